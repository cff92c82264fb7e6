//! Canvas ("charta") API endpoints
//!
//! POST   /chartas/?width=&height=            - Create a blank canvas, returns its id
//! POST   /chartas/:id/?x=&y=&width=&height=  - Paint a BMP segment onto a canvas
//! GET    /chartas/:id/?x=&y=&width=&height=  - Read a segment as BMP
//! DELETE /chartas/:id/                       - Delete a canvas
//!
//! Every path is also served without the trailing slash.

pub mod handlers;
pub mod types;


pub use handlers::{create_charta, delete_charta, read_segment, write_segment};

use axum::{routing::post, Router};

/// Create canvas routes
pub fn chartas_routes() -> Router {
    Router::new()
        .route("/chartas", post(create_charta))
        .route("/chartas/", post(create_charta))
        .route(
            "/chartas/:id",
            post(write_segment).get(read_segment).delete(delete_charta),
        )
        .route(
            "/chartas/:id/",
            post(write_segment).get(read_segment).delete(delete_charta),
        )
}
