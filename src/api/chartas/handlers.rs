use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};
use chartographer_core::{CanvasId, CanvasService};
use std::sync::Arc;
use tracing::debug;

use super::super::error::ApiError;
use super::types::{CreateChartaQuery, SegmentQuery};

/// Canvas operations block on file I/O and image coding, so they run on the
/// blocking pool rather than on the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> chartographer_core::Result<T> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// Create a blank canvas; responds 201 with the new id as text
pub async fn create_charta(
    Extension(service): Extension<Arc<CanvasService>>,
    Query(query): Query<CreateChartaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = run_blocking(move || service.create(query.width, query.height)).await?;
    Ok((StatusCode::CREATED, id.to_string()))
}

/// Paint the BMP in the body onto the canvas
pub async fn write_segment(
    Extension(service): Extension<Arc<CanvasService>>,
    Path(id): Path<u32>,
    Query(query): Query<SegmentQuery>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    debug!(id, bytes = body.len(), "Segment upload received");
    let id = CanvasId::new(id);
    run_blocking(move || service.write_segment(id, query.into(), &body)).await?;
    Ok(StatusCode::OK)
}

/// Read a segment, clipped to the canvas, as BMP
pub async fn read_segment(
    Extension(service): Extension<Arc<CanvasService>>,
    Path(id): Path<u32>,
    Query(query): Query<SegmentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = service.content_type();
    let id = CanvasId::new(id);
    let bytes = run_blocking(move || service.read_segment(id, query.into())).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Delete a canvas
pub async fn delete_charta(
    Extension(service): Extension<Arc<CanvasService>>,
    Path(id): Path<u32>,
) -> Result<StatusCode, ApiError> {
    let id = CanvasId::new(id);
    run_blocking(move || service.delete(id)).await?;
    Ok(StatusCode::OK)
}
