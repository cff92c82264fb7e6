//! Server module for Chartographer
//!
//! Contains the server initialization and runtime logic.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from files and environment
//! - `init`: Server initialization and run loop

pub mod config;
mod init;
mod loader;

// Re-export public API
pub use init::run;
pub use loader::load_config;
