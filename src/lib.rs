// src/lib.rs
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod presentation;
pub mod server;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use errors::{PortalError, PortalResult, ValidationError};
pub use server::{build_router, start_server};
