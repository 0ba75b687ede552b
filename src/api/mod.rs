//! Backend API client and models
//!
//! Wire types for `/api/meta`, `/api/suggest`, `/api/lookup` and
//! `/api/reload`, plus the `LookupService` seam the controller runs against.

pub mod client;
pub mod error;
pub mod models;

pub use client::{ApiClient, LookupService};
pub use error::ApiError;
pub use models::{cell_text, LookupResponse, Meta, ReloadResponse, Row};
