//! Client-side progress contract for the learning tracker backend.
//!
//! The backend owns all progress bookkeeping; this crate covers the two
//! client-observable paths: posting a progress event and reading back the
//! validated dashboard snapshot. Everything else (rendering, navigation,
//! storage selection) lives with the surrounding app.

pub mod services;

pub use services::api::{ApiClient, ApiClientConfig};
pub use services::dashboard::parse_dashboard;
pub use services::errors::ApiError;
