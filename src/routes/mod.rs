//! Route wiring for the HTTP surface

pub mod api;

pub use api::create_api_router;
