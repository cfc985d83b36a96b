//! HTTP surface: router, health and catalog endpoints

pub mod routes;

pub use routes::build_router;
