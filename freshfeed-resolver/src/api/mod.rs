//! HTTP API handlers

pub mod health;
pub mod items;

pub use health::health_routes;
pub use items::item_routes;
