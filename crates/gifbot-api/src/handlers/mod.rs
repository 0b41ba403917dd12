//! HTTP handlers.

pub mod health;
pub mod interactions;

pub use health::health;
pub use interactions::interactions;
