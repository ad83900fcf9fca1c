//! Core domain types shared across the crate.

pub mod event;
pub mod ids;

pub use event::Event;
pub use ids::BucketId;
