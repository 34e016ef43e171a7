//! Application services: loading, rendering and assembling documents.

pub mod documents;
pub mod error;
pub mod front_matter;
pub mod loader;
pub mod reading_time;
pub mod render;
