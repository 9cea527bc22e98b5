pub mod error;
pub mod geo;
pub mod physics;
pub mod geometry;
pub mod rings;
pub mod render;
pub mod session;
pub mod io;

pub use error::{GeodesyError, Result};
pub use geo::GeoPoint;

#[cfg(test)]
mod tests;
