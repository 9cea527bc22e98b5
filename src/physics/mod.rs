pub mod bearing;
pub mod horizon;

pub use bearing::{project, true_bearing, ProjectionResult};
pub use horizon::{horizon_distance, visibility_distance, HorizonResult, VisibilityResult};
