mod backend;
mod backends;

pub use backend::{DetectionBox, PlateDetector};
pub use backends::StubDetector;
