pub mod frame;
pub mod keypoint;

pub use frame::{Frame, Person};
pub use keypoint::{KeypointIndex, MAX_KEYPOINTS};
