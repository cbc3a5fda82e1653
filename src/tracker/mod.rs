pub mod pool;
pub mod probe;
pub mod transform;

pub use pool::{Marker, ReconcileSummary, Segment, SkeletonPool, SkeletonSlot};
pub use probe::KeypointProbe;
pub use transform::ViewTransform;
