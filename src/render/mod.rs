pub mod scene;
pub mod skeleton;
pub mod window;

pub use scene::SceneState;
pub use skeleton::{segments_for, segments_with, Bone, SkeletonPreset};
pub use window::MinifbRenderer;

/// ローカル空間の座標 (x, y, z)
pub type Position = [f32; 3];

/// スロット単位の可視状態・位置の更新を受け取る描画側
///
/// [`crate::tracker::SkeletonPool`] から毎 tick 呼ばれる。エラーは返さない。
pub trait RenderSink {
    fn set_slot_active(&mut self, slot: usize, active: bool);
    fn set_segment_visible(&mut self, slot: usize, segment: usize, visible: bool);
    fn set_segment_endpoints(
        &mut self,
        slot: usize,
        segment: usize,
        start: Position,
        end: Position,
    );
    fn set_marker_visible(&mut self, slot: usize, marker: usize, visible: bool);
    fn set_marker_position(&mut self, slot: usize, marker: usize, position: Position);
}
