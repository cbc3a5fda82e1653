use crate::config::{Config, MarkerMode};
use crate::pose::{Frame, Person, MAX_KEYPOINTS};
use crate::render::{segments_with, Bone, Position, RenderSink, SkeletonPreset};

use super::transform::ViewTransform;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Segment {
    pub visible: bool,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Marker {
    pub visible: bool,
    pub position: Position,
}

/// 1人分の描画スロット。プール内の位置がそのまま識別子になる。
#[derive(Debug, Clone)]
pub struct SkeletonSlot {
    pub active: bool,
    pub segments: Vec<Segment>,
    pub markers: Vec<Marker>,
}

impl SkeletonSlot {
    fn new(segment_count: usize) -> Self {
        Self {
            active: false,
            segments: vec![Segment::default(); segment_count],
            markers: vec![Marker::default(); MAX_KEYPOINTS],
        }
    }
}

/// 1回の reconcile の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub frame_index: i64,
    pub active_slots: usize,
    pub pool_size: usize,
    pub visible_segments: usize,
    pub visible_markers: usize,
}

/// 検出人数に合わせてスケルトンスロットを割り当て・更新する
///
/// スロットは増えるだけで解放しない。人数が減ったら余りのスロットを
/// 非アクティブにして全要素を隠す。フレーム内の並び順 i がそのまま
/// スロット i に対応する (見た目による同一人物判定はしない)。
pub struct SkeletonPool {
    bones: Vec<Bone>,
    transform: ViewTransform,
    show_markers: bool,
    slots: Vec<SkeletonSlot>,
}

impl SkeletonPool {
    pub fn new(bones: Vec<Bone>, transform: ViewTransform, show_markers: bool) -> Self {
        Self {
            bones,
            transform,
            show_markers,
            slots: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let skeleton = &config.skeleton;
        let show_markers = match skeleton.markers {
            MarkerMode::Always => true,
            MarkerMode::FullOnly => skeleton.preset == SkeletonPreset::Full,
            MarkerMode::Never => false,
        };
        Self::new(
            segments_with(skeleton.preset, skeleton.full_face_bones),
            ViewTransform::from_config(&config.view),
            show_markers,
        )
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn slots(&self) -> &[SkeletonSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 最新フレームに合わせてスロットを更新し、変更を sink に流す
    pub fn reconcile<S>(&mut self, frame: &Frame, sink: &mut S) -> ReconcileSummary
    where
        S: RenderSink + ?Sized,
    {
        let n = frame.persons.len();
        if self.slots.len() < n {
            log::debug!("skeleton pool grows {} -> {}", self.slots.len(), n);
            let segment_count = self.bones.len();
            self.slots.resize_with(n, || SkeletonSlot::new(segment_count));
        }

        let mut summary = ReconcileSummary {
            frame_index: frame.index,
            active_slots: n,
            pool_size: self.slots.len(),
            ..Default::default()
        };

        for (i, slot) in self.slots.iter_mut().enumerate() {
            match frame.persons.get(i) {
                Some(person) => {
                    slot.active = true;
                    sink.set_slot_active(i, true);
                    let (segments, markers) = update_slot(
                        i,
                        slot,
                        person,
                        &self.bones,
                        &self.transform,
                        self.show_markers,
                        sink,
                    );
                    summary.visible_segments += segments;
                    summary.visible_markers += markers;
                }
                None => {
                    deactivate_slot(i, slot, sink);
                }
            }
        }

        summary
    }
}

fn update_slot<S: RenderSink + ?Sized>(
    slot_index: usize,
    slot: &mut SkeletonSlot,
    person: &Person,
    bones: &[Bone],
    transform: &ViewTransform,
    show_markers: bool,
    sink: &mut S,
) -> (usize, usize) {
    let mut visible_segments = 0;
    for (seg_index, (segment, bone)) in slot.segments.iter_mut().zip(bones).enumerate() {
        match (person.position(bone.start), person.position(bone.end)) {
            (Some((x1, y1)), Some((x2, y2))) => {
                segment.start = transform.to_local(x1, y1);
                segment.end = transform.to_local(x2, y2);
                segment.visible = true;
                sink.set_segment_endpoints(slot_index, seg_index, segment.start, segment.end);
                sink.set_segment_visible(slot_index, seg_index, true);
                visible_segments += 1;
            }
            _ => {
                segment.visible = false;
                sink.set_segment_visible(slot_index, seg_index, false);
            }
        }
    }

    let mut visible_markers = 0;
    for (kp_index, marker) in slot.markers.iter_mut().enumerate() {
        let position = if show_markers { person.position(kp_index) } else { None };
        match position {
            Some((x, y)) => {
                marker.position = transform.to_marker(x, y);
                marker.visible = true;
                sink.set_marker_position(slot_index, kp_index, marker.position);
                sink.set_marker_visible(slot_index, kp_index, true);
                visible_markers += 1;
            }
            None => {
                marker.visible = false;
                sink.set_marker_visible(slot_index, kp_index, false);
            }
        }
    }

    (visible_segments, visible_markers)
}

fn deactivate_slot<S>(slot_index: usize, slot: &mut SkeletonSlot, sink: &mut S)
where
    S: RenderSink + ?Sized,
{
    slot.active = false;
    sink.set_slot_active(slot_index, false);
    for (seg_index, segment) in slot.segments.iter_mut().enumerate() {
        segment.visible = false;
        sink.set_segment_visible(slot_index, seg_index, false);
    }
    for (kp_index, marker) in slot.markers.iter_mut().enumerate() {
        marker.visible = false;
        sink.set_marker_visible(slot_index, kp_index, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SkeletonConfig;
    use crate::render::{segments_for, SceneState};

    const WIDTH: f32 = 1280.0;
    const HEIGHT: f32 = 720.0;

    fn full_person() -> Person {
        let coords: Vec<(f32, f32)> = (0..MAX_KEYPOINTS)
            .map(|i| (100.0 + i as f32, 50.0 + i as f32))
            .collect();
        Person::from_coords(&coords)
    }

    fn frame_with(index: i64, count: usize) -> Frame {
        Frame::new(index, index as f64 / 30.0, vec![full_person(); count])
    }

    fn pool(preset: SkeletonPreset) -> SkeletonPool {
        SkeletonPool::new(
            segments_for(preset),
            ViewTransform::new(WIDTH, HEIGHT, 1.0, 0.0),
            true,
        )
    }

    #[test]
    fn test_pool_never_shrinks() {
        let mut pool = pool(SkeletonPreset::Barebones);
        let mut scene = SceneState::new();

        pool.reconcile(&frame_with(1, 3), &mut scene);
        assert_eq!(pool.len(), 3);

        let summary = pool.reconcile(&frame_with(2, 1), &mut scene);
        assert_eq!(summary.pool_size, 3);
        assert_eq!(summary.active_slots, 1);
        assert!(pool.slots()[0].active);
        assert!(!pool.slots()[1].active);
        assert!(!pool.slots()[2].active);
        assert!(!scene.slot(1).unwrap().active);
        assert!(!scene.slot(2).unwrap().active);
        assert_eq!(scene.slot(2).unwrap().visible_segments().count(), 0);
        assert_eq!(scene.slot(2).unwrap().visible_markers().count(), 0);

        pool.reconcile(&frame_with(3, 4), &mut scene);
        assert!(pool.len() >= 4);
        assert!(pool.slots().iter().all(|s| s.active));
        assert_eq!(scene.active_count(), 4);

        let summary = pool.reconcile(&frame_with(4, 0), &mut scene);
        assert_eq!(summary.pool_size, 4);
        assert_eq!(summary.active_slots, 0);
        assert_eq!(scene.active_count(), 0);
    }

    #[test]
    fn test_new_slots_sized_from_topology() {
        let mut pool = pool(SkeletonPreset::Mid);
        pool.reconcile(&frame_with(1, 2), &mut SceneState::new());
        for slot in pool.slots() {
            assert_eq!(slot.segments.len(), 38);
            assert_eq!(slot.markers.len(), MAX_KEYPOINTS);
        }
    }

    #[test]
    fn test_all_visible_for_complete_person() {
        let mut pool = pool(SkeletonPreset::Full);
        let mut scene = SceneState::new();
        let summary = pool.reconcile(&frame_with(1, 1), &mut scene);
        assert_eq!(summary.visible_segments, 57);
        assert_eq!(summary.visible_markers, MAX_KEYPOINTS);
        assert_eq!(scene.slot(0).unwrap().visible_segments().count(), 57);
    }

    #[test]
    fn test_missing_coordinate_hides_only_referencing_elements() {
        let mut pool = pool(SkeletonPreset::Full);
        let mut scene = SceneState::new();
        let missing = 9; // 左手首

        let mut person = full_person();
        person.keypoints_y[missing] = None;
        pool.reconcile(&Frame::new(1, 0.0, vec![person]), &mut scene);

        let slot = &pool.slots()[0];
        for (segment, bone) in slot.segments.iter().zip(pool.bones()) {
            assert_eq!(segment.visible, !bone.references(missing), "{:?}", bone);
        }
        for (i, marker) in slot.markers.iter().enumerate() {
            assert_eq!(marker.visible, i != missing);
        }
        let scene_slot = scene.slot(0).unwrap();
        assert!(!scene_slot.markers[missing].visible);
        assert!(scene_slot.markers[missing + 1].visible);
    }

    #[test]
    fn test_out_of_range_keypoints_hidden() {
        let mut pool = pool(SkeletonPreset::Full);
        let mut scene = SceneState::new();
        // body 17点だけ
        let coords: Vec<(f32, f32)> = (0..17).map(|i| (i as f32, i as f32)).collect();
        let summary = pool.reconcile(&Frame::new(1, 0.0, vec![Person::from_coords(&coords)]), &mut scene);

        assert_eq!(summary.visible_segments, 5 + 12);
        assert_eq!(summary.visible_markers, 17);
        assert!(!scene.slot(0).unwrap().markers[17].visible);
    }

    #[test]
    fn test_segment_endpoints_transformed() {
        let mut pool = pool(SkeletonPreset::Barebones);
        let mut scene = SceneState::new();
        let mut coords = vec![(0.0, 0.0); 17];
        coords[0] = (640.0, 360.0);
        coords[1] = (1280.0, 0.0);
        pool.reconcile(&Frame::new(1, 0.0, vec![Person::from_coords(&coords)]), &mut scene);

        // segment 0 = (0, 1)
        let segment = scene.slot(0).unwrap().segments[0];
        assert!(segment.visible);
        assert_eq!(segment.start, [0.0, 0.0, 0.0]);
        assert_eq!(segment.end, [0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_reappearing_slot_updates_again() {
        let mut pool = pool(SkeletonPreset::Barebones);
        let mut scene = SceneState::new();
        pool.reconcile(&frame_with(1, 2), &mut scene);
        pool.reconcile(&frame_with(2, 1), &mut scene);
        assert!(!scene.slot(1).unwrap().active);

        pool.reconcile(&frame_with(3, 2), &mut scene);
        assert!(scene.slot(1).unwrap().active);
        assert_eq!(scene.slot(1).unwrap().visible_segments().count(), 14);
    }

    #[test]
    fn test_marker_modes() {
        let mut config = Config::default();
        config.skeleton = SkeletonConfig {
            preset: SkeletonPreset::Mid,
            full_face_bones: true,
            markers: MarkerMode::FullOnly,
        };
        let mut pool = SkeletonPool::from_config(&config);
        let summary = pool.reconcile(&frame_with(1, 1), &mut SceneState::new());
        assert_eq!(summary.visible_markers, 0);
        assert_eq!(summary.visible_segments, 38);

        config.skeleton.preset = SkeletonPreset::Full;
        let mut pool = SkeletonPool::from_config(&config);
        let summary = pool.reconcile(&frame_with(1, 1), &mut SceneState::new());
        assert_eq!(summary.visible_markers, MAX_KEYPOINTS);

        config.skeleton.markers = MarkerMode::Never;
        config.skeleton.full_face_bones = false;
        let mut pool = SkeletonPool::from_config(&config);
        let summary = pool.reconcile(&frame_with(1, 1), &mut SceneState::new());
        assert_eq!(summary.visible_markers, 0);
        assert_eq!(summary.visible_segments, 52);
    }
}
