use super::{Position, RenderSink};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneSegment {
    pub visible: bool,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneMarker {
    pub visible: bool,
    pub position: Position,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneSlot {
    pub active: bool,
    pub segments: Vec<SceneSegment>,
    pub markers: Vec<SceneMarker>,
}

impl SceneSlot {
    pub fn visible_segments(&self) -> impl Iterator<Item = &SceneSegment> {
        self.segments.iter().filter(|s| s.visible)
    }

    pub fn visible_markers(&self) -> impl Iterator<Item = &SceneMarker> {
        self.markers.iter().filter(|m| m.visible)
    }
}

/// 受け取った更新をそのまま保持するシーン
///
/// 参照されたインデックスに合わせて必要な分だけ伸びる。
#[derive(Debug, Clone, Default)]
pub struct SceneState {
    slots: Vec<SceneSlot>,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[SceneSlot] {
        &self.slots
    }

    pub fn slot(&self, slot: usize) -> Option<&SceneSlot> {
        self.slots.get(slot)
    }

    /// active なスロットの数
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    fn slot_mut(&mut self, slot: usize) -> &mut SceneSlot {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, SceneSlot::default);
        }
        &mut self.slots[slot]
    }

    fn segment_mut(&mut self, slot: usize, segment: usize) -> &mut SceneSegment {
        let segments = &mut self.slot_mut(slot).segments;
        if segments.len() <= segment {
            segments.resize(segment + 1, SceneSegment::default());
        }
        &mut segments[segment]
    }

    fn marker_mut(&mut self, slot: usize, marker: usize) -> &mut SceneMarker {
        let markers = &mut self.slot_mut(slot).markers;
        if markers.len() <= marker {
            markers.resize(marker + 1, SceneMarker::default());
        }
        &mut markers[marker]
    }
}

impl RenderSink for SceneState {
    fn set_slot_active(&mut self, slot: usize, active: bool) {
        self.slot_mut(slot).active = active;
    }

    fn set_segment_visible(&mut self, slot: usize, segment: usize, visible: bool) {
        self.segment_mut(slot, segment).visible = visible;
    }

    fn set_segment_endpoints(
        &mut self,
        slot: usize,
        segment: usize,
        start: Position,
        end: Position,
    ) {
        let seg = self.segment_mut(slot, segment);
        seg.start = start;
        seg.end = end;
    }

    fn set_marker_visible(&mut self, slot: usize, marker: usize, visible: bool) {
        self.marker_mut(slot, marker).visible = visible;
    }

    fn set_marker_position(&mut self, slot: usize, marker: usize, position: Position) {
        self.marker_mut(slot, marker).position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_grows_on_demand() {
        let mut scene = SceneState::new();
        scene.set_segment_visible(2, 4, true);
        assert_eq!(scene.slots().len(), 3);
        assert_eq!(scene.slot(2).unwrap().segments.len(), 5);
        assert!(!scene.slot(0).unwrap().active);
    }

    #[test]
    fn test_scene_records_updates() {
        let mut scene = SceneState::new();
        scene.set_slot_active(0, true);
        scene.set_segment_endpoints(0, 0, [1.0, 2.0, 0.0], [3.0, 4.0, 0.0]);
        scene.set_segment_visible(0, 0, true);
        scene.set_marker_position(0, 1, [5.0, 6.0, -0.1]);
        scene.set_marker_visible(0, 1, true);

        let slot = scene.slot(0).unwrap();
        assert_eq!(scene.active_count(), 1);
        assert_eq!(slot.segments[0].end, [3.0, 4.0, 0.0]);
        assert_eq!(slot.visible_segments().count(), 1);
        assert_eq!(slot.visible_markers().count(), 1);
        assert!(!slot.markers[0].visible);
    }
}
