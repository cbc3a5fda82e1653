use crate::pose::{Frame, KeypointIndex};

use super::transform::ViewTransform;

/// ログに出す主要キーポイント
pub const PROBE_KEYPOINTS: [KeypointIndex; 6] = [
    KeypointIndex::Nose,
    KeypointIndex::LeftShoulder,
    KeypointIndex::RightShoulder,
    KeypointIndex::LeftHip,
    KeypointIndex::RightHip,
    KeypointIndex::RightAnkle,
];

/// 数フレームおきに主要キーポイントのピクセル座標とローカル座標をログに出す
pub struct KeypointProbe {
    interval: u64,
    transform: ViewTransform,
}

impl KeypointProbe {
    /// interval が 0 なら何もしない
    pub fn new(interval: u64, transform: ViewTransform) -> Self {
        Self { interval, transform }
    }

    pub fn should_log(&self, frame: &Frame) -> bool {
        match i64::try_from(self.interval) {
            Ok(0) => false,
            Ok(n) => frame.index.rem_euclid(n) == 0,
            // i64 に収まらない間隔ではフレーム 0 しか該当しない
            Err(_) => frame.index == 0,
        }
    }

    pub fn observe(&self, frame: &Frame) {
        if !self.should_log(frame) || !log::log_enabled!(log::Level::Debug) {
            return;
        }
        for line in self.describe(frame) {
            log::debug!("{line}");
        }
    }

    /// 1キーポイント1行
    pub fn describe(&self, frame: &Frame) -> Vec<String> {
        let mut lines = Vec::new();
        for (p, person) in frame.persons.iter().enumerate() {
            for index in PROBE_KEYPOINTS {
                let line = match person.position(index.index()) {
                    Some((px, py)) => {
                        let local = self.transform.to_local(px, py);
                        format!(
                            "frame {} P{}: {} (idx {}) pixel ({:.2}, {:.2}) local ({:.4}, {:.4}, {:.4})",
                            frame.index,
                            p,
                            index.name(),
                            index.index(),
                            px,
                            py,
                            local[0],
                            local[1],
                            local[2]
                        )
                    }
                    None => format!(
                        "frame {} P{}: {} (idx {}) missing or out of range",
                        frame.index,
                        p,
                        index.name(),
                        index.index()
                    ),
                };
                lines.push(line);
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Person;

    #[test]
    fn test_interval() {
        let probe = KeypointProbe::new(30, ViewTransform::default());
        assert!(probe.should_log(&Frame::new(0, 0.0, vec![])));
        assert!(probe.should_log(&Frame::new(60, 0.0, vec![])));
        assert!(!probe.should_log(&Frame::new(31, 0.0, vec![])));

        let disabled = KeypointProbe::new(0, ViewTransform::default());
        assert!(!disabled.should_log(&Frame::new(0, 0.0, vec![])));
    }

    #[test]
    fn test_interval_beyond_i64() {
        let probe = KeypointProbe::new(u64::MAX, ViewTransform::default());
        assert!(probe.should_log(&Frame::new(0, 0.0, vec![])));
        assert!(!probe.should_log(&Frame::new(1, 0.0, vec![])));
        assert!(!probe.should_log(&Frame::new(-1, 0.0, vec![])));
        assert!(!probe.should_log(&Frame::new(i64::MAX, 0.0, vec![])));
    }

    #[test]
    fn test_describe_reports_missing() {
        let probe = KeypointProbe::new(1, ViewTransform::new(1280.0, 720.0, 1.0, 0.0));
        let person = Person::from_coords(&[(640.0, 360.0); 6]);
        let lines = probe.describe(&Frame::new(3, 0.0, vec![person]));

        assert_eq!(lines.len(), PROBE_KEYPOINTS.len());
        assert!(lines[0].contains("Nose"));
        assert!(lines[0].contains("local (0.0000, 0.0000"));
        assert!(lines[1].contains("LShoulder"));
        // 6点しか無いので hip 以降は範囲外
        assert!(lines[3].contains("missing"));
    }
}
