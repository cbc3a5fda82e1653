/// COCO-WholeBody のキーポイント総数 (body 17 + feet 6 + face 68 + hands 42)
pub const MAX_KEYPOINTS: usize = 133;

/// COCO-WholeBody 先頭17点 (body) のインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "Nose",
            Self::LeftEye => "LEye",
            Self::RightEye => "REye",
            Self::LeftEar => "LEar",
            Self::RightEar => "REar",
            Self::LeftShoulder => "LShoulder",
            Self::RightShoulder => "RShoulder",
            Self::LeftElbow => "LElbow",
            Self::RightElbow => "RElbow",
            Self::LeftWrist => "LWrist",
            Self::RightWrist => "RWrist",
            Self::LeftHip => "LHip",
            Self::RightHip => "RHip",
            Self::LeftKnee => "LKnee",
            Self::RightKnee => "RKnee",
            Self::LeftAnkle => "LAnkle",
            Self::RightAnkle => "RAnkle",
        }
    }
}
