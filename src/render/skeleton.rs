//! 骨格の接続定義 (COCO-WholeBody 133点のインデックス)

use serde::Deserialize;

use crate::pose::MAX_KEYPOINTS;

/// 骨 (開始キーポイント, 終了キーポイント)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bone {
    pub start: usize,
    pub end: usize,
}

impl Bone {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn references(&self, index: usize) -> bool {
        self.start == index || self.end == index
    }
}

/// 骨格の詳細度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonPreset {
    /// 体 + 簡易な顔
    Barebones,
    /// 体 + 簡易な顔 + 各手3本指
    Mid,
    /// 顔 + 体 + 全指
    #[default]
    Full,
}

impl SkeletonPreset {
    pub fn name(self) -> &'static str {
        match self {
            Self::Barebones => "barebones",
            Self::Mid => "mid",
            Self::Full => "full",
        }
    }
}

impl std::str::FromStr for SkeletonPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "barebones" => Ok(Self::Barebones),
            "mid" => Ok(Self::Mid),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown skeleton preset: {other}")),
        }
    }
}

const fn b(start: usize, end: usize) -> Bone {
    Bone::new(start, end)
}

/// 鼻-目 (2本)
const BASIC_FACE_BONES: [Bone; 2] = [b(0, 1), b(0, 2)];

/// 顔の詳細 (5本)。耳 (3, 4) を使う。
const DETAILED_FACE_BONES: [Bone; 5] = [b(0, 1), b(0, 2), b(1, 2), b(1, 3), b(2, 4)];

/// 体 (12本)
const BODY_BONES: [Bone; 12] = [
    // 肩・腕
    b(5, 6),
    b(5, 7),
    b(7, 9),
    b(6, 8),
    b(8, 10),
    // 胴体
    b(5, 11),
    b(6, 12),
    b(11, 12),
    // 脚
    b(11, 13),
    b(13, 15),
    b(12, 14),
    b(14, 16),
];

/// 左手: 親指, 人差し指, 中指 (手首 9 から)
const LEFT_HAND_MID_BONES: [Bone; 12] = [
    b(9, 92),
    b(92, 93),
    b(93, 94),
    b(94, 95),
    b(9, 96),
    b(96, 97),
    b(97, 98),
    b(98, 99),
    b(9, 100),
    b(100, 101),
    b(101, 102),
    b(102, 103),
];

/// 左手: 薬指, 小指
const LEFT_HAND_EXTRA_BONES: [Bone; 8] = [
    b(9, 104),
    b(104, 105),
    b(105, 106),
    b(106, 107),
    b(9, 108),
    b(108, 109),
    b(109, 110),
    b(110, 111),
];

/// 右手: 親指, 人差し指, 中指 (手首 10 から)
const RIGHT_HAND_MID_BONES: [Bone; 12] = [
    b(10, 113),
    b(113, 114),
    b(114, 115),
    b(115, 116),
    b(10, 117),
    b(117, 118),
    b(118, 119),
    b(119, 120),
    b(10, 121),
    b(121, 122),
    b(122, 123),
    b(123, 124),
];

/// 右手: 薬指, 小指
const RIGHT_HAND_EXTRA_BONES: [Bone; 8] = [
    b(10, 125),
    b(125, 126),
    b(126, 127),
    b(127, 128),
    b(10, 129),
    b(129, 130),
    b(130, 131),
    b(131, 132),
];

/// プリセットごとの骨リスト。Full は顔の骨を含む57本。
pub fn segments_for(preset: SkeletonPreset) -> Vec<Bone> {
    segments_with(preset, true)
}

/// `full_face_bones` が false のとき Full の顔の骨 (5本) を外す。
/// 他のプリセットには影響しない。
pub fn segments_with(preset: SkeletonPreset, full_face_bones: bool) -> Vec<Bone> {
    let bones = match preset {
        SkeletonPreset::Barebones => [&BASIC_FACE_BONES[..], &BODY_BONES[..]].concat(),
        SkeletonPreset::Mid => [
            &BASIC_FACE_BONES[..],
            &BODY_BONES[..],
            &LEFT_HAND_MID_BONES[..],
            &RIGHT_HAND_MID_BONES[..],
        ]
        .concat(),
        SkeletonPreset::Full => {
            let face: &[Bone] = if full_face_bones { &DETAILED_FACE_BONES } else { &[] };
            [
                face,
                &BODY_BONES[..],
                &LEFT_HAND_MID_BONES[..],
                &LEFT_HAND_EXTRA_BONES[..],
                &RIGHT_HAND_MID_BONES[..],
                &RIGHT_HAND_EXTRA_BONES[..],
            ]
            .concat()
        }
    };
    debug_assert!(bones.iter().all(|b| b.start < MAX_KEYPOINTS && b.end < MAX_KEYPOINTS));
    bones
}

/// 1人分のスケルトンの色 (RGB)。スロット番号で循環する。
pub const SLOT_COLORS: [u32; 6] = [
    0xFFFF00, // 黄
    0x00FFFF, // シアン
    0xFF00FF, // マゼンタ
    0xFF8000, // 橙
    0x80FF80, // 薄緑
    0x8080FF, // 薄青
];

/// キーポイントの色 (RGB)
pub const KEYPOINT_COLOR: u32 = 0x00FF00; // 緑

pub fn slot_color(slot: usize) -> u32 {
    SLOT_COLORS[slot % SLOT_COLORS.len()]
}
