use crate::config::ViewConfig;
use crate::render::Position;

/// ピクセル座標 → ローカル座標 変換
///
/// 画像中心を原点にし、Y軸を反転して一様にスケールする。
/// `x' = (px / width - 0.5) * scale`, `y' = (0.5 - py / height) * scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    width: f32,
    height: f32,
    scale: f32,
    z: f32,
    marker_z: f32,
}

impl ViewTransform {
    pub fn new(width: f32, height: f32, scale: f32, z: f32) -> Self {
        Self {
            width,
            height,
            scale,
            z,
            marker_z: z,
        }
    }

    pub fn from_config(config: &ViewConfig) -> Self {
        Self::new(
            config.video_width,
            config.video_height,
            config.keypoint_scale,
            config.skeleton_z,
        )
        .with_marker_offset(config.marker_z_offset)
    }

    /// マーカーのZを線からずらす
    pub fn with_marker_offset(mut self, offset: f32) -> Self {
        self.marker_z = self.z + offset;
        self
    }

    pub fn to_local(&self, px: f32, py: f32) -> Position {
        self.project(px, py, self.z)
    }

    pub fn to_marker(&self, px: f32, py: f32) -> Position {
        self.project(px, py, self.marker_z)
    }

    /// ローカル座標 → 画像サイズ (width, height) 上のピクセル座標
    pub fn to_pixel(&self, position: &Position, width: f32, height: f32) -> (f32, f32) {
        let nx = position[0] / self.scale + 0.5;
        let ny = 0.5 - position[1] / self.scale;
        (nx * width, ny * height)
    }

    fn project(&self, px: f32, py: f32, z: f32) -> Position {
        [
            (px / self.width - 0.5) * self.scale,
            (0.5 - py / self.height) * self.scale,
            z,
        ]
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::from_config(&ViewConfig::default())
    }
}
