use anyhow::Result;
use minifb::{Key, Window, WindowOptions};

use crate::render::scene::SceneState;
use crate::render::skeleton::{slot_color, KEYPOINT_COLOR};
use crate::render::Position;
use crate::tracker::ViewTransform;

/// 背景色 (RGB)
const BACKGROUND_COLOR: u32 = 0x101010;

/// マーカーの半径 (px)
const MARKER_RADIUS: i32 = 3;

/// minifbを使用したレンダラー
///
/// [`SceneState`] のローカル座標を [`ViewTransform`] の逆変換で
/// ウィンドウのピクセルに戻して描く。
pub struct MinifbRenderer {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        let buffer = vec![BACKGROUND_COLOR; width * height];

        Ok(Self {
            window,
            buffer,
            width,
            height,
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    pub fn clear(&mut self) {
        self.buffer.fill(BACKGROUND_COLOR);
    }

    /// アクティブなスロットの線とマーカーを描画
    pub fn draw_scene(&mut self, scene: &SceneState, transform: &ViewTransform) {
        let (w, h) = (self.width, self.height);

        for (i, slot) in scene.slots().iter().enumerate() {
            if !slot.active {
                continue;
            }
            let color = slot_color(i);
            for segment in slot.visible_segments() {
                let start = canvas_point(transform, &segment.start, w, h);
                let end = canvas_point(transform, &segment.end, w, h);
                if let (Some((x1, y1)), Some((x2, y2))) = (start, end) {
                    self.draw_line(x1, y1, x2, y2, color);
                }
            }
            for marker in slot.visible_markers() {
                if let Some((x, y)) = canvas_point(transform, &marker.position, w, h) {
                    self.draw_circle(x, y, MARKER_RADIUS, KEYPOINT_COLOR);
                }
            }
        }
    }

    /// バッファをウィンドウに表示
    pub fn update(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }

    /// Bresenhamのアルゴリズムで線を描画
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let (mut x, mut y) = (x0, y0);
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// 円を描画（塗りつぶし）
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx.saturating_add(dx), cy.saturating_add(dy), color);
                }
            }
        }
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize * self.width + x as usize] = color;
        }
    }
}

/// ローカル座標をキャンバスのピクセルに変換する
///
/// 画面から大きく外れた点は None (線もマーカーも描かない)。
pub fn canvas_point(
    transform: &ViewTransform,
    position: &Position,
    width: usize,
    height: usize,
) -> Option<(i32, i32)> {
    let (x, y) = transform.to_pixel(position, width as f32, height as f32);
    let limit = (width.max(height) * 4) as f32;
    if x.abs() < limit && y.abs() < limit {
        Some((x as i32, y as i32))
    } else {
        None
    }
}
