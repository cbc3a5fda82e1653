use serde::{Deserialize, Deserializer, Serialize};

/// 1フレーム分の検出結果
///
/// `persons` の並びはそのフレーム内の検出順でしかなく、フレーム間で
/// 同一人物である保証はない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "frame", default)]
    pub index: i64,
    #[serde(rename = "time", default, deserialize_with = "nullable")]
    pub timestamp: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub persons: Vec<Person>,
}

/// 1人分のキーポイント列
///
/// 各列は同じ長さであることが期待されるが、保証はされない。
/// 未検出の値は `None`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, deserialize_with = "nullable")]
    pub keypoints_x: Vec<Option<f32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub keypoints_y: Vec<Option<f32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub scores: Vec<Option<f32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub angles: Vec<Option<f32>>,
}

impl Frame {
    pub fn new(index: i64, timestamp: f64, persons: Vec<Person>) -> Self {
        Self {
            index,
            timestamp,
            persons,
        }
    }
}

impl Person {
    /// ピクセル座標の列から作る (scores / angles は空)
    pub fn from_coords(coords: &[(f32, f32)]) -> Self {
        Self {
            keypoints_x: coords.iter().map(|&(x, _)| Some(x)).collect(),
            keypoints_y: coords.iter().map(|&(_, y)| Some(y)).collect(),
            scores: Vec::new(),
            angles: Vec::new(),
        }
    }

    /// 範囲外・欠損・非有限値なら None
    pub fn position(&self, index: usize) -> Option<(f32, f32)> {
        let x = finite(self.keypoints_x.get(index))?;
        let y = finite(self.keypoints_y.get(index))?;
        Some((x, y))
    }
}

fn finite(value: Option<&Option<f32>>) -> Option<f32> {
    value.copied().flatten().filter(|v| v.is_finite())
}

/// `null` をデフォルト値として扱う
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
