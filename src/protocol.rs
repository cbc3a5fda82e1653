//! Wire format of the pose producer: one JSON object per `'\n'`-terminated line.
//!
//! ```text
//! {"frame": 12, "time": 0.4, "persons": [
//!   {"keypoints_x": [...], "keypoints_y": [...], "scores": [...], "angles": [...]}]}
//! ```
//!
//! The producer writes undetected keypoints as a bare `NaN` token (and may
//! write `Infinity` / `-Infinity`), which is not valid JSON. Those tokens are
//! rewritten to `null` before parsing, so they land as `None` in [`Person`].
//!
//! Self-contained apart from the frame types in `crate::pose`.

use std::borrow::Cow;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec};

use crate::error::DecodeError;
use crate::pose::Frame;

/// 受信バッファの初期サイズ
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// 1行の上限 (超えた行は次の改行まで捨てる)
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024; // 16MB

/// Decode one message (without its delimiter) into a [`Frame`].
pub fn decode(message: &str) -> Result<Frame, DecodeError> {
    let json = replace_non_finite_tokens(message);
    Ok(serde_json::from_str(&json)?)
}

/// Encode a frame as a single line (no trailing delimiter).
///
/// Missing values are written as `null`, which [`decode`] reads back as missing.
pub fn encode(frame: &Frame) -> Result<String, DecodeError> {
    Ok(serde_json::to_string(frame)?)
}

/// Rewrite `NaN`, `Infinity` and `-Infinity` outside string literals to `null`.
fn replace_non_finite_tokens(text: &str) -> Cow<'_, str> {
    if !text.contains("NaN") && !text.contains("Infinity") {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut i = 0;
    let mut in_string = false;
    let mut escaped = false;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        let token_len = match b {
            b'"' => {
                in_string = true;
                0
            }
            b'N' if text[i..].starts_with("NaN") => 3,
            b'I' if text[i..].starts_with("Infinity") => 8,
            b'-' if text[i..].starts_with("-Infinity") => 9,
            _ => 0,
        };

        if token_len == 0 {
            i += 1;
        } else {
            out.push_str(&text[last..i]);
            out.push_str("null");
            i += token_len;
            last = i;
        }
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

/// 受信バイト列を改行区切りのメッセージに分割する
///
/// UTF-8 の検証は完結した1行ごとに行うので、マルチバイト文字が
/// 読み込み境界で分断されても問題ない。行末の `'\r'` は取り除かれる。
pub struct MessageSplitter {
    buf: BytesMut,
    codec: LinesCodec,
}

impl MessageSplitter {
    pub fn new(initial_capacity: usize, max_message_bytes: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(initial_capacity),
            codec: LinesCodec::new_with_max_length(max_message_bytes),
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// 次の完結したメッセージ。区切りがまだ来ていなければ None。
    ///
    /// 不正な UTF-8 や上限超過の行はエラーとして1回返され、
    /// その行は読み捨てられる。
    pub fn next_message(&mut self) -> Option<Result<String, DecodeError>> {
        match self.codec.decode(&mut self.buf) {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }
    }

    /// 区切り待ちのバイト数
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

impl Default for MessageSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_MAX_MESSAGE_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Person;

    const SAMPLE: &str = r#"{"frame": 7, "time": 0.25, "persons": [{"keypoints_x": [640.0, NaN, 10.5], "keypoints_y": [360.0, 200.0, NaN], "scores": [0.9, NaN, 0.1], "angles": [NaN, 12.5]}]}"#;

    #[test]
    fn test_decode_accepts_nan_tokens() {
        let frame = decode(SAMPLE).unwrap();
        assert_eq!(frame.index, 7);
        assert_eq!(frame.timestamp, 0.25);
        assert_eq!(frame.persons.len(), 1);

        let person = &frame.persons[0];
        assert_eq!(person.keypoints_x, vec![Some(640.0), None, Some(10.5)]);
        assert_eq!(person.keypoints_y, vec![Some(360.0), Some(200.0), None]);
        assert_eq!(person.scores[1], None);
        assert_eq!(person.angles, vec![None, Some(12.5)]);
    }

    #[test]
    fn test_decode_accepts_infinity_tokens() {
        let frame =
            decode(r#"{"frame": 1, "persons": [{"keypoints_x": [Infinity, -Infinity], "keypoints_y": [1.0, 2.0]}]}"#)
                .unwrap();
        assert_eq!(frame.persons[0].keypoints_x, vec![None, None]);
    }

    #[test]
    fn test_decode_leaves_strings_untouched() {
        let json = r#"{"frame": 2, "label": "NaN \"Infinity\" -Infinity", "persons": []}"#;
        assert_eq!(replace_non_finite_tokens(json), json);
        assert_eq!(decode(json).unwrap().index, 2);
    }

    #[test]
    fn test_decode_tolerates_missing_and_extra_fields() {
        let frame = decode(r#"{"persons": [{"keypoints_x": [1.0], "extra": {"a": 1}}], "fps": 30}"#).unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!(frame.timestamp, 0.0);
        assert_eq!(frame.persons[0].keypoints_x, vec![Some(1.0)]);
        assert!(frame.persons[0].keypoints_y.is_empty());

        let frame = decode(r#"{"frame": 3, "time": null, "persons": null}"#).unwrap();
        assert_eq!(frame.index, 3);
        assert!(frame.persons.is_empty());
    }

    #[test]
    fn test_decode_rejects_structural_errors() {
        assert!(decode("").is_err());
        assert!(decode("[1, 2, 3]").is_err());
        assert!(decode(r#"{"frame": 1, "persons": [{"keypoints_x": [1.0,"#).is_err());
        assert!(decode(r#"{"frame": "one"}"#).is_err());
        assert!(decode(r#"{"persons": [{"keypoints_x": "abc"}]}"#).is_err());
    }

    #[test]
    fn test_reencode_preserves_index_and_person_count() {
        let frame = decode(SAMPLE).unwrap();
        let line = encode(&frame).unwrap();
        assert!(!line.contains('\n'));

        let again = decode(&line).unwrap();
        assert_eq!(again.index, frame.index);
        assert_eq!(again.persons.len(), frame.persons.len());
        assert_eq!(again, frame);
    }

    #[test]
    fn test_encode_missing_values_as_null() {
        let mut person = Person::from_coords(&[(1.0, 2.0)]);
        person.keypoints_x.push(None);
        let line = encode(&Frame::new(5, 1.5, vec![person])).unwrap();
        assert!(line.contains("null"));
    }

    #[test]
    fn test_splitter_retains_partial_message() {
        let mut splitter = MessageSplitter::default();
        splitter.push(b"{\"frame\": 1}\n{\"fra");
        assert_eq!(splitter.next_message().unwrap().unwrap(), "{\"frame\": 1}");
        assert!(splitter.next_message().is_none());
        assert_eq!(splitter.pending(), 5);

        splitter.push(b"me\": 2}\r\n");
        assert_eq!(splitter.next_message().unwrap().unwrap(), "{\"frame\": 2}");
        assert!(splitter.next_message().is_none());
    }

    #[test]
    fn test_splitter_handles_split_utf8() {
        let line = "{\"frame\": 1, \"name\": \"é\"}\n".as_bytes();
        let cut = line.iter().position(|&b| b >= 0x80).unwrap() + 1;
        let mut splitter = MessageSplitter::default();
        splitter.push(&line[..cut]);
        assert!(splitter.next_message().is_none());
        splitter.push(&line[cut..]);
        let message = splitter.next_message().unwrap().unwrap();
        assert_eq!(decode(&message).unwrap().index, 1);
    }

    #[test]
    fn test_splitter_skips_oversize_line() {
        let mut splitter = MessageSplitter::new(16, 8);
        splitter.push(b"0123456789abcdef\nshort\n");
        assert!(matches!(splitter.next_message(), Some(Err(DecodeError::Line(_)))));
        assert_eq!(splitter.next_message().unwrap().unwrap(), "short");
        assert!(splitter.next_message().is_none());
    }

    #[test]
    fn test_splitter_skips_invalid_utf8() {
        let mut splitter = MessageSplitter::default();
        splitter.push(b"\xff\xfe\n{\"frame\": 4}\n");
        assert!(matches!(splitter.next_message(), Some(Err(DecodeError::Line(_)))));
        assert_eq!(splitter.next_message().unwrap().unwrap(), "{\"frame\": 4}");
    }
}
