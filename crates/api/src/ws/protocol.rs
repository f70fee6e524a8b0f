use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

/// End-of-stream sentinel used by clients on the raw binary framing,
/// where there is no JSON envelope to carry an `audio-end`.
pub const END_SENTINEL: &str = "END";

/// A frame that could not be decoded. The frame is dropped and the
/// session continues; decode failures never terminate a connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed JSON envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decoded inbound event, from either framing.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    /// A chunk of raw PCM16LE audio.
    Audio(Vec<u8>),
    /// End of session input. A replacement payload supersedes everything
    /// buffered so far (the client re-sends the full take to avoid
    /// double-counting).
    End { replacement: Option<Vec<u8>> },
    /// A well-formed envelope with a message kind we don't know.
    Unknown(String),
}

/// Decodes a text frame: either the `"END"` sentinel or a JSON envelope
/// (`{"type":"audio-stream","data":"<base64>"}` /
/// `{"type":"audio-end","data":"<base64, optional>"}`).
pub fn decode_text(text: &str) -> Result<Inbound, ProtocolError> {
    if text == END_SENTINEL {
        return Ok(Inbound::End { replacement: None });
    }

    let envelope: serde_json::Value = serde_json::from_str(text)?;
    let kind = envelope.get("type").and_then(|t| t.as_str()).unwrap_or("");

    match kind {
        "audio-stream" => match envelope.get("data").and_then(|d| d.as_str()) {
            Some(data) => Ok(Inbound::Audio(BASE64.decode(data)?)),
            // An audio-stream without data carries nothing; skip it.
            None => Ok(Inbound::Audio(Vec::new())),
        },
        "audio-end" => {
            let replacement = match envelope.get("data").and_then(|d| d.as_str()) {
                Some(data) => Some(BASE64.decode(data)?),
                None => None,
            };
            Ok(Inbound::End { replacement })
        }
        other => Ok(Inbound::Unknown(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_audio_stream_envelope() {
        let payload = BASE64.encode([1u8, 2, 3, 4]);
        let text = format!(r#"{{"type":"audio-stream","data":"{payload}","timestamp":1712000000}}"#);
        assert_eq!(decode_text(&text).unwrap(), Inbound::Audio(vec![1, 2, 3, 4]));
    }

    #[test]
    fn audio_stream_without_data_is_an_empty_chunk() {
        let text = r#"{"type":"audio-stream","timestamp":1712000000}"#;
        assert_eq!(decode_text(text).unwrap(), Inbound::Audio(Vec::new()));
    }

    #[test]
    fn decodes_audio_end_without_payload() {
        let text = r#"{"type":"audio-end"}"#;
        assert_eq!(decode_text(text).unwrap(), Inbound::End { replacement: None });
    }

    #[test]
    fn decodes_audio_end_with_replacement_payload() {
        let payload = BASE64.encode(b"full take");
        let text = format!(r#"{{"type":"audio-end","data":"{payload}"}}"#);
        assert_eq!(
            decode_text(&text).unwrap(),
            Inbound::End {
                replacement: Some(b"full take".to_vec())
            }
        );
    }

    #[test]
    fn end_sentinel_closes_the_binary_framing() {
        assert_eq!(
            decode_text(END_SENTINEL).unwrap(),
            Inbound::End { replacement: None }
        );
    }

    #[test]
    fn non_json_text_is_a_decode_error() {
        assert!(matches!(
            decode_text("not json at all"),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn broken_base64_is_a_decode_error() {
        let text = r#"{"type":"audio-stream","data":"@@not-base64@@"}"#;
        assert!(matches!(
            decode_text(text),
            Err(ProtocolError::Base64(_))
        ));
    }

    #[test]
    fn unknown_kind_is_surfaced_not_failed() {
        let text = r#"{"type":"video-stream","data":""}"#;
        assert_eq!(
            decode_text(text).unwrap(),
            Inbound::Unknown("video-stream".to_string())
        );
    }

    #[test]
    fn envelope_without_type_is_unknown() {
        let text = r#"{"data":"AAAA"}"#;
        assert_eq!(decode_text(text).unwrap(), Inbound::Unknown(String::new()));
    }
}
