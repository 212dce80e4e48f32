//! Frame decoding: raw transport frames → typed [`StreamEvent`]s.
//!
//! The wire carries one JSON event per frame, as text or as binary wrapping
//! UTF-8 text. Parsing happens in two steps — document first, then the
//! typed event — so an unknown `type` tag is reported distinctly from a
//! malformed document. Every failure here is recoverable: the caller logs
//! and skips the frame.

use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use taskline_wire::StreamEvent;

use crate::error::DecodeError;

/// Event type tags this client understands.
const KNOWN_EVENT_TYPES: [&str; 4] = ["plan", "stepStart", "stepEnd", "text"];

/// Decode one inbound frame into a [`StreamEvent`].
pub fn decode_frame(frame: &Message) -> Result<StreamEvent, DecodeError> {
    let text: &str = match frame {
        Message::Text(text) => text,
        Message::Binary(bytes) => {
            std::str::from_utf8(bytes).map_err(|_| DecodeError::NonTextPayload)?
        }
        Message::Ping(_) => return Err(DecodeError::UnsupportedFrame("ping")),
        Message::Pong(_) => return Err(DecodeError::UnsupportedFrame("pong")),
        Message::Close(_) => return Err(DecodeError::UnsupportedFrame("close")),
        Message::Frame(_) => return Err(DecodeError::UnsupportedFrame("raw")),
    };

    decode_text(text)
}

/// Decode the textual payload of a frame.
pub fn decode_text(text: &str) -> Result<StreamEvent, DecodeError> {
    let document: Value = serde_json::from_str(text).map_err(DecodeError::InvalidJson)?;

    let Some(event_type) = document.get("type").and_then(Value::as_str) else {
        return Err(DecodeError::MissingEventType);
    };

    if !KNOWN_EVENT_TYPES.contains(&event_type) {
        return Err(DecodeError::UnknownEventType(event_type.to_string()));
    }

    let event_type = event_type.to_string();
    serde_json::from_value(document).map_err(|source| DecodeError::InvalidShape {
        event_type,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskline_wire::StepStatus;

    #[test]
    fn decodes_text_frame() {
        let frame = Message::Text(r#"{"type":"text","stepId":"s1","text":"Hello"}"#.to_string());
        let event = decode_frame(&frame).unwrap();
        assert_eq!(
            event,
            StreamEvent::Text {
                step_id: Some("s1".to_string()),
                text: "Hello".to_string()
            }
        );
    }

    #[test]
    fn decodes_binary_frame_wrapping_utf8_json() {
        let payload = br#"{"type":"stepEnd","stepId":"s2"}"#.to_vec();
        let event = decode_frame(&Message::Binary(payload)).unwrap();
        assert_eq!(
            event,
            StreamEvent::StepEnd {
                step_id: "s2".to_string()
            }
        );
    }

    #[test]
    fn binary_non_utf8_is_non_text_payload() {
        let err = decode_frame(&Message::Binary(vec![0xff, 0xfe, 0x00])).unwrap_err();
        assert!(matches!(err, DecodeError::NonTextPayload));
    }

    #[test]
    fn control_frames_are_unsupported() {
        let err = decode_frame(&Message::Ping(Vec::new())).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFrame("ping")));
    }

    #[test]
    fn invalid_json_is_reported_distinctly() {
        let err = decode_text("not json").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson(_)));
    }

    #[test]
    fn document_without_type_tag_is_rejected() {
        let err = decode_text(r#"{"stepId":"s1"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingEventType));
    }

    #[test]
    fn unknown_type_tag_names_the_tag() {
        let err = decode_text(r#"{"type":"toolCall","name":"ls"}"#).unwrap_err();
        match err {
            DecodeError::UnknownEventType(tag) => assert_eq!(tag, "toolCall"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn known_tag_with_bad_shape_is_invalid_shape() {
        let err = decode_text(r#"{"type":"stepStart"}"#).unwrap_err();
        match err {
            DecodeError::InvalidShape { event_type, .. } => assert_eq!(event_type, "stepStart"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decodes_full_plan_event() {
        let json = r#"{
            "type": "plan",
            "plan": [{"id":"s1","title":"Init","description":"Set up","status":"pending"}]
        }"#;
        let StreamEvent::Plan { plan } = decode_text(json).unwrap() else {
            panic!("expected plan");
        };
        assert_eq!(plan[0].status, StepStatus::Pending);
    }
}
