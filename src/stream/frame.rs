// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Websocket frame decoding

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::Event;

/// Per-room section of a frame
#[derive(Debug, Default, Deserialize)]
struct RoomPayload {
    #[serde(default, rename = "e")]
    events: Vec<Value>,
}

/// Decode one text frame into events.
///
/// A frame maps room keys (`"r17"`) to payloads whose `e` array holds events.
/// The same event is usually repeated under every room the user is in, so
/// events are deduplicated by id within the frame. Nothing is remembered
/// across frames. Undecodable frames, payloads and events are skipped.
pub fn decode_frame(text: &str) -> Vec<Event> {
    let frame: Map<String, Value> = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, "skipping undecodable frame");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut events = Vec::new();

    for (room, payload) in frame {
        let Ok(payload) = serde_json::from_value::<RoomPayload>(payload) else {
            tracing::trace!(room = %room, "skipping non-room payload");
            continue;
        };

        for raw in payload.events {
            match serde_json::from_value::<Event>(raw) {
                Ok(mut event) => {
                    if seen.insert(event.id) {
                        event.precompute();
                        events.push(event);
                    }
                }
                Err(e) => tracing::debug!(room = %room, error = %e, "skipping undecodable event"),
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventType;

    fn posted(id: u64, room: u64, content: &str) -> String {
        format!(
            r#"{{"event_type":1,"time_stamp":1700000000,"content":"{}","id":{},"user_id":7,"user_name":"bob","room_id":{},"room_name":"Sandbox","message_id":{}}}"#,
            content,
            id,
            room,
            id + 1000
        )
    }

    #[test]
    fn test_dedup_within_frame() {
        let frame = format!(
            r#"{{"r1":{{"e":[{a},{a}],"t":5,"d":1}},"r2":{{"e":[{a},{b}]}}}}"#,
            a = posted(10, 1, "hello"),
            b = posted(11, 1, "world"),
        );

        let events = decode_frame(&frame);
        let ids: Vec<u64> = events.iter().map(|e| e.id).collect();

        assert_eq!(ids, vec![10, 11]);
        assert_eq!(events[0].event_type, EventType::MessagePosted);
        assert_eq!(events[0].text_content, "hello");
    }

    #[test]
    fn test_no_dedup_across_frames() {
        let frame = format!(r#"{{"r1":{{"e":[{}]}}}}"#, posted(10, 1, "hi"));

        assert_eq!(decode_frame(&frame).len(), 1);
        assert_eq!(decode_frame(&frame).len(), 1);
    }

    #[test]
    fn test_skips_garbage() {
        assert!(decode_frame("not json").is_empty());
        assert!(decode_frame("[1,2,3]").is_empty());

        let frame = format!(
            r#"{{"r1":{{"t":5}},"r2":42,"r3":{{"e":[{{"bogus":true}},{}]}}}}"#,
            posted(12, 3, "ok")
        );
        let events = decode_frame(&frame);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].room_id, 3);
    }

    #[test]
    fn test_events_are_precomputed() {
        let frame = r#"{"r1":{"e":[{"event_type":8,"id":5,"content":"@alice ping","room_id":1}]}}"#;
        let events = decode_frame(frame);

        assert!(events[0].is_mention);
        assert_eq!(events[0].text_content, "ping");
    }
}
