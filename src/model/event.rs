// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Realtime chat events

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::nullable;
use crate::html::strip_html;

/// Kind of a realtime event. Unknown codes are preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum EventType {
    MessagePosted,
    MessageEdited,
    UserJoined,
    UserLeft,
    RoomNameChanged,
    MessageStarred,
    DebugMessage,
    UserMentioned,
    MessageFlagged,
    MessageDeleted,
    FileAdded,
    ModeratorFlag,
    UserSettingsChanged,
    GlobalNotification,
    AccessLevelChanged,
    UserNotification,
    Invitation,
    MessageReply,
    MessageMovedOut,
    MessageMovedIn,
    TimeBreak,
    FeedTicker,
    UserSuspended,
    UserMerged,
    UserNameOrAvatarChanged,
    Unknown(i64),
}

impl From<i64> for EventType {
    fn from(code: i64) -> Self {
        match code {
            1 => EventType::MessagePosted,
            2 => EventType::MessageEdited,
            3 => EventType::UserJoined,
            4 => EventType::UserLeft,
            5 => EventType::RoomNameChanged,
            6 => EventType::MessageStarred,
            7 => EventType::DebugMessage,
            8 => EventType::UserMentioned,
            9 => EventType::MessageFlagged,
            10 => EventType::MessageDeleted,
            11 => EventType::FileAdded,
            12 => EventType::ModeratorFlag,
            13 => EventType::UserSettingsChanged,
            14 => EventType::GlobalNotification,
            15 => EventType::AccessLevelChanged,
            16 => EventType::UserNotification,
            17 => EventType::Invitation,
            18 => EventType::MessageReply,
            19 => EventType::MessageMovedOut,
            20 => EventType::MessageMovedIn,
            21 => EventType::TimeBreak,
            22 => EventType::FeedTicker,
            29 => EventType::UserSuspended,
            30 => EventType::UserMerged,
            34 => EventType::UserNameOrAvatarChanged,
            other => EventType::Unknown(other),
        }
    }
}

impl From<EventType> for i64 {
    fn from(kind: EventType) -> Self {
        match kind {
            EventType::MessagePosted => 1,
            EventType::MessageEdited => 2,
            EventType::UserJoined => 3,
            EventType::UserLeft => 4,
            EventType::RoomNameChanged => 5,
            EventType::MessageStarred => 6,
            EventType::DebugMessage => 7,
            EventType::UserMentioned => 8,
            EventType::MessageFlagged => 9,
            EventType::MessageDeleted => 10,
            EventType::FileAdded => 11,
            EventType::ModeratorFlag => 12,
            EventType::UserSettingsChanged => 13,
            EventType::GlobalNotification => 14,
            EventType::AccessLevelChanged => 15,
            EventType::UserNotification => 16,
            EventType::Invitation => 17,
            EventType::MessageReply => 18,
            EventType::MessageMovedOut => 19,
            EventType::MessageMovedIn => 20,
            EventType::TimeBreak => 21,
            EventType::FeedTicker => 22,
            EventType::UserSuspended => 29,
            EventType::UserMerged => 30,
            EventType::UserNameOrAvatarChanged => 34,
            EventType::Unknown(code) => code,
        }
    }
}

impl Default for EventType {
    fn default() -> Self {
        EventType::Unknown(0)
    }
}

/// One realtime notification.
///
/// `is_mention` and `text_content` are derived from the wire fields by
/// [`Event::precompute`] before the event reaches a consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique per event instance; dedup key within a frame
    pub id: u64,
    pub event_type: EventType,
    /// Raw HTML
    #[serde(default, deserialize_with = "nullable")]
    pub content: String,
    #[serde(default, deserialize_with = "nullable")]
    pub room_id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub room_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub user_id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub user_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub message_id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: u64,
    /// Unix seconds
    #[serde(default, deserialize_with = "nullable")]
    pub time_stamp: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub message_stars: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub message_edits: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub moved: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub show_parent: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub target_user_id: i64,

    #[serde(skip)]
    pub is_mention: bool,
    #[serde(skip)]
    pub text_content: String,
}

impl Event {
    /// Fill in the derived fields
    pub fn precompute(&mut self) {
        self.is_mention = matches!(
            self.event_type,
            EventType::UserMentioned | EventType::MessageReply
        );
        self.text_content = text_content(&self.content);
    }

    /// Message text prefixed with the reply marker for this event's message
    pub fn format_reply(&self, text: &str) -> String {
        format!(":{} {}", self.message_id, text)
    }

    /// Event time
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.time_stamp, 0).single()
    }
}

/// Plain text of a message with a leading `@handle` removed
fn text_content(content: &str) -> String {
    let text = strip_html(content);
    let text = text.trim();
    match text.strip_prefix('@') {
        Some(rest) => match rest.find(char::is_whitespace) {
            Some(idx) => rest[idx..].trim_start().to_string(),
            None => String::new(),
        },
        None => text.to_string(),
    }
}
