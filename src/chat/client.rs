// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! `ChatClient`: posting, rooms, users and uploads

use bytes::Bytes;
use regex::Regex;
use reqwest::Method;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::auth::AuthSession;
use crate::config::{StreamConfig, LAST_EVENT_SENTINEL};
use crate::error::{Error, Result};
use crate::http::{FilePart, Request, RequestExecutor, Response};
use crate::model::{Access, Event, Room, User};
use crate::script::{ScriptExtractor, ScriptValue, ROOM_USERS_TARGET};
use crate::stream::EventStream;

#[derive(Debug, Deserialize)]
struct RoomList {
    #[serde(default)]
    rooms: Vec<Room>,
}

#[derive(Debug, Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<User>,
}

/// Chat actions on behalf of an [`AuthSession`].
///
/// Every request goes through a [`RequestExecutor`], so POSTs carry the
/// session `fkey` and throttled requests are retried after the server's
/// cooldown. [`ChatClient::shutdown`] aborts any such wait.
#[derive(Debug, Clone)]
pub struct ChatClient {
    session: AuthSession,
    executor: RequestExecutor,
    extractor: ScriptExtractor,
    shutdown: CancellationToken,
    room_pattern: Regex,
}

impl ChatClient {
    /// Create a client for a session (logged in or restored)
    pub fn new(session: AuthSession) -> Result<Self> {
        Self::with_shutdown(session, CancellationToken::new())
    }

    /// Create a client whose rate-limit waits end when `shutdown` fires
    pub fn with_shutdown(session: AuthSession, shutdown: CancellationToken) -> Result<Self> {
        let executor = session.executor(shutdown.clone())?;
        let room_pattern =
            Regex::new(r"^/rooms(?:/info)?/(\d+)").map_err(|e| Error::other(e.to_string()))?;

        Ok(Self {
            session,
            executor,
            extractor: ScriptExtractor::new(),
            shutdown,
            room_pattern,
        })
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Abort pending rate-limit waits; later requests fail with `Cancelled`
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Start an event stream sharing this client's session
    pub fn stream(&self, config: StreamConfig) -> Result<EventStream> {
        EventStream::spawn(self.session.clone(), config)
    }

    /// Post a message to a room
    pub async fn send(&self, room: u64, text: &str) -> Result<()> {
        tracing::debug!(room_id = room, len = text.len(), "sending message");
        self.executor
            .post_form(&format!("/chats/{}/messages/new", room), &[("text", text.to_string())])
            .await?;
        Ok(())
    }

    /// Reply to the message an event refers to, in the event's room
    pub async fn reply(&self, event: &Event, text: &str) -> Result<()> {
        self.send(event.room_id, &event.format_reply(text)).await
    }

    /// Toggle the star on a message
    pub async fn star(&self, message: u64) -> Result<()> {
        self.executor
            .post_form(&format!("/messages/{}/star", message), &[])
            .await?;
        Ok(())
    }

    /// Join a room, treating all of its history as already seen
    pub async fn join(&self, room: u64) -> Result<()> {
        let key = format!("r{}", room);
        self.executor
            .post_form("/events", &[(key.as_str(), LAST_EVENT_SENTINEL.to_string())])
            .await?;
        tracing::info!(room_id = room, "joined room");
        Ok(())
    }

    /// Leave a room
    pub async fn leave(&self, room: u64) -> Result<()> {
        self.executor
            .post_form(&format!("/chats/leave/{}", room), &[("quiet", "true".to_string())])
            .await?;
        tracing::info!(room_id = room, "left room");
        Ok(())
    }

    /// Invite a user to a room
    pub async fn invite(&self, user: i64, room: u64) -> Result<()> {
        self.executor
            .post_form(
                "/users/invite",
                &[("UserId", user.to_string()), ("RoomId", room.to_string())],
            )
            .await?;
        Ok(())
    }

    /// Create a room and return its id
    pub async fn new_room(
        &self,
        name: &str,
        description: &str,
        host: &str,
        access: Access,
    ) -> Result<u64> {
        self.create_room(
            "/rooms/save",
            &[
                ("name", name.to_string()),
                ("description", description.to_string()),
                ("host", host.to_string()),
                ("defaultAccess", access.to_string()),
                ("noDupeCheck", "true".to_string()),
            ],
        )
        .await
    }

    /// Create a private room with another user and return its id
    pub async fn new_room_with_user(&self, user: i64, name: &str) -> Result<u64> {
        self.create_room(
            "/rooms/pairoff",
            &[("withUserId", user.to_string()), ("name", name.to_string())],
        )
        .await
    }

    /// The editor answers with a redirect to the new room; it is not followed
    async fn create_room(&self, path: &str, fields: &[(&str, String)]) -> Result<u64> {
        let request = self.executor.form_request(path, fields)?.follow_redirects(false);
        let response = self.executor.execute(request).await?;

        let room = response
            .location()
            .and_then(|location| self.room_id_from_path(location.path()))
            .ok_or(Error::RoomIdNotFound)?;
        tracing::info!(room_id = room, "created room");
        Ok(room)
    }

    fn room_id_from_path(&self, path: &str) -> Option<u64> {
        self.room_pattern
            .captures(path)
            .and_then(|caps| caps.get(1))
            .and_then(|id| id.as_str().parse().ok())
    }

    /// Extended information about a user
    pub async fn user(&self, user: i64) -> Result<User> {
        self.thumbs(user).await?.json()
    }

    /// Rooms a user is currently in
    pub async fn rooms(&self, user: i64) -> Result<Vec<Room>> {
        let list: RoomList = self.thumbs(user).await?.json()?;
        Ok(list.rooms)
    }

    async fn thumbs(&self, user: i64) -> Result<Response> {
        self.executor.get(&format!("/users/thumbs/{}", user)).await
    }

    /// Basic information about several users as seen from a room
    pub async fn users(&self, users: &[i64], room: u64) -> Result<Vec<User>> {
        let ids = users
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let response = self
            .executor
            .post_form("/user/info", &[("ids", ids), ("roomid", room.to_string())])
            .await?;
        let list: UserList = response.json()?;
        Ok(list.users)
    }

    /// Users present in a room, read from the room page's scripts.
    ///
    /// Fails with `TargetCallNotFound` when the page does not list its
    /// occupants, which usually means the session cannot see the room.
    pub async fn users_in_room(&self, room: u64) -> Result<Vec<User>> {
        let page = self.executor.get(&format!("/rooms/{}", room)).await?;
        self.extractor.extract(&page.text_lossy(), ROOM_USERS_TARGET)
    }

    /// Upload an image and return its hosted URL
    pub async fn upload_image(&self, data: impl Into<Bytes>) -> Result<String> {
        let part = FilePart {
            field: "filename".to_string(),
            file_name: "untitled".to_string(),
            mime: None,
            data: data.into(),
        };
        let request = Request::from_url(Method::POST, self.executor.url("/upload/image")?).file(part);
        let response = self.executor.execute(request).await?;
        self.upload_result(&response.text_lossy())
    }

    fn upload_result(&self, html: &str) -> Result<String> {
        let program = self.extractor.parse_page(html)?;

        let mut result = None;
        let mut error = None;
        for (name, value) in self.extractor.assignments(&program) {
            let text = value.as_ref().and_then(ScriptValue::as_str).map(str::to_string);
            match name.as_str() {
                "result" => result = text,
                "error" => error = text,
                _ => {}
            }
        }

        if let Some(error) = error.filter(|e| !e.is_empty()) {
            return Err(Error::Upload(error));
        }
        result.ok_or_else(|| Error::Upload("no image URL in upload response".to_string()))
    }
}
