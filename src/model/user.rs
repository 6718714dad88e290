// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};

use super::nullable;
use super::room::Room;
use crate::script::{FromScriptMap, ScriptMap, ScriptMapExt};

/// A user's parent site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default, deserialize_with = "nullable")]
    pub icon: String,
    #[serde(default, deserialize_with = "nullable")]
    pub caption: String,
}

/// A chat user. Which fields are filled depends on the endpoint that
/// produced the record; the rest keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email_hash: String,
    #[serde(default, deserialize_with = "nullable")]
    pub reputation: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub is_moderator: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_owner: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_registered: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub last_post: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub last_seen: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub rooms: Vec<Room>,
    #[serde(default, deserialize_with = "nullable")]
    pub user_message: String,
    #[serde(rename = "profileUrl", default, deserialize_with = "nullable")]
    pub profile_url: String,
    #[serde(default)]
    pub site: Option<Site>,
    #[serde(default, deserialize_with = "nullable")]
    pub host: String,
    #[serde(default, deserialize_with = "nullable")]
    pub may_pairoff: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub issues: i64,
}

impl FromScriptMap for User {
    fn from_script_map(map: &ScriptMap) -> Self {
        Self {
            id: map.int("id"),
            name: map.string("name"),
            email_hash: map.string("email_hash"),
            reputation: map.int("reputation"),
            is_moderator: map.flag("is_moderator"),
            is_owner: map.flag("is_owner"),
            is_registered: map.flag("is_registered"),
            last_post: map.int("last_post"),
            last_seen: map.int("last_seen"),
            user_message: map.string("user_message"),
            profile_url: map.string("profileUrl"),
            host: map.string("host"),
            may_pairoff: map.flag("may_pairoff"),
            issues: map.int("issues"),
            ..Self::default()
        }
    }
}
