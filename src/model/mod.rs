// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Chat domain records

mod event;
mod room;
mod user;

pub use event::{Event, EventType};
pub use room::{Access, Room};
pub use user::{Site, User};

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
