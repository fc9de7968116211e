// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Messages exchanged with web clients over the `/posts` websocket.
//!
//! On connect the server sends a status message. Clients page through history with
//! `requestBeforeIndex` or `requestAfterIndex`; each page ends with an `endRequest` message. Live
//! changes are pushed as they happen.

use serde::{Deserialize, Serialize};

use crate::posts::{FeedEvent, FeedPost, Posts};

/// Smallest page the server sends, whatever the client asks for.
pub const MIN_PAGE_SIZE: i64 = 20;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientMessage {
    pub request_before_index: Option<i64>,
    pub request_after_index: Option<i64>,
    pub request_count: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub num_available: Option<usize>,
    pub num_irreversible: Option<usize>,
    pub this_index: Option<usize>,
    pub this_post: Option<FeedPost>,
    pub end_request: bool,
}

impl ServerMessage {
    /// Current size and irreversible position of the post list.
    pub fn status(posts: &Posts) -> Self {
        Self {
            num_available: Some(posts.len()),
            num_irreversible: Some(posts.irreversible_post()),
            ..Default::default()
        }
    }

    fn post(posts: &Posts, index: usize, post: FeedPost) -> Self {
        Self { this_index: Some(index), this_post: Some(post), ..Self::status(posts) }
    }

    pub fn end_request() -> Self {
        Self { end_request: true, ..Default::default() }
    }

    /// The message announcing `event`. `posts` must already include the change.
    pub fn from_event(posts: &Posts, event: FeedEvent) -> Self {
        match event {
            FeedEvent::Undo(index) => Self { num_available: Some(index), ..Default::default() },
            FeedEvent::Added(index, post) => Self::post(posts, index, post),
            FeedEvent::AdvancedIrreversible => Self::status(posts),
        }
    }
}

/// The messages answering `request`, including the final `endRequest`.
///
/// Requests with neither index get no answer.
pub fn respond(posts: &Posts, request: &ClientMessage) -> Vec<ServerMessage> {
    let count = request.request_count.unwrap_or(0).max(MIN_PAGE_SIZE);
    let indexes: Vec<usize> = if let Some(before) = request.request_before_index {
        page(posts.len(), (0..before).rev(), count)
    } else if let Some(after) = request.request_after_index {
        page(posts.len(), after.saturating_add(1)..i64::MAX, count)
    } else {
        return Vec::new();
    };

    let mut messages: Vec<ServerMessage> = indexes
        .into_iter()
        .filter_map(|index| {
            posts.get(index).map(|post| ServerMessage::post(posts, index, post.clone()))
        })
        .collect();
    messages.push(ServerMessage::end_request());
    messages
}

/// Walk `indexes` while they stay inside the list, taking at most `count`.
fn page(len: usize, indexes: impl Iterator<Item = i64>, count: i64) -> Vec<usize> {
    indexes
        .map_while(|index| usize::try_from(index).ok().filter(|&index| index < len))
        .take(usize::try_from(count).unwrap_or(usize::MAX))
        .collect()
}
