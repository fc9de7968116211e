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

//! The ordered list of posts seen on chain, kept consistent with forks.

use std::collections::BTreeMap;

use chain_sdk::Name;
use serde::{Deserialize, Serialize};

use crate::trace::{MatchingAction, TraceMessage};

/// Action whose decoded data carries a post.
pub const CREATEPOST: Name = Name::new("createpost");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub user: String,
    pub message: String,
}

/// A change to the post list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedEvent {
    /// Posts from this index on were forked out.
    Undo(usize),
    Added(usize, FeedPost),
    /// More posts became irreversible.
    AdvancedIrreversible,
}

#[derive(Debug)]
pub struct Posts {
    talk_contract: Name,
    posts: Vec<FeedPost>,
    /// Block number to the index of its first post.
    blocks: BTreeMap<u64, usize>,
    irreversible_block: u64,
    irreversible_post: usize,
}

impl Posts {
    pub fn new(talk_contract: Name) -> Self {
        Self {
            talk_contract,
            posts: Vec::new(),
            blocks: BTreeMap::new(),
            irreversible_block: 0,
            irreversible_post: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FeedPost> {
        self.posts.get(index)
    }

    pub fn posts(&self) -> &[FeedPost] {
        &self.posts
    }

    /// Number of posts that can no longer be forked out.
    pub fn irreversible_post(&self) -> usize {
        self.irreversible_post
    }

    pub fn irreversible_block(&self) -> u64 {
        self.irreversible_block
    }

    /// Apply one trace message and report what changed.
    pub fn push_trace(&mut self, msg: &TraceMessage) -> Vec<FeedEvent> {
        let mut events = Vec::new();
        let block_num = msg.block.num;

        if msg.undo {
            if let Some(&index) = self.blocks.get(&block_num) {
                // Later blocks are built on the undone one, so they go too.
                self.blocks.retain(|&num, _| num < block_num);
                self.posts.truncate(index);
                events.push(FeedEvent::Undo(index));
            }
            return events;
        }

        if let Some(trace) = msg.trace.as_ref().filter(|trace| trace.executed()) {
            self.blocks.entry(block_num).or_insert(self.posts.len());
            for action in &trace.matching_actions {
                if let Some(post) = self.post_of(action) {
                    self.posts.push(post.clone());
                    events.push(FeedEvent::Added(self.posts.len() - 1, post));
                }
            }
        }

        if msg.irreversible_block_num > self.irreversible_block {
            let irreversible = msg.irreversible_block_num;
            self.irreversible_block = irreversible;
            if let Some(&index) = self.blocks.get(&irreversible) {
                self.irreversible_post = index;
                events.push(FeedEvent::AdvancedIrreversible);
            }
            // Blocks below the irreversible one can no longer be undone.
            self.blocks.retain(|&num, _| num >= irreversible);
        }
        events
    }

    fn post_of(&self, action: &MatchingAction) -> Option<FeedPost> {
        if action.account != self.talk_contract || action.name != CREATEPOST {
            return None;
        }
        let post = action.json.as_ref()?.get("post")?;
        match serde_json::from_value(post.clone()) {
            Ok(post) => Some(post),
            Err(err) => {
                tracing::warn!("ignoring malformed post in action {}: {err}", action.seq);
                None
            }
        }
    }
}
