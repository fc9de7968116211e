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

use chain_sdk::Name;
use derive_builder::Builder;

use crate::{replay::ReplayPolicy, EDEN_ACCOUNT, MAX_MESSAGE_LEN};

/// Configuration of a freetalk deployment.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct FreetalkConfig {
    /// Replay protection applied to new posts. Users whose stored state uses the other policy
    /// are migrated on their next post.
    #[builder(default)]
    pub replay_policy: ReplayPolicy,

    /// Contract whose `member` table lists the users allowed to register keys and post. `None`
    /// disables the membership check.
    #[builder(setter(into), default = "Some(EDEN_ACCOUNT)")]
    pub membership_contract: Option<Name>,

    /// Longest message accepted, in bytes.
    #[builder(default = "MAX_MESSAGE_LEN")]
    pub max_message_len: usize,

    /// Whether accepted posts are kept in the `posts` table.
    #[builder(default = "true")]
    pub store_posts: bool,
}

impl FreetalkConfig {
    /// Create a new [FreetalkConfigBuilder].
    pub fn builder() -> FreetalkConfigBuilder {
        Default::default()
    }
}

impl Default for FreetalkConfig {
    fn default() -> Self {
        Self {
            replay_policy: ReplayPolicy::default(),
            membership_contract: Some(EDEN_ACCOUNT),
            max_message_len: MAX_MESSAGE_LEN,
            store_posts: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        assert_eq!(FreetalkConfig::builder().build().unwrap(), FreetalkConfig::default());
    }

    #[test]
    fn builder_overrides() {
        let config = FreetalkConfig::builder()
            .replay_policy(ReplayPolicy::Strict)
            .membership_contract(None::<Name>)
            .store_posts(false)
            .build()
            .unwrap();
        assert_eq!(config.replay_policy, ReplayPolicy::Strict);
        assert_eq!(config.membership_contract, None);
        assert!(!config.store_posts);
        assert_eq!(config.max_message_len, 256);
    }
}
