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

//! Freetalk: posts authorized by off-chain signatures.
//!
//! A user registers a public key once with `registerkey`. After that anyone can submit a
//! `createpost` carrying a post signed with that key; the contract recovers the signing key
//! instead of relying on the chain's permission check, and uses the post's sequence number to
//! reject replays.

use borsh::{BorshDeserialize, BorshSerialize};
use chain_sdk::{
    check, is_notification, recover_key, sha256, Action, ChainError, Contract, Host, Name,
    PublicKey, ReadTables, Record, Result, Table, TableView,
};

pub mod config;
pub mod post;
pub mod replay;

pub use config::{FreetalkConfig, FreetalkConfigBuilder};
#[cfg(feature = "signer")]
pub use post::SignPostError;
pub use post::{CreatePost, Post, RegisterKey};
pub use replay::{
    ReplayError, ReplayGuard, ReplayPolicy, SequenceState, SequenceWindow, StrictSequence,
};

/// The account this contract is normally deployed to.
pub const DEFAULT_CONTRACT_ACCOUNT: Name = Name::new("freetalk");

/// Default scope for tables.
pub const DEFAULT_SCOPE: u64 = 0;

/// Membership is checked against this contract by default.
pub const EDEN_ACCOUNT: Name = Name::new("test2.edev");

pub const MAX_MESSAGE_LEN: usize = 256;

pub mod actions {
    use chain_sdk::Name;

    pub const REGISTERKEY: Name = Name::new("registerkey");
    pub const CREATEPOST: Name = Name::new("createpost");
}

/// Row of the membership contract's `member` table.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct EdenMember {
    pub version: u32,
    pub account: Name,
}

impl Record for EdenMember {
    const TABLE: Name = Name::new("member");

    fn primary_key(&self) -> u64 {
        self.account.value()
    }
}

/// A user's public key and replay state.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UserKey {
    pub user: Name,
    pub key: PublicKey,
    pub sequences: SequenceState,
}

impl Record for UserKey {
    const TABLE: Name = Name::new("userkey");

    fn primary_key(&self) -> u64 {
        self.user.value()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct StoredPost {
    pub id: u64,
    pub user: Name,
    pub sequence: u32,
    pub message: String,
}

impl Record for StoredPost {
    const TABLE: Name = Name::new("posts");

    fn primary_key(&self) -> u64 {
        self.id
    }
}

pub fn get_user_key<D: ReadTables + ?Sized>(
    db: &D,
    contract: Name,
    user: Name,
) -> Result<Option<UserKey>> {
    TableView::<_, UserKey>::new(db, contract, DEFAULT_SCOPE).find(user.value())
}

/// Every stored post, oldest first.
pub fn get_posts<D: ReadTables + ?Sized>(db: &D, contract: Name) -> Result<Vec<StoredPost>> {
    TableView::<_, StoredPost>::new(db, contract, DEFAULT_SCOPE).rows()
}

#[derive(Clone, Debug, Default)]
pub struct FreetalkContract {
    config: FreetalkConfig,
}

impl FreetalkContract {
    pub fn new(config: FreetalkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FreetalkConfig {
        &self.config
    }
}

impl Contract for FreetalkContract {
    fn apply(&self, host: &mut dyn Host, action: &Action) -> Result<()> {
        if is_notification(host) {
            return Ok(());
        }
        match action.name {
            actions::REGISTERKEY => self.registerkey(host, action.decode_data()?),
            actions::CREATEPOST => self.createpost(host, &action.data),
            name => Err(ChainError::UnknownAction { contract: host.receiver(), action: name }),
        }
    }
}

impl FreetalkContract {
    /// Register or replace `user`'s key. The replay state survives a key change.
    pub fn registerkey(
        &self,
        host: &mut dyn Host,
        RegisterKey { user, key }: RegisterKey,
    ) -> Result<()> {
        host.require_auth(user)?;
        let payer = host.receiver();
        let mut keys = Table::<_, UserKey>::new(host, DEFAULT_SCOPE);
        match keys.find(user.value())? {
            None => keys.emplace(
                payer,
                &UserKey { user, key, sequences: SequenceState::new(self.config.replay_policy) },
            )?,
            Some(record) => {
                keys.modify(record, None, |row| {
                    row.key = key;
                    Ok(())
                })?;
            }
        }
        self.require_member(host, user)?;
        tracing::debug!("{user} registered key {key}");
        Ok(())
    }

    /// Accept a signed post. `data` is the raw action data: the signature, then the post.
    pub fn createpost(&self, host: &mut dyn Host, data: &[u8]) -> Result<()> {
        let mut rest = data;
        let signature = Vec::<u8>::deserialize(&mut rest).map_err(|err| ChainError::Decode {
            what: "createpost signature",
            reason: err.to_string(),
        })?;

        // The signature covers the post bytes exactly as sent.
        let digest = sha256(rest);
        let recovered = recover_key(&digest, &signature)?;

        let post = Post::deserialize(&mut rest)
            .map_err(|err| ChainError::Decode { what: "post", reason: err.to_string() })?;
        check(rest.is_empty(), "detected extra action data after post")?;
        check(post.message.len() <= self.config.max_message_len, "post is too long")?;

        let mut keys = Table::<_, UserKey>::new(host, DEFAULT_SCOPE);
        let record = keys.get(post.user.value(), "User has not registered a key")?;
        if recovered != record.key {
            return Err(ChainError::check(format!(
                "Expected {} but recovered {recovered}",
                record.key
            )));
        }

        let policy = self.config.replay_policy;
        keys.modify(record, None, |row| {
            row.sequences.accept_with(policy, post.sequence).map_err(ChainError::from)
        })?;

        self.require_member(host, post.user)?;

        if self.config.store_posts {
            let payer = host.receiver();
            let mut posts = Table::<_, StoredPost>::new(host, DEFAULT_SCOPE);
            let id = posts.available_primary_key()?;
            posts.emplace(
                payer,
                &StoredPost {
                    id,
                    user: post.user,
                    sequence: post.sequence,
                    message: post.message.clone(),
                },
            )?;
        }
        tracing::debug!("accepted post {} from {}", post.sequence, post.user);
        Ok(())
    }

    fn require_member(&self, host: &dyn Host, user: Name) -> Result<()> {
        let Some(membership) = self.config.membership_contract else {
            return Ok(());
        };
        let members = TableView::<_, EdenMember>::new(host, membership, 0);
        check(members.contains(user.value()), "member not found")
    }
}
