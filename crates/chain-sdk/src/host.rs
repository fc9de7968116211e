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

//! Services the host chain provides to a running contract.

use alloy_primitives::B256;
use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    action::Action,
    error::{ChainError, Result},
    name::Name,
};

/// Read access to contract tables. Any contract's tables are readable.
pub trait ReadTables {
    /// Serialized row with `primary_key` in `code`'s `table` under `scope`.
    fn db_get(&self, code: Name, scope: u64, table: Name, primary_key: u64) -> Option<Vec<u8>>;

    /// First row whose primary key is greater than or equal to `primary_key`.
    fn db_lower_bound(
        &self,
        code: Name,
        scope: u64,
        table: Name,
        primary_key: u64,
    ) -> Option<(u64, Vec<u8>)>;

    /// Largest primary key present in the table.
    fn db_last_key(&self, code: Name, scope: u64, table: Name) -> Option<u64>;
}

/// The execution context of one action on one receiver.
///
/// Writes always target the receiver's own tables.
pub trait Host: ReadTables {
    /// Account the running contract is deployed on.
    fn receiver(&self) -> Name;

    /// Account the action was originally sent to.
    fn first_receiver(&self) -> Name;

    /// Whether the action carries the authority of `account`.
    fn has_auth(&self, account: Name) -> bool;

    fn require_auth(&self, account: Name) -> Result<()> {
        if self.has_auth(account) {
            Ok(())
        } else {
            Err(ChainError::MissingAuth(account))
        }
    }

    fn is_account(&self, account: Name) -> bool;

    /// Forward this action as a notification to `account` once the receiver finishes.
    fn require_recipient(&mut self, account: Name) -> Result<()>;

    /// Queue an action to run after this action and its notifications, in the same transaction.
    fn send_inline(&mut self, action: Action) -> Result<()>;

    fn db_store(
        &mut self,
        scope: u64,
        table: Name,
        payer: Name,
        primary_key: u64,
        data: Vec<u8>,
    ) -> Result<()>;

    /// Replace an existing row. `payer` of `None` keeps the current payer.
    fn db_update(
        &mut self,
        scope: u64,
        table: Name,
        payer: Option<Name>,
        primary_key: u64,
        data: Vec<u8>,
    ) -> Result<()>;

    fn db_remove(&mut self, scope: u64, table: Name, primary_key: u64) -> Result<()>;

    /// Privileged: replace the chain's resource parameters.
    fn set_blockchain_parameters(&mut self, params: &BlockchainParameters) -> Result<()>;

    /// Privileged: schedule the protocol feature with the given digest for activation.
    fn preactivate_feature(&mut self, feature_digest: B256) -> Result<()>;
}

/// Chain-wide resource limits.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BlockchainParameters {
    pub max_block_net_usage: u64,
    pub target_block_net_usage_pct: u32,
    pub max_transaction_net_usage: u32,
    pub base_per_transaction_net_usage: u32,
    pub net_usage_leeway: u32,
    pub context_free_discount_net_usage_num: u32,
    pub context_free_discount_net_usage_den: u32,
    pub max_block_cpu_usage: u32,
    pub target_block_cpu_usage_pct: u32,
    pub max_transaction_cpu_usage: u32,
    pub min_transaction_cpu_usage: u32,
    pub max_transaction_lifetime: u32,
    pub deferred_trx_expiration_window: u32,
    pub max_transaction_delay: u32,
    pub max_inline_action_size: u32,
    pub max_inline_action_depth: u16,
    pub max_authority_depth: u16,
}
