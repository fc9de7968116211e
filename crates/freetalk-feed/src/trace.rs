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

//! Transaction trace messages as delivered by the chain indexer.
//!
//! The indexer streams one message per matching transaction, plus `undo` messages when a block is
//! forked out. Field names follow the indexer's JSON.

use chain_sdk::Name;
use serde::{Deserialize, Serialize};

/// Status of a trace whose actions took effect.
pub const EXECUTED: &str = "EXECUTED";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceMessage {
    #[serde(default)]
    pub undo: bool,
    #[serde(default)]
    pub cursor: String,
    #[serde(default)]
    pub irreversible_block_num: u64,
    pub block: BlockRef,
    #[serde(default)]
    pub trace: Option<TransactionTrace>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockRef {
    pub num: u64,
    pub id: String,
    pub timestamp: String,
    pub previous: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTrace {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub matching_actions: Vec<MatchingAction>,
}

impl TransactionTrace {
    pub fn executed(&self) -> bool {
        self.status == EXECUTED
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchingAction {
    #[serde(default)]
    pub seq: u64,
    pub receiver: Name,
    pub account: Name,
    pub name: Name,
    /// Decoded action data, when the indexer has the contract's ABI.
    #[serde(default)]
    pub json: Option<serde_json::Value>,
}
