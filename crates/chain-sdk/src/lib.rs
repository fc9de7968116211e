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

//! Host interface for contracts running on the chain.
//!
//! The host owns execution, storage, authorization and serialization. This crate names those
//! services as traits ([Host], [ReadTables]) and provides the value types contracts exchange with
//! the host: [Name], [Asset], [PublicKey] and [Action]. Contracts implement [Contract].

pub mod action;
pub mod asset;
pub mod crypto;
pub mod error;
pub mod host;
pub mod name;
pub mod table;

pub use action::{is_notification, Action, ActionData, Contract, PermissionLevel, ACTIVE};
pub use asset::{Asset, AssetError, Symbol, SymbolCode};
pub use crypto::{recover_key, sha256, CryptoError, PublicKey};
pub use error::{check, ChainError, Result};
pub use host::{BlockchainParameters, Host, ReadTables};
pub use name::{Name, NameError};
pub use table::{Record, Table, TableView};

pub use alloy_primitives::B256;
