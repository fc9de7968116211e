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

use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;

use crate::{asset::AssetError, crypto::CryptoError, name::Name};

/// Reasons an action aborts. Any error returned from a handler aborts the whole transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A contract check failed.
    #[error("assertion failure with message: {0}")]
    Check(String),

    #[error("missing authority of {0}")]
    MissingAuth(Name),

    #[error("unknown action {action} on contract {contract}")]
    UnknownAction { contract: Name, action: Name },

    #[error("account {0} does not exist")]
    UnknownAccount(Name),

    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("failed to encode {what}: {reason}")]
    Encode { what: &'static str, reason: String },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A host intrinsic refused the request.
    #[error("{0}")]
    Host(String),
}

pub type Result<T, E = ChainError> = std::result::Result<T, E>;

impl ChainError {
    pub fn check(message: impl Into<String>) -> Self {
        Self::Check(message.into())
    }
}

/// Abort with `message` unless `condition` holds.
pub fn check(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(ChainError::check(message))
    }
}

/// Decode a complete borsh value. Trailing bytes are an error.
pub fn decode<T: BorshDeserialize>(what: &'static str, bytes: &[u8]) -> Result<T> {
    borsh::from_slice(bytes).map_err(|err| ChainError::Decode { what, reason: err.to_string() })
}

pub fn encode<T: BorshSerialize + ?Sized>(what: &'static str, value: &T) -> Result<Vec<u8>> {
    borsh::to_vec(value).map_err(|err| ChainError::Encode { what, reason: err.to_string() })
}
