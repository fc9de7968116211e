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
use chain_sdk::{error::encode, sha256, ActionData, Name, PublicKey, Result, B256};

use crate::actions;

/// A message signed off chain by `user`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Post {
    pub user: Name,
    pub sequence: u32,
    pub message: String,
}

impl Post {
    /// The digest the user signs: SHA-256 of the serialized post.
    pub fn signing_digest(&self) -> Result<B256> {
        Ok(sha256(encode("post", self)?))
    }
}

/// Associates a public key with `user`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct RegisterKey {
    pub user: Name,
    pub key: PublicKey,
}

impl ActionData for RegisterKey {
    const NAME: Name = actions::REGISTERKEY;
}

/// A post together with the user's 65-byte recoverable signature over [Post::signing_digest].
///
/// The serialized form is the signature followed by the post, and the contract hashes the post
/// bytes exactly as they appear in the action data.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CreatePost {
    pub signature: Vec<u8>,
    pub post: Post,
}

impl ActionData for CreatePost {
    const NAME: Name = actions::CREATEPOST;
}

#[cfg(feature = "signer")]
mod signing {
    use alloy_signer::SignerSync;
    use chain_sdk::ChainError;
    use thiserror::Error;

    use super::{CreatePost, Post};

    #[derive(Error, Debug)]
    pub enum SignPostError {
        #[error(transparent)]
        Encode(#[from] ChainError),

        #[error("failed to sign post: {0}")]
        Signer(#[from] alloy_signer::Error),
    }

    impl CreatePost {
        /// Sign `post` with `signer` and build the action payload.
        pub fn sign<S: SignerSync + ?Sized>(signer: &S, post: Post) -> Result<Self, SignPostError> {
            let digest = post.signing_digest()?;
            let signature = signer.sign_hash_sync(&digest)?;
            Ok(Self { signature: signature.as_bytes().to_vec(), post })
        }
    }
}

#[cfg(feature = "signer")]
pub use signing::SignPostError;
