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

//! Digests, public keys and signature recovery.

use std::{fmt, str::FromStr};

use alloy_primitives::{Signature, B256};
use borsh::{BorshDeserialize, BorshSerialize};
use k256::ecdsa::VerifyingKey;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of a compressed SEC1 secp256k1 public key.
pub const PUBLIC_KEY_LEN: usize = 33;

const PUBLIC_KEY_PREFIX: &str = "PUB_K1_";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// SHA-256 of the given bytes.
pub fn sha256(data: impl AsRef<[u8]>) -> B256 {
    B256::from_slice(&Sha256::digest(data.as_ref()))
}

/// A secp256k1 public key in compressed SEC1 form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(true);
        let mut bytes = [0u8; PUBLIC_KEY_LEN];
        bytes.copy_from_slice(point.as_bytes());
        Self(bytes)
    }

    /// Parse a SEC1 encoded key, compressed or not. The key is stored compressed.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|err| CryptoError::InvalidPublicKey(err.to_string()))?;
        Ok(Self::from_verifying_key(&key))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PUBLIC_KEY_PREFIX}{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s
            .strip_prefix(PUBLIC_KEY_PREFIX)
            .ok_or_else(|| CryptoError::InvalidPublicKey(format!("missing {PUBLIC_KEY_PREFIX}")))?;
        let bytes =
            hex::decode(encoded).map_err(|err| CryptoError::InvalidPublicKey(err.to_string()))?;
        Self::from_sec1_bytes(&bytes)
    }
}

/// Recover the public key that produced the 65-byte recoverable `signature` over `digest`.
pub fn recover_key(digest: &B256, signature: &[u8]) -> Result<PublicKey, CryptoError> {
    let sig = Signature::try_from(signature)
        .map_err(|err| CryptoError::InvalidSignature(err.to_string()))?;
    let key = sig
        .recover_from_prehash(digest)
        .map_err(|err| CryptoError::InvalidSignature(err.to_string()))?;
    Ok(PublicKey::from_verifying_key(&key))
}

#[cfg(test)]
mod tests {
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    use super::*;

    fn public_key(signer: &PrivateKeySigner) -> PublicKey {
        PublicKey::from_verifying_key(signer.credential().verifying_key())
    }

    #[test]
    fn recovers_signing_key() {
        let signer = PrivateKeySigner::random();
        let digest = sha256(b"hello freetalk");
        let signature = signer.sign_hash_sync(&digest).unwrap();

        let recovered = recover_key(&digest, &signature.as_bytes()).unwrap();
        assert_eq!(recovered, public_key(&signer));
    }

    #[test]
    fn different_digest_recovers_different_key() {
        let signer = PrivateKeySigner::random();
        let signature = signer.sign_hash_sync(&sha256(b"one")).unwrap();

        let recovered = recover_key(&sha256(b"two"), &signature.as_bytes());
        assert_ne!(recovered.ok(), Some(public_key(&signer)));
    }

    #[test]
    fn rejects_malformed_signature() {
        let err = recover_key(&sha256(b"x"), &[0u8; 12]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSignature(_)));
    }

    #[test]
    fn text_form_round_trips() {
        let key = public_key(&PrivateKeySigner::random());
        let text = key.to_string();
        assert!(text.starts_with("PUB_K1_"));
        assert_eq!(text.parse::<PublicKey>().unwrap(), key);
        assert!("PUB_K1_00".parse::<PublicKey>().is_err());
        let legacy = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";
        assert!(legacy.parse::<PublicKey>().is_err());
    }
}
