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

//! Account, action and table identifiers.

use std::{fmt, str::FromStr};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Maximum number of characters in the text form of a [Name].
pub const MAX_NAME_LEN: usize = 13;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    #[error("name is longer than 13 characters: {0}")]
    TooLong(usize),

    #[error("character '{0}' is not allowed in a name")]
    InvalidChar(char),

    #[error("thirteenth character in name cannot be a letter that comes after j: '{0}'")]
    InvalidLastChar(char),
}

/// A 64-bit identifier with a base-32 text form using the alphabet `.12345a-z`.
///
/// The first twelve characters take five bits each. A thirteenth character may be present but is
/// limited to the first sixteen symbols of the alphabet (`.` through `j`).
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct Name(u64);

impl Name {
    /// Construct a [Name] from a literal.
    ///
    /// # Panics
    ///
    /// Panics if the literal is not a valid name. In a `const` context this is a compile error.
    pub const fn new(s: &str) -> Self {
        match Self::parse_bytes(s.as_bytes()) {
            Ok(name) => name,
            Err(_) => panic!("invalid name literal"),
        }
    }

    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    const fn parse_bytes(bytes: &[u8]) -> Result<Self, NameError> {
        if bytes.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong(bytes.len()));
        }
        let mut value = 0u64;
        let mut i = 0;
        while i < bytes.len() {
            let symbol = match char_to_symbol(bytes[i]) {
                Some(symbol) => symbol,
                None => return Err(NameError::InvalidChar(bytes[i] as char)),
            };
            if i < 12 {
                value |= (symbol as u64) << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    return Err(NameError::InvalidLastChar(bytes[i] as char));
                }
                value |= symbol as u64;
            }
            i += 1;
        }
        Ok(Self(value))
    }
}

const fn char_to_symbol(c: u8) -> Option<u8> {
    match c {
        b'a'..=b'z' => Some(c - b'a' + 6),
        b'1'..=b'5' => Some(c - b'1' + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_bytes(s.as_bytes())
    }
}

impl From<Name> for u64 {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; MAX_NAME_LEN];
        let mut tmp = self.0;
        for i in 0..MAX_NAME_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            out[MAX_NAME_LEN - 1 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let end = out.iter().rposition(|c| *c != b'.').map_or(0, |pos| pos + 1);
        // The alphabet is ASCII, so this never fails.
        f.write_str(std::str::from_utf8(&out[..end]).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
