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

//! Token symbols and quantities.

use std::{fmt, str::FromStr};

use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;

/// Largest magnitude an [Asset] amount may take.
pub const MAX_ASSET_AMOUNT: i64 = (1 << 62) - 1;

/// Largest supported decimal precision.
pub const MAX_PRECISION: u8 = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("invalid symbol code: {0:?}")]
    InvalidSymbolCode(String),

    #[error("invalid asset: {0:?}")]
    Parse(String),

    #[error("attempt to combine assets with different symbols: {0} and {1}")]
    SymbolMismatch(Symbol, Symbol),

    #[error("asset amount out of range")]
    Overflow,
}

/// Up to seven upper-case letters packed one per byte, first letter in the lowest byte.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct SymbolCode(u64);

impl SymbolCode {
    /// Construct a [SymbolCode] from a literal.
    ///
    /// # Panics
    ///
    /// Panics if the literal is empty, longer than seven characters, or not upper-case ASCII.
    pub const fn new(s: &str) -> Self {
        match Self::parse_bytes(s.as_bytes()) {
            Some(code) => code,
            None => panic!("invalid symbol code literal"),
        }
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    const fn parse_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > 7 {
            return None;
        }
        let mut value = 0u64;
        let mut i = 0;
        while i < bytes.len() {
            if !bytes[i].is_ascii_uppercase() {
                return None;
            }
            value |= (bytes[i] as u64) << (8 * i);
            i += 1;
        }
        Some(Self(value))
    }
}

impl FromStr for SymbolCode {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_bytes(s.as_bytes()).ok_or_else(|| AssetError::InvalidSymbolCode(s.into()))
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tmp = self.0;
        while tmp != 0 {
            write!(f, "{}", (tmp & 0xff) as u8 as char)?;
            tmp >>= 8;
        }
        Ok(())
    }
}

impl fmt::Debug for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolCode({self})")
    }
}

/// A [SymbolCode] together with the number of decimal places used to display amounts.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct Symbol(u64);

impl Symbol {
    pub const fn new(code: &str, precision: u8) -> Self {
        Self::from_code(SymbolCode::new(code), precision)
    }

    pub const fn from_code(code: SymbolCode, precision: u8) -> Self {
        Self((code.0 << 8) | precision as u64)
    }

    pub const fn code(self) -> SymbolCode {
        SymbolCode(self.0 >> 8)
    }

    pub const fn precision(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

/// A signed token quantity in the smallest unit of its [Symbol].
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub const fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub const fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    pub const fn is_amount_within_range(&self) -> bool {
        -MAX_ASSET_AMOUNT <= self.amount && self.amount <= MAX_ASSET_AMOUNT
    }

    pub fn checked_add(self, other: Asset) -> Result<Asset, AssetError> {
        self.combine(other, i64::checked_add)
    }

    pub fn checked_sub(self, other: Asset) -> Result<Asset, AssetError> {
        self.combine(other, i64::checked_sub)
    }

    fn combine(self, other: Asset, op: fn(i64, i64) -> Option<i64>) -> Result<Asset, AssetError> {
        if self.symbol != other.symbol {
            return Err(AssetError::SymbolMismatch(self.symbol, other.symbol));
        }
        let amount = op(self.amount, other.amount).ok_or(AssetError::Overflow)?;
        let result = Asset::new(amount, self.symbol);
        if !result.is_amount_within_range() {
            return Err(AssetError::Overflow);
        }
        Ok(result)
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    /// Parse an asset in the form `"1000.0000 EOS"`. The number of decimal places sets the
    /// precision of the symbol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || AssetError::Parse(s.into());
        let (number, code) = s.trim().split_once(' ').ok_or_else(parse_err)?;
        let code: SymbolCode = code.trim().parse()?;

        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty()
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
            || (digits.contains('.') && frac_part.is_empty())
        {
            return Err(parse_err());
        }
        let precision = u8::try_from(frac_part.len()).map_err(|_| parse_err())?;
        if precision > MAX_PRECISION {
            return Err(parse_err());
        }

        let scale = 10i64.checked_pow(precision.into()).ok_or(AssetError::Overflow)?;
        let int_value: i64 = int_part.parse().map_err(|_| AssetError::Overflow)?;
        let frac_value: i64 =
            if frac_part.is_empty() { 0 } else { frac_part.parse().map_err(|_| parse_err())? };
        let magnitude = int_value
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or(AssetError::Overflow)?;

        let asset = Asset::new(
            if negative { -magnitude } else { magnitude },
            Symbol::from_code(code, precision),
        );
        if !asset.is_amount_within_range() {
            return Err(AssetError::Overflow);
        }
        Ok(asset)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = u32::from(self.symbol.precision());
        let scale = 10u64.pow(precision);
        let magnitude = self.amount.unsigned_abs();
        let sign = if self.amount < 0 { "-" } else { "" };
        if precision == 0 {
            write!(f, "{sign}{magnitude} {}", self.symbol.code())
        } else {
            write!(
                f,
                "{sign}{}.{:0width$} {}",
                magnitude / scale,
                magnitude % scale,
                self.symbol.code(),
                width = precision as usize
            )
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({self})")
    }
}
