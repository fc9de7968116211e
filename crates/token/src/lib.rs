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

//! Fungible token contract.
//!
//! Balances live in the `accounts` table scoped by owner, and supply information in the `stat`
//! table scoped by symbol code. Both parties of a transfer are notified, which is how other
//! contracts learn about deposits.

use borsh::{BorshDeserialize, BorshSerialize};
use chain_sdk::{
    check, is_notification, Action, ActionData, Asset, ChainError, Contract, Host, Name,
    ReadTables, Record, Result, SymbolCode, Table, TableView,
};

/// The account the trusted token contract is deployed to.
pub const DEFAULT_TOKEN_ACCOUNT: Name = Name::new("eosio.token");

/// Largest memo accepted by [Transfer] and [Issue].
pub const MAX_MEMO_LEN: usize = 256;

pub mod actions {
    use chain_sdk::Name;

    pub const CREATE: Name = Name::new("create");
    pub const ISSUE: Name = Name::new("issue");
    pub const TRANSFER: Name = Name::new("transfer");
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Create {
    pub issuer: Name,
    pub maximum_supply: Asset,
}

impl ActionData for Create {
    const NAME: Name = actions::CREATE;
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Issue {
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

impl ActionData for Issue {
    const NAME: Name = actions::ISSUE;
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Transfer {
    pub from: Name,
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

impl ActionData for Transfer {
    const NAME: Name = actions::TRANSFER;
}

/// One token balance of one owner.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Balance {
    pub balance: Asset,
}

impl Record for Balance {
    const TABLE: Name = Name::new("accounts");

    fn primary_key(&self) -> u64 {
        self.balance.symbol.code().raw()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CurrencyStats {
    pub supply: Asset,
    pub max_supply: Asset,
    pub issuer: Name,
}

impl Record for CurrencyStats {
    const TABLE: Name = Name::new("stat");

    fn primary_key(&self) -> u64 {
        self.supply.symbol.code().raw()
    }
}

/// Balance of `owner` in the token contract deployed at `token_contract`, if the owner has ever
/// held the token.
pub fn get_balance<D: ReadTables + ?Sized>(
    db: &D,
    token_contract: Name,
    owner: Name,
    code: SymbolCode,
) -> Result<Option<Asset>> {
    let balances = TableView::<_, Balance>::new(db, token_contract, owner.value());
    Ok(balances.find(code.raw())?.map(|row| row.balance))
}

pub fn get_supply<D: ReadTables + ?Sized>(
    db: &D,
    token_contract: Name,
    code: SymbolCode,
) -> Result<Option<Asset>> {
    let stats = TableView::<_, CurrencyStats>::new(db, token_contract, code.raw());
    Ok(stats.find(code.raw())?.map(|row| row.supply))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokenContract;

impl Contract for TokenContract {
    fn apply(&self, host: &mut dyn Host, action: &Action) -> Result<()> {
        if is_notification(host) {
            return Ok(());
        }
        match action.name {
            actions::CREATE => self.create(host, action.decode_data()?),
            actions::ISSUE => self.issue(host, action.decode_data()?),
            actions::TRANSFER => self.transfer(host, action.decode_data()?),
            name => Err(ChainError::UnknownAction { contract: host.receiver(), action: name }),
        }
    }
}

impl TokenContract {
    pub fn create(
        &self,
        host: &mut dyn Host,
        Create { issuer, maximum_supply }: Create,
    ) -> Result<()> {
        host.require_auth(host.receiver())?;
        check(maximum_supply.is_amount_within_range(), "invalid supply")?;
        check(maximum_supply.amount > 0, "max-supply must be positive")?;

        let code = maximum_supply.symbol.code();
        let receiver = host.receiver();
        let mut stats = Table::<_, CurrencyStats>::new(host, code.raw());
        check(stats.find(code.raw())?.is_none(), "token with symbol already exists")?;
        stats.emplace(
            receiver,
            &CurrencyStats {
                supply: Asset::zero(maximum_supply.symbol),
                max_supply: maximum_supply,
                issuer,
            },
        )?;
        tracing::debug!("created token {maximum_supply} issued by {issuer}");
        Ok(())
    }

    pub fn issue(&self, host: &mut dyn Host, Issue { to, quantity, memo }: Issue) -> Result<()> {
        check(memo.len() <= MAX_MEMO_LEN, "memo has more than 256 bytes")?;
        let code = quantity.symbol.code();
        let stats = Table::<_, CurrencyStats>::new(host, code.raw())
            .get(code.raw(), "token with symbol does not exist, create token before issue")?;
        check(to == stats.issuer, "tokens can only be issued to issuer account")?;
        host.require_auth(stats.issuer)?;
        check(quantity.is_amount_within_range(), "invalid quantity")?;
        check(quantity.amount > 0, "must issue positive quantity")?;
        check(quantity.symbol == stats.supply.symbol, "symbol precision mismatch")?;
        check(
            quantity.amount <= stats.max_supply.amount - stats.supply.amount,
            "quantity exceeds available supply",
        )?;

        Table::<_, CurrencyStats>::new(host, code.raw()).modify(stats, None, |s| {
            s.supply = s.supply.checked_add(quantity)?;
            Ok(())
        })?;
        add_balance(host, to, quantity, to)
    }

    pub fn transfer(
        &self,
        host: &mut dyn Host,
        Transfer { from, to, quantity, memo }: Transfer,
    ) -> Result<()> {
        check(from != to, "cannot transfer to self")?;
        host.require_auth(from)?;
        check(host.is_account(to), "to account does not exist")?;
        let code = quantity.symbol.code();
        let stats = Table::<_, CurrencyStats>::new(host, code.raw())
            .get(code.raw(), "token with symbol does not exist")?;

        host.require_recipient(from)?;
        host.require_recipient(to)?;

        check(quantity.is_amount_within_range(), "invalid quantity")?;
        check(quantity.amount > 0, "must transfer positive quantity")?;
        check(quantity.symbol == stats.supply.symbol, "symbol precision mismatch")?;
        check(memo.len() <= MAX_MEMO_LEN, "memo has more than 256 bytes")?;

        let payer = if host.has_auth(to) { to } else { from };
        sub_balance(host, from, quantity)?;
        add_balance(host, to, quantity, payer)?;
        tracing::debug!("{} transferred {quantity} from {from} to {to}", host.receiver());
        Ok(())
    }
}

fn sub_balance(host: &mut dyn Host, owner: Name, value: Asset) -> Result<()> {
    let mut balances = Table::<_, Balance>::new(host, owner.value());
    let from = balances.get(value.symbol.code().raw(), "no balance object found")?;
    check(from.balance.amount >= value.amount, "overdrawn balance")?;
    balances.modify(from, Some(owner), |row| {
        row.balance = row.balance.checked_sub(value)?;
        Ok(())
    })?;
    Ok(())
}

fn add_balance(host: &mut dyn Host, owner: Name, value: Asset, payer: Name) -> Result<()> {
    let mut balances = Table::<_, Balance>::new(host, owner.value());
    match balances.find(value.symbol.code().raw())? {
        None => balances.emplace(payer, &Balance { balance: value }),
        Some(to) => balances
            .modify(to, None, |row| {
                row.balance = row.balance.checked_add(value)?;
                Ok(())
            })
            .map(drop),
    }
}
