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

//! Deposit-and-spend example contract.
//!
//! Users deposit tokens by transferring them to the contract; the token contract notifies the
//! contract, which credits the sender. Deposits can then be withdrawn or spent on dogs and cats.

use borsh::{BorshDeserialize, BorshSerialize};
use chain_sdk::{
    check, is_notification, Action, ActionData, Asset, ChainError, Contract, Host, Name,
    PermissionLevel, ReadTables, Record, Result, Symbol, Table, TableView,
};
use derive_builder::Builder;
use token::Transfer;

/// The account this contract is normally deployed to.
pub const DEFAULT_CONTRACT_ACCOUNT: Name = Name::new("depositspend");

/// Default scope for tables.
pub const DEFAULT_SCOPE: u64 = 0;

/// Only transfers from this token contract are accepted.
pub const TOKEN_CONTRACT: Name = token::DEFAULT_TOKEN_ACCOUNT;

pub const TOKEN_SYMBOL: Symbol = Symbol::new("EOS", 4);

pub const DOG_PRICE: Asset = Asset::new(1000_0000, TOKEN_SYMBOL);
pub const CAT_PRICE: Asset = Asset::new(1000, TOKEN_SYMBOL);

const WRONG_TOKEN: &str = "This contract does not deal with this token";

pub mod actions {
    use chain_sdk::Name;

    pub const WITHDRAW: Name = Name::new("withdraw");
    pub const BUYDOG: Name = Name::new("buydog");
    pub const BUYCAT: Name = Name::new("buycat");
}

/// A user's deposit and the animals they own.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AccountRecord {
    pub owner: Name,
    pub balance: Asset,
    pub num_dogs: u32,
    pub num_cats: u32,
}

impl Record for AccountRecord {
    const TABLE: Name = Name::new("accounts");

    fn primary_key(&self) -> u64 {
        self.owner.value()
    }
}

/// Deposit of `owner` held by the contract at `contract`. Zero if the owner never deposited.
pub fn get_balance<D: ReadTables + ?Sized>(db: &D, contract: Name, owner: Name) -> Result<Asset> {
    let accounts = TableView::<_, AccountRecord>::new(db, contract, DEFAULT_SCOPE);
    Ok(accounts
        .find(owner.value())?
        .map_or(Asset::zero(TOKEN_SYMBOL), |record| record.balance))
}

/// Full account record of `owner`, if any.
pub fn get_account<D: ReadTables + ?Sized>(
    db: &D,
    contract: Name,
    owner: Name,
) -> Result<Option<AccountRecord>> {
    TableView::<_, AccountRecord>::new(db, contract, DEFAULT_SCOPE).find(owner.value())
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Withdraw {
    pub user: Name,
    pub quantity: Asset,
}

impl ActionData for Withdraw {
    const NAME: Name = actions::WITHDRAW;
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BuyDog {
    pub user: Name,
    pub dog: Name,
    pub price: Asset,
}

impl ActionData for BuyDog {
    const NAME: Name = actions::BUYDOG;
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BuyCat {
    pub user: Name,
    pub cat: Name,
    pub price: Asset,
}

impl ActionData for BuyCat {
    const NAME: Name = actions::BUYCAT;
}

/// Which token the contract accepts and what animals cost.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct DepositSpendConfig {
    /// Contract whose transfer notifications credit deposits.
    #[builder(default = "TOKEN_CONTRACT")]
    pub token_contract: Name,

    #[builder(default = "TOKEN_SYMBOL")]
    pub token_symbol: Symbol,

    #[builder(default = "DOG_PRICE")]
    pub dog_price: Asset,

    #[builder(default = "CAT_PRICE")]
    pub cat_price: Asset,
}

impl DepositSpendConfig {
    /// Create a new [DepositSpendConfigBuilder].
    pub fn builder() -> DepositSpendConfigBuilder {
        Default::default()
    }
}

impl Default for DepositSpendConfig {
    fn default() -> Self {
        Self {
            token_contract: TOKEN_CONTRACT,
            token_symbol: TOKEN_SYMBOL,
            dog_price: DOG_PRICE,
            cat_price: CAT_PRICE,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DepositSpendContract {
    config: DepositSpendConfig,
}

impl DepositSpendContract {
    pub fn new(config: DepositSpendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DepositSpendConfig {
        &self.config
    }
}

impl Contract for DepositSpendContract {
    fn apply(&self, host: &mut dyn Host, action: &Action) -> Result<()> {
        if is_notification(host) {
            // Transfers from any other token contract are ignored, not rejected.
            if host.first_receiver() == self.config.token_contract
                && action.name == token::actions::TRANSFER
            {
                return self.notify_transfer(host, action.decode_data()?);
            }
            return Ok(());
        }
        match action.name {
            actions::WITHDRAW => self.withdraw(host, action.decode_data()?),
            actions::BUYDOG => self.buydog(host, action.decode_data()?),
            actions::BUYCAT => self.buycat(host, action.decode_data()?),
            name => Err(ChainError::UnknownAction { contract: host.receiver(), action: name }),
        }
    }
}

impl DepositSpendContract {
    /// Credit incoming transfers of the accepted token to the sender.
    pub fn notify_transfer(&self, host: &mut dyn Host, transfer: Transfer) -> Result<()> {
        let receiver = host.receiver();
        if transfer.from == receiver || transfer.to != receiver {
            return Ok(());
        }
        check(transfer.quantity.symbol == self.config.token_symbol, WRONG_TOKEN)?;
        add_balance(host, transfer.from, transfer.quantity)?;
        tracing::debug!("{} deposited {}", transfer.from, transfer.quantity);
        Ok(())
    }

    /// Debit the user's deposit and send the tokens back to them.
    pub fn withdraw(
        &self,
        host: &mut dyn Host,
        Withdraw { user, quantity }: Withdraw,
    ) -> Result<()> {
        host.require_auth(user)?;
        check(quantity.symbol == self.config.token_symbol, WRONG_TOKEN)?;
        sub_balance(host, user, quantity, |_| {})?;

        let receiver = host.receiver();
        let transfer =
            Transfer { from: receiver, to: user, quantity, memo: "withdraw".to_string() };
        let authorization = vec![PermissionLevel::active(receiver)];
        host.send_inline(transfer.to_action(self.config.token_contract, authorization)?)
    }

    pub fn buydog(&self, host: &mut dyn Host, BuyDog { user, dog, price }: BuyDog) -> Result<()> {
        host.require_auth(user)?;
        check(price == self.config.dog_price, "incorrect price for a dog")?;
        sub_balance(host, user, price, |account| account.num_dogs += 1)?;
        tracing::debug!("{user} bought dog {dog}");
        Ok(())
    }

    pub fn buycat(&self, host: &mut dyn Host, BuyCat { user, cat, price }: BuyCat) -> Result<()> {
        host.require_auth(user)?;
        check(price == self.config.cat_price, "incorrect price for a cat")?;
        // Buy one, get one free.
        sub_balance(host, user, price, |account| account.num_cats += 2)?;
        tracing::debug!("{user} bought cat {cat}");
        Ok(())
    }
}

fn add_balance(host: &mut dyn Host, owner: Name, quantity: Asset) -> Result<()> {
    let payer = host.receiver();
    let mut accounts = Table::<_, AccountRecord>::new(host, DEFAULT_SCOPE);
    match accounts.find(owner.value())? {
        None => accounts.emplace(
            payer,
            &AccountRecord { owner, balance: quantity, num_dogs: 0, num_cats: 0 },
        ),
        Some(record) => accounts
            .modify(record, None, |account| {
                account.balance = account.balance.checked_add(quantity)?;
                Ok(())
            })
            .map(drop),
    }
}

/// Debit `quantity` from `owner` and apply `modify_fields` to the record. The owner pays for it.
fn sub_balance<F>(host: &mut dyn Host, owner: Name, quantity: Asset, modify_fields: F) -> Result<()>
where
    F: FnOnce(&mut AccountRecord),
{
    let mut accounts = Table::<_, AccountRecord>::new(host, DEFAULT_SCOPE);
    let record = accounts.get(owner.value(), "user does not have an account")?;
    check(record.balance.amount >= quantity.amount, "not enough funds deposited")?;
    accounts.modify(record, Some(owner), |account| {
        account.balance = account.balance.checked_sub(quantity)?;
        modify_fields(account);
        Ok(())
    })?;
    Ok(())
}
