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

//! Test utilities for the contracts in this workspace.
//!
//! [TestChain] is an in-memory implementation of the chain host. Each pushed transaction runs
//! against a snapshot of the database and is rolled back as a whole when any action in it fails.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    sync::Arc,
};

use chain_sdk::{
    Action, ActionData, BlockchainParameters, ChainError, Contract, Host, Name, PermissionLevel,
    ReadTables, Result, B256,
};

/// The system account, created privileged with every [TestChain].
pub const SYSTEM_ACCOUNT: Name = Name::new("eosio");

/// Inline action nesting allowed before the chain's parameters are set.
pub const DEFAULT_MAX_INLINE_ACTION_DEPTH: u16 = 4;

#[derive(Clone, Default)]
struct AccountInfo {
    privileged: bool,
    contract: Option<Arc<dyn Contract>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct TableId {
    code: Name,
    scope: u64,
    table: Name,
}

#[derive(Clone, Debug)]
struct Row {
    payer: Name,
    data: Vec<u8>,
}

/// Everything a transaction can change. Cloned before each transaction to allow rollback.
#[derive(Clone, Default)]
struct ChainState {
    tables: BTreeMap<TableId, BTreeMap<u64, Row>>,
    parameters: Option<BlockchainParameters>,
    preactivated: BTreeSet<B256>,
}

impl ReadTables for ChainState {
    fn db_get(&self, code: Name, scope: u64, table: Name, primary_key: u64) -> Option<Vec<u8>> {
        self.tables
            .get(&TableId { code, scope, table })
            .and_then(|rows| rows.get(&primary_key))
            .map(|row| row.data.clone())
    }

    fn db_lower_bound(
        &self,
        code: Name,
        scope: u64,
        table: Name,
        primary_key: u64,
    ) -> Option<(u64, Vec<u8>)> {
        self.tables
            .get(&TableId { code, scope, table })
            .and_then(|rows| rows.range(primary_key..).next())
            .map(|(key, row)| (*key, row.data.clone()))
    }

    fn db_last_key(&self, code: Name, scope: u64, table: Name) -> Option<u64> {
        self.tables
            .get(&TableId { code, scope, table })
            .and_then(|rows| rows.keys().next_back().copied())
    }
}

/// One contract execution within a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTrace {
    /// Account whose contract ran.
    pub receiver: Name,
    pub action: Action,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionTrace {
    /// Executions in the order they happened, notifications included.
    pub action_traces: Vec<ActionTrace>,
}

impl TransactionTrace {
    /// Receivers that ran the action named `name` sent to `account`, in order.
    pub fn receivers_of(&self, account: Name, name: Name) -> Vec<Name> {
        self.action_traces
            .iter()
            .filter(|trace| trace.action.account == account && trace.action.name == name)
            .map(|trace| trace.receiver)
            .collect()
    }
}

/// An in-memory chain for contract tests.
#[derive(Clone)]
pub struct TestChain {
    accounts: BTreeMap<Name, AccountInfo>,
    state: ChainState,
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}

impl TestChain {
    pub fn new() -> Self {
        let mut accounts = BTreeMap::new();
        accounts.insert(SYSTEM_ACCOUNT, AccountInfo { privileged: true, contract: None });
        Self { accounts, state: ChainState::default() }
    }

    pub fn create_account(&mut self, account: Name) -> anyhow::Result<()> {
        anyhow::ensure!(!self.accounts.contains_key(&account), "account {account} already exists");
        self.accounts.insert(account, AccountInfo::default());
        Ok(())
    }

    /// Create each of `accounts`.
    pub fn create_accounts(&mut self, accounts: &[Name]) -> anyhow::Result<()> {
        accounts.iter().try_for_each(|account| self.create_account(*account))
    }

    pub fn set_privileged(&mut self, account: Name, privileged: bool) -> anyhow::Result<()> {
        self.account_mut(account)?.privileged = privileged;
        Ok(())
    }

    /// Deploy `contract` to an existing account, replacing any contract already there.
    pub fn set_contract(
        &mut self,
        account: Name,
        contract: impl Contract + 'static,
    ) -> anyhow::Result<()> {
        self.account_mut(account)?.contract = Some(Arc::new(contract));
        Ok(())
    }

    fn account_mut(&mut self, account: Name) -> anyhow::Result<&mut AccountInfo> {
        self.accounts
            .get_mut(&account)
            .ok_or_else(|| anyhow::anyhow!("account {account} does not exist"))
    }

    pub fn blockchain_parameters(&self) -> Option<&BlockchainParameters> {
        self.state.parameters.as_ref()
    }

    pub fn is_preactivated(&self, feature_digest: &B256) -> bool {
        self.state.preactivated.contains(feature_digest)
    }

    pub fn preactivated_features(&self) -> &BTreeSet<B256> {
        &self.state.preactivated
    }

    /// The account billed for a row, if the row exists.
    pub fn payer_of(&self, code: Name, scope: u64, table: Name, primary_key: u64) -> Option<Name> {
        self.state
            .tables
            .get(&TableId { code, scope, table })
            .and_then(|rows| rows.get(&primary_key))
            .map(|row| row.payer)
    }

    /// Push `data` to `contract`, authorized by `actor@active`.
    pub fn act<T: ActionData>(
        &mut self,
        actor: Name,
        contract: Name,
        data: &T,
    ) -> Result<TransactionTrace> {
        self.push_action(data.to_action(contract, vec![PermissionLevel::active(actor)])?)
    }

    pub fn push_action(&mut self, action: Action) -> Result<TransactionTrace> {
        self.push_transaction(vec![action])
    }

    /// Run `actions` as one transaction. The declared authorizations are taken as signed.
    ///
    /// If any action fails, every change made by the transaction is discarded.
    pub fn push_transaction(&mut self, actions: Vec<Action>) -> Result<TransactionTrace> {
        let snapshot = self.state.clone();
        let result = self.run_transaction(actions);
        if let Err(err) = &result {
            tracing::debug!("transaction rolled back: {err}");
            self.state = snapshot;
        }
        result
    }

    fn run_transaction(&mut self, actions: Vec<Action>) -> Result<TransactionTrace> {
        if actions.is_empty() {
            return Err(ChainError::Host("transaction must contain at least one action".into()));
        }
        let mut trace = TransactionTrace::default();
        for action in actions {
            for level in &action.authorization {
                if !self.accounts.contains_key(&level.actor) {
                    return Err(ChainError::UnknownAccount(level.actor));
                }
            }
            execute(&self.accounts, &mut self.state, &action, 0, &mut trace)?;
        }
        Ok(trace)
    }
}

impl ReadTables for TestChain {
    fn db_get(&self, code: Name, scope: u64, table: Name, primary_key: u64) -> Option<Vec<u8>> {
        self.state.db_get(code, scope, table, primary_key)
    }

    fn db_lower_bound(
        &self,
        code: Name,
        scope: u64,
        table: Name,
        primary_key: u64,
    ) -> Option<(u64, Vec<u8>)> {
        self.state.db_lower_bound(code, scope, table, primary_key)
    }

    fn db_last_key(&self, code: Name, scope: u64, table: Name) -> Option<u64> {
        self.state.db_last_key(code, scope, table)
    }
}

/// Run `action` on its account, then on every notified account, then its inline actions.
fn execute(
    accounts: &BTreeMap<Name, AccountInfo>,
    state: &mut ChainState,
    action: &Action,
    depth: u16,
    trace: &mut TransactionTrace,
) -> Result<()> {
    let max_depth = state
        .parameters
        .as_ref()
        .map_or(DEFAULT_MAX_INLINE_ACTION_DEPTH, |params| params.max_inline_action_depth);
    if depth > max_depth {
        return Err(ChainError::Host("max inline action depth exceeded".into()));
    }
    let Some(first) = accounts.get(&action.account) else {
        return Err(ChainError::UnknownAccount(action.account));
    };
    if first.contract.is_none() {
        return Err(ChainError::Host(format!("account {} has no contract", action.account)));
    }

    let mut recipients = vec![action.account];
    let mut inline_actions = Vec::new();
    let mut next = 0;
    while let Some(&receiver) = recipients.get(next) {
        next += 1;
        let Some(info) = accounts.get(&receiver) else {
            return Err(ChainError::UnknownAccount(receiver));
        };
        trace.action_traces.push(ActionTrace { receiver, action: action.clone() });
        let Some(contract) = &info.contract else {
            continue;
        };
        tracing::trace!("apply {}::{} on {receiver}", action.account, action.name);
        let mut ctx = ApplyContext {
            accounts,
            state: &mut *state,
            action,
            receiver,
            privileged: info.privileged,
            recipients: &mut recipients,
            inline_actions: &mut inline_actions,
        };
        contract.apply(&mut ctx, action)?;
    }

    for inline in &inline_actions {
        execute(accounts, state, inline, depth + 1, trace)?;
    }
    Ok(())
}

/// The [Host] seen by one contract while it handles one action.
struct ApplyContext<'a> {
    accounts: &'a BTreeMap<Name, AccountInfo>,
    state: &'a mut ChainState,
    action: &'a Action,
    receiver: Name,
    privileged: bool,
    recipients: &'a mut Vec<Name>,
    inline_actions: &'a mut Vec<Action>,
}

impl ApplyContext<'_> {
    fn require_privileged(&self, what: &str) -> Result<()> {
        if self.privileged {
            Ok(())
        } else {
            Err(ChainError::Host(format!("{what} requires {} to be privileged", self.receiver)))
        }
    }

    fn check_payer(&self, payer: Name) -> Result<()> {
        if payer != self.receiver && !self.has_auth(payer) {
            return Err(ChainError::Host(format!("cannot charge RAM to other account {payer}")));
        }
        if !self.is_account(payer) {
            return Err(ChainError::UnknownAccount(payer));
        }
        Ok(())
    }

    fn table_mut(&mut self, scope: u64, table: Name) -> &mut BTreeMap<u64, Row> {
        self.state.tables.entry(TableId { code: self.receiver, scope, table }).or_default()
    }
}

impl ReadTables for ApplyContext<'_> {
    fn db_get(&self, code: Name, scope: u64, table: Name, primary_key: u64) -> Option<Vec<u8>> {
        self.state.db_get(code, scope, table, primary_key)
    }

    fn db_lower_bound(
        &self,
        code: Name,
        scope: u64,
        table: Name,
        primary_key: u64,
    ) -> Option<(u64, Vec<u8>)> {
        self.state.db_lower_bound(code, scope, table, primary_key)
    }

    fn db_last_key(&self, code: Name, scope: u64, table: Name) -> Option<u64> {
        self.state.db_last_key(code, scope, table)
    }
}

impl Host for ApplyContext<'_> {
    fn receiver(&self) -> Name {
        self.receiver
    }

    fn first_receiver(&self) -> Name {
        self.action.account
    }

    fn has_auth(&self, account: Name) -> bool {
        self.action.authorization.iter().any(|level| level.actor == account)
    }

    fn is_account(&self, account: Name) -> bool {
        self.accounts.contains_key(&account)
    }

    fn require_recipient(&mut self, account: Name) -> Result<()> {
        if !self.is_account(account) {
            return Err(ChainError::UnknownAccount(account));
        }
        if !self.recipients.contains(&account) {
            self.recipients.push(account);
        }
        Ok(())
    }

    fn send_inline(&mut self, action: Action) -> Result<()> {
        if !self.is_account(action.account) {
            return Err(ChainError::UnknownAccount(action.account));
        }
        // Contracts can only delegate their own authority.
        if let Some(level) = action.authorization.iter().find(|level| level.actor != self.receiver)
        {
            return Err(ChainError::MissingAuth(level.actor));
        }
        self.inline_actions.push(action);
        Ok(())
    }

    fn db_store(
        &mut self,
        scope: u64,
        table: Name,
        payer: Name,
        primary_key: u64,
        data: Vec<u8>,
    ) -> Result<()> {
        self.check_payer(payer)?;
        let rows = self.table_mut(scope, table);
        if rows.contains_key(&primary_key) {
            return Err(ChainError::Host(format!(
                "{table}: primary key {primary_key} already exists"
            )));
        }
        rows.insert(primary_key, Row { payer, data });
        Ok(())
    }

    fn db_update(
        &mut self,
        scope: u64,
        table: Name,
        payer: Option<Name>,
        primary_key: u64,
        data: Vec<u8>,
    ) -> Result<()> {
        if let Some(payer) = payer {
            self.check_payer(payer)?;
        }
        let row = self
            .table_mut(scope, table)
            .get_mut(&primary_key)
            .ok_or_else(|| ChainError::Host(format!("{table}: no row with key {primary_key}")))?;
        if let Some(payer) = payer {
            row.payer = payer;
        }
        row.data = data;
        Ok(())
    }

    fn db_remove(&mut self, scope: u64, table: Name, primary_key: u64) -> Result<()> {
        self.table_mut(scope, table)
            .remove(&primary_key)
            .map(drop)
            .ok_or_else(|| ChainError::Host(format!("{table}: no row with key {primary_key}")))
    }

    fn set_blockchain_parameters(&mut self, params: &BlockchainParameters) -> Result<()> {
        self.require_privileged("set_blockchain_parameters")?;
        self.state.parameters = Some(params.clone());
        Ok(())
    }

    fn preactivate_feature(&mut self, feature_digest: B256) -> Result<()> {
        self.require_privileged("preactivate_feature")?;
        if !self.state.preactivated.insert(feature_digest) {
            return Err(ChainError::Host(format!(
                "protocol feature with digest {feature_digest} is already pre-activated"
            )));
        }
        Ok(())
    }
}

/// Assert that `result` failed with an error whose message contains `expected`.
#[track_caller]
pub fn expect_err<T, E: Display>(result: std::result::Result<T, E>, expected: &str) {
    match result {
        Ok(_) => panic!("expected error containing {expected:?}, but the call succeeded"),
        Err(err) => {
            let message = err.to_string();
            assert!(
                message.contains(expected),
                "expected error containing {expected:?}, got {message:?}"
            );
        }
    }
}
