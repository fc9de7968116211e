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

//! Typed access to contract tables.
//!
//! Rows are stored by the host as opaque bytes keyed by `(code, scope, table, primary key)`.
//! [TableView] and [Table] add borsh encoding on top of the host intrinsics.

use std::marker::PhantomData;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    error::{check, decode, encode, ChainError, Result},
    host::{Host, ReadTables},
    name::Name,
};

/// A row type stored in a contract table.
pub trait Record: BorshSerialize + BorshDeserialize {
    const TABLE: Name;

    fn primary_key(&self) -> u64;
}

/// Read-only view of a table owned by any contract.
pub struct TableView<'a, D: ReadTables + ?Sized, R> {
    db: &'a D,
    code: Name,
    scope: u64,
    _record: PhantomData<fn() -> R>,
}

impl<'a, D: ReadTables + ?Sized, R: Record> TableView<'a, D, R> {
    pub fn new(db: &'a D, code: Name, scope: u64) -> Self {
        Self { db, code, scope, _record: PhantomData }
    }

    pub fn find(&self, primary_key: u64) -> Result<Option<R>> {
        self.db
            .db_get(self.code, self.scope, R::TABLE, primary_key)
            .map(|bytes| decode("table row", &bytes))
            .transpose()
    }

    /// Like [Self::find], but abort with `message` when the row is missing.
    pub fn get(&self, primary_key: u64, message: &str) -> Result<R> {
        self.find(primary_key)?.ok_or_else(|| ChainError::check(message))
    }

    pub fn contains(&self, primary_key: u64) -> bool {
        self.db.db_get(self.code, self.scope, R::TABLE, primary_key).is_some()
    }

    /// All rows in primary key order.
    pub fn rows(&self) -> Result<Vec<R>> {
        let mut rows = Vec::new();
        let mut next = Some(0u64);
        while let Some(key) = next {
            let Some((primary_key, bytes)) =
                self.db.db_lower_bound(self.code, self.scope, R::TABLE, key)
            else {
                break;
            };
            rows.push(decode("table row", &bytes)?);
            next = primary_key.checked_add(1);
        }
        Ok(rows)
    }

    pub fn available_primary_key(&self) -> Result<u64> {
        match self.db.db_last_key(self.code, self.scope, R::TABLE) {
            None => Ok(0),
            Some(last) => last.checked_add(1).ok_or_else(|| {
                ChainError::check("next primary key in table is at autoincrement limit")
            }),
        }
    }
}

/// Read-write access to a table owned by the running contract.
pub struct Table<'a, H: Host + ?Sized, R> {
    host: &'a mut H,
    scope: u64,
    _record: PhantomData<fn() -> R>,
}

impl<'a, H: Host + ?Sized, R: Record> Table<'a, H, R> {
    pub fn new(host: &'a mut H, scope: u64) -> Self {
        Self { host, scope, _record: PhantomData }
    }

    pub fn view(&self) -> TableView<'_, H, R> {
        TableView::new(&*self.host, self.host.receiver(), self.scope)
    }

    pub fn find(&self, primary_key: u64) -> Result<Option<R>> {
        self.view().find(primary_key)
    }

    pub fn get(&self, primary_key: u64, message: &str) -> Result<R> {
        self.view().get(primary_key, message)
    }

    pub fn rows(&self) -> Result<Vec<R>> {
        self.view().rows()
    }

    pub fn available_primary_key(&self) -> Result<u64> {
        self.view().available_primary_key()
    }

    /// Insert a new row, billed to `payer`. Fails if the primary key is taken.
    pub fn emplace(&mut self, payer: Name, record: &R) -> Result<()> {
        let primary_key = record.primary_key();
        tracing::trace!("emplace {}:{} key {primary_key}", self.host.receiver(), R::TABLE);
        self.host.db_store(self.scope, R::TABLE, payer, primary_key, encode("table row", record)?)
    }

    /// Apply `update` to `record` and write it back. `payer` of `None` keeps the current payer.
    ///
    /// The update may abort, in which case nothing is written. It may not change the primary key.
    pub fn modify<F>(&mut self, mut record: R, payer: Option<Name>, update: F) -> Result<R>
    where
        F: FnOnce(&mut R) -> Result<()>,
    {
        let primary_key = record.primary_key();
        update(&mut record)?;
        check(
            record.primary_key() == primary_key,
            "updater cannot change primary key when modifying an object",
        )?;
        tracing::trace!("modify {}:{} key {primary_key}", self.host.receiver(), R::TABLE);
        let data = encode("table row", &record)?;
        self.host.db_update(self.scope, R::TABLE, payer, primary_key, data)?;
        Ok(record)
    }

    pub fn erase(&mut self, primary_key: u64) -> Result<()> {
        self.host.db_remove(self.scope, R::TABLE, primary_key)
    }
}
