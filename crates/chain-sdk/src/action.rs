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

//! Actions and the contract dispatch seam.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    error::{decode, encode, Result},
    host::Host,
    name::Name,
};

/// The permission most actions are authorized with.
pub const ACTIVE: Name = Name::new("active");

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

impl PermissionLevel {
    pub const fn new(actor: Name, permission: Name) -> Self {
        Self { actor, permission }
    }

    pub const fn active(actor: Name) -> Self {
        Self::new(actor, ACTIVE)
    }
}

/// A named entry point invoked on a contract account, with its serialized arguments.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    pub data: Vec<u8>,
}

impl Action {
    pub fn new<T: BorshSerialize>(
        account: Name,
        name: Name,
        authorization: Vec<PermissionLevel>,
        data: &T,
    ) -> Result<Self> {
        Ok(Self { account, name, authorization, data: encode("action data", data)? })
    }

    /// Decode the action arguments. All bytes must be consumed.
    pub fn decode_data<T: BorshDeserialize>(&self) -> Result<T> {
        decode("action data", &self.data)
    }
}

/// Typed arguments of a single action.
pub trait ActionData: BorshSerialize + BorshDeserialize {
    const NAME: Name;

    /// Build the [Action] invoking this entry point on `account`.
    fn to_action(&self, account: Name, authorization: Vec<PermissionLevel>) -> Result<Action> {
        Action::new(account, Self::NAME, authorization, self)
    }
}

/// A contract deployed on an account.
///
/// The host calls [Contract::apply] with `host.receiver()` set to the account the contract is
/// deployed on. When `host.first_receiver()` differs from the receiver the action is a
/// notification forwarded from another contract.
pub trait Contract: Send + Sync {
    fn apply(&self, host: &mut dyn Host, action: &Action) -> Result<()>;
}

/// Whether the action being applied is a notification rather than a direct call.
pub fn is_notification(host: &dyn Host) -> bool {
    host.first_receiver() != host.receiver()
}
