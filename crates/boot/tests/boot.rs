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

use boot::{protocol_features, Boot, BootContract, SetAbi, SetCode, BOOT_PARAMETERS};
use borsh::{BorshDeserialize, BorshSerialize};
use chain_sdk::{Action, ActionData, Contract, Host, Name, PermissionLevel, Result};
use chain_test_utils::{expect_err, TestChain, SYSTEM_ACCOUNT};

fn booted_chain() -> TestChain {
    let mut chain = TestChain::new();
    chain.set_contract(SYSTEM_ACCOUNT, BootContract).unwrap();
    chain
}

#[test_log::test]
fn boot_sets_parameters_and_features() {
    let mut chain = booted_chain();
    chain.act(SYSTEM_ACCOUNT, SYSTEM_ACCOUNT, &Boot {}).unwrap();

    assert_eq!(chain.blockchain_parameters(), Some(&BOOT_PARAMETERS));
    let features = protocol_features().unwrap();
    assert_eq!(chain.preactivated_features().len(), features.len());
    assert!(features.iter().all(|feature| chain.is_preactivated(feature)));
}

#[test_log::test]
fn booting_twice_fails_without_changes() {
    let mut chain = booted_chain();
    chain.act(SYSTEM_ACCOUNT, SYSTEM_ACCOUNT, &Boot {}).unwrap();
    expect_err(chain.act(SYSTEM_ACCOUNT, SYSTEM_ACCOUNT, &Boot {}), "already pre-activated");
    assert_eq!(chain.preactivated_features().len(), 10);
}

#[test_log::test]
fn unprivileged_boot_fails() {
    let mut chain = TestChain::new();
    let other = Name::new("bootstrap");
    chain.create_account(other).unwrap();
    chain.set_contract(other, BootContract).unwrap();

    expect_err(chain.act(other, other, &Boot {}), "privileged");
    assert_eq!(chain.blockchain_parameters(), None);
    assert!(chain.preactivated_features().is_empty());
}

#[test_log::test]
fn setabi_and_setcode_are_noops() {
    let mut chain = booted_chain();
    let auth = vec![PermissionLevel::active(SYSTEM_ACCOUNT)];
    let setabi = SetAbi { account: SYSTEM_ACCOUNT, abi: vec![1, 2, 3] };
    let setcode = SetCode { account: SYSTEM_ACCOUNT, vmtype: 0, vmversion: 0, code: vec![0; 8] };
    chain
        .push_transaction(vec![
            setabi.to_action(SYSTEM_ACCOUNT, auth.clone()).unwrap(),
            setcode.to_action(SYSTEM_ACCOUNT, auth).unwrap(),
        ])
        .unwrap();
    assert_eq!(chain.blockchain_parameters(), None);
}

const NOTIFIER: Name = Name::new("notifier");

#[derive(BorshSerialize, BorshDeserialize)]
struct Ping {}

impl ActionData for Ping {
    const NAME: Name = Name::new("ping");
}

/// Forwards every action it receives to the system account.
struct Notifier;

impl Contract for Notifier {
    fn apply(&self, host: &mut dyn Host, _action: &Action) -> Result<()> {
        if host.receiver() == NOTIFIER {
            host.require_recipient(SYSTEM_ACCOUNT)?;
        }
        Ok(())
    }
}

#[test_log::test]
fn notifications_to_system_account_are_ignored() {
    let mut chain = booted_chain();
    chain.act(SYSTEM_ACCOUNT, SYSTEM_ACCOUNT, &Boot {}).unwrap();
    chain.create_account(NOTIFIER).unwrap();
    chain.set_contract(NOTIFIER, Notifier).unwrap();

    let trace = chain.act(NOTIFIER, NOTIFIER, &Ping {}).unwrap();
    assert_eq!(trace.receivers_of(NOTIFIER, Ping::NAME), vec![NOTIFIER, SYSTEM_ACCOUNT]);
    assert_eq!(chain.preactivated_features().len(), 10);
}
