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

use chain_sdk::{Asset, Name, SymbolCode};
use chain_test_utils::{expect_err, TestChain};
use token::{get_balance, get_supply, Create, Issue, TokenContract, Transfer, DEFAULT_TOKEN_ACCOUNT};

const ISSUER: Name = Name::new("issuer");
const ALICE: Name = Name::new("alice");
const BOB: Name = Name::new("bob");

fn s2a(s: &str) -> Asset {
    s.parse().unwrap()
}

fn eos() -> SymbolCode {
    SymbolCode::new("EOS")
}

fn setup() -> TestChain {
    let mut chain = TestChain::new();
    chain.create_accounts(&[DEFAULT_TOKEN_ACCOUNT, ISSUER, ALICE, BOB]).unwrap();
    chain.set_contract(DEFAULT_TOKEN_ACCOUNT, TokenContract).unwrap();
    chain
        .act(
            DEFAULT_TOKEN_ACCOUNT,
            DEFAULT_TOKEN_ACCOUNT,
            &Create { issuer: ISSUER, maximum_supply: s2a("100.0000 EOS") },
        )
        .unwrap();
    chain
}

fn issue(chain: &mut TestChain, quantity: &str) -> chain_sdk::Result<()> {
    chain
        .act(
            ISSUER,
            DEFAULT_TOKEN_ACCOUNT,
            &Issue { to: ISSUER, quantity: s2a(quantity), memo: String::new() },
        )
        .map(drop)
}

fn transfer(chain: &mut TestChain, from: Name, to: Name, quantity: &str) -> chain_sdk::Result<()> {
    let data = Transfer { from, to, quantity: s2a(quantity), memo: "memo".into() };
    chain.act(from, DEFAULT_TOKEN_ACCOUNT, &data).map(drop)
}

#[test_log::test]
fn create_requires_contract_authority() {
    let mut chain = setup();
    expect_err(
        chain.act(
            ALICE,
            DEFAULT_TOKEN_ACCOUNT,
            &Create { issuer: ALICE, maximum_supply: s2a("1.0000 ABC") },
        ),
        "missing authority of eosio.token",
    );
    expect_err(
        chain.act(
            DEFAULT_TOKEN_ACCOUNT,
            DEFAULT_TOKEN_ACCOUNT,
            &Create { issuer: ISSUER, maximum_supply: s2a("1.000 EOS") },
        ),
        "token with symbol already exists",
    );
    expect_err(
        chain.act(
            DEFAULT_TOKEN_ACCOUNT,
            DEFAULT_TOKEN_ACCOUNT,
            &Create { issuer: ISSUER, maximum_supply: s2a("0.0000 ABC") },
        ),
        "max-supply must be positive",
    );
}

#[test_log::test]
fn issue_respects_max_supply() {
    let mut chain = setup();
    issue(&mut chain, "60.0000 EOS").unwrap();
    assert_eq!(get_supply(&chain, DEFAULT_TOKEN_ACCOUNT, eos()).unwrap(), Some(s2a("60.0000 EOS")));
    expect_err(issue(&mut chain, "40.0001 EOS"), "quantity exceeds available supply");
    expect_err(issue(&mut chain, "1.00 EOS"), "symbol precision mismatch");
    expect_err(issue(&mut chain, "1.0000 ABC"), "token with symbol does not exist");
    issue(&mut chain, "40.0000 EOS").unwrap();
    assert_eq!(
        get_balance(&chain, DEFAULT_TOKEN_ACCOUNT, ISSUER, eos()).unwrap(),
        Some(s2a("100.0000 EOS"))
    );
}

#[test_log::test]
fn transfer_moves_balances_and_notifies_both_parties() {
    let mut chain = setup();
    issue(&mut chain, "10.0000 EOS").unwrap();
    let trace = chain
        .act(
            ISSUER,
            DEFAULT_TOKEN_ACCOUNT,
            &Transfer { from: ISSUER, to: ALICE, quantity: s2a("3.0000 EOS"), memo: String::new() },
        )
        .unwrap();
    assert_eq!(
        trace.receivers_of(DEFAULT_TOKEN_ACCOUNT, token::actions::TRANSFER),
        vec![DEFAULT_TOKEN_ACCOUNT, ISSUER, ALICE]
    );
    assert_eq!(
        get_balance(&chain, DEFAULT_TOKEN_ACCOUNT, ALICE, eos()).unwrap(),
        Some(s2a("3.0000 EOS"))
    );
    assert_eq!(
        get_balance(&chain, DEFAULT_TOKEN_ACCOUNT, ISSUER, eos()).unwrap(),
        Some(s2a("7.0000 EOS"))
    );
    assert_eq!(get_balance(&chain, DEFAULT_TOKEN_ACCOUNT, BOB, eos()).unwrap(), None);
}

#[test_log::test]
fn transfer_checks() {
    let mut chain = setup();
    issue(&mut chain, "10.0000 EOS").unwrap();
    transfer(&mut chain, ISSUER, ALICE, "1.0000 EOS").unwrap();

    expect_err(transfer(&mut chain, ALICE, ALICE, "1.0000 EOS"), "cannot transfer to self");
    expect_err(
        transfer(&mut chain, ALICE, Name::new("nobody"), "1.0000 EOS"),
        "to account does not exist",
    );
    expect_err(transfer(&mut chain, ALICE, BOB, "1.0001 EOS"), "overdrawn balance");
    expect_err(transfer(&mut chain, ALICE, BOB, "0.0000 EOS"), "must transfer positive quantity");
    expect_err(transfer(&mut chain, BOB, ALICE, "1.0000 EOS"), "no balance object found");

    let long_memo = Transfer {
        from: ALICE,
        to: BOB,
        quantity: s2a("1.0000 EOS"),
        memo: "x".repeat(257),
    };
    expect_err(chain.act(ALICE, DEFAULT_TOKEN_ACCOUNT, &long_memo), "memo has more than 256 bytes");

    expect_err(
        chain.act(
            BOB,
            DEFAULT_TOKEN_ACCOUNT,
            &Transfer { from: ALICE, to: BOB, quantity: s2a("1.0000 EOS"), memo: String::new() },
        ),
        "missing authority of alice",
    );
    assert_eq!(
        get_balance(&chain, DEFAULT_TOKEN_ACCOUNT, ALICE, eos()).unwrap(),
        Some(s2a("1.0000 EOS"))
    );
}
