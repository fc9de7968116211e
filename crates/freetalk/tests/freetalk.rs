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

use alloy_signer_local::PrivateKeySigner;
use borsh::{BorshDeserialize, BorshSerialize};
use chain_sdk::{
    Action, ActionData, Contract, Host, Name, PermissionLevel, PublicKey, Result, Table,
};
use chain_test_utils::{expect_err, TestChain};
use freetalk::{
    get_posts, get_user_key, CreatePost, EdenMember, FreetalkConfig, FreetalkContract, Post,
    RegisterKey, ReplayPolicy, SequenceState, StrictSequence, DEFAULT_CONTRACT_ACCOUNT as FREETALK,
    EDEN_ACCOUNT,
};

const ALICE: Name = Name::new("alice");
const BOB: Name = Name::new("bob");
const RELAY: Name = Name::new("relay");

/// Stand-in for the membership contract: `addmember(account)` adds a row to `member`.
struct Members;

#[derive(BorshSerialize, BorshDeserialize)]
struct AddMember {
    account: Name,
}

impl ActionData for AddMember {
    const NAME: Name = Name::new("addmember");
}

impl Contract for Members {
    fn apply(&self, host: &mut dyn Host, action: &Action) -> Result<()> {
        let AddMember { account } = action.decode_data()?;
        let payer = host.receiver();
        host.require_auth(payer)?;
        Table::<_, EdenMember>::new(host, 0).emplace(payer, &EdenMember { version: 0, account })
    }
}

fn public_key(signer: &PrivateKeySigner) -> PublicKey {
    PublicKey::from_verifying_key(signer.credential().verifying_key())
}

fn setup_with(config: FreetalkConfig) -> TestChain {
    let mut chain = TestChain::new();
    chain.create_accounts(&[FREETALK, EDEN_ACCOUNT, ALICE, BOB, RELAY]).unwrap();
    chain.set_contract(FREETALK, FreetalkContract::new(config)).unwrap();
    chain.set_contract(EDEN_ACCOUNT, Members).unwrap();
    chain.act(EDEN_ACCOUNT, EDEN_ACCOUNT, &AddMember { account: ALICE }).unwrap();
    chain
}

fn setup() -> TestChain {
    setup_with(FreetalkConfig::default())
}

fn register(chain: &mut TestChain, user: Name, signer: &PrivateKeySigner) -> Result<()> {
    chain.act(user, FREETALK, &RegisterKey { user, key: public_key(signer) }).map(drop)
}

fn signed(signer: &PrivateKeySigner, user: Name, sequence: u32, message: &str) -> CreatePost {
    CreatePost::sign(signer, Post { user, sequence, message: message.into() }).unwrap()
}

/// Posts are relayed by an unrelated account; the signature is the only authorization.
fn post(chain: &mut TestChain, create: &CreatePost) -> Result<()> {
    chain.act(RELAY, FREETALK, create).map(drop)
}

#[test_log::test]
fn registered_member_can_post() {
    let mut chain = setup();
    let signer = PrivateKeySigner::random();
    register(&mut chain, ALICE, &signer).unwrap();

    post(&mut chain, &signed(&signer, ALICE, 0, "hello")).unwrap();
    post(&mut chain, &signed(&signer, ALICE, 1, "world")).unwrap();

    let posts = get_posts(&chain, FREETALK).unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!((posts[0].id, posts[0].sequence, posts[0].message.as_str()), (0, 0, "hello"));
    assert_eq!((posts[1].id, posts[1].user, posts[1].message.as_str()), (1, ALICE, "world"));
}

#[test_log::test]
fn registerkey_requires_auth_and_membership() {
    let mut chain = setup();
    let signer = PrivateKeySigner::random();
    expect_err(
        chain.act(BOB, FREETALK, &RegisterKey { user: ALICE, key: public_key(&signer) }),
        "missing authority of alice",
    );
    expect_err(register(&mut chain, BOB, &signer), "member not found");
    assert_eq!(get_user_key(&chain, FREETALK, BOB).unwrap(), None);
}

#[test_log::test]
fn unregistered_user_cannot_post() {
    let mut chain = setup();
    let signer = PrivateKeySigner::random();
    expect_err(post(&mut chain, &signed(&signer, ALICE, 0, "hi")), "User has not registered a key");
}

#[test_log::test]
fn wrong_key_is_rejected() {
    let mut chain = setup();
    let alice = PrivateKeySigner::random();
    let mallory = PrivateKeySigner::random();
    register(&mut chain, ALICE, &alice).unwrap();

    let expected = format!(
        "Expected {} but recovered {}",
        public_key(&alice),
        public_key(&mallory)
    );
    expect_err(post(&mut chain, &signed(&mallory, ALICE, 0, "forged")), &expected);
    assert!(get_posts(&chain, FREETALK).unwrap().is_empty());
}

#[test_log::test]
fn tampered_post_is_rejected() {
    let mut chain = setup();
    let signer = PrivateKeySigner::random();
    register(&mut chain, ALICE, &signer).unwrap();

    let mut create = signed(&signer, ALICE, 0, "original");
    create.post.message = "tampered".into();
    expect_err(post(&mut chain, &create), "but recovered");
}

#[test_log::test]
fn replays_and_large_gaps_are_rejected() {
    let mut chain = setup();
    let signer = PrivateKeySigner::random();
    register(&mut chain, ALICE, &signer).unwrap();

    let first = signed(&signer, ALICE, 5, "first");
    post(&mut chain, &first).unwrap();
    expect_err(post(&mut chain, &first), "received duplicate sequence 5");
    expect_err(
        post(&mut chain, &signed(&signer, ALICE, 4, "stale")),
        "received duplicate sequence 4",
    );
    expect_err(post(&mut chain, &signed(&signer, ALICE, 16, "far")), "sequence 16 skips too many");
    post(&mut chain, &signed(&signer, ALICE, 15, "near")).unwrap();
    post(&mut chain, &signed(&signer, ALICE, 7, "late")).unwrap();
    assert_eq!(get_posts(&chain, FREETALK).unwrap().len(), 3);
}

#[test_log::test]
fn long_sequential_history_keeps_working() {
    let mut chain = setup();
    let signer = PrivateKeySigner::random();
    register(&mut chain, ALICE, &signer).unwrap();
    for sequence in 0..30 {
        post(&mut chain, &signed(&signer, ALICE, sequence, "tick")).unwrap();
    }
    let key = get_user_key(&chain, FREETALK, ALICE).unwrap().unwrap();
    let SequenceState::Window(window) = key.sequences else {
        panic!("expected window state");
    };
    assert_eq!(window.sequences(), (10..30).collect::<Vec<_>>().as_slice());
    expect_err(
        post(&mut chain, &signed(&signer, ALICE, 9, "old")),
        "received duplicate sequence 9",
    );
}

#[test_log::test]
fn malformed_payloads_are_rejected() {
    let mut chain = setup();
    let signer = PrivateKeySigner::random();
    register(&mut chain, ALICE, &signer).unwrap();

    expect_err(post(&mut chain, &signed(&signer, ALICE, 0, &"x".repeat(257))), "post is too long");
    post(&mut chain, &signed(&signer, ALICE, 0, &"x".repeat(256))).unwrap();

    // Extra bytes after the post are covered by the signature but still rejected.
    let create = signed(&signer, ALICE, 1, "extra");
    let mut post_bytes = borsh::to_vec(&create.post).unwrap();
    post_bytes.push(0);
    let digest = chain_sdk::sha256(&post_bytes);
    let signature = alloy_signer::SignerSync::sign_hash_sync(&signer, &digest).unwrap();
    let mut data = borsh::to_vec(&signature.as_bytes().to_vec()).unwrap();
    data.extend_from_slice(&post_bytes);
    let action = Action {
        account: FREETALK,
        name: CreatePost::NAME,
        authorization: vec![PermissionLevel::active(RELAY)],
        data,
    };
    expect_err(chain.push_action(action), "detected extra action data after post");
}

#[test_log::test]
fn key_rotation_keeps_replay_state() {
    let mut chain = setup();
    let old = PrivateKeySigner::random();
    let new = PrivateKeySigner::random();
    register(&mut chain, ALICE, &old).unwrap();
    post(&mut chain, &signed(&old, ALICE, 0, "before")).unwrap();

    register(&mut chain, ALICE, &new).unwrap();
    expect_err(post(&mut chain, &signed(&old, ALICE, 1, "old key")), "but recovered");
    expect_err(
        post(&mut chain, &signed(&new, ALICE, 0, "replay")),
        "received duplicate sequence 0",
    );
    post(&mut chain, &signed(&new, ALICE, 1, "after")).unwrap();
}

#[test_log::test]
fn membership_check_can_be_disabled() {
    let config = FreetalkConfig::builder().membership_contract(None::<Name>).build().unwrap();
    let mut chain = setup_with(config);
    let signer = PrivateKeySigner::random();
    register(&mut chain, BOB, &signer).unwrap();
    post(&mut chain, &signed(&signer, BOB, 0, "no membership needed")).unwrap();

    // Redeploying with the default configuration checks membership on every post.
    chain.set_contract(FREETALK, FreetalkContract::default()).unwrap();
    expect_err(post(&mut chain, &signed(&signer, BOB, 1, "now checked")), "member not found");
}

#[test_log::test]
fn strict_policy_and_migration() {
    let strict = FreetalkConfig::builder().replay_policy(ReplayPolicy::Strict).build().unwrap();
    let mut chain = setup_with(strict.clone());
    let signer = PrivateKeySigner::random();
    register(&mut chain, ALICE, &signer).unwrap();

    post(&mut chain, &signed(&signer, ALICE, 0, "a")).unwrap();
    expect_err(
        post(&mut chain, &signed(&signer, ALICE, 2, "b")),
        "expected sequence 1 but received 2",
    );
    post(&mut chain, &signed(&signer, ALICE, 1, "b")).unwrap();

    // Switch to the window: out-of-order delivery is tolerated but nothing old reopens.
    chain.set_contract(FREETALK, FreetalkContract::default()).unwrap();
    expect_err(
        post(&mut chain, &signed(&signer, ALICE, 0, "again")),
        "received duplicate sequence 0",
    );
    post(&mut chain, &signed(&signer, ALICE, 4, "d")).unwrap();
    post(&mut chain, &signed(&signer, ALICE, 3, "c")).unwrap();

    // And back: the counter continues after the largest accepted sequence.
    chain.set_contract(FREETALK, FreetalkContract::new(strict)).unwrap();
    post(&mut chain, &signed(&signer, ALICE, 5, "e")).unwrap();
    let key = get_user_key(&chain, FREETALK, ALICE).unwrap().unwrap();
    assert_eq!(key.sequences, SequenceState::Strict(StrictSequence::new(6)));
}

#[test_log::test]
fn posts_table_is_optional() {
    let config = FreetalkConfig::builder().store_posts(false).build().unwrap();
    let mut chain = setup_with(config);
    let signer = PrivateKeySigner::random();
    register(&mut chain, ALICE, &signer).unwrap();
    post(&mut chain, &signed(&signer, ALICE, 0, "ephemeral")).unwrap();
    assert!(get_posts(&chain, FREETALK).unwrap().is_empty());
}
