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

//! Contract deployed on the system account of a fresh chain.
//!
//! `boot` sets the blockchain parameters and pre-activates the protocol features enabled on EOS as
//! of 2021-10-02. `setabi` and `setcode` are accepted as no-ops so the host's native handlers for
//! those actions keep working while this contract occupies the system account.

use borsh::{BorshDeserialize, BorshSerialize};
use chain_sdk::{
    is_notification, Action, ActionData, BlockchainParameters, ChainError, Contract, Host, Name,
    Result, B256,
};

/// The account this contract is deployed to.
pub const DEFAULT_CONTRACT_ACCOUNT: Name = Name::new("eosio");

pub const BOOT_PARAMETERS: BlockchainParameters = BlockchainParameters {
    max_block_net_usage: 1024 * 1024,
    target_block_net_usage_pct: 1000,
    max_transaction_net_usage: 512 * 1024,
    base_per_transaction_net_usage: 12,
    net_usage_leeway: 500,
    context_free_discount_net_usage_num: 20,
    context_free_discount_net_usage_den: 100,
    max_block_cpu_usage: 200_000,
    target_block_cpu_usage_pct: 1000,
    max_transaction_cpu_usage: 150_000,
    min_transaction_cpu_usage: 100,
    max_transaction_lifetime: 60 * 60,
    deferred_trx_expiration_window: 10 * 60,
    max_transaction_delay: 45 * 24 * 3600,
    max_inline_action_size: 512 * 24,
    max_inline_action_depth: 6,
    max_authority_depth: 6,
};

/// Digests of the protocol features pre-activated by `boot`, in activation order.
pub const PROTOCOL_FEATURES: [&str; 10] = [
    "8ba52fe7a3956c5cd3a656a3174b931d3bb2abb45578befc59f283ecd816a405",
    "68dcaa34c0517d19666e6b33add67351d8c5f69e999ca1e37931bc410a297428",
    "1a99a59d87e06e09ec5b028a9cbb7749b4a5ad8819004365d02dc4379a8b7241",
    "e0fb64b1085cc5538970158d05a009c24e276fb94e1a0bf6a528b48fbc4ff526",
    "4e7bf348da00a945489b2a681749eb56f5de00b900014e137ddae39f48f69d67",
    "f0af56d2c5a48d60a4a5b5c903edfb7db3a736a94ed589d0b797df33ff9d3e1d",
    "ef43112c6543b88db2283a2e077278c315ae2c84719a8b25f25cc88565fbea99",
    "4a90c00d55454dc5b059055ca213579c6ea856967712a56017487886a4d4cc0f",
    "299dcb6af692324b899b39f16d5a530a33062804e41f09dc97e9f156b4476707",
    "4fca8bd82bbd181e714e283f83e1b45d95ca5af40fb89ad3977b653c448f78c2",
];

pub mod actions {
    use chain_sdk::Name;

    pub const SETABI: Name = Name::new("setabi");
    pub const SETCODE: Name = Name::new("setcode");
    pub const BOOT: Name = Name::new("boot");
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SetAbi {
    pub account: Name,
    pub abi: Vec<u8>,
}

impl ActionData for SetAbi {
    const NAME: Name = actions::SETABI;
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SetCode {
    pub account: Name,
    pub vmtype: u8,
    pub vmversion: u8,
    pub code: Vec<u8>,
}

impl ActionData for SetCode {
    const NAME: Name = actions::SETCODE;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Boot {}

impl ActionData for Boot {
    const NAME: Name = actions::BOOT;
}

/// Parse [PROTOCOL_FEATURES] into digests.
pub fn protocol_features() -> Result<Vec<B256>> {
    PROTOCOL_FEATURES.iter().map(|feature| parse_digest(feature)).collect()
}

fn parse_digest(hex_digest: &str) -> Result<B256> {
    let bytes = hex::decode(hex_digest)
        .map_err(|err| ChainError::check(format!("invalid feature digest {hex_digest}: {err}")))?;
    if bytes.len() != B256::len_bytes() {
        return Err(ChainError::check(format!("invalid feature digest length: {hex_digest}")));
    }
    Ok(B256::from_slice(&bytes))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BootContract;

impl Contract for BootContract {
    fn apply(&self, host: &mut dyn Host, action: &Action) -> Result<()> {
        if is_notification(host) {
            return Ok(());
        }
        match action.name {
            actions::SETABI => action.decode_data::<SetAbi>().map(drop),
            actions::SETCODE => action.decode_data::<SetCode>().map(drop),
            actions::BOOT => {
                action.decode_data::<Boot>()?;
                self.boot(host)
            }
            name => Err(ChainError::UnknownAction { contract: host.receiver(), action: name }),
        }
    }
}

impl BootContract {
    pub fn boot(&self, host: &mut dyn Host) -> Result<()> {
        host.set_blockchain_parameters(&BOOT_PARAMETERS)?;
        for feature in protocol_features()? {
            tracing::debug!("preactivating feature {feature}");
            host.preactivate_feature(feature)?;
        }
        Ok(())
    }
}
