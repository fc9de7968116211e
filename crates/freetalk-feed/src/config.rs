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

use std::path::PathBuf;

use chain_sdk::Name;
use clap::Parser;
use serde::{Deserialize, Serialize};

/// Arguments for the freetalk feed server.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct FeedArgs {
    /// Port to listen on.
    #[clap(long, env = "SERVER_PORT", default_value_t = 3000)]
    pub port: u16,

    /// File holding the trace messages received so far.
    #[clap(long, env = "TRX_FILE", default_value = "freetalk-trx.json")]
    pub trx_file: PathBuf,

    /// Chain ID reported to web clients.
    #[clap(long, env = "PUBLIC_CHAIN_ID")]
    pub chain_id: Option<String>,

    /// RPC endpoint reported to web clients.
    #[clap(long, env = "PUBLIC_CHAIN_RPC_URL", default_value = "https://testnet.waxsweden.org")]
    pub chain_rpc_url: String,

    /// Account the freetalk contract is deployed to.
    #[clap(long, env = "PUBLIC_TALK_CONTRACT", default_value = "talk.edev")]
    pub talk_contract: Name,

    /// Account of the membership contract.
    #[clap(long, env = "PUBLIC_EDEN_CONTRACT", default_value = "test2.edev")]
    pub eden_contract: Name,

    /// Whether to log in JSON format.
    #[clap(long, env, default_value_t = false)]
    pub log_json: bool,
}

impl FeedArgs {
    pub fn public_config(&self) -> PublicConfig {
        PublicConfig {
            chain_id: self.chain_id.clone(),
            chain_rpc_url: self.chain_rpc_url.clone(),
            talk_contract: self.talk_contract,
            eden_contract: self.eden_contract,
        }
    }
}

/// Configuration served to web clients at `/config.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub chain_id: Option<String>,
    pub chain_rpc_url: String,
    pub talk_contract: Name,
    pub eden_contract: Name,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = FeedArgs::try_parse_from(["freetalk-feed"]).unwrap();
        assert_eq!(args.talk_contract, Name::new("talk.edev"));
        assert_eq!(args.eden_contract, Name::new("test2.edev"));
        assert_eq!(args.chain_rpc_url, "https://testnet.waxsweden.org");
    }

    #[test]
    fn rejects_invalid_contract_names() {
        let args = FeedArgs::try_parse_from(["freetalk-feed", "--talk-contract", "Not.Valid"]);
        assert!(args.is_err());
    }

    #[test]
    fn public_config_json() {
        let args = FeedArgs::try_parse_from(["freetalk-feed", "--chain-id", "abcd"]).unwrap();
        let json = serde_json::to_value(args.public_config()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "chainId": "abcd",
                "chainRpcUrl": "https://testnet.waxsweden.org",
                "talkContract": "talk.edev",
                "edenContract": "test2.edev"
            })
        );
    }
}
