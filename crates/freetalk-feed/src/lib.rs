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

//! Feed of freetalk posts for web clients.
//!
//! Trace messages for the talk contract come in from the chain indexer, are appended to a
//! persisted [trx_log::TrxLog], and update an in-memory [posts::Posts] list that follows forks.
//! Web clients page through the list and receive live changes over a websocket.

pub mod config;
pub mod error;
pub mod ingest;
pub mod posts;
pub mod server;
pub mod session;
pub mod trace;
pub mod trx_log;

pub use config::{FeedArgs, PublicConfig};
pub use error::FeedError;
pub use posts::{FeedEvent, FeedPost, Posts};
pub use server::{create_app, FeedState};
pub use session::{ClientMessage, ServerMessage};
pub use trace::TraceMessage;
pub use trx_log::TrxLog;
