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

//! Reads trace messages, one JSON object per line, and feeds them to the server.

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{server::FeedState, trace::TraceMessage, trx_log::TrxLog};

/// Rebuild the post list from the messages already in `log`.
pub async fn replay(state: &FeedState, log: &TrxLog) {
    tracing::info!("pushing {} existing trace messages", log.messages().len());
    for msg in log.messages() {
        state.push_trace(msg).await;
    }
}

/// Read messages from `reader` until it ends. Malformed lines are logged and skipped, and a
/// failed save of `log` does not stop ingestion.
pub async fn ingest<R: AsyncBufRead + Unpin>(
    reader: R,
    state: &FeedState,
    log: &mut TrxLog,
) -> anyhow::Result<()> {
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read trace stream")? {
        if line.trim().is_empty() {
            continue;
        }
        let msg: TraceMessage = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(err) => {
                tracing::error!("skipping malformed trace message: {err}");
                continue;
            }
        };
        let trx = match &msg.trace {
            Some(trace) => format!("trx {}", trace.id),
            None => "no matching transactions".to_string(),
        };
        let kind = if msg.undo { "undo block" } else { "recv block" };
        tracing::info!("{kind} {} {trx}", msg.block.num);
        match log.record(&msg) {
            Ok(false) => {}
            Ok(true) => state.push_trace(&msg).await,
            Err(err) => {
                // The message stays in the log and the next save retries.
                tracing::error!("failed to save trace log: {err}");
                state.push_trace(&msg).await;
            }
        }
    }
    Ok(())
}
