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

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use freetalk_feed::{create_app, ingest, FeedArgs, FeedState, TrxLog};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<()> {
    let args = FeedArgs::parse();

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();

    if args.log_json {
        tracing_subscriber::fmt().with_ansi(false).json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_ansi(false).with_env_filter(filter).init();
    }

    let public_config = args.public_config();
    tracing::info!("public config: {public_config:?}");

    let mut log = TrxLog::load(&args.trx_file).context("Failed to load trace log")?;
    let state = Arc::new(FeedState::new(public_config));
    ingest::replay(&state, &log).await;
    if let Some(cursor) = log.cursor() {
        tracing::info!("resume the indexer stream from cursor {cursor}");
    }

    let ingest_state = state.clone();
    let ingest_task = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(err) = ingest::ingest(stdin, &ingest_state, &mut log).await {
            tracing::error!("trace ingest stopped: {err:#}");
        }
        tracing::info!("trace stream ended");
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("Server listening on http://{}", addr);
    let listener =
        tokio::net::TcpListener::bind(addr).await.context("Failed to bind to address")?;

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {err}");
            }
        })
        .await
        .context("Server failed")?;

    ingest_task.abort();
    Ok(())
}
