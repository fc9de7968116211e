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

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::PublicConfig,
    posts::Posts,
    session::{respond, ClientMessage, ServerMessage},
    trace::TraceMessage,
};

/// Live messages buffered per client before it is considered too slow.
pub const EVENT_BUFFER: usize = 1024;

/// State shared by the ingest loop and all client connections.
pub struct FeedState {
    posts: RwLock<Posts>,
    events: broadcast::Sender<ServerMessage>,
    public_config: PublicConfig,
}

impl FeedState {
    pub fn new(public_config: PublicConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { posts: RwLock::new(Posts::new(public_config.talk_contract)), events, public_config }
    }

    pub fn public_config(&self) -> &PublicConfig {
        &self.public_config
    }

    pub fn posts(&self) -> &RwLock<Posts> {
        &self.posts
    }

    /// Apply `msg` to the post list and announce the changes to connected clients.
    pub async fn push_trace(&self, msg: &TraceMessage) {
        let mut posts = self.posts.write().await;
        for event in posts.push_trace(msg) {
            // No receivers just means no clients are connected.
            let _ = self.events.send(ServerMessage::from_event(&posts, event));
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }
}

/// Creates the axum application with all routes
pub fn create_app(state: Arc<FeedState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/config.json", get(public_config))
        .route("/posts", get(posts_ws))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .fallback(not_found)
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "freetalk-feed"
    }))
}

async fn public_config(State(state): State<Arc<FeedState>>) -> impl IntoResponse {
    Json(state.public_config().clone())
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": "The requested endpoint does not exist"
        })),
    )
}

async fn posts_ws(ws: WebSocketUpgrade, State(state): State<Arc<FeedState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(err) = serve_client(socket, state).await {
            tracing::warn!("closing websocket: {err:#}");
        }
    })
}

async fn send(
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    msg: &ServerMessage,
) -> anyhow::Result<()> {
    sink.send(Message::Text(serde_json::to_string(msg)?.into())).await?;
    Ok(())
}

async fn serve_client(socket: WebSocket, state: Arc<FeedState>) -> anyhow::Result<()> {
    tracing::info!("incoming ws connection");
    let (mut sink, mut stream) = socket.split();

    // Subscribe before reading the status so no change falls in between.
    let mut events = state.subscribe();
    let status = ServerMessage::status(&*state.posts().read().await);
    send(&mut sink, &status).await?;

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let text = match incoming {
                    None => return Ok(()),
                    Some(msg) => match msg? {
                        Message::Text(text) => text,
                        Message::Close(_) => return Ok(()),
                        _ => continue,
                    },
                };
                let request: ClientMessage = serde_json::from_str(text.as_str())?;
                let page = respond(&*state.posts().read().await, &request);
                for msg in &page {
                    send(&mut sink, msg).await?;
                }
            }
            event = events.recv() => {
                match event {
                    Ok(msg) => send(&mut sink, &msg).await?,
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        anyhow::bail!("client fell behind by {missed} messages");
                    }
                }
            }
        }
    }
}
