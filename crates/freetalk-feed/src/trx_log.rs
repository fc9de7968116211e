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

//! Persisted history of the trace messages the feed was built from.
//!
//! On restart the log is replayed to rebuild the post list, and its last cursor tells the indexer
//! where to resume.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{error::FeedError, trace::TraceMessage};

/// Save once more than this many messages are unsaved.
pub const SAVE_THRESHOLD: usize = 10;

#[derive(Debug)]
pub struct TrxLog {
    path: PathBuf,
    messages: Vec<TraceMessage>,
    num_saved: usize,
}

impl TrxLog {
    /// Load the log at `path`. A missing file is an empty log.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, FeedError> {
        let path = path.into();
        let messages: Vec<TraceMessage> = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(FeedError::io("read", path, err)),
        };
        tracing::info!("loaded {} trace messages from {}", messages.len(), path.display());
        Ok(Self { num_saved: messages.len(), messages, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn messages(&self) -> &[TraceMessage] {
        &self.messages
    }

    /// Cursor to resume the indexer stream from.
    pub fn cursor(&self) -> Option<&str> {
        self.messages.last().map(|msg| msg.cursor.as_str())
    }

    pub fn unsaved(&self) -> usize {
        self.messages.len() - self.num_saved
    }

    /// Whether `msg` belongs in the log: it carries a trace, or it is the first message of a
    /// newer block after one that did.
    pub fn should_keep(&self, msg: &TraceMessage) -> bool {
        msg.trace.is_some()
            || self
                .messages
                .last()
                .is_some_and(|prev| prev.trace.is_some() && prev.block.num < msg.block.num)
    }

    /// Append `msg` if it belongs in the log, saving when due. Returns whether it was kept.
    /// Keep `msg` if it matters, saving when enough is unsaved. A message is kept even if the
    /// save fails.
    pub fn record(&mut self, msg: &TraceMessage) -> Result<bool, FeedError> {
        if !self.should_keep(msg) {
            return Ok(false);
        }
        self.messages.push(msg.clone());
        if self.unsaved() > SAVE_THRESHOLD || msg.trace.is_none() {
            self.save()?;
        }
        Ok(true)
    }

    /// Write the log to a temporary file and rename it over the old one.
    pub fn save(&mut self) -> Result<(), FeedError> {
        tracing::info!(
            "save {}: {} transactions and undo entries",
            self.path.display(),
            self.messages.len()
        );
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let json = serde_json::to_vec(&self.messages)?;
        fs::write(&tmp, json).map_err(|err| FeedError::io("write", &tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| FeedError::io("rename", &self.path, err))?;
        self.num_saved = self.messages.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::tests::{post_action, trace_msg, undo_msg};

    fn empty_msg(block: u64) -> TraceMessage {
        TraceMessage { undo: false, trace: None, ..undo_msg(block) }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrxLog::load(dir.path().join("trx.json")).unwrap();
        assert!(log.messages().is_empty());
        assert_eq!(log.cursor(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trx.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(TrxLog::load(&path), Err(FeedError::Json(_))));
    }

    #[test]
    fn keeps_traces_and_block_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = TrxLog::load(dir.path().join("trx.json")).unwrap();

        // Nothing to mark before the first trace.
        assert!(!log.record(&empty_msg(9)).unwrap());
        assert!(log.record(&trace_msg(10, 0, vec![post_action("alice", "a")])).unwrap());
        // Same block: not a boundary.
        assert!(!log.record(&empty_msg(10)).unwrap());
        assert!(log.record(&empty_msg(11)).unwrap());
        // The previous kept message had no trace.
        assert!(!log.record(&empty_msg(12)).unwrap());
        assert_eq!(log.messages().len(), 2);
    }

    #[test]
    fn saves_after_threshold_or_traceless_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trx.json");
        let mut log = TrxLog::load(&path).unwrap();

        for block in 0..SAVE_THRESHOLD as u64 {
            log.record(&trace_msg(block, 0, vec![])).unwrap();
        }
        assert!(!path.exists());
        log.record(&trace_msg(100, 0, vec![])).unwrap();
        assert!(path.exists());
        assert_eq!(log.unsaved(), 0);
        assert!(!dir.path().join("trx.json.tmp").exists());

        log.record(&trace_msg(101, 0, vec![])).unwrap();
        assert_eq!(log.unsaved(), 1);
        log.record(&empty_msg(102)).unwrap();
        assert_eq!(log.unsaved(), 0);

        let reloaded = TrxLog::load(&path).unwrap();
        assert_eq!(reloaded.messages(), log.messages());
        assert_eq!(reloaded.cursor(), Some(""));
    }
}
