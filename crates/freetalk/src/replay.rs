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

//! Replay protection for posts signed off chain.
//!
//! Each user's accepted sequence numbers are tracked in one of two ways. [SequenceWindow] keeps
//! the most recent numbers and tolerates limited out-of-order delivery. [StrictSequence] keeps
//! only the next expected number.

use borsh::{BorshDeserialize, BorshSerialize};
use chain_sdk::ChainError;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayError {
    #[error("received duplicate sequence {0}")]
    Duplicate(u32),

    #[error("sequence {0} skips too many")]
    SkipsTooMany(u32),

    #[error("expected sequence {expected} but received {received}")]
    OutOfOrder { expected: u32, received: u32 },

    #[error("sequence space exhausted")]
    Exhausted,
}

impl From<ReplayError> for ChainError {
    fn from(err: ReplayError) -> Self {
        ChainError::check(err.to_string())
    }
}

/// Accepts each sequence number at most once.
pub trait ReplayGuard {
    /// Record `sequence` as used, or reject it leaving the state unchanged.
    fn accept(&mut self, sequence: u32) -> Result<(), ReplayError>;
}

/// Ascending set of the most recently accepted sequence numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SequenceWindow {
    sequences: Vec<u32>,
}

impl SequenceWindow {
    /// Number of sequence numbers retained.
    pub const CAPACITY: usize = 20;

    /// How far past the largest retained sequence a new one may land.
    pub const MAX_SKIP: u32 = 10;

    pub fn sequences(&self) -> &[u32] {
        &self.sequences
    }

    pub fn min(&self) -> Option<u32> {
        self.sequences.first().copied()
    }

    pub fn max(&self) -> Option<u32> {
        self.sequences.last().copied()
    }

    /// Where `sequence` would be inserted, if it is acceptable.
    fn position(&self, sequence: u32) -> Result<usize, ReplayError> {
        if let (Some(min), Some(max)) = (self.min(), self.max()) {
            if sequence < min {
                return Err(ReplayError::Duplicate(sequence));
            }
            if u64::from(sequence) > u64::from(max) + u64::from(Self::MAX_SKIP) {
                return Err(ReplayError::SkipsTooMany(sequence));
            }
        }
        match self.sequences.binary_search(&sequence) {
            Ok(_) => Err(ReplayError::Duplicate(sequence)),
            Err(index) => Ok(index),
        }
    }
}

impl ReplayGuard for SequenceWindow {
    fn accept(&mut self, sequence: u32) -> Result<(), ReplayError> {
        let index = self.position(sequence)?;
        self.sequences.insert(index, sequence);
        if self.sequences.len() > Self::CAPACITY {
            self.sequences.remove(0);
        }
        Ok(())
    }
}

/// The next sequence number a user must send.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct StrictSequence {
    next: u32,
}

impl StrictSequence {
    pub const fn new(next: u32) -> Self {
        Self { next }
    }

    pub const fn next(&self) -> u32 {
        self.next
    }
}

impl ReplayGuard for StrictSequence {
    fn accept(&mut self, sequence: u32) -> Result<(), ReplayError> {
        if sequence < self.next {
            return Err(ReplayError::Duplicate(sequence));
        }
        if sequence > self.next {
            return Err(ReplayError::OutOfOrder { expected: self.next, received: sequence });
        }
        self.next = sequence.checked_add(1).ok_or(ReplayError::Exhausted)?;
        Ok(())
    }
}

/// Which replay protection new posts are checked against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReplayPolicy {
    #[default]
    Window,
    Strict,
}

/// Per-user replay state as stored in the `userkey` table.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum SequenceState {
    Window(SequenceWindow),
    Strict(StrictSequence),
}

impl SequenceState {
    /// Fresh state for a user who has never posted.
    pub fn new(policy: ReplayPolicy) -> Self {
        match policy {
            ReplayPolicy::Window => Self::Window(SequenceWindow::default()),
            ReplayPolicy::Strict => Self::Strict(StrictSequence::default()),
        }
    }

    pub fn policy(&self) -> ReplayPolicy {
        match self {
            Self::Window(_) => ReplayPolicy::Window,
            Self::Strict(_) => ReplayPolicy::Strict,
        }
    }

    /// Convert to `policy` without reopening any sequence number already accepted.
    ///
    /// A window becomes a counter positioned after its largest sequence. A counter becomes a
    /// window holding only the last accepted sequence, so nothing below it can be replayed.
    pub fn migrate(self, policy: ReplayPolicy) -> Result<Self, ReplayError> {
        match (self, policy) {
            (state @ Self::Window(_), ReplayPolicy::Window)
            | (state @ Self::Strict(_), ReplayPolicy::Strict) => Ok(state),
            (Self::Window(window), ReplayPolicy::Strict) => {
                let next = match window.max() {
                    None => 0,
                    Some(max) => max.checked_add(1).ok_or(ReplayError::Exhausted)?,
                };
                Ok(Self::Strict(StrictSequence::new(next)))
            }
            (Self::Strict(strict), ReplayPolicy::Window) => {
                let sequences = strict.next.checked_sub(1).into_iter().collect();
                Ok(Self::Window(SequenceWindow { sequences }))
            }
        }
    }

    /// Migrate to `policy` if needed, then accept `sequence`.
    pub fn accept_with(&mut self, policy: ReplayPolicy, sequence: u32) -> Result<(), ReplayError> {
        let mut state = self.clone().migrate(policy)?;
        state.accept(sequence)?;
        *self = state;
        Ok(())
    }
}

impl ReplayGuard for SequenceState {
    fn accept(&mut self, sequence: u32) -> Result<(), ReplayError> {
        match self {
            Self::Window(window) => window.accept(sequence),
            Self::Strict(strict) => strict.accept(sequence),
        }
    }
}
