//! Per-topic duplicate suppression and capture cap.

use crate::models::CandidateItem;
use std::collections::HashSet;

/// Outcome of offering a candidate to a [`Deduplicator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Same lower-cased (title, domain) already captured; the first one wins.
    Duplicate,
    /// The topic already holds `cap` items.
    CapReached,
}

/// Capture set for one topic during one collection pass.
#[derive(Debug)]
pub struct Deduplicator {
    cap: usize,
    seen: HashSet<(String, String)>,
    kept: Vec<CandidateItem>,
}

impl Deduplicator {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            seen: HashSet::new(),
            kept: Vec::new(),
        }
    }

    fn key(item: &CandidateItem) -> (String, String) {
        (item.title.to_lowercase(), item.domain.to_lowercase())
    }

    pub fn offer(&mut self, item: CandidateItem) -> Admission {
        if self.is_full() {
            return Admission::CapReached;
        }
        if !self.seen.insert(Self::key(&item)) {
            return Admission::Duplicate;
        }
        self.kept.push(item);
        Admission::Accepted
    }

    pub fn is_full(&self) -> bool {
        self.kept.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn into_items(self) -> Vec<CandidateItem> {
        self.kept
    }
}
