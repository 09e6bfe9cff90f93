/// Message module for the linkpulse link checking service
///
/// This module defines the data structures shared between the dispatcher,
/// the workers and the durable store: the per-link status, the persisted
/// task record and the queue message handed to workers.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Status of a single link within a task.
///
/// A link starts as `Checking` and transitions exactly once to either
/// `Available` or `NotAvailable` when its probe completes. The serialized
/// form is the wire string stored on disk and returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    #[serde(rename = "checking")]
    Checking,
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "not available")]
    NotAvailable,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkStatus::Checking => "checking",
            LinkStatus::Available => "available",
            LinkStatus::NotAvailable => "not available",
        };
        f.write_str(s)
    }
}

/// Per-task result map, keyed by the original submitted link text.
pub type ResultMap = HashMap<String, LinkStatus>;

/// Persisted form of a task.
///
/// # Fields
/// * `id` - Unique, monotonically assigned task identifier
/// * `links` - The submitted links, in submission order, never rewritten
/// * `result` - Status per link; keys are always exactly `links`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: u64,
    pub links: Vec<String>,
    pub result: ResultMap,
}

/// Queue message handed to a worker.
///
/// `done` is advisory only; the authoritative completion signal is the
/// absence of `Checking` values in the stored result map.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: u64,
    pub links: Vec<String>,
    pub done: bool,
}
