//! Linkpulse checks batches of URLs for reachability in the background.
//!
//! A submitted batch becomes a task: the durable store assigns it an id and
//! an all-"checking" status map, a bounded queue hands it to one of a fixed
//! pool of workers, and the worker probes each link sequentially, writing
//! every result back to the store as it lands. Callers either poll the store
//! or block with a bounded wait until the task resolves.
pub mod config;
pub mod logger;
pub mod message;
pub mod prober;
pub mod runnable;
pub mod service;
pub mod store;
pub mod worker;
