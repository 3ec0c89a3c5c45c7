//! Background Tasks Module
//!
//! Tasks that run periodically next to a shared cache.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries at configured intervals
//! - Stats Feed: Publishes statistics snapshots on a watch channel

mod stats_feed;
mod sweep;

pub use stats_feed::spawn_stats_feed;
pub use sweep::spawn_sweep_task;
