//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: Removes expired entries from every namespace at a fixed interval

mod sweeper;

pub use sweeper::spawn_sweep_task;
