//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Stream token sweep: removes expired stream tokens at a fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
