//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache during server
//! operation.
//!
//! # Tasks
//! - Event Logger: Logs every notification published by the cache

mod event_log;

pub use event_log::spawn_event_logger;
