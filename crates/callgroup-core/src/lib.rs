//! # callgroup-core
//!
//! Concurrency-partitioning registry for callback schedulers.
//!
//! A [`CallbackGroup`] is a named unit of concurrency granularity: it
//! holds weak references to schedulable endpoints (subscriptions, timers,
//! services, clients, publishers, generic waitables) and declares whether
//! an external executor may overlap their callbacks ([`GroupMode`]). The
//! group never executes callbacks, never polls for readiness, and never
//! owns the endpoints it tracks; it is pure in-process bookkeeping plus
//! the two lock-free flags the executor coordinates through.
//!
//! Registration is restricted: endpoints enter a group only through the
//! [`Node`] wiring views, while the broad public surface is read and
//! lookup only.
//!
//! ## Modules
//!
//! - `mode` - Concurrency mode (exclusive vs. reentrant)
//! - `entity` - Schedulable endpoint traits and handle type
//! - `group` - The callback group registry and executor flags
//! - `node` - Trusted wiring layer (the only mutation path)
//! - `error` - Wiring-boundary error types
//! - `spinlock` - Internal spinlock guarding the registry
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

#![allow(dead_code)]

pub mod entity;
pub mod env;
pub mod error;
pub mod group;
pub mod kprint;
pub mod mode;
pub mod node;
pub mod spinlock;

// Re-exports for convenience
pub use entity::{
    Client, EntityHandle, Publisher, Schedulable, Service, Subscription, Timer, Waitable,
};
pub use error::{WiringError, WiringResult};
pub use group::CallbackGroup;
pub use kprint::{set_flush_enabled, set_log_level, LogLevel};
pub use mode::GroupMode;
pub use node::{Node, NodeServices, NodeTimers, NodeTopics, NodeWaitables};
pub use spinlock::SpinLock;
