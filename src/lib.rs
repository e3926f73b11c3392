//! # stringkv - An In-Process String Key-Value Store
//!
//! stringkv is a thread-safe, in-memory store of binary-safe strings that
//! follows the semantics of the Redis string commands: conditional writes,
//! logical TTLs, range and bit access, and atomic integer/float arithmetic.
//!
//! ## Features
//!
//! - **Redis Semantics**: SET with NX/XX/EX/PX/KEEPTTL/GET, GETRANGE, SETBIT,
//!   INCRBYFLOAT, MSETNX and friends behave as Redis documents them
//! - **Concurrent**: Sharded storage with RwLock for concurrent access
//! - **TTL Support**: Expired keys are invisible immediately and purged lazily
//!   or by an optional background sweeper
//! - **Atomic Multi-Key Writes**: MSET and MSETNX are all-or-nothing
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              stringkv                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐                                     │
//! │  │   Shell     │───>│  Command    │  (optional text front end)          │
//! │  │ (stdin)     │    │  Handler    │                                     │
//! │  └─────────────┘    └──────┬──────┘                                     │
//! │                            │                                            │
//! │                            ▼                                            │
//! │                     ┌──────────────────────────────────────────────┐   │
//! │                     │               StringStore                    │   │
//! │                     │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │                     │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │                     │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! │                                               ▲                         │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use stringkv::{CommandHandler, Reply, StringStore};
//! use bytes::Bytes;
//! use std::sync::Arc;
//!
//! let store = Arc::new(StringStore::new());
//! let handler = CommandHandler::new(Arc::clone(&store));
//!
//! let cmd = |args: &[&str]| -> Vec<Bytes> {
//!     args.iter().map(|a| Bytes::from(a.to_string())).collect()
//! };
//!
//! assert_eq!(handler.execute(&cmd(&["SET", "key2", "hello"])), Reply::ok());
//! assert_eq!(handler.execute(&cmd(&["APPEND", "key2", "--world"])), Reply::integer(12));
//! assert_eq!(store.get(&Bytes::from("key2")), Some(Bytes::from("hello--world")));
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: The sharded string store, its errors, numeric encoding and
//!   the expiry sweeper
//! - [`commands`]: Command dispatch and replies for all supported commands
//!
//! ## Design Highlights
//!
//! ### Validate, Then Mutate
//!
//! Every operation checks its arguments and the current value before touching
//! anything, so a failed command leaves the store exactly as it was.
//!
//! ### Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: When a key is accessed, we check if it's expired
//! 2. **Active**: A background task periodically scans for expired keys
//!
//! This ensures memory is reclaimed even for keys that are never accessed again.

pub mod commands;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandHandler, Reply};
pub use storage::{
    start_expiry_sweeper, ExpiryConfig, ExpirySweeper, SetOptions, StoreConfig, StoreError,
    StringStore,
};

/// Version of stringkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
