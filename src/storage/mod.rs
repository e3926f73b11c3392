//! Storage Module
//!
//! This module provides the core storage functionality for stringkv: a
//! thread-safe, sharded string store with logical TTLs, the numeric encoding
//! rules behind the INCR family, and an optional background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      StringStore                            │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ (optional)
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use stringkv::storage::{SetOptions, StringStore, StoreError};
//! use bytes::Bytes;
//!
//! let store = StringStore::new();
//! let counter = Bytes::from("visits");
//!
//! assert_eq!(store.incr_by(&counter, 41), Ok(41));
//! assert_eq!(store.incr(&counter), Ok(42));
//!
//! store.set(Bytes::from("name"), Bytes::from("Ariz"), SetOptions::default()).unwrap();
//! assert_eq!(store.incr(&Bytes::from("name")), Err(StoreError::NotAnInteger));
//! ```

pub mod engine;
pub mod error;
pub mod expiry;
pub mod numeric;

// Re-export commonly used types
pub use engine::{
    Entry, SetOptions, SetReply, StoreConfig, StoreStats, StringStore, TtlState, DEFAULT_SHARDS,
    MAX_BIT_OFFSET, MAX_VALUE_SIZE,
};
pub use error::{StoreError, StoreResult};
pub use expiry::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper};
