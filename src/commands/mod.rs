//! Command Module
//!
//! This module turns textual commands into calls on the string store.
//! It receives a command as a list of byte strings, executes it against the
//! storage engine, and returns a [`Reply`].
//!
//! ## Architecture
//!
//! ```text
//! Command line
//!       │
//!       ▼
//! ┌─────────────────┐
//! │   Tokenizer     │  (shell binary)
//! └────────┬────────┘
//!          │  Vec<Bytes>
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  StringStore    │  (storage module)
//! └─────────────────┘
//! ```

pub mod handler;
pub mod reply;

// Re-export the main command handler
pub use handler::{CommandError, CommandHandler};
pub use reply::Reply;
