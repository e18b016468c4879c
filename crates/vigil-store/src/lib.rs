//! Persistence for the Vigil moderation pipeline
//!
//! The pipeline never talks to a database directly. It reads content items and
//! reports through [`ModerationStore`] and writes every multi-step change as a
//! single [`ItemCommit`], which a store applies atomically after checking the
//! item's optimistic concurrency version.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: in-process maps, for tests and embedding
//! - [`FileStore`]: JSON snapshot on disk, rewritten on every commit
//!
//! # Example
//!
//! ```rust,ignore
//! use vigil_store::{MemoryStore, ModerationStore};
//!
//! # async fn example(item: vigil_common::ContentItem) -> vigil_common::Result<()> {
//! let store = MemoryStore::new();
//! store.insert_content(item.clone()).await?;
//! assert!(store.content(&item.id).await?.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

/// Content and report storage backends
pub mod storage;

pub use storage::{FileStore, ItemCommit, MemoryStore, ModerationStore};
