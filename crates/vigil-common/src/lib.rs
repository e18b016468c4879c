//! Core types for the Vigil moderation pipeline
//!
//! - **Identifiers**: time-ordered [`Tid`]s behind [`ContentId`] and [`ReportId`],
//!   opaque [`UserId`]s assigned by the surrounding platform
//! - **Content**: [`ContentItem`] with its [`Visibility`] state and append-only notes
//! - **Reports**: [`Report`] lifecycle (`pending → approved | denied`)
//! - **Errors**: [`ModerationError`] with a machine-readable [`ErrorKind`]

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
/// Time-ordered identifiers
pub mod tid;
pub mod types;

pub use error::{ErrorKind, ModerationError, Result};
pub use tid::Tid;
pub use types::*;
