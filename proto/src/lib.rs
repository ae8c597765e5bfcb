//! Shared types for the Speaker Outreach directory. Everything here is plain
//! data that moves across the document store and identity provider
//! boundaries, so it all derives serde.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

pub mod category;
pub mod constants;
pub mod entry;
pub mod identity;

pub use category::{categories, resolve, CategoryDescriptor};
pub use entry::{Entry, EntryDraft, EntryId, EntryPatch, ValidationError};
pub use identity::{AuthErrorCode, SignInMethod, SessionUser};
