//! The interaction core of the outreach directory.
//!
//! Components follow a message/update/view shape: each one owns its state,
//! takes messages through `update`, and renders a plain view model through
//! `view`. Nothing here awaits except [`app::App`], which drives the
//! components against an [`idprovider::IdentityProvider`] and an
//! [`gateway::EntryStore`].

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

#[macro_use]
extern crate tracing;

pub mod app;
pub mod components;
pub mod gateway;
pub mod idprovider;
pub mod session;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod utils;

pub use app::App;
pub use gateway::{EntryStore, GatewayError, Mutation, MutationGateway, MutationOutcome};
pub use idprovider::interface::{
    AuthState, IdentityProvider, IdpError, SignInFailure, SignInOutcome, SignInRequest,
};
pub use session::{SessionContext, SessionState, SignInDecision, SignInHandlers};
