//! Shared vocabulary for Arenastake.
//!
//! This crate defines the types every other layer agrees on:
//!
//! - **Identity** ([`AccountId`], [`SessionId`], [`RequestId`], [`FactionId`],
//!   [`Asset`]): newtypes so a session id can never be passed where an
//!   account id is expected.
//! - **Notifications** ([`Notification`], [`Envelope`]): the structured
//!   events the arena and the absorber emit for indexers and UIs.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become bytes.
//! - **Errors** ([`ProtocolError`], [`ErrorKind`]): codec failures and the
//!   taxonomy every core error maps onto.
//!
//! # Architecture
//!
//! ```text
//! Host collaborators ─┐
//!                     ├─→ Arena / Absorber ─→ Notification ─→ Envelope ─→ Codec
//! Protocol (this) ────┘
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::{ErrorKind, ProtocolError};
pub use types::{
    AccountId, Amount, Asset, Envelope, FactionId, Notification, RandomWord,
    RequestId, SessionId, SessionStatus, Timestamp,
};
