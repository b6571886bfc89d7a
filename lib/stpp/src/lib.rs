#![allow(clippy::len_without_is_empty)]
#![allow(clippy::new_without_default)]

//! Server-side endpoint of STPP, the property protocol that mirrors the
//! backend's reactive property tree to remote UI clients over a websocket
//! connection. Clients subscribe to paths in the tree, receive incremental
//! change notifications, write values back, dispatch user events and fetch
//! image resources out of band.
//!
//! The crate owns the per-connection session state: the wire codecs (a
//! JSON and a binary encoding), the per-session identifier registry, the
//! subscription bookkeeping, inbound command dispatch, user-event decoding
//! and the image request pool. The property tree itself, the websocket
//! transport, the image backend and the task runners are collaborators
//! reached through the interfaces in the `proptree` crate.

pub mod config;
pub mod events;
pub mod image;
pub mod registry;
pub mod route;
pub mod session;
pub mod sub;
pub mod wire;

#[cfg(test)]
pub(crate) mod testutil;

pub use crate::session::{Env, FrameSink, Session, OPCODE_BINARY, OPCODE_TEXT};
pub use crate::wire::{FrameError, FrameResult, STPP_VERSION};
