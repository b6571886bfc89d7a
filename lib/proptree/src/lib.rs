#![allow(clippy::len_without_is_empty)]
#![allow(clippy::new_without_default)]

//! Shared vocabulary of the media backend: property handles, tree events,
//! the subscription/courier seams, user events and the image loader
//! contract. The property tree implementation and the protocol endpoints
//! both speak in these terms.

pub mod config;
pub mod event;
pub mod image;
pub mod logging;
pub mod prop;
pub mod sub;

pub use crate::event::{Action, ActionMap, PropEvent, TrackKind, UserEvent};
pub use crate::prop::{Prop, PropKey, PropNode, SetValue};
pub use crate::sub::{Courier, PropTree, SubCallback, SubHandle, SubRequest, Task, TaskRunner};
