//! Core types shared by every cookbook crate.
//!
//! Only the pieces that genuinely cross crate boundaries live here: the
//! rootcause-backed `Result` alias and the strongly-typed identifiers.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConversationSessionId, ParseIdError, TurnId};
