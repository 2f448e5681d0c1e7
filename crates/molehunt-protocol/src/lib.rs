//! Shared vocabulary for the Molehunt game engine.
//!
//! This crate defines the types that cross the engine's boundary:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`]): newtype keys used everywhere.
//! - **Routing** ([`Recipient`]): who a notice is addressed to.
//! - **Notices** ([`Notice`], [`RoleCard`], [`Side`]): the side-effect
//!   descriptions the engine hands back to the transport collaborator.
//!
//! The engine never talks to a chat transport directly. Every operation
//! returns `(Recipient, Notice)` pairs and the transport decides how to
//! render and deliver them. Keeping this vocabulary in its own crate means
//! a transport binary can depend on it without pulling in the engine.

mod types;

pub use types::{
    Candidate, Notice, PlayerId, Recipient, RoleCard, RoomId, Side,
};
