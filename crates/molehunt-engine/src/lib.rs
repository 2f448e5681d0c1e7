//! The Molehunt game session engine.
//!
//! Runs many concurrent instances of a hidden-impostor party game, one
//! per room: a lobby gathers players, roles and a shared secret are
//! dealt, discussion runs on a timer, ballots are collected and
//! resolved, and a surviving impostor may get a time-boxed guess at the
//! secret. The engine is a library: it owns the lifecycle, the
//! concurrency, and the math, and hands every outward effect to its
//! caller as `(Recipient, Notice)` values.
//!
//! # Key types
//!
//! - [`GameEngine`]: the public API, one per process
//! - [`Phase`]: the session lifecycle state machine
//! - [`ModeName`] / [`ModeConfig`]: the fixed game mode table
//! - [`SessionStore`]: per-room locked session registry
//! - [`EngineError`]: typed, recoverable failures
//!
//! # Concurrency
//!
//! Sessions live behind per-room locks; every decision is made in the
//! same locked scope as the write it guards. Phase deadlines are armed
//! on the generation-checked scheduler from `molehunt-timer`, so a
//! timer firing after its phase already ended is a silent no-op.

mod deck;
mod engine;
mod error;
mod mode;
mod phase;
mod roles;
mod session;
mod store;
mod vote;

pub use deck::{matches_guess, SecretDeck};
pub use engine::{
    EngineConfig, EngineEvent, GameEngine, GuessReceipt, Notices, RoomInfo, VoteReceipt,
};
pub use error::{EngineError, VoteRejection};
pub use mode::{EliminationVariant, ModeConfig, ModeName};
pub use phase::Phase;
pub use roles::{Assignment, assign};
pub use session::{PlayerEntry, Session};
pub use store::SessionStore;
pub use vote::{EliminationPick, pick_eliminated, tally};
