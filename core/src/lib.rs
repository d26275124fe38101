//! nodrop-core: keeps a player's inventory across death and disconnect.
//!
//! Capture flattens live containers into snapshots (builder.rs), the
//! store holds one bundle per subject until it is restored once
//! (store/), and restore rebuilds live items from a bundle (restore.rs).
//! The controller ties those to host life-cycle triggers.

pub mod builder;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod memory_world;
pub mod restore;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod world;
