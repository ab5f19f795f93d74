//! boxsync-core: the synchronization engine for crowd-edited performer
//! databases ("boxes").
//!
//! Each box keeps an append-only log of accepted edits next to every
//! performer. This crate reconstructs a performer's exact state at any past
//! instant from that log, mirrors a whole box into a locally persisted
//! snapshot cache, and computes typed structural diffs between two performer
//! states so a caller can decide whether an automated write is safe.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per module; `anyhow` stays at the
//!   binary boundary.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod cache;
pub mod client;
pub mod compare;
pub mod country;
pub mod edit;
pub mod history;
pub mod model;
pub mod sites;
pub mod sync;
