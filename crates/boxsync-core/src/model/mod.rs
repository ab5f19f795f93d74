//! The performer data model shared by every component.

mod performer;

pub use performer::{BodyModification, Image, Performer, PerformerUrl};
