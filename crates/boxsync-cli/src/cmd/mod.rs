//! One module per subcommand.

pub mod diff;
pub mod refresh;
pub mod stats;
pub mod timeline;
pub mod update;
