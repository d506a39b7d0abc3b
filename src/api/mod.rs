//! This mod is meant to hold most of the code for the library's client-facing API.
mod options;
mod wiring;

pub use options::RaftOptions;
pub use wiring::try_create_raft_part;
pub use wiring::RaftPartConfig;
pub use wiring::RaftPartCreationError;
