//! ringlamp — run-length compaction and wire encoding for a 24-element RGB lamp ring.

pub mod config;
pub mod editor;
pub mod error;
pub mod led;
pub mod protocol;
pub mod publish;

pub use error::RinglampError;
