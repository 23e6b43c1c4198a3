//! Persistence and embedded export for cann networks
//!
//! Two binary formats are provided:
//!
//! - `.pcn`: the full network state, checksummed, read and written.
//! - `.rnn`: a compact write-only image for embedded controllers.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod pcn;
pub mod rnn;
pub mod schemas;

pub use error::{Result, StorageError};
pub use pcn::{load, load_from_path, read_header, save, save_to_path, PcnHeader, PCN_VERSION};
pub use rnn::{export_embedded, export_embedded_to_path, RNN_VERSION};

/// Conventional file extension of the persistence format
pub const PCN_EXTENSION: &str = "pcn";

/// Conventional file extension of the embedded format
pub const RNN_EXTENSION: &str = "rnn";
