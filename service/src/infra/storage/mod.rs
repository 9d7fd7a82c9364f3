//! [`ObjectStore`]-related implementations.

pub mod fs;

use std::io;

use derive_more::{Display, Error as StdError, From};

pub use self::fs::Fs;

/// Object storing operation.
pub use common::Handler as ObjectStore;

/// [`ObjectStore`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// I/O operation failed.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),
}
