//! [`DocumentGenerator`]-related implementations.

pub mod html;

use derive_more::{Display, Error as StdError, From};

use crate::infra::storage;

pub use self::html::Html;

/// Document rendering operation.
pub use common::Handler as DocumentGenerator;

/// [`DocumentGenerator`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Rendered document cannot be stored.
    #[display("Failed to store document: {_0}")]
    Storage(storage::Error),
}
