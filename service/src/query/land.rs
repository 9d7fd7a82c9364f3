//! [`Query`] collection related to a single [`Land`].

use common::operations::By;

use crate::domain::{land, Land};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Land`] by its [`land::Id`].
pub type ById = DatabaseQuery<By<Option<Land>, land::Id>>;
