//! [`Query`] collection related to multiple [`Land`]s.

use common::operations::By;

use crate::{domain::Land, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a list of [`Land`]s matching a [`read::land::list::Filter`],
/// newest first.
pub type List = DatabaseQuery<By<Vec<Land>, read::land::list::Filter>>;
