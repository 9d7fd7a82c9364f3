//! [`Query`] collection related to multiple [`ContactRequest`]s.

use common::operations::By;

use crate::domain::{land, user, ContactRequest};
#[cfg(doc)]
use crate::{domain::Land, Query};

use super::DatabaseQuery;

/// Queries [`ContactRequest`]s addressed to the owner with the provided
/// [`user::Id`], newest first.
pub type ForOwner = DatabaseQuery<By<Vec<ContactRequest>, user::Id>>;

/// Queries [`ContactRequest`]s for the [`Land`] with the provided
/// [`land::Id`], newest first.
pub type ByLand = DatabaseQuery<By<Vec<ContactRequest>, land::Id>>;
