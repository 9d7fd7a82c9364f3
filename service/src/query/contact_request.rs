//! [`Query`] collection related to a single [`ContactRequest`].

use common::operations::By;

use crate::domain::{contact_request, ContactRequest};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`ContactRequest`] by its [`contact_request::Id`].
pub type ById =
    DatabaseQuery<By<Option<ContactRequest>, contact_request::Id>>;
