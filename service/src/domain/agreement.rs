//! [`Agreement`] definitions.

use common::define_kind;

use crate::domain::{object, Land, User};

/// Snapshot of parties and terms to render a lease agreement from.
#[derive(Clone, Debug)]
pub enum Agreement {
    /// Agreement signed by the [`Land`] owner only.
    OwnerSigned {
        /// Snapshot of the [`Land`].
        land: Land,

        /// Owner of the [`Land`].
        owner: User,
    },

    /// Agreement signed by both the owner and the lessee.
    Final {
        /// Snapshot of the [`Land`].
        land: Land,

        /// Owner of the [`Land`].
        owner: User,

        /// Lessee of the [`Land`].
        lessee: User,

        /// URL of the previously rendered [`Agreement::OwnerSigned`].
        owner_document: object::Url,
    },
}

impl Agreement {
    /// Returns the [`Stage`] of this [`Agreement`].
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::OwnerSigned { .. } => Stage::OwnerSigned,
            Self::Final { .. } => Stage::Final,
        }
    }

    /// Returns the [`Land`] of this [`Agreement`].
    #[must_use]
    pub const fn land(&self) -> &Land {
        match self {
            Self::OwnerSigned { land, .. } | Self::Final { land, .. } => land,
        }
    }

    /// Returns the owner of the [`Land`] of this [`Agreement`].
    #[must_use]
    pub const fn owner(&self) -> &User {
        match self {
            Self::OwnerSigned { owner, .. } | Self::Final { owner, .. } => owner,
        }
    }

    /// Returns the lessee of this [`Agreement`], if signed already.
    #[must_use]
    pub const fn lessee(&self) -> Option<&User> {
        match self {
            Self::OwnerSigned { .. } => None,
            Self::Final { lessee, .. } => Some(lessee),
        }
    }

    /// Returns the URL of the owner-signed document this [`Agreement`]
    /// supersedes, if any.
    #[must_use]
    pub const fn owner_document(&self) -> Option<&object::Url> {
        match self {
            Self::OwnerSigned { .. } => None,
            Self::Final { owner_document, .. } => Some(owner_document),
        }
    }
}

define_kind! {
    #[doc = "Stage of an [`Agreement`]."]
    enum Stage {
        #[doc = "[`Agreement::OwnerSigned`]."]
        OwnerSigned = 1,

        #[doc = "[`Agreement::Final`]."]
        Final = 2,
    }
}
