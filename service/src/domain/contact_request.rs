//! [`ContactRequest`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{land, user};
#[cfg(doc)]
use crate::domain::{Land, User};

use super::define_text;

/// Message from a prospective lessee to the owner of a [`Land`].
///
/// Never deleted, so serves as an audit trail of negotiations.
#[derive(Clone, Debug)]
pub struct ContactRequest {
    /// ID of this [`ContactRequest`].
    pub id: Id,

    /// ID of the [`Land`] this [`ContactRequest`] is about.
    pub land_id: land::Id,

    /// ID of the [`User`] who sent this [`ContactRequest`].
    pub from_user: user::Id,

    /// ID of the [`User`] owning the [`Land`] at the moment this
    /// [`ContactRequest`] was sent.
    pub to_owner: user::Id,

    /// [`Message`] of this [`ContactRequest`].
    pub message: Message,

    /// [`Status`] of this [`ContactRequest`].
    pub status: Status,

    /// [`DateTime`] when this [`ContactRequest`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`ContactRequest`] was decided, if it was.
    pub decided_at: Option<DecisionDateTime>,
}

impl ContactRequest {
    /// Creates a new [`Status::Pending`] [`ContactRequest`].
    ///
    /// # Errors
    ///
    /// If the `from_user` is the `to_owner`.
    pub fn new(
        land_id: land::Id,
        from_user: user::Id,
        to_owner: user::Id,
        message: Message,
    ) -> Result<Self, SelfContactError> {
        if from_user == to_owner {
            return Err(SelfContactError(from_user));
        }

        Ok(Self {
            id: Id::new(),
            land_id,
            from_user,
            to_owner,
            message,
            status: Status::Pending,
            created_at: DateTimeOf::now(),
            decided_at: None,
        })
    }

    /// Applies the provided [`Decision`] to this [`ContactRequest`].
    ///
    /// # Errors
    ///
    /// If this [`ContactRequest`] is decided already.
    pub fn decide(&mut self, decision: Decision) -> Result<(), AlreadyDecided> {
        if self.status != Status::Pending {
            return Err(AlreadyDecided(self.status));
        }

        self.status = match decision {
            Decision::Accept => Status::Accepted,
            Decision::Reject => Status::Rejected,
        };
        self.decided_at = Some(DateTimeOf::now());
        Ok(())
    }
}

/// ID of a [`ContactRequest`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_text! {
    #[doc = "Message of a [`ContactRequest`]. May be empty."]
    Message { max_len: 2000, allow_empty: true }
}

define_kind! {
    #[doc = "Status of a [`ContactRequest`]."]
    enum Status {
        #[doc = "[`ContactRequest`] awaits a [`Decision`] of the owner."]
        Pending = 1,

        #[doc = "[`ContactRequest`] is accepted by the owner."]
        Accepted = 2,

        #[doc = "[`ContactRequest`] is rejected by the owner."]
        Rejected = 3,
    }
}

define_kind! {
    #[doc = "Decision of a [`Land`] owner upon a [`ContactRequest`]."]
    enum Decision {
        #[doc = "Accept the [`ContactRequest`] and lease the [`Land`]."]
        Accept = 1,

        #[doc = "Reject the [`ContactRequest`]."]
        Reject = 2,
    }
}

/// Error of a [`User`] contacting themselves.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`User(id: {_0})` cannot contact themselves")]
pub struct SelfContactError(#[error(not(source))] pub user::Id);

/// Error of deciding an already decided [`ContactRequest`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`ContactRequest` is already `{_0}`")]
pub struct AlreadyDecided(#[error(not(source))] pub Status);

/// [`DateTime`] when a [`ContactRequest`] was created.
pub type CreationDateTime = DateTimeOf<(ContactRequest, unit::Creation)>;

/// [`DateTime`] when a [`ContactRequest`] was decided.
pub type DecisionDateTime = DateTimeOf<(ContactRequest, unit::Decision)>;

#[cfg(test)]
mod spec {
    use crate::domain::{land, user};

    use super::{ContactRequest, Decision, Message, Status};

    fn request() -> ContactRequest {
        ContactRequest::new(
            land::Id::new(),
            user::Id::new(),
            user::Id::new(),
            Message::new("Interested").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn forbids_self_contact() {
        let user = user::Id::new();
        assert!(ContactRequest::new(
            land::Id::new(),
            user,
            user,
            Message::new("").unwrap(),
        )
        .is_err());
    }

    #[test]
    fn decides_once() {
        for (decision, status) in [
            (Decision::Accept, Status::Accepted),
            (Decision::Reject, Status::Rejected),
        ] {
            let mut req = request();
            assert_eq!(req.status, Status::Pending);
            assert!(req.decided_at.is_none());

            req.decide(decision).unwrap();
            assert_eq!(req.status, status);
            assert!(req.decided_at.is_some());

            for again in [Decision::Accept, Decision::Reject] {
                let err = req.decide(again).unwrap_err();
                assert_eq!(err.0, status);
                assert_eq!(req.status, status);
            }
        }
    }

    #[test]
    fn bounds_message_length() {
        assert!(Message::new("").is_some());
        assert!(Message::new("a".repeat(2000)).is_some());
        assert!(Message::new("a".repeat(2001)).is_none());
        assert!(Message::new(" padded ").is_none());
    }
}
