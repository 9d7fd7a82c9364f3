//! [`ContactRequest`]-related endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, decide_contact::Decided},
    domain::{self, contact_request, land, user},
    query, Command as _,
};

use crate::{api, AsError, Error, Service, Session};

/// Message of a prospective lessee to the owner of a [`Land`].
///
/// [`Land`]: api::Land
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    /// ID of this [`ContactRequest`].
    pub id: contact_request::Id,

    /// ID of the [`Land`] this [`ContactRequest`] is about.
    ///
    /// [`Land`]: api::Land
    pub land_id: land::Id,

    /// ID of the user who sent this [`ContactRequest`].
    pub from_user: user::Id,

    /// ID of the owner this [`ContactRequest`] is addressed to.
    pub to_owner: user::Id,

    /// Message of this [`ContactRequest`].
    pub message: String,

    /// Status of this [`ContactRequest`]: `pending`, `accepted` or
    /// `rejected`.
    pub status: &'static str,

    /// When this [`ContactRequest`] was sent.
    pub created_at: contact_request::CreationDateTime,

    /// When this [`ContactRequest`] was decided, if it was.
    pub decided_at: Option<contact_request::DecisionDateTime>,
}

impl From<domain::ContactRequest> for ContactRequest {
    fn from(req: domain::ContactRequest) -> Self {
        Self {
            id: req.id,
            land_id: req.land_id,
            from_user: req.from_user,
            to_owner: req.to_owner,
            message: req.message.to_string(),
            status: req.status.as_str(),
            created_at: req.created_at,
            decided_at: req.decided_at,
        }
    }
}

/// Body of a new [`ContactRequest`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewContactRequest {
    /// Message to the owner, may be empty.
    pub message: String,
}

/// [`ContactRequest`] along with the [`Land`] it has leased.
///
/// [`Land`]: api::Land
#[derive(Clone, Debug, Serialize)]
pub struct Decision {
    /// Decided [`ContactRequest`].
    pub request: ContactRequest,

    /// [`Land`] leased by accepting the [`ContactRequest`].
    ///
    /// [`Land`]: api::Land
    pub land: Option<api::Land>,
}

impl From<Decided> for Decision {
    fn from(decided: Decided) -> Self {
        Self {
            request: decided.request.into(),
            land: decided.land.map(Into::into),
        }
    }
}

/// Sends a new [`ContactRequest`] about the [`Land`] to its owner.
///
/// # Errors
///
/// Possible error codes:
/// - `LAND_NOT_EXISTS` - [`Land`] with the provided ID does not exist;
/// - `LAND_NOT_AVAILABLE` - [`Land`] is not open for contact;
/// - `SELF_CONTACT` - owner cannot contact themselves;
/// - `INVALID_MESSAGE` - message is too long.
///
/// [`Land`]: api::Land
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn request(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<land::Id>, PathRejection>,
    body: Result<Json<NewContactRequest>, JsonRejection>,
) -> Result<(http::StatusCode, Json<ContactRequest>), Error> {
    let land_id = api::id(id)?;
    let Json(body) = body.map_err(AsError::into_error)?;
    let message = body.message.trim().parse().map_err(|_| {
        Error::new(
            "INVALID_MESSAGE",
            http::StatusCode::BAD_REQUEST,
            &"`message` is too long",
        )
    })?;

    let req = service
        .execute(command::RequestContact {
            land_id,
            from_user: session.user_id,
            message,
        })
        .await
        .map_err(AsError::into_error)?;
    Ok((http::StatusCode::CREATED, Json(req.into())))
}

/// Lists [`ContactRequest`]s about the [`Land`], newest first.
///
/// Only the owner of the [`Land`] may see them.
///
/// # Errors
///
/// Possible error codes:
/// - `LAND_NOT_EXISTS` - [`Land`] with the provided ID does not exist;
/// - `NOT_OWNER` - authenticated user doesn't own the [`Land`].
///
/// [`Land`]: api::Land
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn of_land(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<land::Id>, PathRejection>,
) -> Result<Json<Vec<ContactRequest>>, Error> {
    let land_id = api::id(id)?;
    let land = service
        .execute(query::land::ById::by(land_id))
        .await
        .map_err(AsError::into_error)?
        .ok_or(api::NotFoundError::Land)?;
    if !land.is_owned_by(session.user_id) {
        return Err(api::PrivilegeError::Owner.into());
    }

    let reqs = service
        .execute(query::contact_requests::ByLand::by(land_id))
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(reqs.into_iter().map(Into::into).collect()))
}

/// Lists [`ContactRequest`]s addressed to the authenticated user, newest
/// first.
///
/// # Errors
///
/// If the database fails.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn inbox(
    Extension(service): Extension<Service>,
    session: Session,
) -> Result<Json<Vec<ContactRequest>>, Error> {
    let reqs = service
        .execute(query::contact_requests::ForOwner::by(session.user_id))
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(reqs.into_iter().map(Into::into).collect()))
}

/// Accepts the [`ContactRequest`], leasing its [`Land`] to the requester.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTACT_REQUEST_NOT_EXISTS` - [`ContactRequest`] does not exist;
/// - `NOT_OWNER` - authenticated user doesn't own the [`Land`];
/// - `ALREADY_DECIDED` - [`ContactRequest`] is decided already;
/// - `INVALID_LAND_STATUS` - [`Land`] cannot be leased anymore.
///
/// [`Land`]: api::Land
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn accept(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<contact_request::Id>, PathRejection>,
) -> Result<Json<Decision>, Error> {
    decide(&service, session, api::id(id)?, contact_request::Decision::Accept)
        .await
}

/// Rejects the [`ContactRequest`], notifying its sender.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTACT_REQUEST_NOT_EXISTS` - [`ContactRequest`] does not exist;
/// - `NOT_OWNER` - authenticated user doesn't own the [`Land`];
/// - `ALREADY_DECIDED` - [`ContactRequest`] is decided already.
///
/// [`Land`]: api::Land
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn reject(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<contact_request::Id>, PathRejection>,
) -> Result<Json<Decision>, Error> {
    decide(&service, session, api::id(id)?, contact_request::Decision::Reject)
        .await
}

/// Applies the `decision` of the authenticated owner to the
/// [`ContactRequest`].
async fn decide(
    service: &Service,
    session: Session,
    request_id: contact_request::Id,
    decision: contact_request::Decision,
) -> Result<Json<Decision>, Error> {
    service
        .execute(command::DecideContact {
            request_id,
            decider_id: session.user_id,
            decision,
        })
        .await
        .map_err(AsError::into_error)
        .map(|decided| Json(decided.into()))
}

impl AsError for command::request_contact::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::LandNotExists(_) => api::NotFoundError::Land.into(),
            Self::UserNotExists(_) => api::NotFoundError::User.into(),
            Self::LandNotOpen(_) => Error::new(
                "LAND_NOT_AVAILABLE",
                http::StatusCode::CONFLICT,
                self,
            ),
            Self::SelfContact(e) => {
                Error::new("SELF_CONTACT", http::StatusCode::BAD_REQUEST, e)
            }
        })
    }
}

impl AsError for command::decide_contact::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Transition(e) => return e.try_as_error(),
            Self::RequestNotExists(_) => {
                api::NotFoundError::ContactRequest.into()
            }
            Self::LandNotExists(_) => api::NotFoundError::Land.into(),
            Self::NotOwner(_) => api::PrivilegeError::Owner.into(),
            Self::AlreadyDecided(e) => {
                Error::new("ALREADY_DECIDED", http::StatusCode::CONFLICT, e)
            }
            Self::Conflict(_) | Self::LandConflict(_) => {
                api::ConflictError::Concurrent.into()
            }
        })
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{decide_contact, request_contact},
        domain::{contact_request, land, user},
    };

    use crate::AsError as _;

    #[test]
    fn maps_contact_errors() {
        let closed = request_contact::ExecutionError::LandNotOpen(
            land::Status::Leased,
        )
        .as_error();
        assert_eq!(closed.code, "LAND_NOT_AVAILABLE");
        assert_eq!(closed.status_code, http::StatusCode::CONFLICT);

        let missing = decide_contact::ExecutionError::RequestNotExists(
            contact_request::Id::new(),
        )
        .as_error();
        assert_eq!(missing.code, "CONTACT_REQUEST_NOT_EXISTS");
        assert_eq!(missing.status_code, http::StatusCode::NOT_FOUND);

        let stranger =
            decide_contact::ExecutionError::NotOwner(user::Id::new())
                .as_error();
        assert_eq!(stranger.code, "NOT_OWNER");
    }
}
