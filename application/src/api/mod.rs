//! HTTP API definitions.

pub mod contact;
pub mod land;
pub mod webhook;

use axum::{
    extract::{rejection::PathRejection, Path},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;

use crate::{define_error, AsError as _, Error};

pub use self::{contact::ContactRequest, land::Land};

/// Creates a [`Router`] of all the API endpoints.
///
/// Endpoints expect [`Service`] and [`Auth`] to be provided as
/// [`Extension`]s.
///
/// [`Auth`]: crate::Auth
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
pub fn router() -> Router {
    Router::new()
        .route("/api/lands", get(land::list).post(land::create))
        .route("/api/lands/:id", get(land::get))
        .route("/api/lands/:id/owner-sign", post(land::owner_sign))
        .route("/api/lands/:id/user-sign", post(land::user_sign))
        .route("/api/lands/:id/pay", post(land::pay))
        .route("/api/lands/:id/withdraw", post(land::withdraw))
        .route(
            "/api/lands/:id/contact",
            get(contact::of_land).post(contact::request),
        )
        .route("/api/contact", get(contact::inbox))
        .route("/api/contact/:id/accept", post(contact::accept))
        .route("/api/contact/:id/reject", post(contact::reject))
        .route("/api/webhook/razorpay", post(webhook::razorpay))
}

/// Unwraps the single parameter of a request path.
///
/// # Errors
///
/// If the path parameter cannot be parsed.
fn id<T: DeserializeOwned + Send>(
    path: Result<Path<T>, PathRejection>,
) -> Result<T, Error> {
    path.map(|Path(id)| id).map_err(|e| e.into_error())
}

define_error! {
    enum PrivilegeError {
        #[code = "NOT_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must own the `Land`"]
        Owner,

        #[code = "NOT_LESSEE"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be the lessee of the `Land`"]
        Lessee,
    }
}

define_error! {
    enum NotFoundError {
        #[code = "LAND_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Land` with the provided ID does not exist"]
        Land,

        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the provided ID does not exist"]
        User,

        #[code = "CONTACT_REQUEST_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`ContactRequest` with the provided ID does not exist"]
        ContactRequest,
    }
}

define_error! {
    enum ConflictError {
        #[code = "CONCURRENT_MODIFICATION"]
        #[status = CONFLICT]
        #[message = "Entity is modified concurrently, retry the request"]
        Concurrent,
    }
}
