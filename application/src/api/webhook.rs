//! Payment gateway webhook endpoints.

use axum::{body::Bytes, http::HeaderMap, Extension, Json};
use serde::Serialize;
use service::{
    command::{self, confirm_land_payment::Confirmed},
    domain::{land, payment},
    infra::payment as gateway,
    Command as _,
};

use crate::{api, AsError, Error, Service};

/// Name of the header carrying the Razorpay webhook signature.
const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// Acknowledgement of a received webhook.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ack {
    /// [`Land`] is leased by the confirmed payment.
    ///
    /// [`Land`]: api::Land
    Leased {
        /// Leased [`Land`].
        ///
        /// [`Land`]: api::Land
        land: api::Land,
    },

    /// Payment was confirmed by an earlier delivery.
    #[serde(rename_all = "camelCase")]
    Replayed {
        /// ID of the leased [`Land`].
        ///
        /// [`Land`]: api::Land
        land_id: land::Id,
    },

    /// Event is not related to any lease.
    Ignored {
        /// Kind of the ignored event.
        event: String,
    },
}

impl From<Confirmed> for Ack {
    fn from(confirmed: Confirmed) -> Self {
        match confirmed {
            Confirmed::Leased(land) => Self::Leased { land: land.into() },
            Confirmed::Replayed(land_id) => Self::Replayed { land_id },
            Confirmed::Ignored { kind } => Self::Ignored { event: kind },
        }
    }
}

/// Receives a signed Razorpay webhook.
///
/// The body is verified exactly as received, so it's never parsed before
/// the signature check.
///
/// # Errors
///
/// Possible error codes:
/// - `MISSING_SIGNATURE` - signature header is absent;
/// - `INVALID_SIGNATURE` - signature doesn't match the body;
/// - `MALFORMED_WEBHOOK` - signed body is not a valid event;
/// - `PAYMENT_MISMATCH` - captured payment doesn't match the pending one.
#[tracing::instrument(skip_all, fields(body.len = body.len()))]
pub async fn razorpay(
    Extension(service): Extension<Service>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>, Error> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            Error::new(
                "MISSING_SIGNATURE",
                http::StatusCode::BAD_REQUEST,
                &format!("`{SIGNATURE_HEADER}` header is required"),
            )
        })?;

    service
        .execute(command::ConfirmLandPayment {
            webhook: payment::Webhook {
                body: body.to_vec(),
                signature: signature.to_owned(),
            },
        })
        .await
        .map_err(AsError::into_error)
        .map(|confirmed| Json(confirmed.into()))
}

impl AsError for command::confirm_land_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Transition(e) => return e.try_as_error(),
            Self::Gateway(gateway::Error::Json(e)) => Error::new(
                "MALFORMED_WEBHOOK",
                http::StatusCode::BAD_REQUEST,
                e,
            ),
            Self::Gateway(e) => return e.try_as_error(),
            Self::InvalidSignature => {
                gateway::Error::InvalidSignature.try_as_error()?
            }
            Self::LandNotExists(_) => api::NotFoundError::Land.into(),
            Self::PaymentMismatch(_) => Error::new(
                "PAYMENT_MISMATCH",
                http::StatusCode::CONFLICT,
                self,
            ),
            Self::Conflict(_) => api::ConflictError::Concurrent.into(),
        })
    }
}
