//! [`Error`]-related definitions.

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::{
    domain::land,
    infra::{database, document, payment},
};
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// HTTP API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Creates a new [`Error`] with a message not known in advance.
    #[must_use]
    pub fn new(
        code: Code,
        status_code: http::StatusCode,
        msg: &impl ToString,
    ) -> Self {
        Self {
            code,
            status_code,
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self::new(
            "INTERNAL_SERVER_ERROR",
            http::StatusCode::INTERNAL_SERVER_ERROR,
            msg,
        )
    }

    /// Creates a new [`Error`] representing invalid request data.
    #[must_use]
    pub fn bad_request(msg: &impl ToString) -> Self {
        Self::new("BAD_REQUEST", http::StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

/// JSON body of an [`Error`] response.
#[derive(Debug, Serialize)]
struct Body<'e> {
    /// [`Error::code`].
    code: Code,

    /// [`Error::message`].
    message: &'e str,

    /// Frames of the [`Error::backtrace`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    backtrace: Vec<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            log::error!("{self}");
        }

        let body = Body {
            code: self.code,
            message: &self.message,
            backtrace: self
                .backtrace
                .iter()
                .flat_map(|trace| trace.iter())
                .map(ToString::to_string)
                .collect(),
        };
        (self.status_code, Json(body)).into_response()
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::bad_request(self))
    }
}

impl AsError for JsonRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new("INVALID_JSON", self.status(), &self.body_text()))
    }
}

impl AsError for QueryRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::bad_request(&self.body_text()))
    }
}

impl AsError for PathRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new("INVALID_PATH", self.status(), &self.body_text()))
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for land::TransitionError {
    fn try_as_error(&self) -> Option<Error> {
        let code = match self {
            Self::InvalidStatus { .. } => "INVALID_LAND_STATUS",
            Self::OwnerAsLessee => "OWNER_AS_LESSEE",
            Self::PaymentNotRequired => "PAYMENT_NOT_REQUIRED",
            Self::PaymentRequired => "PAYMENT_REQUIRED",
            Self::NoPendingPayment => "NO_PENDING_PAYMENT",
        };
        Some(Error::new(code, http::StatusCode::CONFLICT, self))
    }
}

impl AsError for payment::Error {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::InvalidSignature => Error::new(
                "INVALID_SIGNATURE",
                http::StatusCode::BAD_REQUEST,
                self,
            ),
            Self::Timeout => Error::new(
                "PAYMENT_GATEWAY_TIMEOUT",
                http::StatusCode::BAD_GATEWAY,
                self,
            ),
            Self::Http(_) | Self::Rejected { .. } | Self::Json(_) => {
                Error::new(
                    "PAYMENT_GATEWAY_FAILED",
                    http::StatusCode::BAD_GATEWAY,
                    self,
                )
            }
        })
    }
}

impl AsError for document::Error {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new(
            "DOCUMENT_GENERATION_FAILED",
            http::StatusCode::BAD_GATEWAY,
            self,
        ))
    }
}

#[cfg(test)]
mod spec {
    use service::domain::land;

    use super::AsError as _;

    #[test]
    fn maps_transitions_to_conflicts() {
        let err = land::TransitionError::InvalidStatus {
            transition: land::Transition::SignAsUser,
            status: land::Status::Available,
        }
        .as_error();

        assert_eq!(err.code, "INVALID_LAND_STATUS");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(
            err.message,
            "cannot sign as user `Land` in `available` status",
        );
    }

    #[test]
    fn keeps_trace_of_traced_errors() {
        let err: tracerr::Traced<_> =
            tracerr::new!(land::TransitionError::OwnerAsLessee);

        let err = err.as_error();
        assert_eq!(err.code, "OWNER_AS_LESSEE");
        assert!(err.backtrace.is_some());
    }
}
