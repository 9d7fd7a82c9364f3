//! [`PaymentGateway`]-related implementations.

pub mod razorpay;
pub mod signature;

use derive_more::{Display, Error as StdError, From};

pub use self::razorpay::Razorpay;

/// Payment gateway operation.
pub use common::Handler as PaymentGateway;

/// [`PaymentGateway`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request to the gateway failed.
    #[display("HTTP request failed: {_0}")]
    #[from]
    Http(reqwest::Error),

    /// Gateway refused to process the request.
    #[display("Gateway responded with `{status}`: {body}")]
    Rejected {
        /// HTTP status code of the response.
        status: u16,

        /// Body of the response.
        body: String,
    },

    /// Gateway payload cannot be parsed.
    #[display("Malformed gateway payload: {_0}")]
    #[from]
    Json(serde_json::Error),

    /// Webhook signature doesn't match its body.
    #[display("Invalid webhook signature")]
    InvalidSignature,

    /// Gateway did not respond in time.
    #[display("Gateway did not respond in time")]
    Timeout,
}
