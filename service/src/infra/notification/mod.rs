//! [`Notifier`]-related implementations.

pub mod brevo;
pub mod twilio;

use common::operations::Deliver;
use derive_more::{Display, Error as StdError, From};
use futures::future;
use tracerr::Traced;

use crate::domain::Notification;

pub use self::{brevo::Brevo, twilio::Twilio};

/// Notification delivery operation.
pub use common::Handler as Notifier;

/// [`Notifier`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request to the delivery provider failed.
    #[display("HTTP request failed: {_0}")]
    #[from]
    Http(reqwest::Error),

    /// Delivery provider refused to deliver.
    #[display("`{provider}` responded with `{status}`: {body}")]
    Rejected {
        /// Name of the delivery provider.
        provider: &'static str,

        /// HTTP status code of the response.
        status: u16,

        /// Body of the response.
        body: String,
    },

    /// Delivery did not complete in time.
    #[display("Delivery did not complete in time")]
    Timeout,
}

/// [`Notifier`] delivering via both of the wrapped [`Notifier`]s
/// concurrently.
///
/// Fails if any of the deliveries fails, but always attempts both.
#[derive(Clone, Copy, Debug, Default)]
pub struct Both<A, B>(pub A, pub B);

impl<A, B> Notifier<Deliver<Notification>> for Both<A, B>
where
    A: Notifier<Deliver<Notification>, Ok = (), Err = Traced<Error>>,
    B: Notifier<Deliver<Notification>, Ok = (), Err = Traced<Error>>,
{
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Deliver(notification): Deliver<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let (a, b) = future::join(
            self.0.execute(Deliver(notification.clone())),
            self.1.execute(Deliver(notification)),
        )
        .await;
        a.map_err(tracerr::wrap!())?;
        b.map_err(tracerr::wrap!())
    }
}

impl<N> Notifier<Deliver<Notification>> for Option<N>
where
    N: Notifier<Deliver<Notification>, Ok = (), Err = Traced<Error>>,
{
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        op: Deliver<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        match self {
            Some(n) => n.execute(op).await.map_err(tracerr::wrap!()),
            None => Ok(()),
        }
    }
}

/// Checks the response of a delivery provider to be successful.
async fn check(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<(), Traced<Error>> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(tracerr::new!(Error::Rejected {
        provider,
        status: status.as_u16(),
        body,
    }))
}
