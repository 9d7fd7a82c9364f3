//! Service contains the business logic of the land lease marketplace.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;

use std::{future::Future, time::Duration};

use common::{operations::Deliver, Currency};
use smart_default::SmartDefault;
use tokio::time;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::Notification,
    infra::{notification, payment, Notifier},
};
#[cfg(doc)]
use crate::infra::{Database, DocumentGenerator, ObjectStore, PaymentGateway};

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// [`Currency`] lands are leased for.
    #[default(Currency::Inr)]
    pub currency: Currency,

    /// Maximum duration of a single [`PaymentGateway`] call.
    #[default(Duration::from_secs(10))]
    pub payment_timeout: Duration,

    /// Maximum duration of a single [`Notifier`] delivery attempt.
    #[default(Duration::from_secs(10))]
    pub notification_timeout: Duration,

    /// Delay before retrying a failed [`Notifier`] delivery.
    #[default(Duration::from_secs(1))]
    pub notification_retry_delay: Duration,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Gw, Nt, Dg, Os> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`PaymentGateway`] of this [`Service`].
    payment_gateway: Gw,

    /// [`Notifier`] of this [`Service`].
    notifier: Nt,

    /// [`DocumentGenerator`] of this [`Service`].
    document_generator: Dg,

    /// [`ObjectStore`] of this [`Service`].
    object_store: Os,
}

impl<Db, Gw, Nt, Dg, Os> Service<Db, Gw, Nt, Dg, Os> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub const fn new(
        config: Config,
        database: Db,
        payment_gateway: Gw,
        notifier: Nt,
        document_generator: Dg,
        object_store: Os,
    ) -> Self {
        Self {
            config,
            database,
            payment_gateway,
            notifier,
            document_generator,
            object_store,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub const fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`PaymentGateway`] of this [`Service`].
    #[must_use]
    pub const fn payment_gateway(&self) -> &Gw {
        &self.payment_gateway
    }

    /// Returns [`Notifier`] of this [`Service`].
    #[must_use]
    pub const fn notifier(&self) -> &Nt {
        &self.notifier
    }

    /// Returns [`DocumentGenerator`] of this [`Service`].
    #[must_use]
    pub const fn document_generator(&self) -> &Dg {
        &self.document_generator
    }

    /// Returns [`ObjectStore`] of this [`Service`].
    #[must_use]
    pub const fn object_store(&self) -> &Os {
        &self.object_store
    }

    /// Awaits the provided [`PaymentGateway`] call no longer than
    /// [`Config::payment_timeout`].
    async fn with_payment_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, Traced<payment::Error>>>,
    ) -> Result<T, Traced<payment::Error>> {
        time::timeout(self.config.payment_timeout, call)
            .await
            .map_err(|_| tracerr::new!(payment::Error::Timeout))?
            .map_err(tracerr::wrap!())
    }

    /// Delivers the provided [`Notification`] on a best-effort basis.
    ///
    /// A failed or timed out delivery is retried once after
    /// [`Config::notification_retry_delay`]. Failures are logged and never
    /// propagated.
    async fn notify(&self, notification: Notification)
    where
        Nt: Notifier<
            Deliver<Notification>,
            Ok = (),
            Err = Traced<notification::Error>,
        >,
    {
        const ATTEMPTS: usize = 2;

        let Config {
            notification_timeout,
            notification_retry_delay,
            ..
        } = self.config;

        for attempt in 1..=ATTEMPTS {
            let delivery = self.notifier.execute(Deliver(notification.clone()));
            let res = time::timeout(notification_timeout, delivery)
                .await
                .map_err(|_| tracerr::new!(notification::Error::Timeout))
                .and_then(|r| r.map_err(tracerr::wrap!()));
            match res {
                Ok(()) => return,
                Err(e) => {
                    log::warn!(
                        "failed to deliver `{}` notification \
                         (attempt {attempt}/{ATTEMPTS}): {e}",
                        notification.subject,
                    );
                    if attempt < ATTEMPTS {
                        time::sleep(notification_retry_delay).await;
                    }
                }
            }
        }
    }
}
