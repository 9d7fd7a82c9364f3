//! [`Command`] for confirming a [`Land`] lease payment from a gateway
//! webhook.

use common::operations::{By, Deliver, Select, Swap, Verify};
use derive_more::{Display, Error};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{land, payment, user, Land, Notification, User},
    infra::{
        database, notification, payment as gateway, Database, Notifier,
        PaymentGateway,
    },
    Service,
};

use super::Command;

/// [`Command`] for confirming a [`Land`] lease payment by a signed
/// [`payment::Webhook`] of the [`PaymentGateway`].
#[derive(Clone, Debug)]
pub struct ConfirmLandPayment {
    /// Received [`payment::Webhook`].
    pub webhook: payment::Webhook,
}

/// Result of a [`ConfirmLandPayment`] [`Command`].
#[derive(Clone, Debug)]
pub enum Confirmed {
    /// [`Land`] is leased by this confirmation.
    Leased(Land),

    /// [`Land`] was leased by an earlier delivery of the same event.
    Replayed(land::Id),

    /// Event doesn't confirm any [`Land`] payment.
    Ignored {
        /// Kind of the ignored event.
        kind: String,
    },
}

impl<Db, Gw, Nt, Dg, Os> Command<ConfirmLandPayment>
    for Service<Db, Gw, Nt, Dg, Os>
where
    Db: Database<
            Select<By<Option<Land>, land::Id>>,
            Ok = Option<Land>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Swap<Land, land::Version>,
            Ok = bool,
            Err = Traced<database::Error>,
        >,
    Gw: PaymentGateway<
        Verify<payment::Webhook>,
        Ok = payment::Event,
        Err = Traced<gateway::Error>,
    >,
    Nt: Notifier<
        Deliver<Notification>,
        Ok = (),
        Err = Traced<notification::Error>,
    >,
{
    type Ok = Confirmed;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConfirmLandPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let event = self
            .payment_gateway()
            .execute(Verify(cmd.webhook))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let capture = match event {
            payment::Event::Captured(capture) => capture,
            payment::Event::Ignored { kind } => {
                return Ok(Confirmed::Ignored { kind });
            }
        };
        let Some(land_id) = capture.land_id else {
            log::info!(
                "ignoring captured payment `{}` without `landId` note",
                capture.payment_id,
            );
            return Ok(Confirmed::Ignored {
                kind: "payment.captured".into(),
            });
        };

        let mut land = self
            .database()
            .execute(Select(By::<Option<Land>, _>::new(land_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LandNotExists(land_id))
            .map_err(tracerr::wrap!())?;
        if land.status == land::Status::Leased {
            return Ok(Confirmed::Replayed(land_id));
        }
        land.check(land::Transition::Lease(land::Path::PaymentCaptured))
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let matches = land.payment.as_ref().is_some_and(|intent| {
            intent.order_id == capture.order_id
                && intent.amount == capture.amount
                && capture.currency.map_or(true, |c| c == intent.currency)
        });
        if !matches {
            return Err(tracerr::new!(E::PaymentMismatch(capture.order_id)));
        }

        let expected = land.version;
        land.lease(land::Finalization::PaymentCaptured)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let swapped = self
            .database()
            .execute(Swap {
                new: land.clone(),
                expected,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !swapped {
            let current = self
                .database()
                .execute(Select(By::<Option<Land>, _>::new(land_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            return if current.is_some_and(|l| l.status == land::Status::Leased)
            {
                Ok(Confirmed::Replayed(land_id))
            } else {
                Err(tracerr::new!(E::Conflict(land_id)))
            };
        }

        let owner = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(land.owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let lessee = match land.acquired_by {
            Some(id) => self
                .database()
                .execute(Select(By::<Option<User>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?,
            None => None,
        };
        if let (Some(owner), Some(lessee)) = (owner, lessee) {
            self.notify(Notification::lease_finalized(&land, &owner, &lessee))
                .await;
        }

        Ok(Confirmed::Leased(land))
    }
}

/// Error of [`ConfirmLandPayment`] [`Command`] execution.
#[derive(Debug, Display, Error)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`PaymentGateway`] error.
    #[display("`PaymentGateway` failed: {_0}")]
    Gateway(gateway::Error),

    /// Signature of the [`payment::Webhook`] doesn't match its body.
    #[display("Webhook signature is invalid")]
    InvalidSignature,

    /// [`Land`] with the provided ID does not exist.
    #[display("`Land(id: {_0})` does not exist")]
    LandNotExists(#[error(not(source))] land::Id),

    /// Captured payment doesn't match the pending [`payment::Intent`] of the
    /// [`Land`].
    #[display("Payment for `{_0}` order doesn't match the pending one")]
    PaymentMismatch(#[error(not(source))] payment::OrderId),

    /// [`Land`] cannot be leased in its current state.
    #[display("{_0}")]
    Transition(land::TransitionError),

    /// [`Land`] is modified concurrently.
    #[display("`Land(id: {_0})` is modified concurrently")]
    Conflict(#[error(not(source))] land::Id),
}

impl From<database::Error> for ExecutionError {
    fn from(e: database::Error) -> Self {
        Self::Db(e)
    }
}

impl From<gateway::Error> for ExecutionError {
    fn from(e: gateway::Error) -> Self {
        match e {
            gateway::Error::InvalidSignature => Self::InvalidSignature,
            e @ (gateway::Error::Http(_)
            | gateway::Error::Rejected { .. }
            | gateway::Error::Json(_)
            | gateway::Error::Timeout) => Self::Gateway(e),
        }
    }
}

impl From<land::TransitionError> for ExecutionError {
    fn from(e: land::TransitionError) -> Self {
        Self::Transition(e)
    }
}
