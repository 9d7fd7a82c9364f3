//! [`Command`] for initiating a payment for a signed [`Land`] lease.

use common::{
    operations::{By, Create, Deliver, Select, Swap},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{land, payment, user, Land, Notification, User},
    infra::{
        database, notification, payment as gateway, Database, Notifier,
        PaymentGateway,
    },
    Service,
};

use super::Command;

/// [`Command`] for initiating a payment for a [`Land`] signed by both
/// parties.
///
/// [`land::Listing::Sharing`] requires no payment, so such a [`Land`] is
/// leased right away.
#[derive(Clone, Copy, Debug)]
pub struct InitiateLandPayment {
    /// ID of the [`Land`] to pay for.
    pub land_id: land::Id,

    /// ID of the [`User`] paying.
    pub payer_id: user::Id,
}

/// Result of an [`InitiateLandPayment`] [`Command`].
#[derive(Clone, Debug)]
pub enum Initiated {
    /// [`payment::Intent`] to be paid by the lessee.
    ///
    /// Repeated initiations return the very same [`payment::Intent`].
    Payment(payment::Intent),

    /// [`Land`] is leased without any payment.
    NoPaymentRequired(Land),
}

impl<Db, Gw, Nt, Dg, Os> Command<InitiateLandPayment>
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
        Create<payment::IntentRequest>,
        Ok = payment::Intent,
        Err = Traced<gateway::Error>,
    >,
    Nt: Notifier<
        Deliver<Notification>,
        Ok = (),
        Err = Traced<notification::Error>,
    >,
{
    type Ok = Initiated;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: InitiateLandPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let InitiateLandPayment { land_id, payer_id } = cmd;

        let mut land = self
            .database()
            .execute(Select(By::<Option<Land>, _>::new(land_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LandNotExists(land_id))
            .map_err(tracerr::wrap!())?;
        land.check(land::Transition::AttachPayment)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if land.acquired_by != Some(payer_id) {
            return Err(tracerr::new!(E::NotLessee(payer_id)));
        }

        let payer = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(payer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(payer_id))
            .map_err(tracerr::wrap!())?;

        let Some(lease_rate) = land.listing.lease_rate() else {
            let expected = land.version;
            land.lease(land::Finalization::NoPaymentRequired)
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
                return Err(tracerr::new!(E::Conflict(land_id)));
            }

            let owner = self
                .database()
                .execute(Select(By::<Option<User>, _>::new(land.owner_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if let Some(owner) = owner {
                self.notify(Notification::lease_finalized(
                    &land, &owner, &payer,
                ))
                .await;
            }
            return Ok(Initiated::NoPaymentRequired(land));
        };

        let amount = lease_rate
            .to_minor_units()
            .ok_or(E::InvalidAmount(lease_rate))
            .map_err(tracerr::wrap!())?;
        let currency = lease_rate.currency;
        if let Some(intent) =
            land.payment.as_ref().filter(|i| i.is_for(amount, currency))
        {
            return Ok(Initiated::Payment(intent.clone()));
        }

        let intent = self
            .with_payment_timeout(self.payment_gateway().execute(Create(
                payment::IntentRequest::for_land(
                    land.id,
                    amount,
                    currency,
                    payer.email.clone(),
                ),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let expected = land.version;
        land.attach_payment(intent.clone())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let swapped = self
            .database()
            .execute(Swap {
                new: land,
                expected,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if swapped {
            return Ok(Initiated::Payment(intent));
        }

        // Lost the race to a concurrent initiation, so its intent wins.
        self.database()
            .execute(Select(By::<Option<Land>, _>::new(land_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .and_then(|l| l.payment)
            .filter(|i| i.is_for(amount, currency))
            .map(Initiated::Payment)
            .ok_or(E::Conflict(land_id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`InitiateLandPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`PaymentGateway`] error.
    #[display("`PaymentGateway` failed: {_0}")]
    #[from]
    Gateway(gateway::Error),

    /// [`Land`] with the provided ID does not exist.
    #[display("`Land(id: {_0})` does not exist")]
    LandNotExists(#[error(not(source))] land::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] is not the lessee who signed the [`Land`] agreement.
    #[display("`User(id: {_0})` is not the lessee of the `Land`")]
    NotLessee(#[error(not(source))] user::Id),

    /// Lease rate cannot be expressed in minor units.
    #[display("`{_0}` cannot be paid")]
    InvalidAmount(#[error(not(source))] Money),

    /// [`Land`] cannot be paid for in its current state.
    #[display("{_0}")]
    #[from]
    Transition(land::TransitionError),

    /// [`Land`] is modified concurrently.
    #[display("`Land(id: {_0})` is modified concurrently")]
    Conflict(#[error(not(source))] land::Id),
}
