//! [`Command`] for deciding upon a [`ContactRequest`].

use common::operations::{
    By, Commit, Deliver, Select, Swap, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        contact_request, land, user, ContactRequest, Land, Notification, User,
    },
    infra::{database, notification, Database, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for deciding upon a [`ContactRequest`] by the [`Land`] owner.
///
/// Accepting a [`ContactRequest`] leases the [`Land`] to the requester at
/// once.
#[derive(Clone, Copy, Debug)]
pub struct DecideContact {
    /// ID of the [`ContactRequest`] to decide upon.
    pub request_id: contact_request::Id,

    /// ID of the [`User`] deciding.
    pub decider_id: user::Id,

    /// [`contact_request::Decision`] to be made.
    pub decision: contact_request::Decision,
}

/// Result of a [`DecideContact`] [`Command`].
#[derive(Clone, Debug)]
pub struct Decided {
    /// Decided [`ContactRequest`].
    pub request: ContactRequest,

    /// [`Land`] leased by accepting the [`ContactRequest`].
    pub land: Option<Land>,
}

impl<Db, Gw, Nt, Dg, Os> Command<DecideContact> for Service<Db, Gw, Nt, Dg, Os>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<ContactRequest>, contact_request::Id>>,
            Ok = Option<ContactRequest>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Land>, land::Id>>,
            Ok = Option<Land>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Swap<ContactRequest, contact_request::Status>,
            Ok = bool,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Swap<ContactRequest, contact_request::Status>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<
            Swap<Land, land::Version>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<
        Deliver<Notification>,
        Ok = (),
        Err = Traced<notification::Error>,
    >,
{
    type Ok = Decided;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DecideContact) -> Result<Self::Ok, Self::Err> {
        use contact_request::{Decision, Status};
        use ExecutionError as E;

        let DecideContact {
            request_id,
            decider_id,
            decision,
        } = cmd;

        let mut request = self
            .database()
            .execute(Select(By::<Option<ContactRequest>, _>::new(request_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RequestNotExists(request_id))
            .map_err(tracerr::wrap!())?;
        if request.to_owner != decider_id {
            return Err(tracerr::new!(E::NotOwner(decider_id)));
        }
        request.decide(decision).map_err(tracerr::from_and_wrap!(=> E))?;

        let mut land = self
            .database()
            .execute(Select(By::<Option<Land>, _>::new(request.land_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LandNotExists(request.land_id))
            .map_err(tracerr::wrap!())?;

        let requester = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(request.from_user)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if decision == Decision::Reject {
            let swapped = self
                .database()
                .execute(Swap {
                    new: request.clone(),
                    expected: Status::Pending,
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if !swapped {
                return Err(tracerr::new!(E::Conflict(request_id)));
            }

            if let Some(requester) = &requester {
                self.notify(Notification::contact_rejected(&land, requester))
                    .await;
            }
            return Ok(Decided {
                request,
                land: None,
            });
        }

        let expected = land.version;
        land.lease(land::Finalization::ContactAccepted(request.from_user))
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let swapped = tx
            .execute(Swap {
                new: request.clone(),
                expected: Status::Pending,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !swapped {
            return Err(tracerr::new!(E::Conflict(request_id)));
        }

        let swapped = tx
            .execute(Swap {
                new: land.clone(),
                expected,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !swapped {
            return Err(tracerr::new!(E::LandConflict(land.id)));
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let owner = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(land.owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let (Some(owner), Some(lessee)) = (owner, requester) {
            self.notify(Notification::lease_finalized(&land, &owner, &lessee))
                .await;
        }

        Ok(Decided {
            request,
            land: Some(land),
        })
    }
}

/// Error of [`DecideContact`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`ContactRequest`] with the provided ID does not exist.
    #[display("`ContactRequest(id: {_0})` does not exist")]
    RequestNotExists(#[error(not(source))] contact_request::Id),

    /// [`Land`] of the [`ContactRequest`] does not exist.
    #[display("`Land(id: {_0})` does not exist")]
    LandNotExists(#[error(not(source))] land::Id),

    /// [`User`] is not the owner the [`ContactRequest`] is addressed to.
    #[display("`User(id: {_0})` is not the addressee of the request")]
    NotOwner(#[error(not(source))] user::Id),

    /// [`ContactRequest`] is decided already.
    #[display("{_0}")]
    #[from]
    AlreadyDecided(contact_request::AlreadyDecided),

    /// [`Land`] cannot be leased in its current state.
    #[display("{_0}")]
    #[from]
    Transition(land::TransitionError),

    /// [`ContactRequest`] is decided concurrently.
    #[display("`ContactRequest(id: {_0})` is decided concurrently")]
    Conflict(#[error(not(source))] contact_request::Id),

    /// [`Land`] is modified concurrently.
    #[display("`Land(id: {_0})` is modified concurrently")]
    LandConflict(#[error(not(source))] land::Id),
}
