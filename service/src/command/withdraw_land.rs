//! [`Command`] for withdrawing a [`Land`] from the marketplace.

use common::operations::{By, Select, Swap};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{land, user, Land},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for withdrawing a [`Land`] from the marketplace by its owner.
///
/// Withdrawn [`Land`] accepts no further transitions.
#[derive(Clone, Copy, Debug)]
pub struct WithdrawLand {
    /// ID of the [`Land`] to withdraw.
    pub land_id: land::Id,

    /// ID of the [`User`] withdrawing the [`Land`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

impl<Db, Gw, Nt, Dg, Os> Command<WithdrawLand> for Service<Db, Gw, Nt, Dg, Os>
where
    Db: Database<
            Select<By<Option<Land>, land::Id>>,
            Ok = Option<Land>,
            Err = Traced<database::Error>,
        > + Database<
            Swap<Land, land::Version>,
            Ok = bool,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Land;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: WithdrawLand) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let WithdrawLand { land_id, owner_id } = cmd;

        let mut land = self
            .database()
            .execute(Select(By::<Option<Land>, _>::new(land_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LandNotExists(land_id))
            .map_err(tracerr::wrap!())?;
        if !land.is_owned_by(owner_id) {
            return Err(tracerr::new!(E::NotOwner(owner_id)));
        }

        let expected = land.version;
        land.withdraw().map_err(tracerr::from_and_wrap!(=> E))?;
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

        Ok(land)
    }
}

/// Error of [`WithdrawLand`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Land`] with the provided ID does not exist.
    #[display("`Land(id: {_0})` does not exist")]
    LandNotExists(#[error(not(source))] land::Id),

    /// [`User`] doesn't own the [`Land`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` is not the owner of the `Land`")]
    NotOwner(#[error(not(source))] user::Id),

    /// [`Land`] cannot be withdrawn in its current state.
    #[display("{_0}")]
    #[from]
    Transition(land::TransitionError),

    /// [`Land`] is modified concurrently.
    #[display("`Land(id: {_0})` is modified concurrently")]
    Conflict(#[error(not(source))] land::Id),
}
