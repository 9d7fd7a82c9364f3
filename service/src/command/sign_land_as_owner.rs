//! [`Command`] for signing a [`Land`] lease agreement by its owner.

use common::operations::{By, Render, Select, Swap};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{land, object, user, Agreement, Land, User},
    infra::{database, document, Database, DocumentGenerator},
    Service,
};

use super::Command;

/// [`Command`] for signing a [`Land`] lease agreement by its owner.
#[derive(Clone, Copy, Debug)]
pub struct SignLandAsOwner {
    /// ID of the [`Land`] to sign the agreement for.
    pub land_id: land::Id,

    /// ID of the [`User`] signing the agreement.
    pub owner_id: user::Id,
}

impl<Db, Gw, Nt, Dg, Os> Command<SignLandAsOwner>
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
    Dg: DocumentGenerator<
        Render<Agreement>,
        Ok = object::Url,
        Err = Traced<document::Error>,
    >,
{
    type Ok = Land;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SignLandAsOwner,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SignLandAsOwner { land_id, owner_id } = cmd;

        let mut land = self
            .database()
            .execute(Select(By::<Option<Land>, _>::new(land_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LandNotExists(land_id))
            .map_err(tracerr::wrap!())?;
        land.check(land::Transition::SignAsOwner)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if !land.is_owned_by(owner_id) {
            return Err(tracerr::new!(E::NotOwner(owner_id)));
        }

        let owner = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(owner_id))
            .map_err(tracerr::wrap!())?;

        let document = self
            .document_generator()
            .execute(Render(Agreement::OwnerSigned {
                land: land.clone(),
                owner,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let expected = land.version;
        land.sign_as_owner(document)
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

        Ok(land)
    }
}

/// Error of [`SignLandAsOwner`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`DocumentGenerator`] error.
    #[display("`DocumentGenerator` failed: {_0}")]
    #[from]
    Document(document::Error),

    /// [`Land`] with the provided ID does not exist.
    #[display("`Land(id: {_0})` does not exist")]
    LandNotExists(#[error(not(source))] land::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] doesn't own the [`Land`].
    #[display("`User(id: {_0})` is not the owner of the `Land`")]
    NotOwner(#[error(not(source))] user::Id),

    /// [`Land`] cannot be signed in its current state.
    #[display("{_0}")]
    #[from]
    Transition(land::TransitionError),

    /// [`Land`] is modified concurrently.
    #[display("`Land(id: {_0})` is modified concurrently")]
    Conflict(#[error(not(source))] land::Id),
}
