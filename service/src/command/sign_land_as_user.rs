//! [`Command`] for signing a [`Land`] lease agreement by a lessee.

use common::operations::{By, Render, Select, Swap};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{land, object, user, Agreement, Land, User},
    infra::{database, document, Database, DocumentGenerator},
    Service,
};

use super::Command;

/// [`Command`] for signing a [`Land`] lease agreement by a lessee, after the
/// owner has signed it.
#[derive(Clone, Copy, Debug)]
pub struct SignLandAsUser {
    /// ID of the [`Land`] to sign the agreement for.
    pub land_id: land::Id,

    /// ID of the [`User`] signing the agreement as a lessee.
    pub user_id: user::Id,
}

impl<Db, Gw, Nt, Dg, Os> Command<SignLandAsUser>
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
        cmd: SignLandAsUser,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SignLandAsUser { land_id, user_id } = cmd;

        let mut land = self
            .database()
            .execute(Select(By::<Option<Land>, _>::new(land_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LandNotExists(land_id))
            .map_err(tracerr::wrap!())?;
        land.check(land::Transition::SignAsUser)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let lessee = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;
        if land.is_owned_by(lessee.id) {
            return Err(tracerr::new!(E::OwnerAsLessee(lessee.id)));
        }

        let owner = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(land.owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(land.owner_id))
            .map_err(tracerr::wrap!())?;
        let owner_document = land
            .owner_signed_document
            .clone()
            .ok_or(E::OwnerDocumentMissing(land_id))
            .map_err(tracerr::wrap!())?;

        let document = self
            .document_generator()
            .execute(Render(Agreement::Final {
                land: land.clone(),
                owner,
                lessee,
                owner_document,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let expected = land.version;
        land.sign_as_user(user_id, document)
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

/// Error of [`SignLandAsUser`] [`Command`] execution.
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

    /// Owner of the [`Land`] cannot sign as its lessee.
    #[display("`User(id: {_0})` owns the `Land` and cannot lease it")]
    OwnerAsLessee(#[error(not(source))] user::Id),

    /// [`Land`] has no owner-signed agreement to be countersigned.
    #[display("`Land(id: {_0})` has no owner-signed agreement")]
    OwnerDocumentMissing(#[error(not(source))] land::Id),

    /// [`Land`] cannot be signed in its current state.
    #[display("{_0}")]
    #[from]
    Transition(land::TransitionError),

    /// [`Land`] is modified concurrently.
    #[display("`Land(id: {_0})` is modified concurrently")]
    Conflict(#[error(not(source))] land::Id),
}
