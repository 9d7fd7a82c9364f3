//! [`Command`] for requesting a contact with a [`Land`] owner.

use common::operations::{By, Deliver, Insert, Select};
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

/// [`Command`] for requesting a contact with a [`Land`] owner.
#[derive(Clone, Debug)]
pub struct RequestContact {
    /// ID of the [`Land`] to contact the owner of.
    pub land_id: land::Id,

    /// ID of the [`User`] requesting the contact.
    pub from_user: user::Id,

    /// Message to the owner.
    pub message: contact_request::Message,
}

impl<Db, Gw, Nt, Dg, Os> Command<RequestContact>
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
        > + Database<Insert<ContactRequest>, Err = Traced<database::Error>>,
    Nt: Notifier<
        Deliver<Notification>,
        Ok = (),
        Err = Traced<notification::Error>,
    >,
{
    type Ok = ContactRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RequestContact,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RequestContact {
            land_id,
            from_user,
            message,
        } = cmd;

        let land = self
            .database()
            .execute(Select(By::<Option<Land>, _>::new(land_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LandNotExists(land_id))
            .map_err(tracerr::wrap!())?;
        if land.status.is_terminal() {
            return Err(tracerr::new!(E::LandNotOpen(land.status)));
        }

        let request =
            ContactRequest::new(land.id, from_user, land.owner_id, message)
                .map_err(tracerr::from_and_wrap!(=> E))?;

        let requester = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(from_user)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(from_user))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Insert(request.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let owner = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(land.owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(owner) = owner {
            self.notify(Notification::contact_requested(
                &land,
                &owner,
                &requester,
                &request.message,
            ))
            .await;
        }

        Ok(request)
    }
}

/// Error of [`RequestContact`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Land`] with the provided ID does not exist.
    #[display("`Land(id: {_0})` does not exist")]
    LandNotExists(#[error(not(source))] land::Id),

    /// [`Land`] is leased or withdrawn already.
    #[display("`Land` is `{_0}` and accepts no contact requests")]
    LandNotOpen(#[error(not(source))] land::Status),

    /// [`User`] tries to contact themselves.
    #[display("{_0}")]
    #[from]
    SelfContact(contact_request::SelfContactError),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
