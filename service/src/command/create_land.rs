//! [`Command`] for creating a new [`Land`].

use common::{
    operations::{By, Insert, Select},
    Currency,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{land, object, user, Land, Object, User},
    infra::{database, storage, Database, ObjectStore},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Land`].
#[derive(Clone, Debug)]
pub struct CreateLand {
    /// ID of the [`User`] owning the [`Land`].
    pub owner_id: user::Id,

    /// Descriptive [`land::Details`] of the [`Land`].
    pub details: land::Details,

    /// Requested [`land::Listing`] terms of the [`Land`].
    pub listing: land::ListingRequest,

    /// Base64-encoded image of the [`Land`], optionally as a `data:` URL.
    pub image: Option<String>,
}

impl<Db, Gw, Nt, Dg, Os> Command<CreateLand> for Service<Db, Gw, Nt, Dg, Os>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Land>, Err = Traced<database::Error>>,
    Os: ObjectStore<
        Insert<Object>,
        Ok = object::Url,
        Err = Traced<storage::Error>,
    >,
{
    type Ok = Land;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateLand) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateLand {
            owner_id,
            details,
            listing,
            image,
        } = cmd;

        let owner = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OwnerNotExists(owner_id))
            .map_err(tracerr::wrap!())?;

        let listing = land::Listing::from_request(listing)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if let Some(rate) = listing.lease_rate() {
            if rate.currency != self.config().currency {
                return Err(tracerr::new!(E::UnsupportedCurrency(
                    rate.currency
                )));
            }
        }

        let image = image
            .as_deref()
            .map(land::Image::from_base64)
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let id = land::Id::new();
        let image_url = if let Some(image) = image {
            let key = format!("lands/{id}/image.{}", image.extension());
            let url = self
                .object_store()
                .execute(Insert(Object {
                    // UUIDs and alphanumeric extensions are always valid.
                    key: object::Key::new(key).expect("valid `object::Key`"),
                    content_type: image.content_type,
                    content: image.bytes,
                }))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            Some(url)
        } else {
            None
        };

        let land = Land::new(id, owner.id, details, listing, image_url);
        self.database()
            .execute(Insert(land.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(land)
    }
}

/// Error of [`CreateLand`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`ObjectStore`] error.
    #[display("`ObjectStore` operation failed: {_0}")]
    #[from]
    Storage(storage::Error),

    /// Owner [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    OwnerNotExists(#[error(not(source))] user::Id),

    /// Requested [`land::Listing`] terms are invalid.
    #[display("Invalid listing: {_0}")]
    #[from]
    InvalidListing(land::ListingError),

    /// Lease rate is requested in a not supported [`Currency`].
    #[display("`{_0}` currency is not supported")]
    UnsupportedCurrency(#[error(not(source))] Currency),

    /// Provided image cannot be decoded.
    #[display("Invalid image: {_0}")]
    #[from]
    InvalidImage(land::ImageError),
}
