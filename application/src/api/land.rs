//! [`Land`]-related endpoints.

use std::str::FromStr;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Extension, Json,
};
use common::{Currency, Money, Percent};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, initiate_land_payment::Initiated},
    domain::{self, land, payment, user},
    query, read, Command as _,
};

use crate::{api, AsError, Error, Service, Session};

/// Land parcel offered for lease or for profit sharing.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Land {
    /// ID of this [`Land`].
    pub id: land::Id,

    /// ID of the owner of this [`Land`].
    pub owner_id: user::Id,

    /// Title of this [`Land`].
    pub title: String,

    /// Description of this [`Land`].
    pub description: String,

    /// Location of this [`Land`].
    pub location: String,

    /// Size of this [`Land`] in a free form.
    pub size: String,

    /// Soil type of this [`Land`], if known.
    pub soil_type: Option<String>,

    /// Soil pH of this [`Land`], if measured.
    pub soil_ph: Option<String>,

    /// Water source of this [`Land`], if any.
    pub water_source: Option<String>,

    /// Indicator whether electricity is available on this [`Land`].
    pub electricity_available: bool,

    /// Facilities available on this [`Land`].
    pub facilities: Vec<String>,

    /// Kind of the listing: `paid` or `sharing`.
    pub listing_type: &'static str,

    /// Lease rate of a `paid` listing.
    pub lease_rate: Option<Money>,

    /// Share of produce of a `sharing` listing.
    pub sharing_percentage: Percent,

    /// URL of the image of this [`Land`], if any.
    pub image: Option<String>,

    /// Current status of this [`Land`].
    pub status: &'static str,

    /// ID of the user acquiring this [`Land`].
    pub acquired_by: Option<user::Id>,

    /// Path this [`Land`] was leased via.
    pub leased_via: Option<String>,

    /// URL of the agreement signed by the owner.
    pub owner_signed_document: Option<String>,

    /// URL of the agreement signed by both parties.
    pub final_document: Option<String>,

    /// Pending [`Payment`] for this [`Land`], if any.
    pub payment: Option<Payment>,

    /// Version of this [`Land`], incremented on every transition.
    pub version: i64,

    /// When this [`Land`] was created.
    pub created_at: land::CreationDateTime,

    /// When this [`Land`] was modified last time.
    pub updated_at: land::ModificationDateTime,
}

impl From<domain::Land> for Land {
    fn from(land: domain::Land) -> Self {
        let domain::Land {
            id,
            owner_id,
            details,
            listing,
            image,
            status,
            acquired_by,
            leased_via,
            owner_signed_document,
            final_document,
            payment,
            version,
            created_at,
            updated_at,
        } = land;
        Self {
            id,
            owner_id,
            title: details.title.to_string(),
            description: details.description.to_string(),
            location: details.location.to_string(),
            size: details.size.to_string(),
            soil_type: details.soil_type.as_ref().map(ToString::to_string),
            soil_ph: details.soil_ph.as_ref().map(ToString::to_string),
            water_source: details
                .water_source
                .as_ref()
                .map(ToString::to_string),
            electricity_available: details.electricity_available,
            facilities: details
                .facilities
                .iter()
                .map(ToString::to_string)
                .collect(),
            listing_type: listing.kind().as_str(),
            lease_rate: listing.lease_rate(),
            sharing_percentage: listing.sharing_percentage(),
            image: image.as_ref().map(ToString::to_string),
            status: status.as_str(),
            acquired_by,
            leased_via: leased_via.as_ref().map(ToString::to_string),
            owner_signed_document: owner_signed_document
                .as_ref()
                .map(ToString::to_string),
            final_document: final_document.as_ref().map(ToString::to_string),
            payment: payment.map(Into::into),
            version: version.into(),
            created_at,
            updated_at,
        }
    }
}

/// Payment to be made via the payment gateway checkout.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// ID of the gateway order to pay.
    pub order_id: String,

    /// Amount to pay in minor units (paise, cents).
    pub amount: u64,

    /// Currency of the [`Payment::amount`].
    pub currency: Currency,
}

impl From<payment::Intent> for Payment {
    fn from(intent: payment::Intent) -> Self {
        Self {
            order_id: intent.order_id.to_string(),
            amount: intent.amount,
            currency: intent.currency,
        }
    }
}

/// Request to list a new [`Land`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLand {
    /// Title of the [`Land`].
    pub title: String,

    /// Description of the [`Land`].
    #[serde(default)]
    pub description: String,

    /// Location of the [`Land`].
    pub location: String,

    /// Size of the [`Land`] in a free form.
    pub size: String,

    /// Soil type of the [`Land`].
    pub soil_type: Option<String>,

    /// Soil pH of the [`Land`].
    pub soil_ph: Option<String>,

    /// Water source of the [`Land`].
    pub water_source: Option<String>,

    /// Indicator whether electricity is available on the [`Land`].
    #[serde(default)]
    pub electricity_available: bool,

    /// Facilities available on the [`Land`].
    #[serde(default)]
    pub facilities: Vec<String>,

    /// Listing terms, tagged by the `listingType` field.
    #[serde(flatten)]
    pub listing: land::ListingRequest,

    /// Base64-encoded image, optionally as a `data:` URL.
    pub image: Option<String>,
}

impl NewLand {
    /// Validates this [`NewLand`] into a [`command::CreateLand`] on behalf of
    /// the provided owner.
    ///
    /// # Errors
    ///
    /// If any of the details is invalid.
    pub fn into_command(
        self,
        owner_id: user::Id,
    ) -> Result<command::CreateLand, Error> {
        let Self {
            title,
            description,
            location,
            size,
            soil_type,
            soil_ph,
            water_source,
            electricity_available,
            facilities,
            listing,
            image,
        } = self;

        Ok(command::CreateLand {
            owner_id,
            details: land::Details {
                title: parse("title", &title)?,
                description: parse("description", &description)?,
                location: parse("location", &location)?,
                size: parse("size", &size)?,
                soil_type: parse_opt("soilType", soil_type)?,
                soil_ph: parse_opt("soilPh", soil_ph)?,
                water_source: parse_opt("waterSource", water_source)?,
                electricity_available,
                facilities: facilities
                    .iter()
                    .map(|f| parse("facilities", f))
                    .collect::<Result<_, _>>()?,
            },
            listing,
            image: image.filter(|i| !i.trim().is_empty()),
        })
    }
}

/// Parses a trimmed `value` of the named field.
fn parse<T: FromStr>(field: &str, value: &str) -> Result<T, Error> {
    value.trim().parse().map_err(|_| {
        Error::new(
            "INVALID_LAND_DETAILS",
            http::StatusCode::BAD_REQUEST,
            &format!("`{field}` is invalid"),
        )
    })
}

/// Parses an optional `value` of the named field, treating a blank one as
/// missing.
fn parse_opt<T: FromStr>(
    field: &str,
    value: Option<String>,
) -> Result<Option<T>, Error> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse(field, &v))
        .transpose()
}

/// Query parameters of listing [`Land`]s.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListParams {
    /// Words to look for in titles and descriptions.
    pub keyword: Option<String>,

    /// Part of a location.
    pub location: Option<String>,

    /// Part of a soil type.
    pub soil_type: Option<String>,

    /// Maximum lease rate, like `5000INR`.
    pub max_lease_rate: Option<Money>,

    /// Kind of the listing: `paid` or `sharing`.
    pub listing_type: Option<String>,

    /// Status of the [`Land`]s.
    pub status: Option<String>,

    /// ID of the owner of the [`Land`]s.
    pub owner_id: Option<user::Id>,
}

impl TryFrom<ListParams> for read::land::list::Filter {
    type Error = Error;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let ListParams {
            keyword,
            location,
            soil_type,
            max_lease_rate,
            listing_type,
            status,
            owner_id,
        } = params;

        Ok(Self {
            keyword,
            location,
            soil_type,
            max_lease_rate,
            listing: listing_type
                .map(|l| l.parse())
                .transpose()
                .map_err(|_| Error::bad_request(&"unknown `listingType`"))?,
            status: status
                .map(|s| s.parse())
                .transpose()
                .map_err(|_| Error::bad_request(&"unknown `status`"))?,
            owner_id,
        })
    }
}

/// Result of initiating a [`Land`] payment.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Initiation {
    /// [`Payment`] is to be made by the lessee.
    PaymentRequired {
        /// [`Payment`] to be made.
        payment: Payment,
    },

    /// [`Land`] is leased without any payment.
    Leased {
        /// Leased [`Land`].
        land: Land,
    },
}

/// Lists a new [`Land`] owned by the authenticated user.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_LAND_DETAILS` - some of the details is invalid;
/// - `INVALID_LISTING` - listing terms are missing or invalid;
/// - `UNSUPPORTED_CURRENCY` - lease rate is not in the marketplace currency;
/// - `INVALID_IMAGE` - image is not a valid base64 image.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn create(
    Extension(service): Extension<Service>,
    session: Session,
    body: Result<Json<NewLand>, JsonRejection>,
) -> Result<(http::StatusCode, Json<Land>), Error> {
    let Json(body) = body.map_err(AsError::into_error)?;
    let land = service
        .execute(body.into_command(session.user_id)?)
        .await
        .map_err(AsError::into_error)?;
    Ok((http::StatusCode::CREATED, Json(land.into())))
}

/// Lists [`Land`]s matching the provided filter, newest first.
///
/// # Errors
///
/// If the filter is invalid.
#[tracing::instrument(skip_all)]
pub async fn list(
    Extension(service): Extension<Service>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Land>>, Error> {
    let Query(params) = params.map_err(AsError::into_error)?;
    let lands = service
        .execute(query::lands::List::by(params.try_into()?))
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(lands.into_iter().map(Into::into).collect()))
}

/// Returns the [`Land`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `LAND_NOT_EXISTS` - [`Land`] with the provided ID does not exist.
#[tracing::instrument(skip_all)]
pub async fn get(
    Extension(service): Extension<Service>,
    id: Result<Path<land::Id>, PathRejection>,
) -> Result<Json<Land>, Error> {
    let id = api::id(id)?;
    service
        .execute(query::land::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|land| Json(land.into()))
        .ok_or_else(|| api::NotFoundError::Land.into())
}

/// Signs the agreement of the [`Land`] by its owner.
///
/// # Errors
///
/// Possible error codes:
/// - `LAND_NOT_EXISTS` - [`Land`] with the provided ID does not exist;
/// - `NOT_OWNER` - authenticated user doesn't own the [`Land`];
/// - `INVALID_LAND_STATUS` - [`Land`] is not `available`;
/// - `DOCUMENT_GENERATION_FAILED` - agreement cannot be generated.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn owner_sign(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<land::Id>, PathRejection>,
) -> Result<Json<Land>, Error> {
    service
        .execute(command::SignLandAsOwner {
            land_id: api::id(id)?,
            owner_id: session.user_id,
        })
        .await
        .map_err(AsError::into_error)
        .map(|land| Json(land.into()))
}

/// Signs the agreement of the [`Land`] by the authenticated user, making
/// them its lessee.
///
/// # Errors
///
/// Possible error codes:
/// - `LAND_NOT_EXISTS` - [`Land`] with the provided ID does not exist;
/// - `OWNER_AS_LESSEE` - owner cannot lease own [`Land`];
/// - `INVALID_LAND_STATUS` - [`Land`] is not signed by its owner;
/// - `DOCUMENT_GENERATION_FAILED` - agreement cannot be generated.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn user_sign(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<land::Id>, PathRejection>,
) -> Result<Json<Land>, Error> {
    service
        .execute(command::SignLandAsUser {
            land_id: api::id(id)?,
            user_id: session.user_id,
        })
        .await
        .map_err(AsError::into_error)
        .map(|land| Json(land.into()))
}

/// Initiates the payment for the [`Land`] signed by both parties.
///
/// # Errors
///
/// Possible error codes:
/// - `LAND_NOT_EXISTS` - [`Land`] with the provided ID does not exist;
/// - `NOT_LESSEE` - authenticated user is not the lessee;
/// - `INVALID_LAND_STATUS` - [`Land`] is not signed by both parties;
/// - `PAYMENT_GATEWAY_FAILED` - payment gateway refused the order.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn pay(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<land::Id>, PathRejection>,
) -> Result<Json<Initiation>, Error> {
    let initiated = service
        .execute(command::InitiateLandPayment {
            land_id: api::id(id)?,
            payer_id: session.user_id,
        })
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(match initiated {
        Initiated::Payment(intent) => Initiation::PaymentRequired {
            payment: intent.into(),
        },
        Initiated::NoPaymentRequired(land) => {
            Initiation::Leased { land: land.into() }
        }
    }))
}

/// Withdraws the [`Land`] from the marketplace.
///
/// # Errors
///
/// Possible error codes:
/// - `LAND_NOT_EXISTS` - [`Land`] with the provided ID does not exist;
/// - `NOT_OWNER` - authenticated user doesn't own the [`Land`];
/// - `INVALID_LAND_STATUS` - [`Land`] is leased or being leased.
#[tracing::instrument(skip_all, fields(user.id = %session.user_id))]
pub async fn withdraw(
    Extension(service): Extension<Service>,
    session: Session,
    id: Result<Path<land::Id>, PathRejection>,
) -> Result<Json<Land>, Error> {
    service
        .execute(command::WithdrawLand {
            land_id: api::id(id)?,
            owner_id: session.user_id,
        })
        .await
        .map_err(AsError::into_error)
        .map(|land| Json(land.into()))
}

impl AsError for command::create_land::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Storage(_) => return None,
            Self::OwnerNotExists(_) => api::NotFoundError::User.into(),
            Self::InvalidListing(e) => Error::new(
                "INVALID_LISTING",
                http::StatusCode::BAD_REQUEST,
                e,
            ),
            Self::UnsupportedCurrency(_) => Error::new(
                "UNSUPPORTED_CURRENCY",
                http::StatusCode::BAD_REQUEST,
                self,
            ),
            Self::InvalidImage(e) => {
                Error::new("INVALID_IMAGE", http::StatusCode::BAD_REQUEST, e)
            }
        })
    }
}

impl AsError for command::sign_land_as_owner::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Document(e) => return e.try_as_error(),
            Self::Transition(e) => return e.try_as_error(),
            Self::LandNotExists(_) => api::NotFoundError::Land.into(),
            Self::UserNotExists(_) => api::NotFoundError::User.into(),
            Self::NotOwner(_) => api::PrivilegeError::Owner.into(),
            Self::Conflict(_) => api::ConflictError::Concurrent.into(),
        })
    }
}

impl AsError for command::sign_land_as_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Document(e) => return e.try_as_error(),
            Self::Transition(e) => return e.try_as_error(),
            Self::OwnerDocumentMissing(_) => return None,
            Self::LandNotExists(_) => api::NotFoundError::Land.into(),
            Self::UserNotExists(_) => api::NotFoundError::User.into(),
            Self::OwnerAsLessee(_) => {
                land::TransitionError::OwnerAsLessee.try_as_error()?
            }
            Self::Conflict(_) => api::ConflictError::Concurrent.into(),
        })
    }
}

impl AsError for command::initiate_land_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Gateway(e) => return e.try_as_error(),
            Self::Transition(e) => return e.try_as_error(),
            Self::InvalidAmount(_) => return None,
            Self::LandNotExists(_) => api::NotFoundError::Land.into(),
            Self::UserNotExists(_) => api::NotFoundError::User.into(),
            Self::NotLessee(_) => api::PrivilegeError::Lessee.into(),
            Self::Conflict(_) => api::ConflictError::Concurrent.into(),
        })
    }
}

impl AsError for command::withdraw_land::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Transition(e) => return e.try_as_error(),
            Self::LandNotExists(_) => api::NotFoundError::Land.into(),
            Self::NotOwner(_) => api::PrivilegeError::Owner.into(),
            Self::Conflict(_) => api::ConflictError::Concurrent.into(),
        })
    }
}

#[cfg(test)]
mod spec {
    use common::Money;
    use service::{domain::land, read};

    use super::{ListParams, NewLand};

    fn new_land(json: &str) -> NewLand {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn trims_and_validates_details() {
        let owner = service::domain::user::Id::new();
        let cmd = new_land(
            r#"{
                "title": "  Riverside plot ",
                "location": "Nashik",
                "size": "2 acres",
                "soilType": " ",
                "soilPh": "6.5",
                "facilities": ["well"],
                "listingType": "paid",
                "leaseRate": "5000INR"
            }"#,
        )
        .into_command(owner)
        .unwrap();

        assert_eq!(cmd.owner_id, owner);
        assert_eq!(cmd.details.title.to_string(), "Riverside plot");
        assert!(cmd.details.soil_type.is_none());
        assert_eq!(cmd.details.soil_ph.unwrap().to_string(), "6.5");
        assert_eq!(cmd.details.facilities.len(), 1);
        assert!(matches!(cmd.listing, land::ListingRequest::Paid { .. }));
        assert!(cmd.image.is_none());
    }

    #[test]
    fn rejects_invalid_details() {
        let err = new_land(
            r#"{
                "title": "",
                "location": "Nashik",
                "size": "2 acres",
                "listingType": "sharing",
                "sharingPercentage": 30
            }"#,
        )
        .into_command(service::domain::user::Id::new())
        .unwrap_err();

        assert_eq!(err.code, "INVALID_LAND_DETAILS");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parses_list_filter() {
        let filter = read::land::list::Filter::try_from(ListParams {
            listing_type: Some("sharing".into()),
            status: Some("available".into()),
            max_lease_rate: Some("5000INR".parse::<Money>().unwrap()),
            ..ListParams::default()
        })
        .unwrap();

        assert_eq!(filter.listing, Some(land::ListingKind::Sharing));
        assert_eq!(filter.status, Some(land::Status::Available));

        let err = read::land::list::Filter::try_from(ListParams {
            status: Some("sold".into()),
            ..ListParams::default()
        })
        .unwrap_err();
        assert_eq!(err.code, "BAD_REQUEST");
    }
}
