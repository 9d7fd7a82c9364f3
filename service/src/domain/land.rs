//! [`Land`] definitions.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money, Percent};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{object, payment, user};
#[cfg(doc)]
use crate::domain::User;

use super::define_text;

/// Land parcel offered for lease or for profit sharing.
///
/// Lifecycle fields ([`Land::status`], [`Land::acquired_by`], documents and
/// payment) are meant to be changed via transition methods only, so that
/// [`Land::acquired_by`] is set if and only if the [`Status`] is
/// [`Status::AgreementUserSigned`] or [`Status::Leased`].
#[derive(Clone, Debug)]
pub struct Land {
    /// ID of this [`Land`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Land`].
    pub owner_id: user::Id,

    /// Descriptive [`Details`] of this [`Land`].
    pub details: Details,

    /// [`Listing`] terms of this [`Land`].
    pub listing: Listing,

    /// URL of this [`Land`]'s image, if any.
    pub image: Option<object::Url>,

    /// Current [`Status`] of this [`Land`].
    pub status: Status,

    /// ID of the [`User`] acquiring this [`Land`].
    pub acquired_by: Option<user::Id>,

    /// [`Path`] this [`Land`] became [`Status::Leased`] via.
    pub leased_via: Option<Path>,

    /// URL of the agreement signed by the owner.
    pub owner_signed_document: Option<object::Url>,

    /// URL of the agreement signed by both parties.
    pub final_document: Option<object::Url>,

    /// Pending [`payment::Intent`] for leasing this [`Land`], if any.
    pub payment: Option<payment::Intent>,

    /// [`Version`] of this [`Land`], incremented on every transition.
    pub version: Version,

    /// [`DateTime`] when this [`Land`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Land`] was modified last time.
    pub updated_at: ModificationDateTime,
}

impl Land {
    /// Creates a new [`Status::Available`] [`Land`].
    #[must_use]
    pub fn new(
        id: Id,
        owner_id: user::Id,
        details: Details,
        listing: Listing,
        image: Option<object::Url>,
    ) -> Self {
        let now = DateTimeOf::<()>::now();
        Self {
            id,
            owner_id,
            details,
            listing,
            image,
            status: Status::Available,
            acquired_by: None,
            leased_via: None,
            owner_signed_document: None,
            final_document: None,
            payment: None,
            version: Version::INITIAL,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    /// Indicates whether the provided [`User`] owns this [`Land`].
    #[must_use]
    pub fn is_owned_by(&self, user_id: user::Id) -> bool {
        self.owner_id == user_id
    }

    /// Marks this [`Land`] as signed by its owner with the provided
    /// agreement `document`.
    ///
    /// # Errors
    ///
    /// If this [`Land`] is not [`Status::Available`].
    pub fn sign_as_owner(
        &mut self,
        document: object::Url,
    ) -> Result<(), TransitionError> {
        self.check(Transition::SignAsOwner)?;

        self.status = Status::AgreementOwnerSigned;
        self.owner_signed_document = Some(document);
        self.touch();
        Ok(())
    }

    /// Marks this [`Land`] as signed by the `lessee` with the provided final
    /// agreement `document`.
    ///
    /// # Errors
    ///
    /// - If this [`Land`] is not [`Status::AgreementOwnerSigned`].
    /// - If the `lessee` is the owner of this [`Land`].
    pub fn sign_as_user(
        &mut self,
        lessee: user::Id,
        document: object::Url,
    ) -> Result<(), TransitionError> {
        self.check(Transition::SignAsUser)?;
        if self.is_owned_by(lessee) {
            return Err(TransitionError::OwnerAsLessee);
        }

        self.status = Status::AgreementUserSigned;
        self.acquired_by = Some(lessee);
        self.final_document = Some(document);
        self.touch();
        Ok(())
    }

    /// Attaches the provided pending [`payment::Intent`] to this [`Land`].
    ///
    /// # Errors
    ///
    /// - If this [`Land`] is not [`Status::AgreementUserSigned`].
    /// - If this [`Land`] is not [`Listing::Paid`].
    pub fn attach_payment(
        &mut self,
        intent: payment::Intent,
    ) -> Result<(), TransitionError> {
        self.check(Transition::AttachPayment)?;
        if self.listing.kind() != ListingKind::Paid {
            return Err(TransitionError::PaymentNotRequired);
        }

        self.payment = Some(intent);
        self.touch();
        Ok(())
    }

    /// Finalizes the lease of this [`Land`] via the provided
    /// [`Finalization`].
    ///
    /// This is the only way for a [`Land`] to become [`Status::Leased`].
    ///
    /// # Errors
    ///
    /// If the [`Finalization`] is not applicable to the current state of this
    /// [`Land`].
    pub fn lease(&mut self, via: Finalization) -> Result<(), TransitionError> {
        self.check(Transition::Lease(via.path()))?;
        match via {
            Finalization::ContactAccepted(lessee) => {
                if self.is_owned_by(lessee) {
                    return Err(TransitionError::OwnerAsLessee);
                }
                self.acquired_by = Some(lessee);
            }
            Finalization::PaymentCaptured => {
                if self.listing.kind() != ListingKind::Paid {
                    return Err(TransitionError::PaymentNotRequired);
                }
                if self.payment.is_none() {
                    return Err(TransitionError::NoPendingPayment);
                }
            }
            Finalization::NoPaymentRequired => {
                if self.listing.kind() == ListingKind::Paid {
                    return Err(TransitionError::PaymentRequired);
                }
            }
        }

        self.status = Status::Leased;
        self.leased_via = Some(via.path());
        self.touch();
        Ok(())
    }

    /// Withdraws this [`Land`] from the marketplace for good.
    ///
    /// # Errors
    ///
    /// If this [`Land`] is already signed by a lessee, leased or withdrawn.
    pub fn withdraw(&mut self) -> Result<(), TransitionError> {
        self.check(Transition::Withdraw)?;

        self.status = Status::Withdrawn;
        self.touch();
        Ok(())
    }

    /// Checks whether the provided [`Transition`] is allowed from the current
    /// [`Status`] of this [`Land`].
    ///
    /// # Errors
    ///
    /// If this [`Land`] is not in any of the [`Transition::sources()`].
    pub fn check(&self, transition: Transition) -> Result<(), TransitionError> {
        if transition.sources().contains(&self.status) {
            Ok(())
        } else {
            Err(TransitionError::InvalidStatus {
                transition,
                status: self.status,
            })
        }
    }

    /// Bumps the [`Version`] and the modification [`DateTime`] of this
    /// [`Land`].
    fn touch(&mut self) {
        self.version = self.version.next();
        self.updated_at = DateTimeOf::now();
    }
}

/// ID of a [`Land`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Version of a [`Land`] used for optimistic concurrency control.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Version(i64);

impl Version {
    /// [`Version`] of a newly created [`Land`].
    pub const INITIAL: Self = Self(0);

    /// Returns the [`Version`] following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Descriptive details of a [`Land`].
#[derive(Clone, Debug)]
pub struct Details {
    /// [`Title`] of the [`Land`].
    pub title: Title,

    /// [`Description`] of the [`Land`].
    pub description: Description,

    /// [`Location`] of the [`Land`].
    pub location: Location,

    /// [`Size`] of the [`Land`].
    pub size: Size,

    /// [`SoilType`] of the [`Land`], if known.
    pub soil_type: Option<SoilType>,

    /// [`SoilPh`] of the [`Land`], if measured.
    pub soil_ph: Option<SoilPh>,

    /// [`WaterSource`] of the [`Land`], if any.
    pub water_source: Option<WaterSource>,

    /// Indicator whether electricity is available on the [`Land`].
    pub electricity_available: bool,

    /// [`Facility`]s available on the [`Land`].
    pub facilities: Vec<Facility>,
}

define_text! {
    #[doc = "Title of a [`Land`]."]
    Title { max_len: 256, allow_empty: false }
}

define_text! {
    #[doc = "Description of a [`Land`]."]
    Description { max_len: 8192, allow_empty: true }
}

define_text! {
    #[doc = "Location of a [`Land`]."]
    Location { max_len: 512, allow_empty: false }
}

define_text! {
    #[doc = "Size of a [`Land`] in a free form (`5 acres`, `2 ha`)."]
    Size { max_len: 128, allow_empty: false }
}

define_text! {
    #[doc = "Soil type of a [`Land`]."]
    SoilType { max_len: 128, allow_empty: false }
}

define_text! {
    #[doc = "Water source of a [`Land`]."]
    WaterSource { max_len: 256, allow_empty: false }
}

define_text! {
    #[doc = "Facility available on a [`Land`]."]
    Facility { max_len: 128, allow_empty: false }
}

/// Soil pH of a [`Land`] within `0..=14` range.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SoilPh(Decimal);

impl SoilPh {
    /// Creates a new [`SoilPh`] if the provided `value` is within `0..=14`.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::from(14))
            .contains(&value)
            .then(|| Self(value.normalize()))
    }

    /// Returns the underlying [`Decimal`] value of this [`SoilPh`].
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl FromStr for SoilPh {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `SoilPh`")
    }
}

/// Listing terms of a [`Land`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Listing {
    /// [`Land`] is leased for a fixed rate.
    Paid {
        /// Strictly positive lease rate.
        lease_rate: Money,
    },

    /// [`Land`] is leased for a share of produce.
    Sharing {
        /// Strictly positive share of produce.
        percentage: Percent,
    },
}

impl Listing {
    /// Validates the provided [`ListingRequest`] into a [`Listing`].
    ///
    /// # Errors
    ///
    /// If the terms required by the requested [`ListingKind`] are missing or
    /// invalid.
    pub fn from_request(req: ListingRequest) -> Result<Self, ListingError> {
        match req {
            ListingRequest::Paid { lease_rate } => {
                let lease_rate =
                    lease_rate.ok_or(ListingError::MissingLeaseRate)?;
                if !lease_rate.is_positive() {
                    return Err(ListingError::NonPositiveLeaseRate(lease_rate));
                }
                if lease_rate.to_minor_units().is_none() {
                    return Err(ListingError::FractionalLeaseRate(lease_rate));
                }
                Ok(Self::Paid { lease_rate })
            }
            // Lease rate of a sharing listing is always zero, whatever is
            // requested.
            ListingRequest::Sharing { percentage, .. } => {
                let percentage =
                    percentage.ok_or(ListingError::MissingSharingPercentage)?;
                if !percentage.is_positive() {
                    return Err(ListingError::NonPositiveSharingPercentage);
                }
                Ok(Self::Sharing { percentage })
            }
        }
    }

    /// Returns [`ListingKind`] of this [`Listing`].
    #[must_use]
    pub const fn kind(&self) -> ListingKind {
        match self {
            Self::Paid { .. } => ListingKind::Paid,
            Self::Sharing { .. } => ListingKind::Sharing,
        }
    }

    /// Returns the lease rate of this [`Listing`].
    ///
    /// [`None`] means zero, as a [`Listing::Sharing`] is never paid.
    #[must_use]
    pub const fn lease_rate(&self) -> Option<Money> {
        match self {
            Self::Paid { lease_rate } => Some(*lease_rate),
            Self::Sharing { .. } => None,
        }
    }

    /// Returns the sharing percentage of this [`Listing`].
    ///
    /// Always [`Percent::ZERO`] for a [`Listing::Paid`].
    #[must_use]
    pub const fn sharing_percentage(&self) -> Percent {
        match self {
            Self::Paid { .. } => Percent::ZERO,
            Self::Sharing { percentage } => *percentage,
        }
    }
}

/// Requested, not yet validated, [`Listing`] terms.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(
    tag = "listingType",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ListingRequest {
    /// Request for a [`Listing::Paid`].
    Paid {
        /// Requested lease rate.
        lease_rate: Option<Money>,
    },

    /// Request for a [`Listing::Sharing`].
    Sharing {
        /// Requested share of produce.
        #[serde(rename = "sharingPercentage")]
        percentage: Option<Percent>,

        /// Lease rate, ignored for sharing listings.
        lease_rate: Option<Money>,
    },
}

/// Error of validating a [`ListingRequest`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum ListingError {
    /// Lease rate is missing for a [`Listing::Paid`].
    #[display("lease rate is required for a paid listing")]
    MissingLeaseRate,

    /// Lease rate is not strictly positive.
    #[display("lease rate must be positive, but is `{_0}`")]
    NonPositiveLeaseRate(#[error(not(source))] Money),

    /// Lease rate has more fractional digits than its currency allows.
    #[display("lease rate `{_0}` is not representable in minor units")]
    FractionalLeaseRate(#[error(not(source))] Money),

    /// Sharing percentage is missing for a [`Listing::Sharing`].
    #[display("sharing percentage is required for a sharing listing")]
    MissingSharingPercentage,

    /// Sharing percentage is zero.
    #[display("sharing percentage must be positive")]
    NonPositiveSharingPercentage,
}

define_kind! {
    #[doc = "Kind of a [`Listing`]."]
    enum ListingKind {
        #[doc = "[`Listing::Paid`]."]
        Paid = 1,

        #[doc = "[`Listing::Sharing`]."]
        Sharing = 2,
    }
}

define_kind! {
    #[doc = "Status of a [`Land`]."]
    enum Status {
        #[doc = "[`Land`] is listed and open for agreements."]
        Available = 1,

        #[doc = "[`Land`] agreement is signed by its owner."]
        AgreementOwnerSigned = 2,

        #[doc = "[`Land`] agreement is signed by both its owner and lessee."]
        AgreementUserSigned = 3,

        #[doc = "[`Land`] is leased."]
        Leased = 4,

        #[doc = "[`Land`] is withdrawn from the marketplace by its owner."]
        Withdrawn = 5,
    }
}

impl Status {
    /// Indicates whether a [`Land`] in this [`Status`] has an acquirer.
    #[must_use]
    pub const fn is_acquired(self) -> bool {
        matches!(self, Self::AgreementUserSigned | Self::Leased)
    }

    /// Indicates whether no transition is possible out of this [`Status`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Leased | Self::Withdrawn)
    }
}

define_kind! {
    #[doc = "Path a [`Land`] became [`Status::Leased`] via."]
    enum Path {
        #[doc = "Owner accepted a contact request."]
        ContactAccepted = 1,

        #[doc = "Lessee paid the lease rate."]
        PaymentCaptured = 2,

        #[doc = "Sharing listing was signed by both parties."]
        NoPaymentRequired = 3,
    }
}

/// Reason to finalize the lease of a [`Land`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Finalization {
    /// Owner accepted a contact request of the contained [`User`].
    ContactAccepted(user::Id),

    /// Payment of the signed agreement is captured.
    PaymentCaptured,

    /// Signed agreement doesn't require any payment.
    NoPaymentRequired,
}

impl Finalization {
    /// Returns the [`Path`] of this [`Finalization`].
    #[must_use]
    pub const fn path(self) -> Path {
        match self {
            Self::ContactAccepted(_) => Path::ContactAccepted,
            Self::PaymentCaptured => Path::PaymentCaptured,
            Self::NoPaymentRequired => Path::NoPaymentRequired,
        }
    }
}

/// Transition of a [`Land`] between [`Status`]es.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Transition {
    /// [`Land::sign_as_owner()`].
    #[display("sign as owner")]
    SignAsOwner,

    /// [`Land::sign_as_user()`].
    #[display("sign as user")]
    SignAsUser,

    /// [`Land::attach_payment()`].
    #[display("attach payment to")]
    AttachPayment,

    /// [`Land::lease()`].
    #[display("lease via `{_0}`")]
    Lease(Path),

    /// [`Land::withdraw()`].
    #[display("withdraw")]
    Withdraw,
}

impl Transition {
    /// Returns [`Status`]es this [`Transition`] is allowed from.
    #[must_use]
    pub const fn sources(self) -> &'static [Status] {
        match self {
            Self::SignAsOwner => &[Status::Available],
            Self::SignAsUser => &[Status::AgreementOwnerSigned],
            Self::AttachPayment
            | Self::Lease(Path::PaymentCaptured | Path::NoPaymentRequired) => {
                &[Status::AgreementUserSigned]
            }
            Self::Lease(Path::ContactAccepted) | Self::Withdraw => {
                &[Status::Available, Status::AgreementOwnerSigned]
            }
        }
    }
}

/// Error of a [`Land`] [`Transition`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum TransitionError {
    /// [`Transition`] is not allowed from the current [`Status`].
    #[display("cannot {transition} `Land` in `{status}` status")]
    InvalidStatus {
        /// Attempted [`Transition`].
        transition: Transition,

        /// Current [`Status`] of the [`Land`].
        status: Status,
    },

    /// Owner cannot lease own [`Land`].
    #[display("owner cannot lease own `Land`")]
    OwnerAsLessee,

    /// [`Land`] with a [`Listing::Sharing`] is never paid.
    #[display("`Land` doesn't require any payment")]
    PaymentNotRequired,

    /// [`Land`] with a [`Listing::Paid`] cannot be leased without a payment.
    #[display("`Land` requires a payment")]
    PaymentRequired,

    /// [`Land`] has no pending [`payment::Intent`] to be captured.
    #[display("`Land` has no pending payment")]
    NoPendingPayment,
}

/// Image of a [`Land`] decoded from its base64 representation.
#[derive(Clone, Debug)]
pub struct Image {
    /// MIME type of this [`Image`].
    pub content_type: String,

    /// Raw bytes of this [`Image`].
    pub bytes: Vec<u8>,
}

impl Image {
    /// Maximum allowed size of an [`Image`] in bytes.
    pub const MAX_SIZE: usize = 5 * 1024 * 1024;

    /// Decodes an [`Image`] from either a plain base64 string or a
    /// `data:image/...;base64,` URL.
    ///
    /// # Errors
    ///
    /// If the provided `input` is not a valid base64 image.
    pub fn from_base64(input: &str) -> Result<Self, ImageError> {
        let input = input.trim();
        let data_url = input.strip_prefix("data:");
        let (content_type, data) = if let Some(url) = data_url {
            let (meta, data) =
                url.split_once(',').ok_or(ImageError::MalformedDataUrl)?;
            let content_type = meta
                .strip_suffix(";base64")
                .ok_or(ImageError::MalformedDataUrl)?;
            if !content_type.starts_with("image/") {
                return Err(ImageError::NotAnImage);
            }
            (Some(content_type.to_owned()), data)
        } else {
            (None, input)
        };

        let bytes = BASE64.decode(data)?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > Self::MAX_SIZE {
            return Err(ImageError::TooLarge(bytes.len()));
        }

        let content_type = content_type
            .or_else(|| Self::sniff(&bytes).map(ToOwned::to_owned))
            .ok_or(ImageError::NotAnImage)?;
        Ok(Self {
            content_type,
            bytes,
        })
    }

    /// Returns the file extension matching the MIME type of this [`Image`].
    #[must_use]
    pub fn extension(&self) -> &str {
        match self.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/svg+xml" => "svg",
            other => other
                .strip_prefix("image/")
                .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
                .unwrap_or("bin"),
        }
    }

    /// Detects the MIME type of the provided image `bytes` by their magic
    /// numbers.
    fn sniff(bytes: &[u8]) -> Option<&'static str> {
        match bytes {
            [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
            [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
            [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
                Some("image/webp")
            }
            _ => None,
        }
    }
}

/// Error of decoding an [`Image`].
#[derive(Debug, Display, Error, From)]
pub enum ImageError {
    /// Image is not a valid base64.
    #[display("invalid base64: {_0}")]
    #[from]
    Base64(base64::DecodeError),

    /// Image is empty.
    #[display("image is empty")]
    Empty,

    /// `data:` URL is malformed.
    #[display("malformed `data:` URL")]
    MalformedDataUrl,

    /// Decoded content is not an image.
    #[display("content is not an image")]
    NotAnImage,

    /// Image exceeds [`Image::MAX_SIZE`].
    #[display("image of {_0} bytes is too large")]
    TooLarge(#[error(not(source))] usize),
}

/// [`DateTime`] when a [`Land`] was created.
pub type CreationDateTime = DateTimeOf<(Land, unit::Creation)>;

/// [`DateTime`] when a [`Land`] was modified.
pub type ModificationDateTime = DateTimeOf<(Land, unit::Modification)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Currency, Money, Percent};

    use crate::domain::{object, payment, user};

    use super::{
        Details, Finalization, Image, ImageError, Land, Listing, ListingError,
        ListingRequest, Path, Status, Title, TransitionError, Version,
    };

    fn details() -> Details {
        Details {
            title: Title::new("Green acres").unwrap(),
            description: "Fertile plot".parse().unwrap(),
            location: "Nashik".parse().unwrap(),
            size: "5 acres".parse().unwrap(),
            soil_type: Some("loam".parse().unwrap()),
            soil_ph: Some("6.5".parse().unwrap()),
            water_source: None,
            electricity_available: true,
            facilities: vec![],
        }
    }

    fn inr(amount: &str) -> Money {
        Money::from_str(&format!("{amount}INR")).unwrap()
    }

    fn paid_land() -> Land {
        Land::new(
            super::Id::new(),
            user::Id::new(),
            details(),
            Listing::Paid {
                lease_rate: inr("5000"),
            },
            None,
        )
    }

    fn sharing_land() -> Land {
        Land::new(
            super::Id::new(),
            user::Id::new(),
            details(),
            Listing::Sharing {
                percentage: Percent::from_str("30").unwrap(),
            },
            None,
        )
    }

    fn url(s: &str) -> object::Url {
        object::Url::new(s)
    }

    fn intent() -> payment::Intent {
        payment::Intent {
            order_id: payment::OrderId::new("order_1"),
            amount: 500_000,
            currency: Currency::Inr,
        }
    }

    fn assert_acquirer_invariant(land: &Land) {
        assert_eq!(
            land.acquired_by.is_some(),
            land.status.is_acquired(),
            "`acquired_by` mismatches `{}` status",
            land.status,
        );
    }

    #[test]
    fn walks_sign_and_pay_path() {
        let lessee = user::Id::new();
        let mut land = paid_land();
        assert_eq!(land.status, Status::Available);
        assert_eq!(land.version, Version::INITIAL);
        assert_acquirer_invariant(&land);

        land.sign_as_owner(url("owner.html")).unwrap();
        assert_eq!(land.status, Status::AgreementOwnerSigned);
        assert_eq!(land.owner_signed_document, Some(url("owner.html")));
        assert_acquirer_invariant(&land);

        land.sign_as_user(lessee, url("final.html")).unwrap();
        assert_eq!(land.status, Status::AgreementUserSigned);
        assert_eq!(land.acquired_by, Some(lessee));
        assert_eq!(land.final_document, Some(url("final.html")));
        assert_acquirer_invariant(&land);

        assert_eq!(
            land.clone().lease(Finalization::PaymentCaptured),
            Err(TransitionError::NoPendingPayment),
        );
        land.attach_payment(intent()).unwrap();
        land.lease(Finalization::PaymentCaptured).unwrap();
        assert_eq!(land.status, Status::Leased);
        assert_eq!(land.leased_via, Some(Path::PaymentCaptured));
        assert_eq!(land.acquired_by, Some(lessee));
        assert_acquirer_invariant(&land);

        assert_eq!(land.version, Version::from(4));
    }

    #[test]
    fn shortcuts_via_accepted_contact() {
        for sign_first in [false, true] {
            let lessee = user::Id::new();
            let mut land = paid_land();
            if sign_first {
                land.sign_as_owner(url("owner.html")).unwrap();
            }

            land.lease(Finalization::ContactAccepted(lessee)).unwrap();
            assert_eq!(land.status, Status::Leased);
            assert_eq!(land.acquired_by, Some(lessee));
            assert_eq!(land.leased_via, Some(Path::ContactAccepted));
            assert_acquirer_invariant(&land);
        }
    }

    #[test]
    fn never_moves_backwards() {
        let lessee = user::Id::new();
        let mut land = paid_land();
        land.sign_as_owner(url("owner.html")).unwrap();
        land.sign_as_user(lessee, url("final.html")).unwrap();

        assert!(matches!(
            land.sign_as_owner(url("again.html")),
            Err(TransitionError::InvalidStatus {
                status: Status::AgreementUserSigned,
                ..
            }),
        ));
        assert!(land
            .lease(Finalization::ContactAccepted(user::Id::new()))
            .is_err());
        assert!(land.withdraw().is_err());
        assert_eq!(land.status, Status::AgreementUserSigned);
        assert_eq!(land.acquired_by, Some(lessee));

        land.attach_payment(intent()).unwrap();
        land.lease(Finalization::PaymentCaptured).unwrap();
        let version = land.version;

        assert!(land.sign_as_user(lessee, url("x.html")).is_err());
        assert!(land.lease(Finalization::PaymentCaptured).is_err());
        assert!(land.withdraw().is_err());
        assert_eq!(land.status, Status::Leased);
        assert_eq!(land.version, version);
    }

    #[test]
    fn rejects_owner_as_lessee() {
        let mut land = paid_land();
        let owner = land.owner_id;

        assert_eq!(
            land.clone().lease(Finalization::ContactAccepted(owner)),
            Err(TransitionError::OwnerAsLessee),
        );

        land.sign_as_owner(url("owner.html")).unwrap();
        assert_eq!(
            land.sign_as_user(owner, url("final.html")),
            Err(TransitionError::OwnerAsLessee),
        );
        assert_eq!(land.status, Status::AgreementOwnerSigned);
        assert_acquirer_invariant(&land);
    }

    #[test]
    fn sharing_bypasses_payment() {
        let mut land = sharing_land();
        land.sign_as_owner(url("owner.html")).unwrap();
        land.sign_as_user(user::Id::new(), url("final.html")).unwrap();

        assert_eq!(
            land.clone().attach_payment(intent()),
            Err(TransitionError::PaymentNotRequired),
        );
        assert_eq!(
            land.clone().lease(Finalization::PaymentCaptured),
            Err(TransitionError::PaymentNotRequired),
        );
        land.lease(Finalization::NoPaymentRequired).unwrap();
        assert_eq!(land.leased_via, Some(Path::NoPaymentRequired));
    }

    #[test]
    fn paid_requires_payment() {
        let mut land = paid_land();
        land.sign_as_owner(url("owner.html")).unwrap();
        land.sign_as_user(user::Id::new(), url("final.html")).unwrap();

        assert_eq!(
            land.lease(Finalization::NoPaymentRequired),
            Err(TransitionError::PaymentRequired),
        );
        assert_eq!(land.status, Status::AgreementUserSigned);
    }

    #[test]
    fn withdrawn_is_terminal() {
        let mut land = paid_land();
        land.sign_as_owner(url("owner.html")).unwrap();
        land.withdraw().unwrap();
        assert_eq!(land.status, Status::Withdrawn);
        assert!(land.status.is_terminal());

        assert!(land.sign_as_owner(url("owner.html")).is_err());
        assert!(land.sign_as_user(user::Id::new(), url("f.html")).is_err());
        assert!(land
            .lease(Finalization::ContactAccepted(user::Id::new()))
            .is_err());
        assert!(land.withdraw().is_err());
        assert_acquirer_invariant(&land);
    }

    #[test]
    fn forces_zero_lease_rate_for_sharing() {
        let listing = Listing::from_request(ListingRequest::Sharing {
            percentage: Some(Percent::from_str("30").unwrap()),
            lease_rate: Some(inr("5000")),
        })
        .unwrap();

        assert_eq!(listing.lease_rate(), None);
        assert_eq!(listing.sharing_percentage(), "30".parse().unwrap());
    }

    #[test]
    fn validates_listing_terms() {
        let paid = Listing::from_request(ListingRequest::Paid {
            lease_rate: Some(inr("5000")),
        })
        .unwrap();
        assert_eq!(paid.lease_rate(), Some(inr("5000")));
        assert_eq!(paid.sharing_percentage(), Percent::ZERO);

        assert_eq!(
            Listing::from_request(ListingRequest::Paid { lease_rate: None }),
            Err(ListingError::MissingLeaseRate),
        );
        assert_eq!(
            Listing::from_request(ListingRequest::Paid {
                lease_rate: Some(inr("0")),
            }),
            Err(ListingError::NonPositiveLeaseRate(inr("0"))),
        );
        assert_eq!(
            Listing::from_request(ListingRequest::Paid {
                lease_rate: Some(inr("10.005")),
            }),
            Err(ListingError::FractionalLeaseRate(inr("10.005"))),
        );
        assert_eq!(
            Listing::from_request(ListingRequest::Sharing {
                percentage: None,
                lease_rate: Some(inr("5000")),
            }),
            Err(ListingError::MissingSharingPercentage),
        );
        assert_eq!(
            Listing::from_request(ListingRequest::Sharing {
                percentage: Some(Percent::ZERO),
                lease_rate: None,
            }),
            Err(ListingError::NonPositiveSharingPercentage),
        );
    }

    #[test]
    fn deserializes_tagged_listing_request() {
        let req: ListingRequest = serde_json::from_str(
            r#"{"listingType": "sharing", "sharingPercentage": 30,
                "leaseRate": "100INR"}"#,
        )
        .unwrap();
        assert!(matches!(
            req,
            ListingRequest::Sharing {
                percentage: Some(_),
                lease_rate: Some(_),
            },
        ));

        let req: ListingRequest = serde_json::from_str(
            r#"{"listingType": "paid", "leaseRate": "5000INR"}"#,
        )
        .unwrap();
        assert!(matches!(
            req,
            ListingRequest::Paid {
                lease_rate: Some(_)
            },
        ));

        assert!(serde_json::from_str::<ListingRequest>(
            r#"{"listingType": "barter"}"#,
        )
        .is_err());
    }

    #[test]
    fn decodes_images() {
        let png = Image::from_base64("data:image/png;base64,iVBORw0KGgo=")
            .unwrap();
        assert_eq!(png.content_type, "image/png");
        assert_eq!(png.bytes[..4], [0x89, b'P', b'N', b'G']);

        let sniffed = Image::from_base64("iVBORw0KGgo=").unwrap();
        assert_eq!(sniffed.content_type, "image/png");
        assert_eq!(sniffed.extension(), "png");

        let jpeg = Image::from_base64("/9j/4AAQ").unwrap();
        assert_eq!(jpeg.content_type, "image/jpeg");
        assert_eq!(jpeg.extension(), "jpg");

        assert!(matches!(
            Image::from_base64("data:text/plain;base64,aGk="),
            Err(ImageError::NotAnImage),
        ));
        assert!(matches!(
            Image::from_base64("aGk="),
            Err(ImageError::NotAnImage),
        ));
        assert!(matches!(
            Image::from_base64("data:image/png,raw"),
            Err(ImageError::MalformedDataUrl),
        ));
        assert!(matches!(
            Image::from_base64("not base64!"),
            Err(ImageError::Base64(_)),
        ));
    }
}
