//! Payment definitions.

use common::{Currency, Money};
use derive_more::{AsRef, Debug, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

use crate::domain::{land, user};
#[cfg(doc)]
use crate::domain::Land;

/// ID of an order assigned by a payment gateway.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new [`OrderId`] out of the gateway-provided one.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Payment intent tracked by a payment gateway, expected to be paid and
/// confirmed asynchronously.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Intent {
    /// [`OrderId`] of this [`Intent`].
    pub order_id: OrderId,

    /// Amount of this [`Intent`] in minor units of its [`Currency`].
    pub amount: u64,

    /// [`Currency`] of this [`Intent`].
    pub currency: Currency,
}

impl Intent {
    /// Indicates whether this [`Intent`] requests exactly the provided
    /// amount.
    #[must_use]
    pub fn is_for(&self, amount: u64, currency: Currency) -> bool {
        self.amount == amount && self.currency == currency
    }

    /// Returns the amount of this [`Intent`] as [`Money`].
    #[must_use]
    pub fn money(&self) -> Money {
        Money::from_minor_units(self.amount, self.currency)
    }
}

/// Request to create a new [`Intent`].
#[derive(Clone, Debug)]
pub struct IntentRequest {
    /// Amount to be paid in minor units of the [`Currency`].
    pub amount: u64,

    /// [`Currency`] to be paid in.
    pub currency: Currency,

    /// Merchant-side correlation ID of the [`Intent`].
    pub receipt: String,

    /// ID of the [`Land`] being paid for.
    pub land_id: land::Id,

    /// Email of the payer, if known.
    pub payer_email: Option<user::Email>,
}

impl IntentRequest {
    /// Creates a new [`IntentRequest`] for leasing the provided [`Land`].
    #[must_use]
    pub fn for_land(
        land_id: land::Id,
        amount: u64,
        currency: Currency,
        payer_email: Option<user::Email>,
    ) -> Self {
        Self {
            amount,
            currency,
            receipt: format!("receipt_{land_id}"),
            land_id,
            payer_email,
        }
    }
}

/// Raw webhook notification received from a payment gateway.
#[derive(Clone, Debug)]
pub struct Webhook {
    /// Raw body of this [`Webhook`], exactly as received.
    #[debug("{} bytes", body.len())]
    pub body: Vec<u8>,

    /// Signature of the [`Webhook::body`] provided by the gateway.
    pub signature: String,
}

/// Verified payment event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// Payment was captured.
    Captured(Capture),

    /// Any other event, not affecting leases.
    Ignored {
        /// Gateway name of the event.
        kind: String,
    },
}

/// Captured payment details.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Capture {
    /// Gateway ID of the payment.
    pub payment_id: String,

    /// [`OrderId`] the payment was made for.
    pub order_id: OrderId,

    /// Captured amount in minor units.
    pub amount: u64,

    /// [`Currency`] of the captured amount, if recognized.
    pub currency: Option<Currency>,

    /// ID of the [`Land`] the payment is correlated to, if any.
    pub land_id: Option<land::Id>,

    /// Email of the payer, if provided.
    pub payer_email: Option<String>,
}
