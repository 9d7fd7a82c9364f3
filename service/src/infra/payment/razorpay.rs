//! [Razorpay] [`PaymentGateway`] implementation.
//!
//! [Razorpay]: https://razorpay.com/docs/api

use common::{
    operations::{Create, Verify},
    Currency,
};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracerr::Traced;

use crate::{
    domain::payment,
    infra::payment::{signature, Error, PaymentGateway},
};

/// Name of the webhook event reporting a captured payment.
const CAPTURED: &str = "payment.captured";

/// [`Razorpay`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the Razorpay API.
    pub api_url: String,

    /// Key ID to authenticate API requests with.
    pub key_id: String,

    /// Key secret to authenticate API requests with.
    pub key_secret: SecretString,

    /// Secret the webhook bodies are signed with.
    pub webhook_secret: SecretString,
}

/// [Razorpay] [`PaymentGateway`] client.
///
/// [Razorpay]: https://razorpay.com
#[derive(Clone, Debug)]
pub struct Razorpay {
    /// HTTP client to perform API requests with.
    client: reqwest::Client,

    /// [`Config`] of this client.
    config: Config,
}

impl Razorpay {
    /// Creates a new [`Razorpay`] client with the provided [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

/// Body of an order creation request.
#[derive(Debug, Serialize)]
struct OrderRequest<'r> {
    /// Amount in minor units.
    amount: u64,

    /// ISO 4217 currency code.
    currency: &'static str,

    /// Merchant-side correlation ID.
    receipt: &'r str,

    /// Key-value metadata echoed back in webhooks.
    notes: Notes<'r>,
}

/// Metadata attached to a Razorpay order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Notes<'r> {
    /// ID of the land being paid for.
    land_id: String,

    /// Email of the payer.
    #[serde(skip_serializing_if = "Option::is_none")]
    user_email: Option<&'r str>,
}

/// Created Razorpay order.
#[derive(Debug, Deserialize)]
struct Order {
    /// ID of the order.
    id: String,

    /// Amount of the order in minor units.
    amount: u64,
}

impl PaymentGateway<Create<payment::IntentRequest>> for Razorpay {
    type Ok = payment::Intent;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Create(req): Create<payment::IntentRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        let payment::IntentRequest {
            amount,
            currency,
            receipt,
            land_id,
            payer_email,
        } = req;

        let body = OrderRequest {
            amount,
            currency: currency.code(),
            receipt: &receipt,
            notes: Notes {
                land_id: land_id.to_string(),
                user_email: payer_email.as_ref().map(AsRef::as_ref),
            },
        };
        let response = self
            .client
            .post(format!(
                "{}/v1/orders",
                self.config.api_url.trim_end_matches('/'),
            ))
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(tracerr::new!(Error::Rejected {
                status: status.as_u16(),
                body,
            }));
        }

        let order: Order = response
            .json()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(payment::Intent {
            order_id: payment::OrderId::new(order.id),
            amount: order.amount,
            currency,
        })
    }
}

impl PaymentGateway<Verify<payment::Webhook>> for Razorpay {
    type Ok = payment::Event;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Verify(webhook): Verify<payment::Webhook>,
    ) -> Result<Self::Ok, Self::Err> {
        let secret = self.config.webhook_secret.expose_secret();
        if !signature::verify(
            &webhook.body,
            &webhook.signature,
            secret.as_bytes(),
        ) {
            return Err(tracerr::new!(Error::InvalidSignature));
        }

        parse_event(&webhook.body).map_err(tracerr::from_and_wrap!(=> Error))
    }
}

/// Raw Razorpay webhook body.
#[derive(Debug, Deserialize)]
struct RawEvent {
    /// Name of the event.
    event: String,

    /// Entities the event is about.
    #[serde(default)]
    payload: Value,
}

/// Raw Razorpay payment entity.
#[derive(Debug, Deserialize)]
struct RawPayment {
    /// ID of the payment.
    id: String,

    /// ID of the order the payment is made for.
    order_id: String,

    /// Amount of the payment in minor units.
    amount: u64,

    /// ISO 4217 currency code of the payment.
    currency: String,

    /// Notes of the order, either an object or an empty array.
    #[serde(default)]
    notes: Value,
}

/// Parses the provided Razorpay webhook `body` into a [`payment::Event`].
///
/// # Errors
///
/// If the `body` is not a valid Razorpay webhook, or a captured payment
/// misses its required fields.
pub fn parse_event(
    body: &[u8],
) -> Result<payment::Event, serde_json::Error> {
    let RawEvent { event, mut payload } = serde_json::from_slice(body)?;
    if event != CAPTURED {
        return Ok(payment::Event::Ignored { kind: event });
    }

    let entity = payload
        .pointer_mut("/payment/entity")
        .map(Value::take)
        .unwrap_or_default();
    let RawPayment {
        id,
        order_id,
        amount,
        currency,
        notes,
    } = serde_json::from_value(entity)?;
    let note = |key: &str| notes.get(key).and_then(Value::as_str);

    Ok(payment::Event::Captured(payment::Capture {
        payment_id: id,
        order_id: payment::OrderId::new(order_id),
        amount,
        currency: Currency::from_code(&currency),
        land_id: note("landId").and_then(|id| id.parse().ok()),
        payer_email: note("userEmail").map(ToOwned::to_owned),
    }))
}

#[cfg(test)]
mod spec {
    use common::{operations::Verify, Currency};

    use crate::{
        domain::{land, payment},
        infra::payment::{signature, Error, PaymentGateway as _},
    };

    use super::{parse_event, Config, Razorpay};

    fn captured(notes: &str) -> String {
        format!(
            r#"{{
                "event": "payment.captured",
                "payload": {{"payment": {{"entity": {{
                    "id": "pay_1",
                    "order_id": "order_1",
                    "amount": 500000,
                    "currency": "INR",
                    "notes": {notes}
                }}}}}}
            }}"#,
        )
    }

    #[test]
    fn parses_captured_payment() {
        let land_id = land::Id::new();
        let body = captured(&format!(
            r#"{{"landId": "{land_id}", "userEmail": "farmer@example.com"}}"#,
        ));

        let payment::Event::Captured(capture) =
            parse_event(body.as_bytes()).unwrap()
        else {
            panic!("expected captured event");
        };
        assert_eq!(capture.payment_id, "pay_1");
        assert_eq!(capture.order_id, payment::OrderId::new("order_1"));
        assert_eq!(capture.amount, 500_000);
        assert_eq!(capture.currency, Some(Currency::Inr));
        assert_eq!(capture.land_id, Some(land_id));
        assert_eq!(capture.payer_email.as_deref(), Some("farmer@example.com"));
    }

    #[test]
    fn tolerates_empty_notes() {
        let payment::Event::Captured(capture) =
            parse_event(captured("[]").as_bytes()).unwrap()
        else {
            panic!("expected captured event");
        };
        assert_eq!(capture.land_id, None);
        assert_eq!(capture.payer_email, None);

        let payment::Event::Captured(capture) =
            parse_event(captured(r#"{"landId": "garbage"}"#).as_bytes())
                .unwrap()
        else {
            panic!("expected captured event");
        };
        assert_eq!(capture.land_id, None);
    }

    #[test]
    fn ignores_other_events() {
        assert_eq!(
            parse_event(br#"{"event": "payment.failed", "payload": {}}"#)
                .unwrap(),
            payment::Event::Ignored {
                kind: "payment.failed".into(),
            },
        );
        assert_eq!(
            parse_event(br#"{"event": "order.paid"}"#).unwrap(),
            payment::Event::Ignored {
                kind: "order.paid".into(),
            },
        );
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(parse_event(b"not json").is_err());
        assert!(parse_event(br#"{"payload": {}}"#).is_err());
        assert!(parse_event(br#"{"event": "payment.captured"}"#).is_err());
    }

    fn razorpay() -> Razorpay {
        Razorpay::new(Config {
            api_url: "http://127.0.0.1:1".into(),
            key_id: "rzp_test".into(),
            key_secret: "key_secret".into(),
            webhook_secret: "webhook_secret".into(),
        })
    }

    #[tokio::test]
    async fn verifies_webhook_signature() {
        let body = captured("[]").into_bytes();

        let event = razorpay()
            .execute(Verify(payment::Webhook {
                signature: signature::sign(&body, b"webhook_secret"),
                body: body.clone(),
            }))
            .await
            .unwrap();
        assert!(matches!(event, payment::Event::Captured(_)));

        let err = razorpay()
            .execute(Verify(payment::Webhook {
                signature: signature::sign(&body, b"another_secret"),
                body,
            }))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), Error::InvalidSignature));
    }
}
