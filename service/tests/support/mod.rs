//! Fixtures and recording test doubles shared by the workflow tests.

#![allow(dead_code, reason = "every test binary uses its own subset")]

use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use common::{
    operations::{By, Create, Deliver, Insert, Render, Select, Verify},
    Currency, Money,
};
use service::{
    command::{CreateLand, SignLandAsOwner, SignLandAsUser},
    domain::{land, object, payment, user, Agreement, Land, Notification, User},
    infra::{
        document::{self, Html},
        notification,
        payment::{self as gateway, razorpay, signature},
        storage::{self, fs, Fs},
        Database as _, DocumentGenerator, Memory, Notifier, PaymentGateway,
    },
    query, Command as _, Config, Service,
};
use tempfile::TempDir;
use tracerr::Traced;

/// Secret the test webhooks are signed with.
pub const WEBHOOK_SECRET: &[u8] = b"whsec_test";

/// [`Service`] wired with in-memory and recording collaborators.
pub type TestService<Dg> = Service<Memory, Gateway, Outbox, Dg, Fs>;

/// [`PaymentGateway`] recording created intents.
#[derive(Clone, Debug, Default)]
pub struct Gateway(Arc<Mutex<GatewayState>>);

#[derive(Debug, Default)]
struct GatewayState {
    requests: Vec<payment::IntentRequest>,
    failing: bool,
    delay: Option<Duration>,
}

impl Gateway {
    /// Returns all the intent requests received so far.
    pub fn requests(&self) -> Vec<payment::IntentRequest> {
        self.0.lock().unwrap().requests.clone()
    }

    /// Makes all the following intent creations fail.
    pub fn fail(&self) {
        self.0.lock().unwrap().failing = true;
    }

    /// Delays all the following intent creations.
    pub fn stall(&self, delay: Duration) {
        self.0.lock().unwrap().delay = Some(delay);
    }
}

impl PaymentGateway<Create<payment::IntentRequest>> for Gateway {
    type Ok = payment::Intent;
    type Err = Traced<gateway::Error>;

    async fn execute(
        &self,
        Create(req): Create<payment::IntentRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        let delay = self.0.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.0.lock().unwrap();
        if state.failing {
            return Err(tracerr::new!(gateway::Error::Rejected {
                status: 503,
                body: "unavailable".into(),
            }));
        }
        state.requests.push(req.clone());
        Ok(payment::Intent {
            order_id: payment::OrderId::new(format!(
                "order_{}",
                state.requests.len(),
            )),
            amount: req.amount,
            currency: req.currency,
        })
    }
}

impl PaymentGateway<Verify<payment::Webhook>> for Gateway {
    type Ok = payment::Event;
    type Err = Traced<gateway::Error>;

    async fn execute(
        &self,
        Verify(webhook): Verify<payment::Webhook>,
    ) -> Result<Self::Ok, Self::Err> {
        if !signature::verify(&webhook.body, &webhook.signature, WEBHOOK_SECRET)
        {
            return Err(tracerr::new!(gateway::Error::InvalidSignature));
        }
        razorpay::parse_event(&webhook.body)
            .map_err(tracerr::from_and_wrap!(=> gateway::Error))
    }
}

/// [`Notifier`] recording delivered notifications.
#[derive(Clone, Debug, Default)]
pub struct Outbox(Arc<Mutex<OutboxState>>);

#[derive(Debug, Default)]
struct OutboxState {
    delivered: Vec<Notification>,
    attempts: usize,
    failures_left: usize,
}

impl Outbox {
    /// Returns all the successfully delivered notifications.
    pub fn delivered(&self) -> Vec<Notification> {
        self.0.lock().unwrap().delivered.clone()
    }

    /// Returns the number of delivery attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.0.lock().unwrap().attempts
    }

    /// Makes the next `n` deliveries fail.
    pub fn fail_next(&self, n: usize) {
        self.0.lock().unwrap().failures_left = n;
    }
}

impl Notifier<Deliver<Notification>> for Outbox {
    type Ok = ();
    type Err = Traced<notification::Error>;

    async fn execute(
        &self,
        Deliver(notification): Deliver<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.0.lock().unwrap();
        state.attempts += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(tracerr::new!(notification::Error::Rejected {
                provider: "outbox",
                status: 500,
                body: "unavailable".into(),
            }));
        }
        state.delivered.push(notification);
        Ok(())
    }
}

/// [`DocumentGenerator`] always failing to store documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrokenDocuments;

impl DocumentGenerator<Render<Agreement>> for BrokenDocuments {
    type Ok = object::Url;
    type Err = Traced<document::Error>;

    async fn execute(
        &self,
        _: Render<Agreement>,
    ) -> Result<Self::Ok, Self::Err> {
        Err(tracerr::new!(document::Error::from(storage::Error::from(
            io::Error::other("disk is full"),
        ))))
    }
}

/// Marketplace with an owner and two farmers registered.
pub struct World<Dg = Html<Fs>> {
    pub service: TestService<Dg>,
    pub db: Memory,
    pub gateway: Gateway,
    pub outbox: Outbox,
    pub files: TempDir,
    pub owner: User,
    pub farmer: User,
    pub other_farmer: User,
}

impl World {
    /// Creates a new [`World`] rendering real HTML agreements.
    pub async fn new() -> Self {
        Self::with_documents(Html::new).await
    }
}

impl World<BrokenDocuments> {
    /// Creates a new [`World`] unable to generate any document.
    pub async fn with_broken_documents() -> Self {
        Self::with_documents(|_| BrokenDocuments).await
    }
}

impl<Dg> World<Dg> {
    async fn with_documents(documents: impl FnOnce(Fs) -> Dg) -> Self {
        let files = tempfile::tempdir().unwrap();
        let store = Fs::new(fs::Config {
            root: files.path().to_owned(),
            public_url: "http://files.test".into(),
        });
        let db = Memory::new();
        let gateway = Gateway::default();
        let outbox = Outbox::default();

        let owner = user("Ravi", Some("ravi@farm.in"), Some("+919876543210"));
        let farmer = user("Asha", Some("asha@farm.in"), Some("98765 43211"));
        let other_farmer = user("Kiran", None, Some("+919876543212"));
        for u in [&owner, &farmer, &other_farmer] {
            db.execute(Insert(u.clone())).await.unwrap();
        }

        let service = Service::new(
            Config {
                currency: Currency::Inr,
                payment_timeout: Duration::from_millis(200),
                notification_timeout: Duration::from_millis(200),
                notification_retry_delay: Duration::from_millis(10),
            },
            db.clone(),
            gateway.clone(),
            outbox.clone(),
            documents(store.clone()),
            store,
        );

        Self {
            service,
            db,
            gateway,
            outbox,
            files,
            owner,
            farmer,
            other_farmer,
        }
    }

    /// Returns the current state of the [`Land`] with the provided ID.
    pub async fn land(&self, id: land::Id) -> Land {
        self.service
            .execute(query::land::ById::by(id))
            .await
            .unwrap()
            .unwrap()
    }

    /// Lists a new [`Land`] of the owner with the provided listing terms.
    pub async fn list(&self, listing: land::ListingRequest) -> Land {
        self.service
            .execute(CreateLand {
                owner_id: self.owner.id,
                details: details(),
                listing,
                image: None,
            })
            .await
            .unwrap()
    }

    /// Lists a new paid [`Land`] for `5000INR`.
    pub async fn paid_land(&self) -> Land {
        self.list(land::ListingRequest::Paid {
            lease_rate: Some(inr("5000")),
        })
        .await
    }

    /// Lists a new sharing [`Land`] for 30% of produce.
    pub async fn sharing_land(&self) -> Land {
        self.list(land::ListingRequest::Sharing {
            percentage: Some("30".parse().unwrap()),
            lease_rate: Some(inr("5000")),
        })
        .await
    }
}

impl World {
    /// Signs the agreement of the provided [`Land`] by its owner and the
    /// farmer.
    pub async fn sign_by_both(&self, land: &Land) -> Land {
        _ = self
            .service
            .execute(SignLandAsOwner {
                land_id: land.id,
                owner_id: self.owner.id,
            })
            .await
            .unwrap();
        self.service
            .execute(SignLandAsUser {
                land_id: land.id,
                user_id: self.farmer.id,
            })
            .await
            .unwrap()
    }
}

/// Creates a new [`User`] with the provided contacts.
pub fn user(name: &str, email: Option<&str>, phone: Option<&str>) -> User {
    User {
        id: user::Id::new(),
        name: user::Name::new(name).unwrap(),
        email: email.map(|e| user::Email::new(e).unwrap()),
        phone: phone.map(|p| user::Phone::new(p).unwrap()),
        role: user::Role::Farmer,
    }
}

/// Returns [`land::Details`] of a typical farming plot.
pub fn details() -> land::Details {
    land::Details {
        title: "Green Acres".parse().unwrap(),
        description: "Fertile plot near the river".parse().unwrap(),
        location: "Nashik, Maharashtra".parse().unwrap(),
        size: "5 acres".parse().unwrap(),
        soil_type: Some("Black cotton".parse().unwrap()),
        soil_ph: Some("6.8".parse().unwrap()),
        water_source: Some("Canal".parse().unwrap()),
        electricity_available: true,
        facilities: vec!["Storage shed".parse().unwrap()],
    }
}

/// Parses the provided amount of Indian rupees.
pub fn inr(amount: &str) -> Money {
    format!("{amount}INR").parse().unwrap()
}

/// Creates a [`payment::Webhook`] with the provided `body` signed by the
/// [`WEBHOOK_SECRET`].
pub fn signed_webhook(body: String) -> payment::Webhook {
    payment::Webhook {
        signature: signature::sign(body.as_bytes(), WEBHOOK_SECRET),
        body: body.into_bytes(),
    }
}

/// Creates a signed `payment.captured` [`payment::Webhook`] for the provided
/// [`payment::Intent`] of the [`Land`] with the provided ID.
pub fn captured(
    land_id: land::Id,
    intent: &payment::Intent,
) -> payment::Webhook {
    signed_webhook(format!(
        r#"{{
            "event": "payment.captured",
            "payload": {{"payment": {{"entity": {{
                "id": "pay_1",
                "order_id": "{}",
                "amount": {},
                "currency": "{}",
                "notes": {{"landId": "{land_id}", "userEmail": "asha@farm.in"}}
            }}}}}}
        }}"#,
        intent.order_id,
        intent.amount,
        intent.currency.code(),
    ))
}

/// Selects a [`Land`] directly from the [`Memory`] database.
pub async fn stored_land(db: &Memory, id: land::Id) -> Option<Land> {
    db.execute(Select(By::<Option<Land>, _>::new(id)))
        .await
        .unwrap()
}
