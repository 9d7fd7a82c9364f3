//! HTML [`DocumentGenerator`] implementation.

use common::{
    operations::{Insert, Render},
    DateTime,
};
use maud::{html, Markup, DOCTYPE};
use tracerr::Traced;
use xxhash_rust::xxh3;

use crate::{
    domain::{land, object, Agreement, Land, Object, User},
    infra::{
        document::{DocumentGenerator, Error},
        storage::{self, ObjectStore},
    },
};

/// [`DocumentGenerator`] rendering [`Agreement`]s as HTML pages and putting
/// them into an [`ObjectStore`].
#[derive(Clone, Debug)]
pub struct Html<Os> {
    /// [`ObjectStore`] to put rendered documents into.
    store: Os,
}

impl<Os> Html<Os> {
    /// Creates a new [`Html`] [`DocumentGenerator`] storing documents in the
    /// provided [`ObjectStore`].
    #[must_use]
    pub const fn new(store: Os) -> Self {
        Self { store }
    }
}

impl<Os> DocumentGenerator<Render<Agreement>> for Html<Os>
where
    Os: ObjectStore<
        Insert<Object>,
        Ok = object::Url,
        Err = Traced<storage::Error>,
    >,
{
    type Ok = object::Url;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Render(agreement): Render<Agreement>,
    ) -> Result<Self::Ok, Self::Err> {
        let content = render(&agreement, DateTime::now()).into_string();
        let object = Object {
            key: key(&agreement, content.as_bytes()),
            content_type: "text/html; charset=utf-8".into(),
            content: content.into_bytes(),
        };

        self.store
            .execute(Insert(object))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> Error))
    }
}

/// Builds a content-addressed [`object::Key`] for the rendered [`Agreement`],
/// so a re-rendered document never overwrites a previous one.
fn key(agreement: &Agreement, content: &[u8]) -> object::Key {
    let key = format!(
        "agreements/{}/{}-{:032x}.html",
        agreement.land().id,
        agreement.stage(),
        xxh3::xxh3_128(content),
    );
    // UUIDs, snake_case stages and hex digits are always valid segments.
    object::Key::new(key).expect("valid `object::Key`")
}

/// Renders the provided [`Agreement`] as a "Legal Farming Agreement" HTML
/// page dated by the provided [`DateTime`].
fn render(agreement: &Agreement, date: DateTime) -> Markup {
    let land = agreement.land();
    let owner = agreement.owner();
    let lessee = agreement.lessee();

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "Legal Farming Agreement" }
                style {
                    "body { font-family: serif; max-width: 48rem; \
                     margin: 2rem auto; line-height: 1.5; } \
                     .signature { display: inline-block; width: 45%; \
                     margin-top: 3rem; border-top: 1px solid #000; }"
                }
            }
            body {
                h1 { "Legal Farming Agreement" }
                p { "Date: " (date.to_rfc3339()) }
                p { "Agreement reference: " code { (land.id.to_string()) } }

                h2 { "1. Parties" }
                (party("Landowner", owner))
                @if let Some(lessee) = lessee {
                    (party("Lessee", lessee))
                } @else {
                    p { em { "Lessee: to be signed." } }
                }

                h2 { "2. Land" }
                (details(land))

                h2 { "3. Terms" }
                (terms(land))
                p {
                    "The Lessee shall use the Land for agricultural purposes \
                     only and shall maintain its soil, water source and \
                     facilities in good condition."
                }

                @if let Some(url) = agreement.owner_document() {
                    h2 { "4. Prior agreement" }
                    p {
                        "This agreement supersedes the owner-signed agreement "
                        @let url = url.to_string();
                        a href=(url) { (url) }
                        "."
                    }
                }

                div {
                    div.signature { "Landowner: " (owner.name.to_string()) }
                    " "
                    div.signature {
                        "Lessee: "
                        @if let Some(lessee) = lessee {
                            (lessee.name.to_string())
                        }
                    }
                }
            }
        }
    }
}

/// Renders the identity of an [`Agreement`] party.
fn party(role: &str, user: &User) -> Markup {
    html! {
        p {
            strong { (role) ": " } (user.name.to_string())
            @if let Some(email) = &user.email {
                br;
                "E-mail: " (email.to_string())
            }
            @if let Some(phone) = &user.phone {
                br;
                "Phone: " (phone.to_string())
            }
        }
    }
}

/// Renders the descriptive [`land::Details`] of a [`Land`].
fn details(land: &Land) -> Markup {
    let land::Details {
        title,
        description,
        location,
        size,
        soil_type,
        soil_ph,
        water_source,
        electricity_available,
        facilities,
    } = &land.details;

    html! {
        table {
            tr { th { "Title" } td { (title.to_string()) } }
            tr { th { "Location" } td { (location.to_string()) } }
            tr { th { "Size" } td { (size.to_string()) } }
            @if let Some(soil) = soil_type {
                tr { th { "Soil type" } td { (soil.to_string()) } }
            }
            @if let Some(ph) = soil_ph {
                tr { th { "Soil pH" } td { (ph.to_string()) } }
            }
            @if let Some(water) = water_source {
                tr { th { "Water source" } td { (water.to_string()) } }
            }
            tr {
                th { "Electricity" }
                td {
                    @if *electricity_available { "Available" } @else { "None" }
                }
            }
            @if !facilities.is_empty() {
                tr {
                    th { "Facilities" }
                    td {
                        @for (i, f) in facilities.iter().enumerate() {
                            @if i > 0 { ", " }
                            (f.to_string())
                        }
                    }
                }
            }
        }
        @let description: &str = description.as_ref();
        @if !description.is_empty() {
            p { (description) }
        }
    }
}

/// Renders the [`land::Listing`] terms of a [`Land`].
fn terms(land: &Land) -> Markup {
    html! {
        @match land.listing {
            land::Listing::Paid { lease_rate } => p {
                "Lease type: paid. The Lessee shall pay the lease rate of "
                strong {
                    (lease_rate.amount.to_string())
                    " "
                    (lease_rate.currency.code())
                }
                " to the Landowner."
            },
            land::Listing::Sharing { percentage } => p {
                "Lease type: profit sharing. The Landowner is entitled to "
                strong { (percentage.to_string()) "%" }
                " of the produce. No lease rate is payable."
            },
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money, Percent};

    use crate::domain::{agreement, land, object, user, Agreement, Land, User};

    use super::{key, render};

    fn user(name: &str) -> User {
        User {
            id: user::Id::new(),
            name: user::Name::new(name).unwrap(),
            email: user::Email::new(format!("{}@farm.in", name.to_lowercase())),
            phone: None,
            role: user::Role::Farmer,
        }
    }

    fn land(owner: &User, listing: land::Listing) -> Land {
        Land::new(
            land::Id::new(),
            owner.id,
            land::Details {
                title: "Mango <Orchard>".parse().unwrap(),
                description: "Irrigated".parse().unwrap(),
                location: "Ratnagiri".parse().unwrap(),
                size: "5 acres".parse().unwrap(),
                soil_type: Some("Laterite".parse().unwrap()),
                soil_ph: None,
                water_source: Some("Well".parse().unwrap()),
                electricity_available: true,
                facilities: vec![
                    "Shed".parse().unwrap(),
                    "Drip".parse().unwrap(),
                ],
            },
            listing,
            None,
        )
    }

    #[test]
    fn renders_owner_signed_agreement() {
        let owner = user("Ravi");
        let land = land(
            &owner,
            land::Listing::Paid {
                lease_rate: Money::from_str("5000INR").unwrap(),
            },
        );

        let html = render(
            &Agreement::OwnerSigned { land, owner },
            DateTime::now(),
        )
        .into_string();

        assert!(html.contains("<h1>Legal Farming Agreement</h1>"));
        assert!(html.contains("Ravi"));
        assert!(html.contains("ravi@farm.in"));
        assert!(html.contains("Mango &lt;Orchard&gt;"));
        assert!(html.contains("5000 INR"));
        assert!(html.contains("Lessee: to be signed."));
        assert!(html.contains("Shed, Drip"));
        assert!(!html.contains("Prior agreement"));
    }

    #[test]
    fn renders_final_agreement() {
        let owner = user("Ravi");
        let lessee = user("Asha");
        let land = land(
            &owner,
            land::Listing::Sharing {
                percentage: Percent::from_str("25").unwrap(),
            },
        );

        let html = render(
            &Agreement::Final {
                land,
                owner,
                lessee,
                owner_document: object::Url::new("http://files/owner.html"),
            },
            DateTime::now(),
        )
        .into_string();

        assert!(html.contains("Asha"));
        assert!(html.contains("25%"));
        assert!(html.contains("profit sharing"));
        assert!(html.contains(r#"href="http://files/owner.html""#));
        assert!(!html.contains("to be signed"));
    }

    #[test]
    fn addresses_documents_by_content() {
        let owner = user("Ravi");
        let land = land(
            &owner,
            land::Listing::Paid {
                lease_rate: Money::from_str("100INR").unwrap(),
            },
        );
        let id = land.id;
        let agreement = Agreement::OwnerSigned { land, owner };
        assert_eq!(agreement.stage(), agreement::Stage::OwnerSigned);

        let a = key(&agreement, b"a");
        let b = key(&agreement, b"b");

        assert_ne!(a, b);
        assert_eq!(a, key(&agreement, b"a"));
        let a = a.to_string();
        assert!(a.starts_with(&format!("agreements/{id}/owner_signed-")));
        assert!(a.ends_with(".html"));
    }
}
