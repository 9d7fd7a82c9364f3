//! [`Land`]-related read definitions.

#[cfg(doc)]
use crate::domain::Land;

pub mod list {
    //! [`Land`] list definitions.

    use common::Money;

    use crate::domain::{land, user, Land};

    /// Filter of a [`Land`] list.
    ///
    /// Every provided criterion must match. Text criteria are matched
    /// case-insensitively.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Words, any of which should occur in a [`land::Title`] or a
        /// [`land::Description`].
        pub keyword: Option<String>,

        /// Part of a [`land::Location`].
        pub location: Option<String>,

        /// Part of a [`land::SoilType`].
        pub soil_type: Option<String>,

        /// Maximum lease rate.
        ///
        /// Sharing listings are never paid, so always match.
        pub max_lease_rate: Option<Money>,

        /// Required [`land::ListingKind`].
        pub listing: Option<land::ListingKind>,

        /// Required [`land::Status`].
        pub status: Option<land::Status>,

        /// Required owner.
        pub owner_id: Option<user::Id>,
    }

    impl Filter {
        /// Returns the whitespace-separated words of the
        /// [`Filter::keyword`], if any.
        #[must_use]
        pub fn keywords(&self) -> Vec<String> {
            self.keyword
                .as_deref()
                .map(|k| {
                    k.split_whitespace().map(str::to_lowercase).collect()
                })
                .unwrap_or_default()
        }

        /// Checks whether the provided [`Land`] matches this [`Filter`].
        #[must_use]
        pub fn matches(&self, land: &Land) -> bool {
            let details = &land.details;

            let keywords = self.keywords();
            let keyword_matches = keywords.is_empty() || {
                let title = details.title.to_string().to_lowercase();
                let description =
                    details.description.to_string().to_lowercase();
                keywords
                    .iter()
                    .any(|w| title.contains(w) || description.contains(w))
            };

            let location_matches = self.location.as_deref().map_or(true, |l| {
                contains_ignore_case(&details.location.to_string(), l)
            });

            let soil_matches = self.soil_type.as_deref().map_or(true, |s| {
                details
                    .soil_type
                    .as_ref()
                    .is_some_and(|t| contains_ignore_case(&t.to_string(), s))
            });

            let rate_matches = self.max_lease_rate.map_or(true, |max| {
                land.listing.lease_rate().map_or(true, |rate| {
                    rate.currency == max.currency && rate.amount <= max.amount
                })
            });

            keyword_matches
                && location_matches
                && soil_matches
                && rate_matches
                && self.listing.map_or(true, |k| land.listing.kind() == k)
                && self.status.map_or(true, |s| land.status == s)
                && self.owner_id.map_or(true, |o| land.owner_id == o)
        }
    }

    /// Checks whether the `haystack` contains the `needle` ignoring case.
    fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(&needle.trim().to_lowercase())
    }

    #[cfg(test)]
    mod spec {
        use std::str::FromStr as _;

        use common::{Money, Percent};

        use crate::domain::{land, user, Land};

        use super::Filter;

        fn land(title: &str, location: &str, listing: land::Listing) -> Land {
            Land::new(
                land::Id::new(),
                user::Id::new(),
                land::Details {
                    title: title.parse().unwrap(),
                    description: "".parse().unwrap(),
                    location: location.parse().unwrap(),
                    size: "2 acres".parse().unwrap(),
                    soil_type: Some("Black cotton".parse().unwrap()),
                    soil_ph: None,
                    water_source: None,
                    electricity_available: false,
                    facilities: vec![],
                },
                listing,
                None,
            )
        }

        fn paid(rate: &str) -> land::Listing {
            land::Listing::Paid {
                lease_rate: Money::from_str(rate).unwrap(),
            }
        }

        #[test]
        fn matches_everything_by_default() {
            let land = land("Orchard", "Pune", paid("100INR"));
            assert!(Filter::default().matches(&land));
        }

        #[test]
        fn matches_any_keyword() {
            let land = land("Mango Orchard", "Pune", paid("100INR"));

            let filter = Filter {
                keyword: Some("grape mango".into()),
                ..Filter::default()
            };
            assert!(filter.matches(&land));

            let filter = Filter {
                keyword: Some("grape".into()),
                ..Filter::default()
            };
            assert!(!filter.matches(&land));
        }

        #[test]
        fn matches_location_and_soil_ignoring_case() {
            let land = land("Orchard", "Pune, Maharashtra", paid("100INR"));

            let filter = Filter {
                location: Some("pune".into()),
                soil_type: Some("BLACK".into()),
                ..Filter::default()
            };
            assert!(filter.matches(&land));

            let filter = Filter {
                location: Some("Nashik".into()),
                ..Filter::default()
            };
            assert!(!filter.matches(&land));
        }

        #[test]
        fn bounds_lease_rate() {
            let cheap = land("Plot", "Pune", paid("100INR"));
            let pricey = land("Plot", "Pune", paid("10000INR"));
            let dollars = land("Plot", "Pune", paid("10USD"));
            let sharing = land(
                "Plot",
                "Pune",
                land::Listing::Sharing {
                    percentage: Percent::from_str("20").unwrap(),
                },
            );

            let filter = Filter {
                max_lease_rate: Some(Money::from_str("500INR").unwrap()),
                ..Filter::default()
            };
            assert!(filter.matches(&cheap));
            assert!(!filter.matches(&pricey));
            assert!(!filter.matches(&dollars));
            assert!(filter.matches(&sharing));
        }
    }
}
