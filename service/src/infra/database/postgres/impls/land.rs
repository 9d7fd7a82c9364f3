//! [`Land`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Swap},
    Currency, Money, Percent,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{land, payment, Land},
    infra::{
        database::{
            self,
            postgres::{Connection, LikePatterns},
            Postgres,
        },
        Database,
    },
    read,
};

/// Columns of the `lands` table, in the order of [`Columns::params()`].
const COLUMNS: &str = "\
    id, owner_id, \
    title, description, location, size, \
    soil_type, soil_ph, water_source, electricity_available, facilities, \
    listing_type, lease_rate, lease_currency, sharing_percentage, \
    image_url, \
    status, acquired_by, leased_via, \
    owner_signed_document, final_document, \
    payment_order_id, payment_amount, payment_currency, \
    version, created_at, updated_at";

/// [`Land`] columns which are not stored as they are.
struct Columns<'l> {
    /// [`Land`] being stored.
    land: &'l Land,

    /// [`land::ListingKind`] of the [`Land::listing`].
    listing_type: land::ListingKind,

    /// Amount of a [`land::Listing::Paid`] lease rate.
    lease_rate: Option<Decimal>,

    /// [`Currency`] of a [`land::Listing::Paid`] lease rate.
    lease_currency: Option<Currency>,

    /// [`Percent`] of a [`land::Listing::Sharing`].
    sharing_percentage: Option<Percent>,

    /// [`payment::OrderId`] of a pending [`payment::Intent`].
    payment_order_id: Option<&'l payment::OrderId>,

    /// Amount of a pending [`payment::Intent`].
    payment_amount: Option<i64>,

    /// [`Currency`] of a pending [`payment::Intent`].
    payment_currency: Option<Currency>,
}

impl<'l> Columns<'l> {
    /// Splits the provided [`Land`] into [`Columns`].
    fn new(land: &'l Land) -> Self {
        let (lease_rate, sharing_percentage) = match land.listing {
            land::Listing::Paid { lease_rate } => (Some(lease_rate), None),
            land::Listing::Sharing { percentage } => (None, Some(percentage)),
        };
        let payment = land.payment.as_ref();
        Self {
            land,
            listing_type: land.listing.kind(),
            lease_rate: lease_rate.map(|m| m.amount),
            lease_currency: lease_rate.map(|m| m.currency),
            sharing_percentage,
            payment_order_id: payment.map(|p| &p.order_id),
            payment_amount: payment.map(|p| {
                i64::try_from(p.amount).expect("`payment_amount` overflow")
            }),
            payment_currency: payment.map(|p| p.currency),
        }
    }

    /// Returns the SQL parameters in the order of [`COLUMNS`].
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let Land {
            id,
            owner_id,
            details,
            listing: _,
            image,
            status,
            acquired_by,
            leased_via,
            owner_signed_document,
            final_document,
            payment: _,
            version,
            created_at,
            updated_at,
        } = self.land;
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
        } = details;
        let params: [&(dyn ToSql + Sync); 27] = [
            id,
            owner_id,
            title,
            description,
            location,
            size,
            soil_type,
            soil_ph,
            water_source,
            electricity_available,
            facilities,
            &self.listing_type,
            &self.lease_rate,
            &self.lease_currency,
            &self.sharing_percentage,
            image,
            status,
            acquired_by,
            leased_via,
            owner_signed_document,
            final_document,
            &self.payment_order_id,
            &self.payment_amount,
            &self.payment_currency,
            version,
            created_at,
            updated_at,
        ];
        params.into()
    }
}

/// Reads a [`Land`] out of the provided [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Land {
    let listing = match row.get::<_, land::ListingKind>("listing_type") {
        land::ListingKind::Paid => land::Listing::Paid {
            lease_rate: Money {
                amount: row.get("lease_rate"),
                currency: row.get("lease_currency"),
            },
        },
        land::ListingKind::Sharing => land::Listing::Sharing {
            percentage: row.get("sharing_percentage"),
        },
    };
    let payment = row
        .get::<_, Option<payment::OrderId>>("payment_order_id")
        .map(|order_id| payment::Intent {
            order_id,
            amount: u64::try_from(row.get::<_, i64>("payment_amount"))
                .expect("`payment_amount` overflow"),
            currency: row.get("payment_currency"),
        });

    Land {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        details: land::Details {
            title: row.get("title"),
            description: row.get("description"),
            location: row.get("location"),
            size: row.get("size"),
            soil_type: row.get("soil_type"),
            soil_ph: row.get("soil_ph"),
            water_source: row.get("water_source"),
            electricity_available: row.get("electricity_available"),
            facilities: row.get("facilities"),
        },
        listing,
        image: row.get("image_url"),
        status: row.get("status"),
        acquired_by: row.get("acquired_by"),
        leased_via: row.get("leased_via"),
        owner_signed_document: row.get("owner_signed_document"),
        final_document: row.get("final_document"),
        payment,
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Land>, land::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Land>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Land>, land::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: land::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM lands \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Land>, read::land::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Land>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Land>, read::land::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let read::land::list::Filter {
            keyword: _,
            location,
            soil_type,
            max_lease_rate,
            listing,
            status,
            owner_id,
        } = &filter;

        let keywords = LikePatterns::any_of(filter.keywords());
        let location = location.as_deref().map(str::trim);
        let soil_type = soil_type.as_deref().map(str::trim);
        let max_amount = max_lease_rate.map(|m| m.amount);
        let max_currency = max_lease_rate.map(|m| m.currency);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let mut conditions = vec![];

        if let Some(k) = &keywords {
            ps.push(k);
            let idx = ps.len();
            conditions.push(format!(
                "(title ILIKE ANY(${idx}::VARCHAR[]) \
                  OR description ILIKE ANY(${idx}::VARCHAR[]))",
            ));
        }
        if let Some(l) = &location {
            ps.push(l);
            conditions.push(format!(
                "STRPOS(LOWER(location), LOWER(${}::VARCHAR)) > 0",
                ps.len(),
            ));
        }
        if let Some(s) = &soil_type {
            ps.push(s);
            conditions.push(format!(
                "STRPOS(LOWER(soil_type), LOWER(${}::VARCHAR)) > 0",
                ps.len(),
            ));
        }
        if let (Some(amount), Some(currency)) = (&max_amount, &max_currency) {
            ps.push(amount);
            ps.push(currency);
            let (amount_idx, currency_idx) = (ps.len() - 1, ps.len());
            conditions.push(format!(
                "(listing_type = {sharing} \
                  OR (lease_currency = ${currency_idx}::INT2 \
                      AND lease_rate <= ${amount_idx}::NUMERIC))",
                sharing = land::ListingKind::Sharing.u8(),
            ));
        }
        if let Some(l) = listing {
            ps.push(l);
            conditions.push(format!("listing_type = ${}::INT2", ps.len()));
        }
        if let Some(s) = status {
            ps.push(s);
            conditions.push(format!("status = ${}::INT2", ps.len()));
        }
        if let Some(o) = owner_id {
            ps.push(o);
            conditions.push(format!("owner_id = ${}::UUID", ps.len()));
        }

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM lands \
             WHERE TRUE \
                   {filtering} \
             ORDER BY created_at DESC, id DESC",
            filtering = conditions
                .iter()
                .format_with(" ", |c, f| f(&format_args!("AND {c}"))),
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Land>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(land): Insert<Land>,
    ) -> Result<Self::Ok, Self::Err> {
        let columns = Columns::new(&land);
        let params = columns.params();

        let sql = format!(
            "INSERT INTO lands ({COLUMNS}) VALUES ({})",
            (1..=params.len())
                .format_with(", ", |i, f| f(&format_args!("${i}"))),
        );
        self.exec(&sql, params.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Swap<Land, land::Version>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Swap { new, expected }: Swap<Land, land::Version>,
    ) -> Result<Self::Ok, Self::Err> {
        let columns = Columns::new(&new);
        let mut params = columns.params();
        params.push(&expected);

        // `id` and `created_at` never change.
        let sql = format!(
            "UPDATE lands \
             SET {assignments} \
             WHERE id = $1::UUID \
               AND version = ${expected}::INT8",
            assignments = COLUMNS
                .split(',')
                .map(str::trim)
                .enumerate()
                .filter(|(_, c)| !matches!(*c, "id" | "created_at"))
                .format_with(", ", |(i, c), f| {
                    f(&format_args!("{c} = ${}", i + 1))
                }),
            expected = params.len(),
        );
        self.swap(&sql, params.as_slice())
            .await
            .map_err(tracerr::wrap!())
    }
}
