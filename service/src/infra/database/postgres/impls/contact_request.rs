//! [`ContactRequest`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Swap};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contact_request, land, user, ContactRequest},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Reads a [`ContactRequest`] out of the provided [`Row`].
fn from_row(row: &Row) -> ContactRequest {
    ContactRequest {
        id: row.get("id"),
        land_id: row.get("land_id"),
        from_user: row.get("from_user"),
        to_owner: row.get("to_owner"),
        message: row.get("message"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        decided_at: row.get("decided_at"),
    }
}

impl<C> Database<Select<By<Option<ContactRequest>, contact_request::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<ContactRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ContactRequest>, contact_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contact_request::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, land_id, from_user, to_owner, message, status, \
                   created_at, decided_at \
            FROM contact_requests \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<ContactRequest>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<ContactRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<ContactRequest>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let owner_id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, land_id, from_user, to_owner, message, status, \
                   created_at, decided_at \
            FROM contact_requests \
            WHERE to_owner = $1::UUID \
            ORDER BY created_at DESC, id DESC";
        Ok(self
            .query(SQL, &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<ContactRequest>, land::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<ContactRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<ContactRequest>, land::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let land_id: land::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, land_id, from_user, to_owner, message, status, \
                   created_at, decided_at \
            FROM contact_requests \
            WHERE land_id = $1::UUID \
            ORDER BY created_at DESC, id DESC";
        Ok(self
            .query(SQL, &[&land_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<ContactRequest>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(req): Insert<ContactRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        let ContactRequest {
            id,
            land_id,
            from_user,
            to_owner,
            message,
            status,
            created_at,
            decided_at,
        } = req;

        const SQL: &str = "\
            INSERT INTO contact_requests (\
                id, land_id, from_user, to_owner, message, status, \
                created_at, decided_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::VARCHAR, $6::INT2, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &land_id,
                &from_user,
                &to_owner,
                &message,
                &status,
                &created_at,
                &decided_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Swap<ContactRequest, contact_request::Status>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Swap { new, expected }: Swap<ContactRequest, contact_request::Status>,
    ) -> Result<Self::Ok, Self::Err> {
        // Only the decision is mutable.
        const SQL: &str = "\
            UPDATE contact_requests \
            SET status = $2::INT2, \
                decided_at = $3::TIMESTAMPTZ \
            WHERE id = $1::UUID \
              AND status = $4::INT2";
        self.swap(SQL, &[&new.id, &new.status, &new.decided_at, &expected])
            .await
            .map_err(tracerr::wrap!())
    }
}
