//! In-memory [`Database`] implementation.
//!
//! All the writes are serialized by a single writer lock. A transaction holds
//! this lock for its whole lifetime, works on its own snapshot of the data and
//! publishes the snapshot on [`Commit`]. Dropping a transaction without
//! committing discards all its changes.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex as SyncMutex, PoisonError},
};

use common::operations::{By, Commit, Insert, Select, Swap, Transact};
use derive_more::{Debug, Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{contact_request, land, user, ContactRequest, Land, User},
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub struct Memory<S = NonTx>(S);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Data stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Land`]s.
    lands: HashMap<land::Id, Land>,

    /// Stored [`ContactRequest`]s.
    contact_requests: HashMap<contact_request::Id, ContactRequest>,
}

/// Non-transactional [`Memory`] storage.
#[derive(Clone, Debug, Default)]
pub struct NonTx(Arc<Mutex<Tables>>);

/// Transactional [`Memory`] storage.
#[derive(Clone, Debug)]
pub struct Tx(Arc<SyncMutex<Option<Snapshot>>>);

/// Snapshot of [`Tables`] being modified by a [`Tx`].
#[derive(Debug)]
struct Snapshot {
    /// Writer lock held for the whole [`Tx`] lifetime.
    #[debug(skip)]
    guard: OwnedMutexGuard<Tables>,

    /// [`Tables`] modified by the [`Tx`].
    tables: Tables,
}

impl Tx {
    /// Runs the provided function over the [`Snapshot`] of this [`Tx`].
    fn with_snapshot<R>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> R,
    ) -> Result<R, Traced<database::Error>> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
            .map(f)
            .ok_or_else(|| tracerr::new!(Error::TxFinished))
            .map_err(tracerr::map_from)
    }
}

/// Storage of [`Tables`] backing a [`Memory`] database.
pub trait Storage {
    /// Runs the provided function over the stored [`Tables`] exclusively.
    ///
    /// # Errors
    ///
    /// If the [`Tables`] cannot be accessed anymore.
    fn with<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

impl Storage for NonTx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> R,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&mut *self.0.lock().await))
    }
}

impl Storage for Tx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> R,
    ) -> Result<R, Traced<database::Error>> {
        self.with_snapshot(|snapshot| f(&mut snapshot.tables))
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Transaction is used after being committed.
    #[display("Transaction is already finished")]
    TxFinished,
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let guard = Arc::clone(&self.0 .0).lock_owned().await;
        let tables = guard.clone();
        Ok(Memory(Tx(Arc::new(SyncMutex::new(Some(Snapshot {
            guard,
            tables,
        }))))))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Snapshot { mut guard, tables } = self
            .0
             .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| tracerr::new!(Error::TxFinished))
            .map_err(tracerr::map_from)?;
        *guard = tables;
        Ok(())
    }
}

impl<S: Storage> Database<Select<By<Option<User>, user::Id>>> for Memory<S> {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|t| t.users.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Insert<User>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|t| t.users.insert(user.id, user))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<S: Storage> Database<Select<By<Option<Land>, land::Id>>> for Memory<S> {
    type Ok = Option<Land>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Land>, land::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|t| t.lands.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Vec<Land>, read::land::list::Filter>>>
    for Memory<S>
{
    type Ok = Vec<Land>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Land>, read::land::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let mut lands = self
            .0
            .with(|t| {
                t.lands
                    .values()
                    .filter(|l| filter.matches(l))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await
            .map_err(tracerr::wrap!())?;
        lands.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lands)
    }
}

impl<S: Storage> Database<Insert<Land>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(land): Insert<Land>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|t| t.lands.insert(land.id, land))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<S: Storage> Database<Swap<Land, land::Version>> for Memory<S> {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Swap { new, expected }: Swap<Land, land::Version>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|t| match t.lands.get_mut(&new.id) {
                Some(stored) if stored.version == expected => {
                    *stored = new;
                    true
                }
                Some(_) | None => false,
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage>
    Database<Select<By<Option<ContactRequest>, contact_request::Id>>>
    for Memory<S>
{
    type Ok = Option<ContactRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ContactRequest>, contact_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|t| t.contact_requests.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Vec<ContactRequest>, user::Id>>>
    for Memory<S>
{
    type Ok = Vec<ContactRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<ContactRequest>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        self.0
            .with(|t| {
                newest_first(
                    t.contact_requests
                        .values()
                        .filter(|r| r.to_owner == owner_id),
                )
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Vec<ContactRequest>, land::Id>>>
    for Memory<S>
{
    type Ok = Vec<ContactRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<ContactRequest>, land::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let land_id = by.into_inner();
        self.0
            .with(|t| {
                newest_first(
                    t.contact_requests
                        .values()
                        .filter(|r| r.land_id == land_id),
                )
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Insert<ContactRequest>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(req): Insert<ContactRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|t| t.contact_requests.insert(req.id, req))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<S: Storage> Database<Swap<ContactRequest, contact_request::Status>>
    for Memory<S>
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Swap { new, expected }: Swap<ContactRequest, contact_request::Status>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|t| match t.contact_requests.get_mut(&new.id) {
                Some(stored) if stored.status == expected => {
                    *stored = new;
                    true
                }
                Some(_) | None => false,
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Collects the provided [`ContactRequest`]s ordered from the newest to the
/// oldest.
fn newest_first<'a>(
    requests: impl Iterator<Item = &'a ContactRequest>,
) -> Vec<ContactRequest> {
    let mut requests = requests.cloned().collect::<Vec<_>>();
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    requests
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Commit, Insert, Select, Swap, Transact},
        Money,
    };

    use crate::{
        domain::{land, user, Land},
        infra::Database as _,
    };

    use super::Memory;

    fn land() -> Land {
        Land::new(
            land::Id::new(),
            user::Id::new(),
            land::Details {
                title: "Plot".parse().unwrap(),
                description: "".parse().unwrap(),
                location: "Pune".parse().unwrap(),
                size: "1 acre".parse().unwrap(),
                soil_type: None,
                soil_ph: None,
                water_source: None,
                electricity_available: false,
                facilities: vec![],
            },
            land::Listing::Paid {
                lease_rate: "100INR".parse::<Money>().unwrap(),
            },
            None,
        )
    }

    async fn select(db: &Memory, id: land::Id) -> Option<Land> {
        db.execute(Select(By::<Option<Land>, _>::new(id))).await.unwrap()
    }

    #[tokio::test]
    async fn swaps_only_expected_version() {
        let db = Memory::new();
        let mut stored = land();
        db.execute(Insert(stored.clone())).await.unwrap();

        let expected = stored.version;
        stored.withdraw().unwrap();
        let stale = stored.clone();

        assert!(db
            .execute(Swap {
                new: stored.clone(),
                expected,
            })
            .await
            .unwrap());
        assert!(!db.execute(Swap { new: stale, expected }).await.unwrap());

        let selected = select(&db, stored.id).await.unwrap();
        assert_eq!(selected.version, stored.version);
        assert_eq!(selected.status, land::Status::Withdrawn);
    }

    #[tokio::test]
    async fn discards_uncommitted_transaction() {
        let db = Memory::new();
        let stored = land();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(stored.clone())).await.unwrap();
        assert!(tx
            .execute(Select(By::<Option<Land>, _>::new(stored.id)))
            .await
            .unwrap()
            .is_some());
        drop(tx);

        assert!(select(&db, stored.id).await.is_none());
    }

    #[tokio::test]
    async fn publishes_committed_transaction() {
        let db = Memory::new();
        let stored = land();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(stored.clone())).await.unwrap();
        tx.execute(Commit).await.unwrap();

        assert!(select(&db, stored.id).await.is_some());
        assert!(tx.execute(Commit).await.is_err());
    }
}
