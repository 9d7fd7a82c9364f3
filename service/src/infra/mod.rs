//! Infrastructure layer.

pub mod database;
pub mod document;
pub mod notification;
pub mod payment;
pub mod storage;

pub use self::{
    database::{Database, Memory},
    document::DocumentGenerator,
    notification::Notifier,
    payment::PaymentGateway,
    storage::ObjectStore,
};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
