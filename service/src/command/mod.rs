//! [`Command`] definition.

pub mod confirm_land_payment;
pub mod create_land;
pub mod decide_contact;
pub mod initiate_land_payment;
pub mod request_contact;
pub mod sign_land_as_owner;
pub mod sign_land_as_user;
pub mod withdraw_land;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    confirm_land_payment::ConfirmLandPayment, create_land::CreateLand,
    decide_contact::DecideContact, initiate_land_payment::InitiateLandPayment,
    request_contact::RequestContact, sign_land_as_owner::SignLandAsOwner,
    sign_land_as_user::SignLandAsUser, withdraw_land::WithdrawLand,
};
