//! [`Notification`] definitions.

use crate::domain::{contact_request, object, user, Land, User};

/// Message to be delivered to one or more [`Recipient`]s.
#[derive(Clone, Debug)]
pub struct Notification {
    /// [`Recipient`]s of this [`Notification`].
    pub recipients: Vec<Recipient>,

    /// Subject of this [`Notification`].
    pub subject: String,

    /// Plain text body of this [`Notification`].
    pub body: String,

    /// URL of a document attached to this [`Notification`], if any.
    pub attachment: Option<object::Url>,
}

/// Recipient of a [`Notification`].
#[derive(Clone, Debug)]
pub struct Recipient {
    /// Name of this [`Recipient`].
    pub name: user::Name,

    /// [`user::Email`] to deliver to, if any.
    pub email: Option<user::Email>,

    /// [`user::Phone`] to deliver to, if any.
    pub phone: Option<user::Phone>,
}

impl From<&User> for Recipient {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

impl Notification {
    /// Notifies the [`Land`] owner about a new contact request.
    #[must_use]
    pub fn contact_requested(
        land: &Land,
        owner: &User,
        requester: &User,
        message: &contact_request::Message,
    ) -> Self {
        let mut body = format!(
            "{} is interested in your land \"{}\".",
            requester.name, land.details.title,
        );
        let message: &str = message.as_ref();
        if !message.is_empty() {
            body.push_str(&format!("\n\nMessage: {message}"));
        }
        if let Some(email) = &requester.email {
            body.push_str(&format!("\nEmail: {email}"));
        }
        if let Some(phone) = &requester.phone {
            body.push_str(&format!("\nPhone: {phone}"));
        }

        Self {
            recipients: vec![owner.into()],
            subject: "New Contact Request".into(),
            body,
            attachment: None,
        }
    }

    /// Notifies the requester that the [`Land`] owner rejected the contact
    /// request.
    #[must_use]
    pub fn contact_rejected(land: &Land, requester: &User) -> Self {
        Self {
            recipients: vec![requester.into()],
            subject: "Contact Request Declined".into(),
            body: format!(
                "Your contact request for the land \"{}\" was declined by \
                 its owner.",
                land.details.title,
            ),
            attachment: None,
        }
    }

    /// Notifies both parties about the finalized lease of the [`Land`].
    #[must_use]
    pub fn lease_finalized(land: &Land, owner: &User, lessee: &User) -> Self {
        let mut body = format!(
            "The land \"{}\" has been leased successfully.\n\n\
             Owner: {}\nLessee: {}",
            land.details.title, owner.name, lessee.name,
        );
        if land.final_document.is_some() {
            body.push_str(
                "\n\nThe signed agreement document is attached for your \
                 records.",
            );
        }

        Self {
            recipients: vec![owner.into(), lessee.into()],
            subject: "Land Lease Agreement Completed".into(),
            body,
            attachment: land.final_document.clone(),
        }
    }
}
