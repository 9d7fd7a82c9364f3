//! [Brevo] transactional e-mail [`Notifier`] implementation.
//!
//! [Brevo]: https://developers.brevo.com/docs/send-a-transactional-email

use common::operations::Deliver;
use maud::{html, Markup};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use tracerr::Traced;

use crate::{
    domain::{notification::Recipient, Notification},
    infra::notification::{check, Error, Notifier},
};

/// [`Brevo`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the Brevo API.
    pub api_url: String,

    /// API key to authenticate requests with.
    pub api_key: SecretString,

    /// Name of the sender.
    pub sender_name: String,

    /// E-mail address of the sender.
    pub sender_email: String,
}

/// [Brevo] e-mail [`Notifier`].
///
/// [Brevo]: https://brevo.com
#[derive(Clone, Debug)]
pub struct Brevo {
    /// HTTP client to perform API requests with.
    client: reqwest::Client,

    /// [`Config`] of this [`Notifier`].
    config: Config,
}

impl Brevo {
    /// Creates a new [`Brevo`] [`Notifier`] with the provided [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

/// Body of a transactional e-mail request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Email<'n> {
    sender: Contact<'n>,
    to: Vec<Contact<'n>>,
    subject: &'n str,
    html_content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachment: Vec<Attachment<'n>>,
}

#[derive(Debug, Serialize)]
struct Contact<'n> {
    name: &'n str,
    email: &'n str,
}

#[derive(Debug, Serialize)]
struct Attachment<'n> {
    url: &'n str,
}

/// Renders the HTML content of the provided [`Notification`].
fn render(notification: &Notification) -> Markup {
    html! {
        div style="font-family: Arial, sans-serif; line-height: 1.6;" {
            h2 { (notification.subject) }
            @for line in notification.body.lines() {
                @if line.is_empty() { br; } @else { p { (line) } }
            }
            @if let Some(url) = &notification.attachment {
                @let url = url.to_string();
                p {
                    "Document: "
                    a href=(url) { (url) }
                }
            }
        }
    }
}

impl Notifier<Deliver<Notification>> for Brevo {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Deliver(notification): Deliver<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let to = notification
            .recipients
            .iter()
            .filter_map(|Recipient { name, email, .. }| {
                Some(Contact {
                    name: name.as_ref(),
                    email: email.as_ref()?.as_ref(),
                })
            })
            .collect::<Vec<_>>();
        if to.is_empty() {
            return Ok(());
        }

        let email = Email {
            sender: Contact {
                name: &self.config.sender_name,
                email: &self.config.sender_email,
            },
            to,
            subject: &notification.subject,
            html_content: render(&notification).into_string(),
            attachment: notification
                .attachment
                .iter()
                .map(|url| Attachment { url: url.as_ref() })
                .collect(),
        };
        let response = self
            .client
            .post(format!(
                "{}/v3/smtp/email",
                self.config.api_url.trim_end_matches('/'),
            ))
            .header("api-key", self.config.api_key.expose_secret())
            .json(&email)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        check("Brevo", response).await.map_err(tracerr::wrap!())
    }
}
