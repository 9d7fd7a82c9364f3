//! [Twilio] WhatsApp [`Notifier`] implementation.
//!
//! [Twilio]: https://www.twilio.com/docs/whatsapp/api

use common::operations::Deliver;
use futures::future;
use secrecy::{ExposeSecret as _, SecretString};
use tracerr::Traced;

use crate::{
    domain::{user, Notification},
    infra::notification::{check, Error, Notifier},
};

/// [`Twilio`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the Twilio API.
    pub api_url: String,

    /// Account SID to authenticate requests with.
    pub account_sid: String,

    /// Auth token to authenticate requests with.
    pub auth_token: SecretString,

    /// WhatsApp-enabled number to send messages from.
    pub from: String,

    /// Country calling code prepended to national [`user::Phone`] numbers.
    pub default_country_code: String,
}

/// [Twilio] WhatsApp [`Notifier`].
///
/// [Twilio]: https://twilio.com
#[derive(Clone, Debug)]
pub struct Twilio {
    /// HTTP client to perform API requests with.
    client: reqwest::Client,

    /// [`Config`] of this [`Notifier`].
    config: Config,
}

impl Twilio {
    /// Creates a new [`Twilio`] [`Notifier`] with the provided [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Sends a single WhatsApp message to the provided [`user::Phone`].
    async fn send(
        &self,
        phone: &user::Phone,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<(), Traced<Error>> {
        let Config {
            api_url,
            account_sid,
            auth_token,
            from,
            default_country_code,
        } = &self.config;

        let to = format!(
            "whatsapp:{}",
            international_number(phone, default_country_code),
        );
        let from = format!("whatsapp:{from}");
        let mut form =
            vec![("From", from.as_str()), ("To", to.as_str()), ("Body", body)];
        if let Some(url) = media_url {
            form.push(("MediaUrl", url));
        }

        let response = self
            .client
            .post(format!(
                "{}/2010-04-01/Accounts/{account_sid}/Messages.json",
                api_url.trim_end_matches('/'),
            ))
            .basic_auth(account_sid, Some(auth_token.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        check("Twilio", response).await.map_err(tracerr::wrap!())
    }
}

impl Notifier<Deliver<Notification>> for Twilio {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Deliver(notification): Deliver<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let Notification {
            recipients,
            subject,
            body,
            attachment,
        } = &notification;
        let body = format!("*{subject}*\n\n{body}");
        let media_url: Option<&str> = attachment.as_ref().map(AsRef::as_ref);

        future::try_join_all(
            recipients
                .iter()
                .filter_map(|r| r.phone.as_ref())
                .map(|phone| self.send(phone, &body, media_url)),
        )
        .await
        .map(drop)
        .map_err(tracerr::wrap!())
    }
}

/// Formats the provided [`user::Phone`] in the international format,
/// prepending the `default_country_code` to national numbers.
fn international_number(
    phone: &user::Phone,
    default_country_code: &str,
) -> String {
    if phone.is_international() {
        format!("+{}", phone.digits())
    } else {
        let code = default_country_code.trim_start_matches('+');
        format!("+{code}{}", phone.digits().trim_start_matches('0'))
    }
}
