//! [`Session`]-related definitions.

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use derive_more::Debug;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use service::domain::user;

use crate::{define_error, AsError as _, Error};

/// Verifier of [JWT] bearer tokens issued by the identity provider.
///
/// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
#[derive(Clone, Debug)]
pub struct Auth {
    /// Key to verify token signatures with.
    #[debug(skip)]
    key: DecodingKey,

    /// [`Validation`] rules of tokens.
    validation: Validation,
}

impl Auth {
    /// Creates a new [`Auth`] verifying tokens signed with the provided
    /// `secret`.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verifies the provided `token` and returns the [`Session`] it
    /// represents.
    ///
    /// # Errors
    ///
    /// If the `token` is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<Session, Error> {
        jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| Session {
                user_id: data.claims.sub,
            })
            .map_err(|_| AuthError::InvalidToken.into())
    }
}

/// Claims of a bearer token.
#[derive(Debug, Deserialize)]
struct Claims {
    /// ID of the [`User`] the token is issued for.
    ///
    /// [`User`]: service::domain::User
    sub: user::Id,
}

/// Authenticated caller of the API.
#[derive(Clone, Copy, Debug)]
pub struct Session {
    /// ID of the authenticated [`User`].
    ///
    /// [`User`]: service::domain::User
    pub user_id: user::Id,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<Auth>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Auth` extension"))?;

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                if e.is_missing() {
                    AuthError::AuthorizationRequired.into()
                } else {
                    e.into_error()
                }
            })?;

        auth.verify(bearer.token())
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Provided bearer token is invalid or expired"]
        InvalidToken,
    }
}

#[cfg(test)]
mod spec {
    use jsonwebtoken::{EncodingKey, Header};
    use secrecy::SecretString;
    use serde::Serialize;
    use service::domain::user;

    use super::Auth;

    #[derive(Serialize)]
    struct Claims {
        sub: user::Id,
        exp: u64,
    }

    fn token(secret: &str, sub: user::Id, exp: u64) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &Claims { sub, exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn auth() -> Auth {
        Auth::new(&SecretString::from("secret".to_owned()))
    }

    #[test]
    fn verifies_issued_tokens() {
        let id = user::Id::new();

        let session = auth().verify(&token("secret", id, u64::MAX / 2));

        assert_eq!(session.unwrap().user_id, id);
    }

    #[test]
    fn rejects_forged_and_expired_tokens() {
        let id = user::Id::new();

        let forged = auth().verify(&token("guessed", id, u64::MAX / 2));
        let expired = auth().verify(&token("secret", id, 1));

        assert_eq!(forged.unwrap_err().code, "INVALID_TOKEN");
        assert_eq!(expired.unwrap_err().code, "INVALID_TOKEN");
    }
}
