//! Domain definitions.

pub mod agreement;
pub mod contact_request;
pub mod land;
pub mod notification;
pub mod object;
pub mod payment;
pub mod user;

pub use self::{
    agreement::Agreement, contact_request::ContactRequest, land::Land,
    notification::Notification, object::Object, user::User,
};

/// Declares a free-text newtype over a [`String`].
///
/// The text is valid if it has no leading or trailing whitespace and fits into
/// `max_len` bytes. Empty text is only valid when `allow_empty` is `true`.
macro_rules! define_text {
    (
        #[doc = $doc:literal]
        $name:ident { max_len: $max:literal, allow_empty: $empty:literal $(,)? }
    ) => {
        #[doc = $doc]
        #[derive(
            ::derive_more::AsRef,
            Clone,
            Debug,
            ::derive_more::Display,
            Eq,
            Hash,
            PartialEq,
        )]
        #[as_ref(forward)]
        #[cfg_attr(
            feature = "postgres",
            derive(::postgres_types::FromSql, ::postgres_types::ToSql),
            postgres(transparent),
        )]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new [`", stringify!($name), "`].")]
            ///
            /// # Safety
            ///
            /// The caller must ensure that the given `text` matches the
            /// format.
            #[expect(unsafe_code, reason = "bypass")]
            #[must_use]
            pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
                Self(text.into())
            }

            #[doc = concat!(
                "Creates a new [`", stringify!($name), "`] if the given ",
                "`text` is valid.",
            )]
            #[must_use]
            pub fn new(text: impl Into<String>) -> Option<Self> {
                let text = text.into();
                Self::check(&text).then_some(Self(text))
            }

            #[doc = concat!(
                "Checks whether the given `text` is a valid [`",
                stringify!($name), "`].",
            )]
            fn check(text: impl AsRef<str>) -> bool {
                let text = text.as_ref();
                text.trim() == text
                    && ($empty || !text.is_empty())
                    && text.len() <= $max
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s).ok_or(concat!("invalid `", stringify!($name), "`"))
            }
        }
    };
}
use define_text;
