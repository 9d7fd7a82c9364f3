//! [`Object`] definitions.

use derive_more::{AsRef, Debug, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Binary object to be put into an object store.
#[derive(Clone, Debug)]
pub struct Object {
    /// [`Key`] this [`Object`] is stored under.
    pub key: Key,

    /// MIME type of the [`Object`] content.
    pub content_type: String,

    /// Raw content of this [`Object`].
    #[debug("{} bytes", content.len())]
    pub content: Vec<u8>,
}

/// Key of an [`Object`] in an object store.
///
/// Consists of `/`-separated segments, each being a non-empty sequence of
/// ASCII alphanumerics, `-`, `_` and `.` characters, but never `.` or `..`
/// alone. So a [`Key`] is always relative and never escapes its store.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
pub struct Key(String);

impl Key {
    /// Maximum length of a [`Key`] in bytes.
    const MAX_LEN: usize = 1024;

    /// Creates a new [`Key`] if the given `key` is valid.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        Self::check(&key).then_some(Self(key))
    }

    /// Returns `/`-separated segments of this [`Key`].
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Checks whether the given `key` is a valid [`Key`].
    fn check(key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        !key.is_empty()
            && key.len() <= Self::MAX_LEN
            && key.split('/').all(|segment| {
                !segment.is_empty()
                    && segment != "."
                    && segment != ".."
                    && segment.chars().all(|c| {
                        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
                    })
            })
    }
}

/// Public URL of a stored [`Object`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Url(String);

impl Url {
    /// Creates a new [`Url`] without any checks.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }
}

#[cfg(test)]
mod spec {
    use super::Key;

    #[test]
    fn accepts_nested_keys() {
        for key in [
            "lands/6c1c/image",
            "agreements/6c1c/owner_signed-a1b2.html",
            "a",
            "x.y-z_w",
        ] {
            assert!(Key::new(key).is_some(), "`{key}` is rejected");
        }
    }

    #[test]
    fn rejects_escaping_keys() {
        for key in [
            "",
            "/etc/passwd",
            "../secret",
            "lands/../../secret",
            "lands/./image",
            "lands//image",
            "lands/image/",
            "lands\\image",
            "lands/im age",
            "lands/%2e%2e",
        ] {
            assert!(Key::new(key).is_none(), "`{key}` is accepted");
        }
    }

    #[test]
    fn splits_into_segments() {
        let key = Key::new("agreements/land/final-00.html").unwrap();
        assert_eq!(
            key.segments().collect::<Vec<_>>(),
            ["agreements", "land", "final-00.html"],
        );
    }
}
