//! Macros for defining kind enums.

/// Macro for defining a kind enum.
///
/// Declared enum is represented as [`u8`] in storage and as a `snake_case`
/// string everywhere else.
///
/// # Example
///
/// ```rust
/// # use common::define_kind;
/// define_kind! {
///     #[doc = "Irrigation kind."]
///     enum Irrigation {
///         #[doc = "Irrigated by rain only."]
///         Rainfed = 1,
///
///         #[doc = "Irrigated from a borewell."]
///         Borewell = 2,
///     }
/// }
///
/// assert_eq!(Irrigation::Borewell.to_string(), "borewell");
/// assert_eq!(Irrigation::Rainfed.as_str(), "rainfed");
/// assert_eq!(Irrigation::try_from(1_u8), Ok(Irrigation::Rainfed));
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            $crate::private::strum::IntoStaticStr,
            Eq,
            Hash,
            PartialEq,
        )]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
            serde(rename_all = "snake_case"),
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = "snake_case")]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            /// All the variants of this kind, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }

            /// Returns the `snake_case` name of this variant.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                self.into()
            }
        }

        impl ::core::convert::TryFrom<u8> for $name {
            type Error = u8;

            fn try_from(v: u8) -> Result<Self, Self::Error> {
                Self::ALL.iter().copied().find(|k| k.u8() == v).ok_or(v)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<Self, $crate::private::SqlError> {
                let raw = i16::from_sql(ty, raw)?;
                u8::try_from(raw)
                    .ok()
                    .and_then(|v| Self::try_from(v).ok())
                    .ok_or_else(|| {
                        ::std::format!(
                            "no `{}` is stored as {raw}",
                            ::core::stringify!($name),
                        )
                        .into()
                    })
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                $crate::private::SqlError,
            > {
                i16::from(self.u8()).to_sql(ty, w)
            }
        }
    };
}
