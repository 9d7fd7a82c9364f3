//! [`LikePatterns`] definition.

use postgres_types::ToSql;

/// `ILIKE` patterns matching a text containing any of the words they're built
/// from.
///
/// Bound as a `VARCHAR[]` parameter of an `ILIKE ANY(...)` expression.
#[derive(Clone, Debug, Eq, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct LikePatterns(Vec<String>);

impl LikePatterns {
    /// Builds [`LikePatterns`] out of the provided `words`.
    ///
    /// [`None`] if there are no non-blank `words`.
    #[must_use]
    pub fn any_of<I>(words: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let patterns = words
            .into_iter()
            .filter_map(|w| {
                let w = w.as_ref().trim();
                (!w.is_empty()).then(|| format!("%{}%", escape(w)))
            })
            .collect::<Vec<_>>();
        (!patterns.is_empty()).then_some(Self(patterns))
    }
}

/// Escapes the `LIKE` wildcards in the provided `word`.
fn escape(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
