//! Abstract operations.

use std::marker::PhantomData;

use crate::Handler;

/// Operation to insert a value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation to select a value.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Operation to replace a stored value only if it still matches the
/// `expected` state.
///
/// Results in `true` if the value was written, or `false` if the stored value
/// has diverged from the `expected` one (or doesn't exist at all).
#[derive(Clone, Copy, Debug)]
pub struct Swap<T, E> {
    /// New value to be stored.
    pub new: T,

    /// State the stored value is expected to be in.
    pub expected: E,
}

/// Operation to create a value in an external system.
#[derive(Clone, Copy, Debug)]
pub struct Create<T>(pub T);

/// Operation to deliver a value to its recipients.
#[derive(Clone, Copy, Debug)]
pub struct Deliver<T>(pub T);

/// Operation to render a value into a durable artifact.
#[derive(Clone, Copy, Debug)]
pub struct Render<T>(pub T);

/// Operation to verify the authenticity of a value.
#[derive(Clone, Copy, Debug)]
pub struct Verify<T>(pub T);

/// Operation to start a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// [`Transact`]ed value.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Operation to commit a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of `W` by `B`.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the value to select.
    _what: PhantomData<W>,

    /// Value to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] with the given value.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Returns a reference to the inner value.
    #[must_use]
    pub fn as_inner(&self) -> &B {
        &self.by
    }

    /// Consumes this [`By`] and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
