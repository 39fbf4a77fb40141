//! The read-transform-write protocol shared by all aggregate updates.
//!
//! Every `update_*` repository operation follows the same steps inside one
//! transaction: load the aggregate by its natural key, hand it to a
//! caller-supplied transform, then persist the result against the row(s)
//! addressed by the *original* key. Adapters supply the load and persist
//! steps through [`MutationTarget`]; [`apply_mutation`] sequences them.
//!
//! Transform failures are returned to the caller untouched. Repository
//! failures are converted into the caller's error type through `From`, so a
//! transform error can never be mistaken for a storage error.

use async_trait::async_trait;

use super::ports::RepositoryError;

/// Load and persist steps for one aggregate type, bound to an open transaction.
#[async_trait]
pub trait MutationTarget<A: Send>: Send {
    /// State captured by [`MutationTarget::load`] that persist needs to
    /// address the original rows (surrogate ids, original key, timestamps).
    type Handle: Send;

    /// Load the aggregate, failing with a not-found kind when it is absent.
    async fn load(&mut self) -> Result<(Self::Handle, A), RepositoryError>;

    /// Write the transformed aggregate over the rows identified by `handle`.
    async fn persist(&mut self, handle: Self::Handle, aggregate: &A)
    -> Result<(), RepositoryError>;
}

/// Load, transform, and persist through `target`.
///
/// Returns the transformed aggregate. Callers own the surrounding
/// transaction: any `Err` must roll it back.
pub async fn apply_mutation<A, T, F, E>(target: &mut T, transform: F) -> Result<A, E>
where
    A: Send,
    T: MutationTarget<A> + ?Sized,
    F: FnOnce(A) -> Result<A, E> + Send,
    E: From<RepositoryError> + Send,
{
    let (handle, current) = target.load().await?;
    let next = transform(current)?;
    target.persist(handle, &next).await?;
    Ok(next)
}
