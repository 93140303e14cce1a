//! Hooks that let a collection wrapper act as a view of another container.
//!
//! A plain wrapper uses [`Direct`]: every mutation is admitted and nothing is
//! forwarded. The mapping views plug their own bridge in to reject additions
//! and to re-dispatch removals on the owning mapping.

use vigil_core::{Change, CollectionResult, MutationKind};

use crate::delegate::Collection;

/// Per-mutation hooks run by [`ObservableCollection`](crate::ObservableCollection).
///
/// The call sequence for one mutation is `admit`, then `prepare` on the
/// unmodified delegate, then the delegate mutation, then `forward` with the
/// change about to be dispatched. `forward` runs before the wrapper's own
/// listeners are notified. Nothing runs past a failed `admit` or `prepare`,
/// and `forward` is skipped when the delegate reports no change.
pub trait Bridge<D: Collection> {
    /// State captured before the mutation.
    type Snapshot;

    /// Accept or reject a mutation before anything is touched.
    fn admit(&self, mutation: MutationKind) -> CollectionResult<()>;

    /// Capture whatever `forward` will need about the pre-mutation state.
    fn prepare(&self, delegate: &D) -> CollectionResult<Self::Snapshot>;

    /// Relay a successful change.
    fn forward(&self, snapshot: Self::Snapshot, change: &Change<D::Item>);
}

/// Bridge of a standalone wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Direct;

impl<D: Collection> Bridge<D> for Direct {
    type Snapshot = ();

    fn admit(&self, _mutation: MutationKind) -> CollectionResult<()> {
        Ok(())
    }

    fn prepare(&self, _delegate: &D) -> CollectionResult<()> {
        Ok(())
    }

    fn forward(&self, _snapshot: (), _change: &Change<D::Item>) {}
}
