//! Hydration protocol.
//!
//! Snapshots produced by the data-loading phases are merged into a live
//! store by dispatching a [`Hydrate`] action. Within one render pass the
//! application-level snapshot is dispatched before the page-level one, so
//! page state wins wherever the reducer resolves conflicts by last write.
//!
//! [`HydrationGate`] tracks a single mount: the first render hydrates
//! synchronously, later renders only hydrate when their snapshots changed
//! and do so once layout is committed.

use crate::config::WrapperConfig;
use crate::error::Result;
use crate::store::{Hydrate, Snapshot, Store};

/// Dispatches `snapshot` into `store` as a hydration action.
///
/// Returns `Ok(false)` without touching the store when there is nothing to
/// hydrate (absent or `null` snapshot).
///
/// # Examples
///
/// ```ignore
/// let dispatched = hydrate(&*store, Some(&json!({"count": 1})), &config)?;
/// assert!(dispatched);
/// ```
pub fn hydrate<S: Store>(
	store: &S,
	snapshot: Option<&Snapshot>,
	config: &WrapperConfig<S::State>,
) -> Result<bool> {
	let Some(snapshot) = snapshot.filter(|s| !s.is_null()) else {
		return Ok(false);
	};

	let payload = config.deserialize(snapshot.clone())?;
	if config.debug_enabled() {
		tracing::debug!(key = config.key(), snapshot = %snapshot, "dispatching hydration action");
	}
	store.dispatch(Hydrate::new(payload).into());
	Ok(true)
}

/// Which snapshots a hydration pass dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
	/// Application-level snapshot was dispatched.
	pub app: bool,
	/// Page-level snapshot was dispatched.
	pub page: bool,
}

impl HydrationReport {
	/// Number of hydration actions dispatched.
	pub fn dispatched(&self) -> usize {
		usize::from(self.app) + usize::from(self.page)
	}
}

/// Hydrates the application-level snapshot, then the page-level one.
pub fn hydrate_ordered<S: Store>(
	store: &S,
	app: Option<&Snapshot>,
	page: Option<&Snapshot>,
	config: &WrapperConfig<S::State>,
) -> Result<HydrationReport> {
	let app = hydrate(store, app, config)?;
	let page = hydrate(store, page, config)?;
	Ok(HydrationReport { app, page })
}

/// Snapshots observed by one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotPair {
	/// Application-level snapshot.
	pub app: Option<Snapshot>,
	/// Page-level snapshot.
	pub page: Option<Snapshot>,
}

impl SnapshotPair {
	/// Creates a pair from borrowed snapshots.
	pub fn new(app: Option<&Snapshot>, page: Option<&Snapshot>) -> Self {
		Self {
			app: app.cloned(),
			page: page.cloned(),
		}
	}

	/// Dispatches both snapshots in order.
	pub fn hydrate<S: Store>(
		&self,
		store: &S,
		config: &WrapperConfig<S::State>,
	) -> Result<HydrationReport> {
		hydrate_ordered(store, self.app.as_ref(), self.page.as_ref(), config)
	}
}

/// When a render pass's hydration takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationTiming {
	/// Applied before the render returned (first render of a mount).
	Synchronous,
	/// Queued until the host commits layout.
	Deferred,
	/// The snapshots were already applied on this mount.
	Skipped,
}

/// Hydration waiting to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingHydration {
	/// Snapshots the render pass observed.
	pub observed: SnapshotPair,
	/// Snapshots that still have to be dispatched.
	pub dispatch: SnapshotPair,
}

/// Per-mount hydration bookkeeping.
///
/// A snapshot already applied on this mount is not dispatched again. A
/// changed application-level snapshot re-dispatches the page-level one
/// after it, so the page keeps winning.
///
/// A later render whose page snapshot changed while the application
/// snapshot did not dispatches the page snapshot alone. The application
/// snapshot is not replayed in front of it, since it was already applied
/// on this mount. Reducers that merge payloads (rather than overwrite) see
/// only the new page payload on such a pass.
#[derive(Debug, Default)]
pub struct HydrationGate {
	mounted: bool,
	applied: Option<SnapshotPair>,
	pending: Option<PendingHydration>,
}

impl HydrationGate {
	/// Creates a gate for a fresh mount.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records the snapshots of a render pass and decides their timing.
	///
	/// For [`HydrationTiming::Synchronous`] and [`HydrationTiming::Deferred`]
	/// the work becomes pending; the caller applies it via
	/// [`take_pending`](Self::take_pending).
	pub fn plan(&mut self, incoming: SnapshotPair) -> HydrationTiming {
		if !self.mounted {
			self.mounted = true;
			self.pending = Some(PendingHydration {
				dispatch: incoming.clone(),
				observed: incoming,
			});
			return HydrationTiming::Synchronous;
		}

		let latest = self
			.pending
			.as_ref()
			.map(|pending| &pending.observed)
			.or(self.applied.as_ref());
		if latest == Some(&incoming) {
			return HydrationTiming::Skipped;
		}

		let applied = self.applied.clone().unwrap_or_default();
		let dispatch = if incoming.app != applied.app {
			incoming.clone()
		} else if incoming.page != applied.page {
			SnapshotPair {
				app: None,
				page: incoming.page.clone(),
			}
		} else {
			SnapshotPair::default()
		};
		self.pending = Some(PendingHydration {
			observed: incoming,
			dispatch,
		});
		HydrationTiming::Deferred
	}

	/// Takes the work waiting to be applied.
	pub fn take_pending(&mut self) -> Option<PendingHydration> {
		self.pending.take()
	}

	/// Records the snapshots now reflected in the store.
	pub fn mark_applied(&mut self, observed: SnapshotPair) {
		self.applied = Some(observed);
	}

	/// Returns true if work is waiting for commit.
	pub fn has_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Returns true once the first render happened.
	pub fn is_mounted(&self) -> bool {
		self.mounted
	}
}
