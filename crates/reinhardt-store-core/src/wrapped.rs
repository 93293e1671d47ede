//! Render-phase handle.
//!
//! A [`WrappedStore`] lives as long as one mount of the wrapped
//! application. Each render passes the props produced by the data-loading
//! phases; the handle hydrates its store and returns the props rendering
//! should see.

use std::sync::Arc;

use crate::config::WrapperConfig;
use crate::error::Result;
use crate::hydration::{HydrationGate, HydrationReport, HydrationTiming, SnapshotPair};
use crate::props::WrapperProps;
use crate::store::{Props, Store};

/// Outcome of one render pass.
#[derive(Debug)]
pub struct RenderPass<S> {
	/// The store rendering reads from.
	pub store: Arc<S>,
	/// Props with page-level overrides applied and the page snapshot removed.
	pub props: Props,
	/// When this pass's hydration takes effect.
	pub timing: HydrationTiming,
	/// What was dispatched during the render itself.
	pub report: HydrationReport,
}

/// Store bound to one mount, with its hydration state.
pub struct WrappedStore<S: Store> {
	store: Arc<S>,
	config: Arc<WrapperConfig<S::State>>,
	gate: HydrationGate,
}

impl<S: Store> WrappedStore<S> {
	pub(crate) fn new(store: Arc<S>, config: Arc<WrapperConfig<S::State>>) -> Self {
		Self {
			store,
			config,
			gate: HydrationGate::new(),
		}
	}

	/// Returns the mounted store.
	pub fn store(&self) -> &Arc<S> {
		&self.store
	}

	/// Renders with `props`.
	///
	/// The first render hydrates before returning, so nothing can read the
	/// store before it holds the merged state. Later renders queue changed
	/// snapshots until [`commit`](Self::commit).
	pub fn render(&mut self, props: &WrapperProps) -> Result<RenderPass<S>> {
		let timing = self
			.gate
			.plan(SnapshotPair::new(props.app_snapshot(), props.page_snapshot()));
		let report = match timing {
			HydrationTiming::Synchronous => self.apply_pending()?,
			HydrationTiming::Deferred | HydrationTiming::Skipped => HydrationReport::default(),
		};

		Ok(RenderPass {
			store: Arc::clone(&self.store),
			props: props.compose(),
			timing,
			report,
		})
	}

	/// Applies hydration deferred by the last render (layout commit).
	pub fn commit(&mut self) -> Result<HydrationReport> {
		self.apply_pending()
	}

	/// Returns true if a render left hydration waiting for commit.
	pub fn has_pending(&self) -> bool {
		self.gate.has_pending()
	}

	fn apply_pending(&mut self) -> Result<HydrationReport> {
		let Some(pending) = self.gate.take_pending() else {
			return Ok(HydrationReport::default());
		};
		let report = pending.dispatch.hydrate(&*self.store, &self.config)?;
		if self.config.debug_enabled() {
			tracing::debug!(
				app = report.app,
				page = report.page,
				"applied hydration to mounted store"
			);
		}
		self.gate.mark_applied(pending.observed);
		Ok(report)
	}
}
