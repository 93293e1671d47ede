//! Store wrapper.
//!
//! [`StoreWrapper`] wires store acquisition, serialization and hydration
//! into the data-loading phases a host exposes:
//!
//! | Phase | Adapter | Store scope | Result |
//! |-------|---------|-------------|--------|
//! | Request-time | [`request_props`](StoreWrapper::request_props) | per request | [`WrapperProps`] |
//! | Render-time static | [`static_props`](StoreWrapper::static_props) | fresh | flattened [`Props`] |
//! | Initial mount (page) | [`initial_page_props`](StoreWrapper::initial_page_props) | context scope | [`WrapperProps`] |
//! | Initial mount (app) | [`initial_app_props`](StoreWrapper::initial_app_props) | context scope | [`WrapperProps`] |
//!
//! # Examples
//!
//! ```ignore
//! let wrapper = StoreWrapper::new(|_cx: &RenderContext| Ok::<_, BoxError>(make_store()), WrapperConfig::new());
//!
//! let request = wrapper.begin_request();
//! let props = wrapper
//! 	.request_props(request.context(), |cx| async move {
//! 		cx.store().dispatch(Action::Increment);
//! 		Ok::<_, BoxError>(None)
//! 	})
//! 	.await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::config::WrapperConfig;
use crate::context::{MountLevel, Phase, PhaseInput, RenderContext, RequestId, StoreContext};
use crate::error::{BoxError, Result, StoreError};
use crate::lifecycle::{ClientRegistry, RequestScope, StoreFactory, StoreLifecycle, StoreOrigin};
use crate::props::WrapperProps;
use crate::store::{Props, Store};
use crate::wrapped::WrappedStore;

/// Binds a store factory and its configuration to the host's phases.
pub struct StoreWrapper<S: Store> {
	factory: StoreFactory<S>,
	config: Arc<WrapperConfig<S::State>>,
	lifecycle: StoreLifecycle<S>,
}

impl<S: Store> StoreWrapper<S> {
	/// Creates a wrapper using the process-wide client registry.
	pub fn new<F, E>(factory: F, config: WrapperConfig<S::State>) -> Self
	where
		F: Fn(&RenderContext) -> std::result::Result<S, E> + Send + Sync + 'static,
		E: Into<BoxError> + 'static,
	{
		Self::builder(factory).config(config).build()
	}

	/// Starts building a wrapper around `factory`.
	pub fn builder<F, E>(factory: F) -> StoreWrapperBuilder<S>
	where
		F: Fn(&RenderContext) -> std::result::Result<S, E> + Send + Sync + 'static,
		E: Into<BoxError> + 'static,
	{
		let factory: StoreFactory<S> = Arc::new(
			move |cx: &RenderContext| -> std::result::Result<S, BoxError> { factory(cx).map_err(Into::into) },
		);
		StoreWrapperBuilder {
			factory,
			config: WrapperConfig::new(),
			registry: None,
		}
	}

	/// Returns the configuration shared by every phase.
	pub fn config(&self) -> &WrapperConfig<S::State> {
		&self.config
	}

	/// Returns the lifecycle manager.
	pub fn lifecycle(&self) -> &StoreLifecycle<S> {
		&self.lifecycle
	}

	/// Returns the store for the scope of `context`, creating it if needed.
	pub fn acquire(&self, context: &RenderContext) -> Result<Arc<S>> {
		let (store, origin) =
			self.lifecycle
				.acquire_tracked(context, self.config.key(), |cx| (self.factory)(cx))?;
		if self.config.debug_enabled() {
			match origin {
				StoreOrigin::Created => {
					tracing::debug!(scope = ?context.scope(), key = self.config.key(), "created store")
				}
				StoreOrigin::Reused => {
					tracing::debug!(scope = ?context.scope(), key = self.config.key(), "reusing store")
				}
			}
		}
		Ok(store)
	}

	/// Opens a server request scope. The request's store is released when
	/// the returned guard drops.
	pub fn begin_request(&self) -> RequestScope<'_, S> {
		self.lifecycle.begin_request()
	}

	/// Releases the store of `request`. Returns true if one was held.
	pub fn end_request(&self, request: &RequestId) -> bool {
		self.lifecycle.release(request).is_some()
	}

	/// Acquires the store for `context` and binds it to a render-phase handle.
	pub fn mount(&self, context: &RenderContext) -> Result<WrappedStore<S>> {
		let store = self.acquire(context)?;
		Ok(WrappedStore::new(store, Arc::clone(&self.config)))
	}

	/// Runs a request-time loader against the request's store.
	///
	/// Pass the context of a [`begin_request`](Self::begin_request) guard.
	/// A bare [`RenderContext::server`] context keeps its store alive until
	/// [`end_request`](Self::end_request) is called.
	pub async fn request_props<F, Fut, E>(
		&self,
		input: impl Into<PhaseInput<S>>,
		callback: F,
	) -> Result<WrapperProps>
	where
		F: FnOnce(StoreContext<S>) -> Fut,
		Fut: Future<Output = std::result::Result<Option<Props>, E>>,
		E: Into<BoxError>,
	{
		self.produce(input.into(), Phase::RequestTime, callback).await
	}

	/// Runs a static loader against a fresh store and returns the host's
	/// flattened page-props shape.
	pub async fn static_props<F, Fut, E>(
		&self,
		input: impl Into<PhaseInput<S>>,
		callback: F,
	) -> Result<Props>
	where
		F: FnOnce(StoreContext<S>) -> Fut,
		Fut: Future<Output = std::result::Result<Option<Props>, E>>,
		E: Into<BoxError>,
	{
		let props = self.produce(input.into(), Phase::RenderStatic, callback).await?;
		Ok(props.into_page_props())
	}

	/// Runs a page-level initial-mount loader.
	pub async fn initial_page_props<F, Fut, E>(
		&self,
		input: impl Into<PhaseInput<S>>,
		callback: F,
	) -> Result<WrapperProps>
	where
		F: FnOnce(StoreContext<S>) -> Fut,
		Fut: Future<Output = std::result::Result<Option<Props>, E>>,
		E: Into<BoxError>,
	{
		self.produce(input.into(), Phase::InitialMount(MountLevel::Page), callback)
			.await
	}

	/// Runs an application-level initial-mount loader.
	///
	/// The callback's context carries the store; nested page loaders must
	/// receive that context rather than the host's.
	pub async fn initial_app_props<F, Fut, E>(
		&self,
		input: impl Into<PhaseInput<S>>,
		callback: F,
	) -> Result<WrapperProps>
	where
		F: FnOnce(StoreContext<S>) -> Fut,
		Fut: Future<Output = std::result::Result<Option<Props>, E>>,
		E: Into<BoxError>,
	{
		self.produce(input.into(), Phase::InitialMount(MountLevel::App), callback)
			.await
	}

	async fn produce<F, Fut, E>(&self, input: PhaseInput<S>, phase: Phase, callback: F) -> Result<WrapperProps>
	where
		F: FnOnce(StoreContext<S>) -> Fut,
		Fut: Future<Output = std::result::Result<Option<Props>, E>>,
		E: Into<BoxError>,
	{
		let context = match input {
			PhaseInput::Wrapped(outer) => {
				tracing::warn!(
					%phase,
					outer = %outer.phase(),
					"store already attached to context, skipping store creation; do not wrap nested loaders twice"
				);
				let props = run_callback(phase, callback, outer).await?;
				return Ok(WrapperProps::new(props, None));
			}
			PhaseInput::Fresh(context) => context,
		};

		let store = self.acquire(&context)?;
		let props = run_callback(phase, callback, StoreContext::new(context, Arc::clone(&store), phase)).await?;
		let state = self.config.serialize(&store.state())?;
		if self.config.debug_enabled() {
			tracing::debug!(%phase, key = self.config.key(), state = %state, "serialized store state");
		}

		Ok(WrapperProps::new(props, Some(state)))
	}
}

async fn run_callback<S, F, Fut, E>(phase: Phase, callback: F, context: StoreContext<S>) -> Result<Props>
where
	F: FnOnce(StoreContext<S>) -> Fut,
	Fut: Future<Output = std::result::Result<Option<Props>, E>>,
	E: Into<BoxError>,
{
	callback(context)
		.await
		.map(Option::unwrap_or_default)
		.map_err(|source| StoreError::Callback {
			phase: phase.to_string(),
			source: source.into(),
		})
}

/// Builder for [`StoreWrapper`].
pub struct StoreWrapperBuilder<S: Store> {
	factory: StoreFactory<S>,
	config: WrapperConfig<S::State>,
	registry: Option<Arc<ClientRegistry>>,
}

impl<S: Store> StoreWrapperBuilder<S> {
	/// Sets the configuration.
	pub fn config(mut self, config: WrapperConfig<S::State>) -> Self {
		self.config = config;
		self
	}

	/// Uses `registry` for client stores instead of the process-wide one.
	pub fn registry(mut self, registry: Arc<ClientRegistry>) -> Self {
		self.registry = Some(registry);
		self
	}

	/// Builds the wrapper.
	pub fn build(self) -> StoreWrapper<S> {
		let lifecycle = match self.registry {
			Some(registry) => StoreLifecycle::with_registry(registry),
			None => StoreLifecycle::new(),
		};
		StoreWrapper {
			factory: self.factory,
			config: Arc::new(self.config),
			lifecycle,
		}
	}
}
