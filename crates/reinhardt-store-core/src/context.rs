//! Rendering context and phase descriptors.
//!
//! The host framework decides at the call site which phase it is running
//! and whether an outer phase already acquired the store. Nothing here
//! inspects a context's shape at runtime.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use uuid::Uuid;

/// Identity of one in-flight server request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
	/// Creates a fresh, random request identity.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	/// Returns the underlying UUID.
	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}

impl Default for RequestId {
	fn default() -> Self {
		Self::new()
	}
}

impl From<Uuid> for RequestId {
	fn from(uuid: Uuid) -> Self {
		Self(uuid)
	}
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Where the current phase executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
	/// Server-side rendering.
	Server,
	/// Browser session.
	Client,
}

/// Lifetime boundary a store instance is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
	/// One server request.
	Request(RequestId),
	/// A server render with no request (static generation). Nothing to
	/// memoize against.
	Static,
	/// One client session.
	Client,
}

/// Descriptor of the environment a phase runs in, supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
	environment: Environment,
	request: Option<RequestId>,
	path: Option<String>,
	query: HashMap<String, String>,
	params: HashMap<String, String>,
}

impl RenderContext {
	fn with_environment(environment: Environment, request: Option<RequestId>) -> Self {
		Self {
			environment,
			request,
			path: None,
			query: HashMap::new(),
			params: HashMap::new(),
		}
	}

	/// Context for a server phase handling `request`.
	///
	/// A store acquired with this context stays in the lifecycle's request
	/// table until the request is released. Prefer
	/// [`StoreLifecycle::begin_request`](crate::lifecycle::StoreLifecycle::begin_request),
	/// whose guard releases it on drop; otherwise call
	/// [`StoreWrapper::end_request`](crate::wrapper::StoreWrapper::end_request).
	pub fn server(request: RequestId) -> Self {
		Self::with_environment(Environment::Server, Some(request))
	}

	/// Context for a server phase without a live request.
	pub fn server_static() -> Self {
		Self::with_environment(Environment::Server, None)
	}

	/// Context for a phase running in the browser.
	pub fn client() -> Self {
		Self::with_environment(Environment::Client, None)
	}

	/// Sets the page path.
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	/// Adds a query string parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.insert(key.into(), value.into());
		self
	}

	/// Adds a route parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());
		self
	}

	/// Returns the execution environment.
	pub fn environment(&self) -> Environment {
		self.environment
	}

	/// Returns the server request, if any.
	pub fn request(&self) -> Option<RequestId> {
		self.request
	}

	/// Returns the page path.
	pub fn path(&self) -> Option<&str> {
		self.path.as_deref()
	}

	/// Returns a query string parameter.
	pub fn query(&self, key: &str) -> Option<&str> {
		self.query.get(key).map(String::as_str)
	}

	/// Returns a route parameter.
	pub fn param(&self, key: &str) -> Option<&str> {
		self.params.get(key).map(String::as_str)
	}

	/// Returns true when running on the server.
	pub fn is_server(&self) -> bool {
		self.environment == Environment::Server
	}

	/// Derives the store scope for this context.
	pub fn scope(&self) -> Scope {
		match (self.environment, self.request) {
			(Environment::Client, _) => Scope::Client,
			(Environment::Server, Some(id)) => Scope::Request(id),
			(Environment::Server, None) => Scope::Static,
		}
	}
}

/// Which level an initial-mount phase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountLevel {
	/// Application-wide bootstrap.
	App,
	/// A single page.
	Page,
}

/// The data-loading phase a callback runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	/// Per-request server load.
	RequestTime,
	/// Static render without a live request.
	RenderStatic,
	/// Initial-mount load used for full hydration.
	InitialMount(MountLevel),
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::RequestTime => f.write_str("request-time"),
			Self::RenderStatic => f.write_str("render-static"),
			Self::InitialMount(MountLevel::App) => f.write_str("initial-mount(app)"),
			Self::InitialMount(MountLevel::Page) => f.write_str("initial-mount(page)"),
		}
	}
}

/// Host context enriched with the acquired store.
///
/// This is what phase callbacks receive. It dereferences to the
/// [`RenderContext`].
pub struct StoreContext<S> {
	context: RenderContext,
	store: Arc<S>,
	phase: Phase,
}

impl<S> StoreContext<S> {
	/// Attaches `store` to `context` for `phase`.
	pub fn new(context: RenderContext, store: Arc<S>, phase: Phase) -> Self {
		Self {
			context,
			store,
			phase,
		}
	}

	/// Returns the host context.
	pub fn context(&self) -> &RenderContext {
		&self.context
	}

	/// Returns the attached store.
	pub fn store(&self) -> &Arc<S> {
		&self.store
	}

	/// Returns the phase the context was created for.
	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Splits the context into its host context and store.
	pub fn into_parts(self) -> (RenderContext, Arc<S>) {
		(self.context, self.store)
	}
}

impl<S> Clone for StoreContext<S> {
	fn clone(&self) -> Self {
		Self {
			context: self.context.clone(),
			store: Arc::clone(&self.store),
			phase: self.phase,
		}
	}
}

impl<S> Deref for StoreContext<S> {
	type Target = RenderContext;

	fn deref(&self) -> &Self::Target {
		&self.context
	}
}

impl<S> fmt::Debug for StoreContext<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StoreContext")
			.field("context", &self.context)
			.field("phase", &self.phase)
			.finish_non_exhaustive()
	}
}

/// What a phase adapter receives from the host.
pub enum PhaseInput<S> {
	/// First entry into the wrapper for this render pass.
	Fresh(RenderContext),
	/// An outer phase already acquired the store.
	Wrapped(StoreContext<S>),
}

impl<S> PhaseInput<S> {
	/// Returns the host context.
	pub fn context(&self) -> &RenderContext {
		match self {
			Self::Fresh(context) => context,
			Self::Wrapped(wrapped) => wrapped.context(),
		}
	}
}

impl<S> From<RenderContext> for PhaseInput<S> {
	fn from(context: RenderContext) -> Self {
		Self::Fresh(context)
	}
}

impl<S> From<StoreContext<S>> for PhaseInput<S> {
	fn from(context: StoreContext<S>) -> Self {
		Self::Wrapped(context)
	}
}
