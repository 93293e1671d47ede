//! Store lifecycle management.
//!
//! Decides which store instance a phase observes:
//!
//! - [`Scope::Request`]: one store per server request, memoized in a side
//!   table keyed by [`RequestId`] and dropped by [`StoreLifecycle::release`].
//! - [`Scope::Static`]: a fresh store on every call.
//! - [`Scope::Client`]: one store per registry key for the whole session,
//!   kept in a [`ClientRegistry`].
//!
//! A failing factory never leaves an entry behind, so the next call tries
//! again.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, LazyLock};

use parking_lot::{Mutex, RwLock};

use crate::context::{RenderContext, RequestId, Scope};
use crate::error::{BoxError, Result, StoreError};

/// Factory creating a store for a rendering context.
pub type StoreFactory<S> =
	Arc<dyn Fn(&RenderContext) -> std::result::Result<S, BoxError> + Send + Sync>;

static GLOBAL_REGISTRY: LazyLock<Arc<ClientRegistry>> =
	LazyLock::new(|| Arc::new(ClientRegistry::new()));

/// Whether [`StoreLifecycle::acquire_tracked`] created the store or found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
	/// The factory ran for this call.
	Created,
	/// An existing store for the scope was returned.
	Reused,
}

/// Session-wide registry of client stores, keyed by store key.
///
/// Each key is written at most once and never cleared.
pub struct ClientRegistry {
	stores: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ClientRegistry {
	/// Creates an empty registry.
	///
	/// Most callers want [`ClientRegistry::global`]; separate registries are
	/// useful to isolate several applications in one process.
	pub fn new() -> Self {
		Self {
			stores: RwLock::new(HashMap::new()),
		}
	}

	/// Returns the process-wide registry, creating it on first access.
	pub fn global() -> Arc<Self> {
		Arc::clone(&GLOBAL_REGISTRY)
	}

	/// Looks up the store registered under `key`.
	pub fn get<S: Send + Sync + 'static>(&self, key: &str) -> Result<Option<Arc<S>>> {
		match self.stores.read().get(key) {
			Some(entry) => downcast(key, Arc::clone(entry)).map(Some),
			None => Ok(None),
		}
	}

	/// Returns true if a store is registered under `key`.
	pub fn contains(&self, key: &str) -> bool {
		self.stores.read().contains_key(key)
	}

	/// Returns the number of registered stores.
	pub fn len(&self) -> usize {
		self.stores.read().len()
	}

	/// Returns true if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.stores.read().is_empty()
	}

	fn get_or_try_insert<S, F>(&self, key: &str, create: F) -> Result<(Arc<S>, StoreOrigin)>
	where
		S: Send + Sync + 'static,
		F: FnOnce() -> Result<S>,
	{
		if let Some(existing) = self.get::<S>(key)? {
			return Ok((existing, StoreOrigin::Reused));
		}

		// The factory runs outside the lock; if another caller published
		// first, theirs wins and ours is dropped.
		let created = Arc::new(create()?);
		let mut stores = self.stores.write();
		match stores.entry(key.to_string()) {
			Entry::Occupied(entry) => Ok((downcast(key, Arc::clone(entry.get()))?, StoreOrigin::Reused)),
			Entry::Vacant(entry) => {
				entry.insert(Arc::clone(&created) as Arc<dyn Any + Send + Sync>);
				Ok((created, StoreOrigin::Created))
			}
		}
	}
}

impl Default for ClientRegistry {
	fn default() -> Self {
		Self::new()
	}
}

fn downcast<S: Send + Sync + 'static>(
	key: &str,
	entry: Arc<dyn Any + Send + Sync>,
) -> Result<Arc<S>> {
	entry
		.downcast::<S>()
		.map_err(|_| StoreError::RegistryTypeMismatch {
			key: key.to_string(),
		})
}

/// Creates or retrieves the store for the current scope.
pub struct StoreLifecycle<S> {
	requests: Mutex<HashMap<RequestId, Arc<S>>>,
	registry: Arc<ClientRegistry>,
}

impl<S: Send + Sync + 'static> StoreLifecycle<S> {
	/// Creates a lifecycle backed by the process-wide client registry.
	pub fn new() -> Self {
		Self::with_registry(ClientRegistry::global())
	}

	/// Creates a lifecycle backed by `registry`.
	pub fn with_registry(registry: Arc<ClientRegistry>) -> Self {
		Self {
			requests: Mutex::new(HashMap::new()),
			registry,
		}
	}

	/// Returns the client registry.
	pub fn registry(&self) -> &Arc<ClientRegistry> {
		&self.registry
	}

	/// Returns the store for the scope of `context`, creating it if needed.
	///
	/// `key` selects the client registry entry and is ignored on the server.
	pub fn acquire<F>(&self, context: &RenderContext, key: &str, factory: F) -> Result<Arc<S>>
	where
		F: Fn(&RenderContext) -> std::result::Result<S, BoxError>,
	{
		self.acquire_tracked(context, key, factory)
			.map(|(store, _)| store)
	}

	/// Like [`acquire`](Self::acquire), also reporting whether the store
	/// was created.
	pub fn acquire_tracked<F>(
		&self,
		context: &RenderContext,
		key: &str,
		factory: F,
	) -> Result<(Arc<S>, StoreOrigin)>
	where
		F: Fn(&RenderContext) -> std::result::Result<S, BoxError>,
	{
		let create = || factory(context).map_err(StoreError::Factory);

		match context.scope() {
			Scope::Request(id) => {
				if let Some(existing) = self.requests.lock().get(&id) {
					return Ok((Arc::clone(existing), StoreOrigin::Reused));
				}
				let created = Arc::new(create()?);
				let mut requests = self.requests.lock();
				match requests.entry(id) {
					Entry::Occupied(entry) => Ok((Arc::clone(entry.get()), StoreOrigin::Reused)),
					Entry::Vacant(entry) => {
						entry.insert(Arc::clone(&created));
						Ok((created, StoreOrigin::Created))
					}
				}
			}
			Scope::Static => Ok((Arc::new(create()?), StoreOrigin::Created)),
			Scope::Client => self.registry.get_or_try_insert(key, create),
		}
	}

	/// Returns the store already bound to the scope of `context`, without
	/// creating one. Static scopes never hold a store.
	pub fn current(&self, context: &RenderContext, key: &str) -> Result<Option<Arc<S>>> {
		match context.scope() {
			Scope::Request(id) => Ok(self.requests.lock().get(&id).cloned()),
			Scope::Static => Ok(None),
			Scope::Client => self.registry.get(key),
		}
	}

	/// Opens a request scope that releases its store when dropped.
	pub fn begin_request(&self) -> RequestScope<'_, S> {
		RequestScope {
			lifecycle: self,
			id: RequestId::new(),
		}
	}

	/// Ends the scope of `request`, returning its store if one was created.
	pub fn release(&self, request: &RequestId) -> Option<Arc<S>> {
		self.requests.lock().remove(request)
	}

	/// Returns the number of requests currently holding a store.
	pub fn active_requests(&self) -> usize {
		self.requests.lock().len()
	}
}

impl<S: Send + Sync + 'static> Default for StoreLifecycle<S> {
	fn default() -> Self {
		Self::new()
	}
}

/// Guard for one server request. Releases the request's store on drop.
pub struct RequestScope<'a, S: Send + Sync + 'static> {
	lifecycle: &'a StoreLifecycle<S>,
	id: RequestId,
}

impl<S: Send + Sync + 'static> RequestScope<'_, S> {
	/// Returns the request identity.
	pub fn id(&self) -> RequestId {
		self.id
	}

	/// Returns a server context bound to this request.
	pub fn context(&self) -> RenderContext {
		RenderContext::server(self.id)
	}
}

impl<S: Send + Sync + 'static> Drop for RequestScope<'_, S> {
	fn drop(&mut self) {
		self.lifecycle.release(&self.id);
	}
}
