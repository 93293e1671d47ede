//! The store contract the wrapper orchestrates.
//!
//! The wrapper never reduces state itself. It only decides which store
//! instance a phase observes and when a [`Hydrate`] action is dispatched
//! into it; how the payload merges with existing state is up to the
//! store's own reducer.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Action type tag identifying a hydration message.
///
/// Stable across versions so reducers can match on it.
pub const HYDRATE: &str = "__REINHARDT_STORE_HYDRATE__";

/// Serialized store state as it crosses the server/client boundary.
pub type Snapshot = serde_json::Value;

/// Plain properties object exchanged with the host framework.
pub type Props = serde_json::Map<String, serde_json::Value>;

/// A reducer-driven state container.
///
/// Implementations must be shareable across tasks; the wrapper hands out
/// `Arc<S>` so that every phase in a scope observes the same instance.
pub trait Store: Send + Sync + 'static {
	/// The state held by the store.
	type State: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

	/// Actions accepted by [`Store::dispatch`]. Must be able to carry a
	/// hydration message.
	type Action: From<Hydrate<Self::State>> + Send;

	/// Returns a copy of the current state.
	fn state(&self) -> Self::State;

	/// Dispatches an action through the store's reducer.
	fn dispatch(&self, action: Self::Action);
}

/// Hydration action carrying deserialized state from another environment.
///
/// Serializes as `{"type": HYDRATE, "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "__REINHARDT_STORE_HYDRATE__")]
pub struct Hydrate<T> {
	/// State to merge into the store.
	pub payload: T,
}

impl<T> Hydrate<T> {
	/// The action type tag, identical to [`HYDRATE`].
	pub const TYPE: &'static str = HYDRATE;

	/// Creates a hydration action for `payload`.
	pub fn new(payload: T) -> Self {
		Self { payload }
	}

	/// Consumes the action and returns its payload.
	pub fn into_payload(self) -> T {
		self.payload
	}
}
