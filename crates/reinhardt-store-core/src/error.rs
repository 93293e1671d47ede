//! Error types for the store wrapper.
//!
//! Every failure raised by a user-supplied function (store factory, state
//! hooks, phase callbacks) is carried through unchanged as the `source` of
//! one of these variants. Nothing here is retried.

use thiserror::Error;

/// Boxed error produced by user-supplied functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for store wrapper operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store wrapper errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
	/// The store factory failed. No store was memoized for the scope.
	#[error("store factory failed: {0}")]
	Factory(#[source] BoxError),

	/// The `serialize_state` hook (or the default conversion) failed.
	#[error("failed to serialize store state: {0}")]
	Serialize(#[source] BoxError),

	/// The `deserialize_state` hook (or the default conversion) failed.
	#[error("failed to deserialize snapshot: {0}")]
	Deserialize(#[source] BoxError),

	/// A phase callback returned an error.
	#[error("{phase} callback failed: {source}")]
	Callback {
		/// Phase the callback ran in.
		phase: String,
		/// Error returned by the callback.
		#[source]
		source: BoxError,
	},

	/// The client registry holds a store of a different type under this key.
	#[error("client registry entry '{key}' holds a different store type")]
	RegistryTypeMismatch {
		/// Registry key.
		key: String,
	},

	/// A settings value could not be parsed.
	#[error("invalid value for setting {name}: '{value}'")]
	InvalidSetting {
		/// Setting name.
		name: String,
		/// Raw value that failed to parse.
		value: String,
	},

	/// Text passed as a props script tag is not one.
	#[error("malformed props script tag: {tag}")]
	MalformedScriptTag {
		/// Start of the rejected text.
		tag: String,
	},

	/// Wrapper props could not be encoded or decoded for transport.
	#[error("props transport error: {0}")]
	Transport(#[from] serde_json::Error),
}

impl StoreError {
	/// Returns true if the error came out of a user-supplied function.
	pub fn is_user_error(&self) -> bool {
		matches!(
			self,
			StoreError::Factory(_)
				| StoreError::Serialize(_)
				| StoreError::Deserialize(_)
				| StoreError::Callback { .. }
		)
	}
}
