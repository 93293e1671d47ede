//! Wrapper configuration.
//!
//! [`WrapperConfig`] is built once at setup time and shared read-only by
//! every phase. It resolves the optional state hooks, the client registry
//! key and the debug flag. [`WrapperSettings`] carries the non-function
//! part so it can come from a settings file or the environment.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{BoxError, Result, StoreError};
use crate::store::Snapshot;

/// Registry key used when `store_key` is not configured.
pub const DEFAULT_STORE_KEY: &str = "__REINHARDT_STORE__";

/// Environment variable overriding the registry key.
pub const STORE_KEY_ENV: &str = "REINHARDT_STORE_KEY";

/// Environment variable enabling debug tracing.
pub const DEBUG_ENV: &str = "REINHARDT_STORE_DEBUG";

/// Hook turning store state into a snapshot.
pub type SerializeHook<T> =
	Arc<dyn Fn(&T) -> std::result::Result<Snapshot, BoxError> + Send + Sync>;

/// Hook turning a snapshot back into store state.
pub type DeserializeHook<T> =
	Arc<dyn Fn(Snapshot) -> std::result::Result<T, BoxError> + Send + Sync>;

/// Configuration for a [`StoreWrapper`](crate::StoreWrapper).
///
/// Without hooks, state is converted to and from its own JSON shape, so
/// the snapshot is the state as-is. Custom hooks must be inverses of each
/// other for hydration to reproduce the server state.
///
/// # Examples
///
/// ```
/// use reinhardt_store_core::{DEFAULT_STORE_KEY, WrapperConfig};
///
/// let config = WrapperConfig::<u32>::new();
/// assert_eq!(config.key(), DEFAULT_STORE_KEY);
/// assert!(!config.debug_enabled());
///
/// let config = WrapperConfig::<u32>::new().store_key("__APP__").debug(true);
/// assert_eq!(config.key(), "__APP__");
/// assert!(config.debug_enabled());
/// ```
pub struct WrapperConfig<T> {
	serialize_state: Option<SerializeHook<T>>,
	deserialize_state: Option<DeserializeHook<T>>,
	store_key: Option<String>,
	debug: bool,
}

impl<T: 'static> WrapperConfig<T> {
	/// Creates a configuration with every option at its default.
	pub fn new() -> Self {
		Self {
			serialize_state: None,
			deserialize_state: None,
			store_key: None,
			debug: false,
		}
	}

	/// Creates a configuration from loaded settings.
	pub fn from_settings(settings: WrapperSettings) -> Self {
		let mut config = Self::new().debug(settings.debug);
		config.store_key = settings.store_key;
		config
	}

	/// Sets the hook used to turn state into a snapshot.
	pub fn serialize_state<F, E>(mut self, hook: F) -> Self
	where
		F: Fn(&T) -> std::result::Result<Snapshot, E> + Send + Sync + 'static,
		E: Into<BoxError> + 'static,
	{
		let hook: SerializeHook<T> =
			Arc::new(move |state: &T| -> std::result::Result<Snapshot, BoxError> {
				hook(state).map_err(Into::into)
			});
		self.serialize_state = Some(hook);
		self
	}

	/// Sets the hook used to turn a snapshot back into state.
	pub fn deserialize_state<F, E>(mut self, hook: F) -> Self
	where
		F: Fn(Snapshot) -> std::result::Result<T, E> + Send + Sync + 'static,
		E: Into<BoxError> + 'static,
	{
		let hook: DeserializeHook<T> =
			Arc::new(move |snapshot: Snapshot| -> std::result::Result<T, BoxError> {
				hook(snapshot).map_err(Into::into)
			});
		self.deserialize_state = Some(hook);
		self
	}

	/// Sets the client registry key.
	pub fn store_key(mut self, key: impl Into<String>) -> Self {
		self.store_key = Some(key.into());
		self
	}

	/// Enables or disables debug tracing.
	pub fn debug(mut self, enabled: bool) -> Self {
		self.debug = enabled;
		self
	}

	/// Returns the client registry key.
	pub fn key(&self) -> &str {
		self.store_key.as_deref().unwrap_or(DEFAULT_STORE_KEY)
	}

	/// Returns true if debug tracing is enabled.
	pub fn debug_enabled(&self) -> bool {
		self.debug
	}
}

impl<T: Serialize + DeserializeOwned> WrapperConfig<T> {
	/// Converts state into a snapshot.
	pub fn serialize(&self, state: &T) -> Result<Snapshot> {
		match &self.serialize_state {
			Some(hook) => hook(state).map_err(StoreError::Serialize),
			None => serde_json::to_value(state).map_err(|e| StoreError::Serialize(Box::new(e))),
		}
	}

	/// Converts a snapshot back into state.
	pub fn deserialize(&self, snapshot: Snapshot) -> Result<T> {
		match &self.deserialize_state {
			Some(hook) => hook(snapshot).map_err(StoreError::Deserialize),
			None => {
				serde_json::from_value(snapshot).map_err(|e| StoreError::Deserialize(Box::new(e)))
			}
		}
	}
}

impl<T: 'static> Default for WrapperConfig<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for WrapperConfig<T> {
	fn clone(&self) -> Self {
		Self {
			serialize_state: self.serialize_state.clone(),
			deserialize_state: self.deserialize_state.clone(),
			store_key: self.store_key.clone(),
			debug: self.debug,
		}
	}
}

impl<T> fmt::Debug for WrapperConfig<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WrapperConfig")
			.field("serialize_state", &self.serialize_state.is_some())
			.field("deserialize_state", &self.deserialize_state.is_some())
			.field("store_key", &self.store_key.as_deref().unwrap_or(DEFAULT_STORE_KEY))
			.field("debug", &self.debug)
			.finish()
	}
}

/// Serializable part of the wrapper configuration.
///
/// ```
/// use reinhardt_store_core::WrapperSettings;
///
/// let settings: WrapperSettings =
/// 	serde_json::from_str(r#"{"store_key": "__APP__", "debug": true}"#).unwrap();
/// assert_eq!(settings.store_key.as_deref(), Some("__APP__"));
/// assert!(settings.debug);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperSettings {
	/// Client registry key.
	pub store_key: Option<String>,
	/// Debug tracing.
	pub debug: bool,
}

impl WrapperSettings {
	/// Loads settings from `REINHARDT_STORE_KEY` and `REINHARDT_STORE_DEBUG`.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads settings through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let store_key = lookup(STORE_KEY_ENV)
			.map(|key| key.trim().to_string())
			.filter(|key| !key.is_empty());
		let debug = match lookup(DEBUG_ENV) {
			Some(raw) => parse_flag(DEBUG_ENV, &raw)?,
			None => false,
		};
		Ok(Self { store_key, debug })
	}
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"" | "0" | "false" | "no" | "off" => Ok(false),
		_ => Err(StoreError::InvalidSetting {
			name: name.to_string(),
			value: raw.to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::collections::HashMap;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Counter {
		count: i64,
	}

	#[rstest]
	fn test_default_hooks_keep_state_shape() {
		let config = WrapperConfig::<Counter>::new();
		let snapshot = config.serialize(&Counter { count: 3 }).unwrap();
		assert_eq!(snapshot, json!({"count": 3}));
		assert_eq!(config.deserialize(snapshot).unwrap(), Counter { count: 3 });
	}

	#[rstest]
	fn test_custom_hooks_are_used() {
		let config = WrapperConfig::<Counter>::new()
			.serialize_state(|s: &Counter| Ok::<_, BoxError>(json!({"wrapped": s.count})))
			.deserialize_state(|v: Snapshot| {
				v["wrapped"]
					.as_i64()
					.map(|count| Counter { count })
					.ok_or_else(|| BoxError::from("missing wrapped"))
			});

		let snapshot = config.serialize(&Counter { count: 9 }).unwrap();
		assert_eq!(snapshot, json!({"wrapped": 9}));
		assert_eq!(config.deserialize(snapshot).unwrap(), Counter { count: 9 });
	}

	#[rstest]
	fn test_hook_failure_is_not_substituted() {
		let config = WrapperConfig::<Counter>::new()
			.deserialize_state(|_| Err::<Counter, _>("corrupt snapshot"));
		let err = config.deserialize(json!({"count": 1})).unwrap_err();
		assert!(matches!(err, StoreError::Deserialize(_)));
		assert!(err.to_string().contains("corrupt snapshot"));
	}

	#[rstest]
	fn test_default_deserialize_rejects_wrong_shape() {
		let config = WrapperConfig::<Counter>::new();
		let err = config.deserialize(json!("nope")).unwrap_err();
		assert!(matches!(err, StoreError::Deserialize(_)));
	}

	#[rstest]
	fn test_debug_output_hides_hooks() {
		let config = WrapperConfig::<Counter>::new().serialize_state(|_| Ok::<_, BoxError>(json!(null)));
		let debug = format!("{:?}", config);
		assert!(debug.contains("serialize_state: true"));
		assert!(debug.contains(DEFAULT_STORE_KEY));
	}

	#[rstest]
	fn test_from_settings() {
		let config = WrapperConfig::<Counter>::from_settings(WrapperSettings {
			store_key: Some("__CUSTOM__".to_string()),
			debug: true,
		});
		assert_eq!(config.key(), "__CUSTOM__");
		assert!(config.debug_enabled());
	}

	#[rstest]
	#[case("true", true)]
	#[case("1", true)]
	#[case(" Yes ", true)]
	#[case("off", false)]
	#[case("", false)]
	fn test_settings_debug_flag(#[case] raw: &str, #[case] expected: bool) {
		let vars = HashMap::from([(DEBUG_ENV, raw.to_string())]);
		let settings = WrapperSettings::from_lookup(|name| vars.get(name).cloned()).unwrap();
		assert_eq!(settings.debug, expected);
	}

	#[rstest]
	fn test_settings_invalid_flag() {
		let err = WrapperSettings::from_lookup(|name| {
			(name == DEBUG_ENV).then(|| "sometimes".to_string())
		})
		.unwrap_err();
		assert!(matches!(err, StoreError::InvalidSetting { .. }));
	}

	#[rstest]
	fn test_settings_blank_key_falls_back_to_default() {
		let settings = WrapperSettings::from_lookup(|name| {
			(name == STORE_KEY_ENV).then(|| "   ".to_string())
		})
		.unwrap();
		assert_eq!(settings.store_key, None);
		assert_eq!(WrapperConfig::<Counter>::from_settings(settings).key(), DEFAULT_STORE_KEY);
	}
}
