//! Props composition and transport.
//!
//! A phase hands [`WrapperProps`] to the render phase. There the
//! application-level initial props and the page-level props are merged
//! (page-level wins) and the page snapshot, which only exists to feed
//! hydration, is removed before anything reaches rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::store::{Props, Snapshot};

/// Key holding a snapshot inside a props object.
pub const INITIAL_STATE_KEY: &str = "initialState";

/// Key holding page props inside application props.
pub const PAGE_PROPS_KEY: &str = "pageProps";

/// Key holding page props in the flattened static/request shape.
pub const PROPS_KEY: &str = "props";

/// Element id of the props script tag.
pub const PROPS_SCRIPT_ID: &str = "__REINHARDT_STORE_PROPS__";

/// Envelope passed from a data-loading phase to the render phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapperProps {
	/// Whatever the phase callback returned.
	#[serde(default)]
	pub initial_props: Props,
	/// Application-level snapshot.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub initial_state: Option<Snapshot>,
	/// Page-level contributions, possibly carrying a page snapshot under
	/// `initialState`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page_props: Option<Props>,
}

impl WrapperProps {
	/// Creates props from a callback result and its snapshot.
	pub fn new(initial_props: Props, initial_state: Option<Snapshot>) -> Self {
		Self {
			initial_props,
			initial_state,
			page_props: None,
		}
	}

	/// Attaches page-level props.
	pub fn with_page_props(mut self, page_props: Props) -> Self {
		self.page_props = Some(page_props);
		self
	}

	/// Returns the application-level snapshot.
	pub fn app_snapshot(&self) -> Option<&Snapshot> {
		self.initial_state.as_ref()
	}

	/// Returns the page-level snapshot.
	///
	/// Page-level props win; otherwise a snapshot nested in
	/// `initialProps.pageProps` (an application loader forwarding its page
	/// loader's result) is used.
	pub fn page_snapshot(&self) -> Option<&Snapshot> {
		self.page_props
			.as_ref()
			.and_then(page_snapshot)
			.or_else(|| match self.initial_props.get(PAGE_PROPS_KEY) {
				Some(Value::Object(nested)) => page_snapshot(nested),
				_ => None,
			})
	}

	/// Composes the props exposed to rendering.
	pub fn compose(&self) -> Props {
		compose(&self.initial_props, self.page_props.as_ref())
	}

	/// Flattens into the host's page-props shape:
	/// `{...initialProps, props: {...initialProps.props, initialState}}`.
	pub fn into_page_props(self) -> Props {
		let mut flattened = self.initial_props;
		let mut props = match flattened.remove(PROPS_KEY) {
			Some(Value::Object(props)) => props,
			_ => Props::new(),
		};
		if let Some(state) = self.initial_state {
			props.insert(INITIAL_STATE_KEY.to_string(), state);
		}
		flattened.insert(PROPS_KEY.to_string(), Value::Object(props));
		flattened
	}

	/// Serializes to JSON.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	/// Deserializes from JSON.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Generates a JSON `<script>` tag carrying the props to the client.
	///
	/// The body is the props as JSON; read it back with
	/// [`from_script_tag`](Self::from_script_tag).
	pub fn to_script_tag(&self) -> Result<String> {
		// `</` would let a snapshot string close the tag early. `<\/` is
		// still valid JSON.
		let json = self.to_json()?.replace("</", "<\\/");
		Ok(format!(
			r#"<script id="{}" type="application/json">{}</script>"#,
			PROPS_SCRIPT_ID, json
		))
	}

	/// Parses a tag produced by [`to_script_tag`](Self::to_script_tag).
	pub fn from_script_tag(tag: &str) -> Result<Self> {
		let tag = tag.trim();
		let body = tag
			.strip_prefix("<script")
			.and_then(|rest| rest.split_once('>'))
			.and_then(|(_, rest)| rest.strip_suffix("</script>"))
			.ok_or_else(|| StoreError::MalformedScriptTag {
				tag: tag.chars().take(64).collect(),
			})?;
		Self::from_json(body)
	}
}

/// Returns the page-level snapshot carried by `page_props`.
pub fn page_snapshot(page_props: &Props) -> Option<&Snapshot> {
	page_props.get(INITIAL_STATE_KEY).filter(|s| !s.is_null())
}

/// Returns a shallow copy of `page_props` without its snapshot.
pub fn strip_snapshot(page_props: &Props) -> Props {
	let mut stripped = page_props.clone();
	stripped.remove(INITIAL_STATE_KEY);
	stripped
}

/// Merges application-level initial props with page-level props.
///
/// `initial_props.pageProps` (if an object) is overlaid with `page_props`,
/// page-level keys winning. The snapshot key is dropped from the merged
/// page props. Neither input is modified.
///
/// # Examples
///
/// ```
/// use reinhardt_store_core::props::compose;
/// use serde_json::json;
///
/// let initial = json!({"appProp": 1, "pageProps": {"title": "app", "lang": "en"}});
/// let page = json!({"title": "page", "initialState": {"count": 5}});
///
/// let merged = compose(initial.as_object().unwrap(), page.as_object());
/// assert_eq!(
/// 	serde_json::Value::Object(merged),
/// 	json!({"appProp": 1, "pageProps": {"title": "page", "lang": "en"}})
/// );
/// ```
pub fn compose(initial_props: &Props, page_props: Option<&Props>) -> Props {
	let nested = match initial_props.get(PAGE_PROPS_KEY) {
		Some(Value::Object(nested)) => Some(nested),
		_ => None,
	};
	if nested.is_none() && page_props.is_none() {
		return initial_props.clone();
	}

	let mut merged_page = nested.cloned().unwrap_or_default();
	if let Some(page_props) = page_props {
		merged_page.extend(page_props.iter().map(|(k, v)| (k.clone(), v.clone())));
	}
	merged_page.remove(INITIAL_STATE_KEY);

	let mut composed = initial_props.clone();
	composed.insert(PAGE_PROPS_KEY.to_string(), Value::Object(merged_page));
	composed
}
