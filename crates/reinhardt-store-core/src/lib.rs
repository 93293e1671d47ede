//! Reinhardt Store - store lifecycle and hydration for server-rendered pages
//!
//! Binds one reducer-driven store to the lifecycle of a server-rendering
//! host. On the server every request gets its own store, shared by all of
//! that request's data-loading phases. On the client one store lives for
//! the whole session. State crosses the boundary as a JSON snapshot and is
//! merged back through a well-known hydration action.
//!
//! # Features
//!
//! - **Scoped stores**: per-request, per-session and throwaway static stores
//! - **Ordered hydration**: application snapshot first, page snapshot last
//! - **Props composition**: page-level props override application-level ones
//! - **Props transport**: JSON script tag carrying the props to the client
//!
//! # Quick Start
//!
//! ```ignore
//! use reinhardt_store_core::prelude::*;
//!
//! let wrapper = StoreWrapper::new(
//! 	|_cx: &RenderContext| Ok::<_, BoxError>(AppStore::default()),
//! 	WrapperConfig::new().debug(true),
//! );
//!
//! // Server: request-time loading.
//! let request = wrapper.begin_request();
//! let props = wrapper
//! 	.request_props(request.context(), |cx| async move {
//! 		cx.store().dispatch(AppAction::Load);
//! 		Ok::<_, BoxError>(None)
//! 	})
//! 	.await?;
//! let script = props.to_script_tag()?;
//!
//! // Client: render with the transported props.
//! let mut mounted = wrapper.mount(&RenderContext::client())?;
//! let pass = mounted.render(&props)?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │          StoreWrapper            │
//! │    - Phase adapters              │
//! │    - Double-wrap guard           │
//! └────────────────┬─────────────────┘
//!                  │
//!     ┌────────────┼────────────┐
//!     │            │            │
//! ┌───▼─────┐ ┌────▼────┐ ┌─────▼───┐
//! │Lifecycle│ │Hydration│ │  Props  │
//! └─────────┘ └─────────┘ └─────────┘
//! ```
//!
//! # Feature Flags
//!
//! - `testing` - Exposes [`testing::ReducerStore`] for downstream tests

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod hydration;
pub mod lifecycle;
pub mod props;
pub mod store;
pub mod wrapped;
pub mod wrapper;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{DEFAULT_STORE_KEY, WrapperConfig, WrapperSettings};
pub use context::{
	Environment, MountLevel, Phase, PhaseInput, RenderContext, RequestId, Scope, StoreContext,
};
pub use error::{BoxError, Result, StoreError};
pub use hydration::{
	HydrationGate, HydrationReport, HydrationTiming, PendingHydration, SnapshotPair, hydrate,
	hydrate_ordered,
};
pub use lifecycle::{ClientRegistry, RequestScope, StoreFactory, StoreLifecycle, StoreOrigin};
pub use props::{WrapperProps, compose};
pub use store::{HYDRATE, Hydrate, Props, Snapshot, Store};
pub use wrapped::{RenderPass, WrappedStore};
pub use wrapper::{StoreWrapper, StoreWrapperBuilder};

/// Re-export commonly used types.
pub mod prelude {
	pub use crate::config::{WrapperConfig, WrapperSettings};
	pub use crate::context::{PhaseInput, RenderContext, RequestId, StoreContext};
	pub use crate::error::{BoxError, Result, StoreError};
	pub use crate::props::WrapperProps;
	pub use crate::store::{Hydrate, Props, Snapshot, Store};
	pub use crate::wrapped::{RenderPass, WrappedStore};
	pub use crate::wrapper::StoreWrapper;
}
