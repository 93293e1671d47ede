//! # Reinhardt Store
//!
//! Binds a reducer-driven store to the lifecycle of a Reinhardt
//! server-rendered page.
//!
//! - **Server**: one store per request, shared by every data-loading phase
//!   of that request and released with it.
//! - **Client**: one store per store key for the whole session.
//! - **Hydration**: state crosses the boundary as a JSON snapshot and is
//!   merged back application-level first, page-level last.
//!
//! ## Feature Flags
//!
//! - `testing` - Test utilities ([`testing::ReducerStore`] and a counter store)
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use reinhardt_store::prelude::*;
//!
//! let wrapper = StoreWrapper::new(
//! 	|_cx: &RenderContext| Ok::<_, BoxError>(AppStore::default()),
//! 	WrapperConfig::from_settings(WrapperSettings::from_env()?),
//! );
//!
//! let request = wrapper.begin_request();
//! let props = wrapper
//! 	.request_props(request.context(), |cx| async move {
//! 		cx.store().dispatch(AppAction::LoadUser(42));
//! 		Ok::<_, BoxError>(None)
//! 	})
//! 	.await?;
//! let script = props.to_script_tag()?;
//! ```

pub mod hydration;
#[cfg(feature = "testing")]
pub mod testing;

pub use reinhardt_store_core::{
	BoxError, ClientRegistry, DEFAULT_STORE_KEY, Environment, HYDRATE, Hydrate, MountLevel, Phase,
	PhaseInput, Props, RenderContext, RenderPass, RequestId, RequestScope, Result, Scope,
	Snapshot, Store, StoreContext, StoreError, StoreFactory, StoreLifecycle, StoreOrigin,
	StoreWrapper, StoreWrapperBuilder, WrappedStore, WrapperConfig, WrapperProps,
	WrapperSettings,
};

/// Re-export commonly used types.
pub mod prelude {
	pub use reinhardt_store_core::prelude::*;
}
