//! Server-to-client flow tests.
//!
//! Props produced by the data-loading phases travel as JSON and drive the
//! render-phase hydration of the client store.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use reinhardt_store_core::prelude::*;
use reinhardt_store_core::testing::{CounterAction, CounterState, CounterStore, counter_store};
use reinhardt_store_core::{ClientRegistry, HydrationTiming};
use rstest::{fixture, rstest};
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[fixture]
fn wrapper() -> StoreWrapper<CounterStore> {
	StoreWrapper::builder(|_cx: &RenderContext| Ok::<_, Infallible>(counter_store(0)))
		.registry(Arc::new(ClientRegistry::new()))
		.build()
}

/// Captures `[LEVEL] message` lines.
struct LogCapture {
	logs: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		struct MessageVisitor {
			message: String,
		}

		impl tracing::field::Visit for MessageVisitor {
			fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
				if field.name() == "message" {
					self.message = format!("{:?}", value);
				}
			}
		}

		let mut visitor = MessageVisitor {
			message: String::new(),
		};
		event.record(&mut visitor);
		self.logs
			.lock()
			.unwrap()
			.push(format!("[{}] {}", event.metadata().level(), visitor.message));
	}
}

fn page_props(count: i64, title: &str) -> Props {
	let mut props = Props::new();
	props.insert("initialState".to_string(), json!({"count": count}));
	props.insert("title".to_string(), json!(title));
	props
}

#[rstest]
#[tokio::test]
async fn test_request_time_increment_is_serialized_unmodified(wrapper: StoreWrapper<CounterStore>) {
	// Arrange
	let request = wrapper.begin_request();

	// Act
	let props = wrapper
		.request_props(request.context(), |cx| async move {
			cx.store().dispatch(CounterAction::Increment);
			Ok::<_, Infallible>(None)
		})
		.await
		.unwrap();

	// Assert
	assert_eq!(props.initial_state, Some(json!({"count": 1})));
	assert!(props.initial_props.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_phases_of_one_request_share_the_store(wrapper: StoreWrapper<CounterStore>) {
	// Arrange
	let request = wrapper.begin_request();

	// Act
	let first = wrapper
		.request_props(request.context(), |cx| async move {
			cx.store().dispatch(CounterAction::Add(2));
			Ok::<_, Infallible>(None)
		})
		.await
		.unwrap();
	let second = wrapper
		.initial_page_props(request.context(), |cx| async move {
			cx.store().dispatch(CounterAction::Add(3));
			Ok::<_, Infallible>(None)
		})
		.await
		.unwrap();

	// Assert
	assert_eq!(first.initial_state, Some(json!({"count": 2})));
	assert_eq!(second.initial_state, Some(json!({"count": 5})));
	assert_eq!(wrapper.lifecycle().active_requests(), 1);

	drop(request);
	assert_eq!(wrapper.lifecycle().active_requests(), 0);
}

#[rstest]
#[tokio::test]
async fn test_nested_invocation_warns_and_reuses_store(wrapper: StoreWrapper<CounterStore>) {
	// Arrange
	let logs = Arc::new(Mutex::new(Vec::new()));
	let _guard = tracing_subscriber::registry()
		.with(LogCapture { logs: logs.clone() })
		.set_default();
	let request = wrapper.begin_request();
	let outer_store = wrapper.acquire(&request.context()).unwrap();
	let outer = StoreContext::new(
		request.context(),
		Arc::clone(&outer_store),
		reinhardt_store_core::Phase::InitialMount(reinhardt_store_core::MountLevel::App),
	);

	// Act
	let props = wrapper
		.initial_page_props(outer, |cx| async move {
			cx.store().dispatch(CounterAction::Add(7));
			Ok::<_, Infallible>(None)
		})
		.await
		.unwrap();

	// Assert
	assert!(props.initial_state.is_none());
	assert_eq!(outer_store.state(), CounterState { count: 7 });
	assert!(Arc::ptr_eq(&outer_store, &wrapper.acquire(&request.context()).unwrap()));
	let captured = logs.lock().unwrap();
	assert!(
		captured
			.iter()
			.any(|line| line.starts_with("[WARN]") && line.contains("store already attached")),
		"expected a double-wrap warning, got {:?}",
		*captured
	);
}

async fn request_then_render(debug: bool) -> (WrapperProps, CounterState, Vec<String>) {
	let logs = Arc::new(Mutex::new(Vec::new()));
	let _guard = tracing_subscriber::registry()
		.with(LogCapture { logs: logs.clone() })
		.set_default();
	let wrapper = StoreWrapper::builder(|_cx: &RenderContext| Ok::<_, Infallible>(counter_store(0)))
		.config(WrapperConfig::new().debug(debug))
		.registry(Arc::new(ClientRegistry::new()))
		.build();

	let request = wrapper.begin_request();
	let props = wrapper
		.request_props(request.context(), |cx| async move {
			cx.store().dispatch(CounterAction::Increment);
			Ok::<_, Infallible>(None)
		})
		.await
		.unwrap();
	let mut mounted = wrapper.mount(&RenderContext::client()).unwrap();
	let state = mounted.render(&props).unwrap().store.state();

	let captured = logs.lock().unwrap().clone();
	(props, state, captured)
}

#[rstest]
#[tokio::test]
async fn test_debug_mode_only_adds_diagnostics() {
	// Arrange
	let (quiet_props, quiet_state, quiet_logs) = request_then_render(false).await;

	// Act
	let (debug_props, debug_state, debug_logs) = request_then_render(true).await;

	// Assert
	assert_eq!(debug_props, quiet_props);
	assert_eq!(debug_state, quiet_state);
	assert_eq!(debug_state, CounterState { count: 1 });
	assert!(!quiet_logs.iter().any(|line| line.starts_with("[DEBUG]")));
	for message in [
		"created store",
		"serialized store state",
		"dispatching hydration action",
		"applied hydration to mounted store",
	] {
		assert!(
			debug_logs
				.iter()
				.any(|line| line.starts_with("[DEBUG]") && line.contains(message)),
			"missing debug event {message:?} in {debug_logs:?}"
		);
	}
}

#[rstest]
#[tokio::test]
async fn test_page_snapshot_wins_over_app_snapshot(wrapper: StoreWrapper<CounterStore>) {
	// Arrange
	let request = wrapper.begin_request();
	let app = wrapper
		.initial_app_props(request.context(), |cx| async move {
			cx.store().dispatch(CounterAction::Increment);
			Ok::<_, Infallible>(None)
		})
		.await
		.unwrap()
		.with_page_props(page_props(5, "dashboard"));
	let transported = WrapperProps::from_json(&app.to_json().unwrap()).unwrap();

	// Act
	let mut mounted = wrapper.mount(&RenderContext::client()).unwrap();
	let pass = mounted.render(&transported).unwrap();

	// Assert
	assert_eq!(pass.timing, HydrationTiming::Synchronous);
	assert_eq!(pass.report.dispatched(), 2);
	assert_eq!(pass.store.state(), CounterState { count: 5 });
	assert_eq!(pass.props["pageProps"], json!({"title": "dashboard"}));
	assert_eq!(transported.page_snapshot(), Some(&json!({"count": 5})));
}

#[rstest]
fn test_navigation_hydration_waits_for_commit(wrapper: StoreWrapper<CounterStore>) {
	// Arrange
	let mut mounted = wrapper.mount(&RenderContext::client()).unwrap();
	let first = WrapperProps::new(Props::new(), Some(json!({"count": 1})));
	mounted.render(&first).unwrap();
	let next = first.clone().with_page_props(page_props(9, "next"));

	// Act
	let pass = mounted.render(&next).unwrap();
	let before_commit = mounted.store().state();
	let report = mounted.commit().unwrap();

	// Assert
	assert_eq!(pass.timing, HydrationTiming::Deferred);
	assert_eq!(before_commit, CounterState { count: 1 });
	assert!(!report.app);
	assert!(report.page);
	assert_eq!(mounted.store().state(), CounterState { count: 9 });
}

#[rstest]
fn test_identical_rerender_does_not_dispatch(wrapper: StoreWrapper<CounterStore>) {
	// Arrange
	let mut mounted = wrapper.mount(&RenderContext::client()).unwrap();
	let props = WrapperProps::new(Props::new(), Some(json!({"count": 4})))
		.with_page_props(page_props(6, "same"));
	mounted.render(&props).unwrap();
	mounted.store().dispatch(CounterAction::Increment);
	let dispatched = mounted.store().dispatch_count();

	// Act
	let pass = mounted.render(&props).unwrap();
	mounted.commit().unwrap();

	// Assert
	assert_eq!(pass.timing, HydrationTiming::Skipped);
	assert_eq!(mounted.store().dispatch_count(), dispatched);
	assert_eq!(mounted.store().state(), CounterState { count: 7 });
}

#[rstest]
#[tokio::test]
async fn test_custom_hooks_round_trip_through_transport() {
	// Arrange
	let config = WrapperConfig::<CounterState>::new()
		.serialize_state(|state: &CounterState| Ok::<_, Infallible>(json!({"n": state.count})))
		.deserialize_state(|snapshot: Snapshot| {
			snapshot["n"]
				.as_i64()
				.map(|count| CounterState { count })
				.ok_or("missing n")
		});
	let wrapper = StoreWrapper::builder(|_cx: &RenderContext| Ok::<_, Infallible>(counter_store(10)))
		.config(config)
		.registry(Arc::new(ClientRegistry::new()))
		.build();

	// Act
	let props = wrapper
		.static_props(RenderContext::server_static(), |_cx| async move {
			Ok::<_, Infallible>(None)
		})
		.await
		.unwrap();
	let snapshot = props["props"]["initialState"].clone();
	let client = WrapperProps::new(Props::new(), Some(snapshot.clone()));
	let mut mounted = wrapper.mount(&RenderContext::client()).unwrap();
	let pass = mounted.render(&client).unwrap();

	// Assert
	assert_eq!(snapshot, json!({"n": 10}));
	assert_eq!(pass.store.state(), CounterState { count: 10 });
}

#[rstest]
fn test_malformed_snapshot_surfaces_deserialize_error(wrapper: StoreWrapper<CounterStore>) {
	// Arrange
	let mut mounted = wrapper.mount(&RenderContext::client()).unwrap();
	let props = WrapperProps::new(Props::new(), Some(json!({"count": "many"})));

	// Act
	let result = mounted.render(&props);

	// Assert
	assert!(matches!(result, Err(StoreError::Deserialize(_))));
}

#[rstest]
fn test_script_tag_escapes_closing_tags() {
	// Arrange
	let props = WrapperProps::new(Props::new(), Some(json!({"note": "</script><b>"})));

	// Act
	let tag = props.to_script_tag().unwrap();

	// Assert
	assert!(tag.starts_with(r#"<script id="__REINHARDT_STORE_PROPS__""#));
	assert_eq!(tag.matches("</script>").count(), 1);
	assert!(tag.contains(r"<\/script><b>"));
}
