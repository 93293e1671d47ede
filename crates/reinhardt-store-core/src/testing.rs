//! Test utilities.
//!
//! [`ReducerStore`] is a minimal reducer-driven store, and the counter
//! types give tests a ready-made reducer that treats hydration as a full
//! overwrite.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::store::{Hydrate, Store};

type Reducer<S, A> = Box<dyn Fn(&S, A) -> S + Send + Sync>;

/// A store whose state is replaced by `reducer(state, action)` on dispatch.
pub struct ReducerStore<S, A> {
	state: Mutex<S>,
	reducer: Reducer<S, A>,
	dispatched: AtomicUsize,
}

impl<S, A> ReducerStore<S, A> {
	/// Creates a store holding `initial`.
	pub fn new<R>(initial: S, reducer: R) -> Self
	where
		R: Fn(&S, A) -> S + Send + Sync + 'static,
	{
		Self {
			state: Mutex::new(initial),
			reducer: Box::new(reducer),
			dispatched: AtomicUsize::new(0),
		}
	}

	/// Number of actions dispatched so far, hydration included.
	pub fn dispatch_count(&self) -> usize {
		self.dispatched.load(Ordering::SeqCst)
	}
}

impl<S, A> Store for ReducerStore<S, A>
where
	S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
	A: From<Hydrate<S>> + Send + 'static,
{
	type State = S;
	type Action = A;

	fn state(&self) -> S {
		self.state.lock().clone()
	}

	fn dispatch(&self, action: A) {
		let mut state = self.state.lock();
		let next = (self.reducer)(&*state, action);
		*state = next;
		self.dispatched.fetch_add(1, Ordering::SeqCst);
	}
}

/// State of the test counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
	/// Current count.
	pub count: i64,
}

/// Actions of the test counter.
#[derive(Debug, Clone, PartialEq)]
pub enum CounterAction {
	/// Adds one.
	Increment,
	/// Adds the given amount.
	Add(i64),
	/// Replaces the whole state.
	Hydrate(CounterState),
}

impl From<Hydrate<CounterState>> for CounterAction {
	fn from(action: Hydrate<CounterState>) -> Self {
		Self::Hydrate(action.payload)
	}
}

/// Counter store used throughout the tests.
pub type CounterStore = ReducerStore<CounterState, CounterAction>;

/// Creates a counter store starting at `count`.
pub fn counter_store(count: i64) -> CounterStore {
	ReducerStore::new(CounterState { count }, |state: &CounterState, action: CounterAction| match action {
		CounterAction::Increment => CounterState {
			count: state.count + 1,
		},
		CounterAction::Add(n) => CounterState {
			count: state.count + n,
		},
		CounterAction::Hydrate(next) => next,
	})
}
