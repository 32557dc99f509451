use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Holds back a rapidly changing value until it has been stable for `delay`.
///
/// The settled value starts at the initial input. Every `set` restarts the
/// single pending timer and only the latest input can settle.
pub struct Debouncer<T> {
    delay: Duration,
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    state: Mutex<DebounceState<T>>,
    settled: watch::Sender<T>,
}

struct DebounceState<T> {
    input: T,
    generation: u64,
    pending: Option<AbortHandle>,
    disposed: bool,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, DebounceState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (settled, _) = watch::channel(initial.clone());
        Self {
            delay,
            shared: Arc::new(Shared {
                state: Mutex::new(DebounceState {
                    input: initial,
                    generation: 0,
                    pending: None,
                    disposed: false,
                }),
                settled,
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records a new raw input. Repeating the current input keeps the running
    /// timer. Outside a tokio runtime there is no timer and the input settles
    /// at once.
    pub fn set(&self, value: T) {
        let mut state = self.shared.lock();
        if state.disposed || state.input == value {
            return;
        }

        state.generation = state.generation.wrapping_add(1);
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.input = value.clone();

        if *self.shared.settled.borrow() == value {
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("no tokio runtime for the debounce timer, settling immediately");
            self.shared.settled.send_replace(value);
            return;
        };

        let generation = state.generation;
        let shared = self.shared.clone();
        let delay = self.delay;
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.lock();
            if state.disposed || state.generation != generation {
                return;
            }
            state.pending = None;
            shared.settled.send_replace(state.input.clone());
        });
        state.pending = Some(task.abort_handle());
    }

    pub fn input(&self) -> T {
        self.shared.lock().input.clone()
    }

    pub fn settled(&self) -> T {
        self.shared.settled.borrow().clone()
    }

    /// True while the raw input differs from the settled value.
    pub fn is_pending(&self) -> bool {
        let state = self.shared.lock();
        *self.shared.settled.borrow() != state.input
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.shared.settled.subscribe()
    }

    /// Cancels the pending timer. Later `set` calls are ignored.
    pub fn dispose(&self) {
        let mut state = self.shared.lock();
        state.disposed = true;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.disposed = true;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
    }
}
