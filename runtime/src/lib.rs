//! # Busline Runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling
//! for the booking client.
//!
//! ## Core Components
//!
//! - **Store**: owns feature state, runs the reducer, executes effects
//! - **Effect execution**: backend calls and timers run as Tokio tasks and feed
//!   their resulting action back into the store
//! - **Cancellation registry**: tasks started under an `EffectId` can be aborted
//!   as a group, which is how view teardown disposes of the payment countdown
//!
//! ## Example
//!
//! ```ignore
//! use busline_runtime::Store;
//!
//! let store = Store::new(TicketState::default(), TicketReducer::new(), env);
//!
//! let handle = store.send(TicketAction::ViewEntered(View::MyTickets)).await?;
//! handle.wait().await;
//!
//! let bookings = store.state(|s| s.list.bookings.clone()).await;
//! ```

use busline_core::effect::{Effect, EffectId};
use busline_core::reducer::Reducer;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::AbortHandle;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The store is shutting down and no longer accepts actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out with effects still running
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Waiting for a matching action timed out
        #[error("Timed out waiting for action")]
        Timeout,

        /// The action broadcast channel closed
        #[error("Action channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Handle for waiting on the effects started by one `send`
///
/// The handle completes once every task spawned directly for the action has
/// finished. A task that produced an action finishes only after that action
/// has been reduced, so after `wait()` the store reflects the response.
/// Cancelled tasks count as finished.
pub struct EffectHandle {
    counter: Arc<AtomicUsize>,
    notifier: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let (tx, rx) = watch::channel(());
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = Self {
            counter: Arc::clone(&counter),
            notifier: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };
        (handle, tracking)
    }

    /// Number of effects from this action that are still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.counter.load(Ordering::Acquire)
    }

    /// Wait until all effects for the action have completed
    pub async fn wait(&mut self) {
        loop {
            if self.counter.load(Ordering::Acquire) == 0 {
                return;
            }
            if self.notifier.changed().await.is_err() {
                // All trackers dropped, nothing left to wait for
                return;
            }
        }
    }

    /// Wait with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when the
    /// timeout expires.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::AcqRel);
    }
}

/// Decrements the tracking counter when a task ends, including on abort or panic
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.counter.fetch_sub(1, Ordering::AcqRel);
        let _ = self.0.notifier.send(());
    }
}

struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Tasks started under an `EffectId`, indexed so each task can deregister itself
#[derive(Default)]
struct CancellationRegistry {
    next_key: AtomicU64,
    tasks: Mutex<HashMap<EffectId, HashMap<u64, AbortHandle>>>,
}

impl CancellationRegistry {
    fn spawn<F>(self: &Arc<Self>, id: EffectId, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(self);
        let task_id = id.clone();

        // Hold the lock across spawn so a fast task cannot deregister before
        // it has been registered.
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        let join = tokio::spawn(async move {
            task.await;
            registry.deregister(&task_id, key);
        });
        tasks.entry(id).or_default().insert(key, join.abort_handle());
    }

    fn deregister(&self, id: &EffectId, key: u64) {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(group) = tasks.get_mut(id) {
            group.remove(&key);
            if group.is_empty() {
                tasks.remove(id);
            }
        }
    }

    fn cancel(&self, id: &EffectId) -> usize {
        let group = {
            let mut tasks = match self.tasks.lock() {
                Ok(tasks) => tasks,
                Err(poisoned) => poisoned.into_inner(),
            };
            tasks.remove(id)
        };
        group.map_or(0, |group| {
            let count = group.len();
            for handle in group.into_values() {
                handle.abort();
            }
            count
        })
    }

    fn in_flight(&self, id: &EffectId) -> usize {
        let tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        tasks.get(id).map_or(0, HashMap::len)
    }
}

/// Store module - the runtime coordinator
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, CancellationRegistry, DecrementGuard,
        Duration, Effect, EffectHandle, EffectId, EffectTracking, Future, Ordering, Reducer,
        RwLock, StoreError, broadcast,
    };

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (state transitions)
    /// 3. Environment (backend client, clock, session storage)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// State is only ever mutated by the reducer, so every update is the
    /// result of a pending/fulfilled/rejected action passing through `send`.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        cancellations: Arc<CancellationRegistry>,
        /// Actions produced by effects are broadcast to observers (CLI
        /// renderers, tests waiting for a response).
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                cancellations: Arc::clone(&self.cancellations),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast buffers 64 actions; use
        /// [`Store::with_broadcast_capacity`] for chattier observers.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 64)
        }

        /// Create a new Store with custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                cancellations: Arc::new(CancellationRegistry::default()),
                action_broadcast,
            }
        }

        /// The injected environment
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Starts executing the returned effects
        ///
        /// `send()` returns once effects have been started. Use the returned
        /// [`EffectHandle`] to wait for them.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, &tracking, None);
            }

            Ok(handle)
        }

        /// Send an action and wait for the first effect-produced action
        /// matching `predicate`
        ///
        /// Subscribes before sending, so a fast response cannot be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action before the timeout
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let loading = store.state(|s| s.list.loading).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Number of live tasks registered under a cancellation id
        #[must_use]
        pub fn in_flight(&self, id: &EffectId) -> usize {
            self.cancellations.in_flight(id)
        }

        /// Initiate graceful shutdown of the store
        ///
        /// New actions are rejected immediately; pending effects get until
        /// `timeout` to finish.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when the timeout expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(50);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Spawn a tracked task, registering it for cancellation when scoped
        fn spawn_tracked<F>(&self, tracking: &EffectTracking, scope: Option<&EffectId>, task: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::AcqRel);

            let guard = DecrementGuard(tracking.clone());
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
            let task = async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                task.await;
            };

            match scope {
                Some(id) => self.cancellations.spawn(id.clone(), task),
                None => {
                    tokio::spawn(task);
                },
            }
        }

        /// Feed an effect-produced action back into the store
        async fn feed_back(self, action: A) {
            let _ = self.action_broadcast.send(action.clone());
            if let Err(error) = self.send(action).await {
                tracing::debug!(%error, "Dropped effect result");
            }
        }

        /// Execute an effect
        ///
        /// - `None`: no-op
        /// - `Future`: runs the computation, sends the resulting action if `Some`
        /// - `Delay`: sleeps, then sends the action
        /// - `Parallel`: executes each child effect
        /// - `Cancellable`: executes the child with its tasks registered under `id`
        /// - `Cancel`: aborts every task registered under `id`
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking, scope: Option<&EffectId>) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let store = self.clone();
                    self.spawn_tracked(tracking, scope, async move {
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action");
                            store.feed_back(action).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let store = self.clone();
                    self.spawn_tracked(tracking, scope, async move {
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking, scope);
                    }
                },
                Effect::Cancellable { id, effect } => {
                    metrics::counter!("store.effects.executed", "type" => "cancellable").increment(1);
                    self.execute_effect(*effect, tracking, Some(&id));
                },
                Effect::Cancel(id) => {
                    let cancelled = self.cancellations.cancel(&id);
                    tracing::debug!(effect_id = %id, cancelled, "Cancelled effects");
                    // Task count, never near f64 precision limits
                    #[allow(clippy::cast_precision_loss)]
                    metrics::histogram!("store.effects.cancelled").record(cancelled as f64);
                },
            }
        }
    }
}

pub use store::Store;
