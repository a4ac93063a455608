//! # Busline Core
//!
//! Reducer, effect and clock abstractions shared by every Busline feature.
//!
//! The booking client is written as a functional core with an imperative shell:
//!
//! - **State**: what the client currently knows (last fetched bookings, detail, seat map)
//! - **Action**: every input (user intent, lifecycle hook, backend response, timer tick)
//! - **Reducer**: pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of I/O to perform, never the I/O itself
//! - **Environment**: injected dependencies (backend client, clock, session storage)
//!
//! Backend calls are described as [`effect::Effect::Future`] values whose output
//! is fed back into the reducer as a fulfilled/rejected action. Timers are
//! [`effect::Effect::Delay`] values, and any group of effects can be tagged with an
//! [`effect::EffectId`] so a later [`effect::Effect::Cancel`] disposes of it.
//!
//! ## Example
//!
//! ```ignore
//! use busline_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = CounterEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &CounterEnvironment,
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => {
//!                 state.count += 1;
//!                 smallvec![Effect::None]
//!             }
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

#[macro_use]
mod effect_macros;

/// Reducer module - the core trait for client-side state transitions
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - all state transitions go through it
    ///
    /// # Type Parameters
    ///
    /// - `State`: The feature state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// Reducers must not perform I/O. Anything that talks to the backend,
    /// sleeps, or touches storage is returned as an [`Effect`].
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime. Most actions produce
        /// zero or one effect, so the small-vector stays on the stack.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects describe work for the runtime. They are values: a reducer can
/// return them, tests can inspect them, and nothing happens until a store
/// executes them.
pub mod effect {
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Identifier for a group of cancellable effects
    ///
    /// Every task started while executing [`Effect::Cancellable`] is registered
    /// under its id. [`Effect::Cancel`] with the same id aborts all of them.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct EffectId(String);

    impl EffectId {
        /// Create an effect id from any string-like value
        #[must_use]
        pub fn new(id: impl Into<String>) -> Self {
            Self(id.into())
        }

        /// Borrow the id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<&str> for EffectId {
        fn from(id: &str) -> Self {
            Self::new(id)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Dispatch an action after a delay (timers, ticks)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run an effect whose tasks can later be aborted with [`Effect::Cancel`]
        Cancellable {
            /// Group the spawned tasks are registered under
            id: EffectId,
            /// The effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort every in-flight task registered under the id
        ///
        /// Aborted tasks never feed an action back into the reducer.
        Cancel(EffectId),
    }

    // Future doesn't implement Debug
    impl<Action> fmt::Debug for Effect<Action>
    where
        Action: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Tag this effect so it can be cancelled with `Effect::Cancel(id)`
        #[must_use]
        pub fn cancellable(self, id: impl Into<EffectId>) -> Effect<Action> {
            Effect::Cancellable {
                id: id.into(),
                effect: Box::new(self),
            }
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Returns `true` if this effect, or any effect nested in it, is a
        /// `Cancel` for the given id
        #[must_use]
        pub fn cancels(&self, id: &EffectId) -> bool {
            match self {
                Effect::Cancel(cancelled) => cancelled == id,
                Effect::Parallel(effects) => effects.iter().any(|e| e.cancels(id)),
                Effect::Cancellable { effect, .. } => effect.cancels(id),
                _ => false,
            }
        }

        /// Count the `Future` effects (backend calls) in this effect tree
        #[must_use]
        pub fn future_count(&self) -> usize {
            match self {
                Effect::Future(_) => 1,
                Effect::Parallel(effects) => effects.iter().map(Effect::future_count).sum(),
                Effect::Cancellable { effect, .. } => effect.future_count(),
                _ => 0,
            }
        }
    }
}

/// Environment module - dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts "now" so time-derived state is testable
    ///
    /// Production uses [`SystemClock`]; tests use a fixed or manually advanced
    /// clock from `busline-testing`.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
