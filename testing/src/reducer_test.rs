//! Given-When-Then harness for reducers

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use busline_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers
///
/// Earlier actions passed to [`ReducerTest::given_actions`] are reduced first
/// and their effects discarded, which is how a test puts a slice into its
/// pending state before feeding it a response.
///
/// # Example
///
/// ```ignore
/// use busline_testing::ReducerTest;
///
/// ReducerTest::new(TicketReducer::new())
///     .with_env(env)
///     .given_state(TicketState::default())
///     .given_actions(vec![TicketAction::ViewEntered(View::MyTickets)])
///     .when_action(TicketAction::BookingsLoaded { seq: 1, page })
///     .then_state(|state| assert!(!state.list.loading))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    setup: Vec<A>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            setup: Vec::new(),
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Actions reduced before the action under test (Given)
    #[must_use]
    pub fn given_actions(mut self, actions: Vec<A>) -> Self {
        self.setup = actions;
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertion fails.
    #[allow(clippy::panic)]
    #[allow(clippy::expect_used)]
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        for earlier in self.setup {
            let _ = self.reducer.reduce(&mut state, earlier, &env);
        }

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use busline_core::effect::{Effect, EffectId};

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    #[allow(clippy::panic)]
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)]
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert the number of backend calls, looking through `Parallel` and
    /// `Cancellable`
    ///
    /// # Panics
    ///
    /// Panics if the count doesn't match.
    #[allow(clippy::panic)]
    pub fn assert_future_count<A>(effects: &[Effect<A>], expected: usize) {
        let found: usize = effects.iter().map(Effect::future_count).sum();
        assert_eq!(
            found, expected,
            "Expected {expected} Future effects, but found {found}"
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)]
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| e.future_count() > 0),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects schedule a delayed action under the given id
    ///
    /// # Panics
    ///
    /// Panics if no matching cancellable delay is found.
    #[allow(clippy::panic)]
    pub fn assert_has_cancellable_delay<A>(effects: &[Effect<A>], id: &EffectId) {
        fn found<A>(effect: &Effect<A>, id: &EffectId, scoped: bool) -> bool {
            match effect {
                Effect::Delay { .. } => scoped,
                Effect::Parallel(effects) => effects.iter().any(|e| found(e, id, scoped)),
                Effect::Cancellable {
                    id: scope,
                    effect,
                } => found(effect, id, scoped || scope == id),
                _ => false,
            }
        }

        assert!(
            effects.iter().any(|e| found(e, id, false)),
            "Expected a Delay registered under {id}, but none found"
        );
    }

    /// Assert that effects cancel the given id
    ///
    /// # Panics
    ///
    /// Panics if no `Cancel` for the id is found.
    #[allow(clippy::panic)]
    pub fn assert_cancels<A>(effects: &[Effect<A>], id: &EffectId) {
        assert!(
            effects.iter().any(|e| e.cancels(id)),
            "Expected Effect::Cancel({id}), but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busline_core::effect::{Effect, EffectId};
    use busline_core::reducer::Reducer;
    use std::time::Duration;

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Decrement,
        StartTimer,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> smallvec::SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    smallvec::smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.count -= 1;
                    smallvec::smallvec![Effect::None]
                },
                TestAction::StartTimer => smallvec::smallvec![
                    Effect::Delay {
                        duration: Duration::from_secs(1),
                        action: Box::new(TestAction::Increment),
                    }
                    .cancellable("timer"),
                    Effect::Cancel(EffectId::new("previous")),
                ],
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn given_actions_run_before_action_under_test() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 5 })
            .given_actions(vec![TestAction::Increment, TestAction::Increment])
            .when_action(TestAction::Decrement)
            .then_state(|state| {
                assert_eq!(state.count, 6);
            })
            .run();
    }

    #[test]
    fn timer_assertions() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::StartTimer)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_future_count(effects, 0);
                assertions::assert_has_cancellable_delay(effects, &EffectId::new("timer"));
                assertions::assert_cancels(effects, &EffectId::new("previous"));
            })
            .run();
    }
}
