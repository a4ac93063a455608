//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use busline_core::async_effect;
///
/// async_effect! {
///     match api.booking_detail(&token, &booking_guid).await {
///         Ok(detail) => Some(TicketAction::DetailLoaded { seq, detail }),
///         Err(error) => Some(TicketAction::DetailFailed { seq, error }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use busline_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(1),
///     action: TicketAction::CountdownTick
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Wrap an effect so it is registered under a cancellation id
///
/// # Example
///
/// ```rust,ignore
/// use busline_core::{cancellable, delay};
///
/// cancellable! {
///     id: "countdown",
///     effect: delay! { duration: tick, action: TicketAction::CountdownTick }
/// }
/// ```
#[macro_export]
macro_rules! cancellable {
    (
        id: $id:expr,
        effect: $effect:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $crate::effect::EffectId::from($id),
            effect: ::std::boxed::Box::new($effect),
        }
    };
}
