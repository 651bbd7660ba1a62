//! Macros for listener error handling.
//!
//! Shorthands for building and returning [`crate::error::ListenerError`] values.

/// Creates a [`crate::error::ListenerError`] from a kind, a static description and an optional
/// dynamic detail.
#[macro_export]
macro_rules! listener_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::ListenerError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::ListenerError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Returns early with a [`crate::error::ListenerError`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return Err($crate::listener_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return Err($crate::listener_error!($kind, $desc, $detail))
    };
}
