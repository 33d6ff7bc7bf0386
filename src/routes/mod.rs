/// Router Module Index
///
/// Routes are split by access level so the session layer is applied to a whole
/// module at once rather than handler by handler.

/// Routes accessible to anonymous clients (login and reads).
pub mod public;

/// Routes behind the `AccessGate`. Requires a valid bearer token.
pub mod authenticated;
