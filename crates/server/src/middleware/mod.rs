//! HTTP middleware.

mod session;

pub use session::create_session_layer;
