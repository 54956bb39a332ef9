//! Application services.

pub mod quiz_sync;
