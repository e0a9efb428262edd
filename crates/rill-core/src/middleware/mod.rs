//! Middleware handlers
//!
//! Middleware is an ordinary handler registered with
//! [`Router::use_handlers`](crate::Router::use_handlers) or
//! [`Router::mount`](crate::Router::mount): it does its work on the request
//! and response, then returns [`Signal::Next`](crate::Signal::Next) so
//! dispatch carries on.

pub mod tracing;

pub use self::tracing::{
    generate_counter_id, generate_uuid, request_tracing, IdGenerator, TracingConfig,
};
