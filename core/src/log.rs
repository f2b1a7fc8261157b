//! Injectable logging for request tracing and error reporting.
//!
//! The client never touches a global logger. A [`Logger`] is handed to it at
//! construction; the default [`NoopLogger`] discards everything and
//! [`TracingLogger`] forwards to the `tracing` crate.

/// Sink for the client's debug and error messages.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn error(&self, message: &str);
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Forwards messages to `tracing` under the `gorse_core` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "gorse_core", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "gorse_core", "{message}");
    }
}
