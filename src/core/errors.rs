/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use super::id::Identity;
use miette::Diagnostic;
use thiserror::Error;

/// Invalid construction of a primitive
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
#[error("Invalid configuration: {0}")]
#[diagnostic(
    code(config::invalid),
    help("The primitive cannot be built with these parameters. Fix the call site.")
)]
pub struct ConfigurationError(pub String);

/// Ordered queue errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum QueueError {
    #[error("The queue is empty")]
    #[diagnostic(
        code(queue::empty),
        help("Check `is_empty()` before calling `dequeue()`.")
    )]
    Empty,

    #[error("Failed to start enqueue dispatcher: {0}")]
    #[diagnostic(
        code(queue::notifier_failed),
        help("The OS refused to create the dispatcher thread. Check thread limits.")
    )]
    Notifier(String),
}

/// Exclusive session errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SessionError {
    #[error("Identity {caller} is not the owner of the session (owned by {owner})")]
    #[diagnostic(
        code(session::not_owner),
        help("Every end of a session must be paired with a begin by the same identity.")
    )]
    NotOwner { owner: Identity, caller: Identity },
}

/// Resource orchestrator errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum OrchestratorError {
    #[error("Orchestrator configuration error: {0}")]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to spawn coordinator thread: {0}")]
    #[diagnostic(
        code(orchestrator::spawn_failed),
        help("The OS refused to create a thread. Check thread limits and stack size.")
    )]
    Spawn(String),
}

/// Unified error type with miette diagnostics
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
pub type QueueResult<T> = Result<T, QueueError>;
pub type SessionResult<T> = Result<T, SessionError>;
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
