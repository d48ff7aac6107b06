/*!
 * Orchestrator Configuration
 *
 * Settings for the coordinator thread each orchestrator owns
 */

use crate::core::errors::{ConfigResult, ConfigurationError};

/// Default name of the coordinator thread
pub const DEFAULT_COORDINATOR_NAME: &str = "resource-orchestrator";

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Name given to the coordinator thread
    pub coordinator_name: String,
    /// Stack size of the coordinator thread (platform default when `None`)
    pub stack_size: Option<usize>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            coordinator_name: DEFAULT_COORDINATOR_NAME.to_string(),
            stack_size: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_coordinator_name(mut self, name: impl Into<String>) -> Self {
        self.coordinator_name = name.into();
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Reject settings the thread builder would choke on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.coordinator_name.is_empty() {
            return Err(ConfigurationError(
                "coordinator thread name must not be empty".into(),
            ));
        }
        if self.coordinator_name.contains('\0') {
            return Err(ConfigurationError(
                "coordinator thread name must not contain NUL bytes".into(),
            ));
        }
        if self.stack_size == Some(0) {
            return Err(ConfigurationError(
                "coordinator stack size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
