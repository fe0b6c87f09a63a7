//! Errors surfaced by the command-line client

use crm_kanban::{ConfigError, GatewayError, KanbanError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Kanban(#[from] KanbanError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot reach backend: {0}")]
    Gateway(#[from] GatewayError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("watch interrupted: {0}")]
    Signal(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code: 2 for bad input, 1 for everything else
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Kanban(e) if e.is_validation() || e.is_not_found() => 2,
            CliError::Kanban(KanbanError::DuplicateId { .. }) => 2,
            CliError::Config(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::from(KanbanError::task_not_found("9")).exit_code(), 2);
        assert_eq!(
            CliError::from(KanbanError::validation("title", "empty")).exit_code(),
            2
        );
        assert_eq!(
            CliError::from(KanbanError::Persistence(GatewayError::Timeout { after_ms: 10 }))
                .exit_code(),
            1
        );
        assert_eq!(
            CliError::from(ConfigError::invalid_value("api_url", "bad")).exit_code(),
            2
        );
    }
}
