//! crm-kanban - kanban board for the CRM's tasks.
//!
//! Commands:
//! - `crm-kanban board`: Show the board
//! - `crm-kanban show <id>`: Show one task and its subtasks
//! - `crm-kanban columns`: List columns
//! - `crm-kanban add <title>`: Create a task
//! - `crm-kanban update <id>`: Change a task
//! - `crm-kanban move <id> <column>`: Move a task
//! - `crm-kanban delete <id>`: Delete a task
//! - `crm-kanban watch`: Keep the board on screen, refreshed by polling
//!
//! Environment variables:
//! - CRM_KANBAN_API_URL: Backend base URL
//! - CRM_KANBAN_POLL_INTERVAL_MS: Refresh period for `watch`
//! - CRM_KANBAN_REQUEST_TIMEOUT_MS: Per-request timeout
//! - CRM_KANBAN_ACTOR: Name recorded in the activity log
//!
//! Exit codes:
//! - 0: Success
//! - 1: Backend or runtime error
//! - 2: Invalid input, unknown task or column, bad configuration

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crm_kanban_cli::{run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level
    let filter = if cli.debug {
        EnvFilter::new("crm_kanban=debug,crm_kanban_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crm_kanban_cli::{Commands, TaskFields};
    use std::path::PathBuf;

    #[test]
    fn test_cli_parsing_board() {
        let cli = Cli::parse_from(["crm-kanban", "board"]);
        assert!(matches!(cli.command, Commands::Board { json: false }));
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_parsing_global_flags() {
        let cli = Cli::parse_from([
            "crm-kanban",
            "columns",
            "--debug",
            "--api-url",
            "http://crm:5000",
            "--config",
            "board.toml",
        ]);
        assert!(cli.debug);
        assert_eq!(cli.api_url.as_deref(), Some("http://crm:5000"));
        assert_eq!(cli.config, Some(PathBuf::from("board.toml")));
    }

    #[test]
    fn test_cli_parsing_add() {
        let cli = Cli::parse_from([
            "crm-kanban",
            "add",
            "Call Acme",
            "--priority",
            "high",
            "--tag",
            "sales",
            "--tag",
            "q3",
            "--due",
            "2024-06-01",
            "--parent",
            "4",
        ]);
        match cli.command {
            Commands::Add { title, fields } => {
                assert_eq!(title, "Call Acme");
                assert_eq!(
                    fields,
                    TaskFields {
                        priority: Some("high".into()),
                        tags: vec!["sales".into(), "q3".into()],
                        due: NaiveDate::from_ymd_opt(2024, 6, 1),
                        parent: Some("4".into()),
                        ..TaskFields::default()
                    }
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["crm-kanban", "add", "x", "--due", "June 1st"]).is_err());
    }

    #[test]
    fn test_cli_parsing_update_clear_flags() {
        let cli = Cli::parse_from(["crm-kanban", "update", "7", "--no-parent", "--clear-due"]);
        assert!(matches!(
            cli.command,
            Commands::Update {
                no_parent: true,
                clear_due: true,
                clear_start: false,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["crm-kanban", "update", "7", "--no-parent", "--parent", "1"])
            .is_err());
    }

    #[test]
    fn test_cli_parsing_move_and_watch() {
        let cli = Cli::parse_from(["crm-kanban", "move", "3", "done"]);
        assert!(matches!(
            cli.command,
            Commands::Move { ref id, ref destination } if id == "3" && destination == "done"
        ));

        let cli = Cli::parse_from(["crm-kanban", "watch", "--column", "Review", "--column", "QA"]);
        match cli.command {
            Commands::Watch { columns } => assert_eq!(columns, vec!["Review", "QA"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
