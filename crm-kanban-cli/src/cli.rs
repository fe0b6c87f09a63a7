//! CLI definition for the kanban command-line client.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Kanban board for the CRM's tasks.
///
/// Every command loads the board from the backend first, then applies its
/// change through the backend before showing the result.
#[derive(Parser, Debug)]
#[command(name = "crm-kanban")]
#[command(version)]
#[command(about = "Kanban board for the CRM's tasks")]
#[command(
    long_about = "Manage the CRM's tasks as a kanban board.\n\n\
    The board always has the columns todo, in-progress and done. Tasks can be\n\
    nested one level deep under a parent task.\n\n\
    Environment variables:\n  \
    CRM_KANBAN_API_URL             Backend base URL (default http://localhost:5000)\n  \
    CRM_KANBAN_POLL_INTERVAL_MS    Refresh period for `watch`\n  \
    CRM_KANBAN_REQUEST_TIMEOUT_MS  Per-request timeout\n  \
    CRM_KANBAN_ACTOR               Name recorded in the activity log"
)]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Read settings from this file instead of ./crm-kanban.{toml,yaml,yml}
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding every other setting
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the board, one table column per board column
    Board {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single task and its subtasks
    Show {
        /// Task id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the board's columns
    Columns,

    /// Create a task
    Add {
        /// Task title
        title: String,
        #[command(flatten)]
        fields: TaskFields,
    },

    /// Change fields of an existing task
    Update {
        /// Task id
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
        /// Make the task a top-level task again
        #[arg(long, conflicts_with = "parent")]
        no_parent: bool,
        /// Remove the start date
        #[arg(long, conflicts_with = "start")]
        clear_start: bool,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
    },

    /// Move a task to another column
    #[command(name = "move")]
    Move {
        /// Task id
        id: String,
        /// Destination column id or title
        destination: String,
    },

    /// Delete a task; its subtasks become top-level tasks
    Delete {
        /// Task id
        id: String,
    },

    /// Keep the board on screen, refreshing it from the backend
    ///
    /// Extra columns only live for the duration of the session.
    Watch {
        /// Add a column with this title before watching (repeatable)
        #[arg(long = "column", value_name = "TITLE")]
        columns: Vec<String>,
    },
}

/// Task fields shared by `add` and `update`
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct TaskFields {
    /// Free-form description
    #[arg(long)]
    pub description: Option<String>,
    /// Column id or title
    #[arg(long)]
    pub status: Option<String>,
    /// low, medium or high
    #[arg(long)]
    pub priority: Option<String>,
    /// Assignee
    #[arg(long)]
    pub assigned_to: Option<String>,
    /// Tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,
    /// Due date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub due: Option<NaiveDate>,
    /// Parent task id
    #[arg(long, value_name = "ID")]
    pub parent: Option<String>,
}
