//! Command dispatch: build the board, run one command, print the outcome.

use std::str::FromStr;
use std::sync::Arc;

use crm_kanban::{
    board::{GetBoard, LoadBoard},
    column::AddColumn,
    task::{AddTask, DeleteTask, GetTask, MoveTask, UpdateTask},
    BoardContext, BoardProjection, BoardSync, ColumnId, ConfigProvider, HttpGateway,
    KanbanConfig, KanbanOperationProcessor, OperationProcessor, Priority, TaskDraft, TaskId,
    TaskPatch, TaskStore,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{Cli, Commands, TaskFields};
use crate::error::CliError;
use crate::render;

pub type CliResult<T> = Result<T, CliError>;

/// Everything a command needs: the loaded board and who is acting on it
pub struct Session {
    pub config: KanbanConfig,
    pub ctx: Arc<BoardContext>,
    pub processor: KanbanOperationProcessor,
}

impl Session {
    /// Load configuration, connect to the backend and load the board
    pub async fn open(cli: &Cli) -> CliResult<Self> {
        let mut provider = ConfigProvider::new().with_api_url(cli.api_url.clone());
        if let Some(path) = &cli.config {
            provider = provider.with_file(path);
        }
        let config = provider.load()?;

        let gateway = HttpGateway::new(&config.api_url, config.request_timeout())?;
        let session = Self::with_context(config, BoardContext::new(Arc::new(gateway)));
        session.load().await?;
        Ok(session)
    }

    /// Wrap an existing context without loading it
    pub fn with_context(config: KanbanConfig, ctx: BoardContext) -> Self {
        let processor = match &config.actor {
            Some(actor) => KanbanOperationProcessor::with_actor(actor.as_str()),
            None => KanbanOperationProcessor::new(),
        };
        Self {
            config,
            ctx: Arc::new(ctx),
            processor,
        }
    }

    pub async fn load(&self) -> CliResult<Value> {
        let stats = self.processor.process(&LoadBoard::new(), self.ctx.as_ref()).await?;
        debug!(tasks = %stats["tasks"], "board loaded");
        Ok(stats)
    }
}

/// Run the parsed command line to completion
pub async fn run(cli: Cli) -> CliResult<()> {
    let session = Session::open(&cli).await?;
    let output = execute(&session, cli.command).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Run one command against an open session and return what to print
pub async fn execute(session: &Session, command: Commands) -> CliResult<String> {
    let ctx: &BoardContext = session.ctx.as_ref();
    let processor = &session.processor;

    match command {
        Commands::Board { json } => {
            if json {
                let board = processor.process(&GetBoard::new(), ctx).await?;
                return Ok(serde_json::to_string_pretty(&board)?);
            }
            Ok(render_board(&*ctx.read_store().await))
        }

        Commands::Show { id, json } => {
            let value = processor.process(&GetTask::new(id.as_str()), ctx).await?;
            if json {
                return Ok(serde_json::to_string_pretty(&value)?);
            }
            let store = ctx.read_store().await;
            let task = store.require_task(&TaskId::from(id.as_str()))?;
            let projection = BoardProjection::new(&store);
            Ok(render::task_detail(task, &projection.subtasks_of(&task.id)))
        }

        Commands::Columns => {
            let store = ctx.read_store().await;
            Ok(render::columns_table(store.columns()).to_string())
        }

        Commands::Add { title, fields } => {
            let draft = {
                let store = ctx.read_store().await;
                draft_from(title, fields, &store)?
            };
            let task = processor.process(&AddTask::from_draft(draft), ctx).await?;
            Ok(format!(
                "Created task #{} in {}",
                task_field(&task, "id"),
                task_field(&task, "status")
            ))
        }

        Commands::Update {
            id,
            title,
            fields,
            no_parent,
            clear_start,
            clear_due,
        } => {
            let mut patch = {
                let store = ctx.read_store().await;
                patch_from(fields, &store)?
            };
            if let Some(title) = title {
                patch = patch.with_title(title);
            }
            if no_parent {
                patch = patch.with_parent(None);
            }
            if clear_start {
                patch = patch.with_start_date(None);
            }
            if clear_due {
                patch = patch.with_due_date(None);
            }
            if patch.is_empty() {
                return Ok(format!("Nothing to change on task #{}", id));
            }
            processor
                .process(&UpdateTask::new(id.as_str()).with_patch(patch), ctx)
                .await?;
            Ok(format!("Updated task #{}", id))
        }

        Commands::Move { id, destination } => {
            let destination = resolve_column(&*ctx.read_store().await, &destination);
            let result = processor
                .process(&MoveTask::to_column(id.as_str(), destination.clone()), ctx)
                .await?;
            if result["moved"].as_bool().unwrap_or(false) {
                Ok(format!("Moved task #{} to {}", id, destination))
            } else {
                Ok(format!("Task #{} is already in {}", id, destination))
            }
        }

        Commands::Delete { id } => {
            let result = processor.process(&DeleteTask::new(id.as_str()), ctx).await?;
            let promoted = result["promoted"].as_array().map(Vec::len).unwrap_or(0);
            if promoted > 0 {
                Ok(format!("Deleted task #{}; {} subtask(s) are now top-level", id, promoted))
            } else {
                Ok(format!("Deleted task #{}", id))
            }
        }

        Commands::Watch { columns } => {
            add_columns(session, columns).await?;
            watch(session).await?;
            Ok(String::new())
        }
    }
}

/// Add session columns, skipping titles that name an existing column
pub async fn add_columns(session: &Session, titles: Vec<String>) -> CliResult<Vec<ColumnId>> {
    let mut added = Vec::new();
    for title in titles {
        let existing = {
            let store = session.ctx.read_store().await;
            store.has_column(&resolve_column(&store, &title))
        };
        if existing {
            debug!(%title, "column already on the board");
            continue;
        }
        let result = session
            .processor
            .process(&AddColumn::new(title), session.ctx.as_ref())
            .await?;
        if result["added"].as_bool().unwrap_or(false) {
            added.push(ColumnId::from(task_field(&result, "id")));
        }
    }
    Ok(added)
}

/// Redraw the board whenever a poll lands, until Ctrl-C
async fn watch(session: &Session) -> CliResult<()> {
    let sync = BoardSync::spawn(session.ctx.clone(), session.config.poll_interval());
    let mut status = sync.status();
    info!(period_ms = session.config.poll_interval_ms, "watching board");

    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => break signal.map_err(CliError::from),
            changed = status.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = status.borrow_and_update().clone();
                let board = render_board(&*session.ctx.read_store().await);
                println!("{}", board);
                if let Some(error) = current.last_error {
                    eprintln!("Refresh failed: {}", error);
                }
            }
        }
    };

    sync.shutdown().await;
    outcome
}

fn render_board(store: &TaskStore) -> String {
    let projection = BoardProjection::new(store);
    render::board_table(&projection.board()).to_string()
}

/// Match a column by id first, then by title ignoring case
pub fn resolve_column(store: &TaskStore, raw: &str) -> ColumnId {
    let raw = raw.trim();
    if store.has_column(&ColumnId::from(raw)) {
        return ColumnId::from(raw);
    }
    store
        .columns()
        .iter()
        .find(|c| c.title.eq_ignore_ascii_case(raw))
        .map(|c| c.id.clone())
        .unwrap_or_else(|| ColumnId::from_title(raw))
}

fn draft_from(title: String, fields: TaskFields, store: &TaskStore) -> CliResult<TaskDraft> {
    let mut draft = TaskDraft::new(title).with_dates(fields.start, fields.due);
    if let Some(description) = fields.description {
        draft = draft.with_description(description);
    }
    if let Some(status) = fields.status {
        draft = draft.with_status(resolve_column(store, &status));
    }
    if let Some(priority) = fields.priority {
        draft = draft.with_priority(Priority::from_str(&priority)?);
    }
    if let Some(assignee) = fields.assigned_to {
        draft = draft.with_assigned_to(assignee);
    }
    if !fields.tags.is_empty() {
        draft = draft.with_tags(fields.tags);
    }
    if let Some(parent) = fields.parent {
        draft = draft.with_parent(parent.as_str());
    }
    Ok(draft)
}

fn patch_from(fields: TaskFields, store: &TaskStore) -> CliResult<TaskPatch> {
    let mut patch = TaskPatch::new();
    if let Some(description) = fields.description {
        patch = patch.with_description(description);
    }
    if let Some(status) = fields.status {
        patch = patch.with_status(resolve_column(store, &status));
    }
    if let Some(priority) = fields.priority {
        patch = patch.with_priority(Priority::from_str(&priority)?);
    }
    if let Some(assignee) = fields.assigned_to {
        patch = patch.with_assigned_to(assignee);
    }
    if !fields.tags.is_empty() {
        patch = patch.with_tags(fields.tags);
    }
    if fields.start.is_some() {
        patch = patch.with_start_date(fields.start);
    }
    if fields.due.is_some() {
        patch = patch.with_due_date(fields.due);
    }
    if let Some(parent) = fields.parent {
        patch = patch.with_parent(Some(TaskId::from(parent.as_str())));
    }
    Ok(patch)
}

fn task_field<'a>(task: &'a Value, key: &str) -> &'a str {
    task[key].as_str().unwrap_or_default()
}
