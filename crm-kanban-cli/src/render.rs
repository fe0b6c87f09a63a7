//! Terminal rendering of boards, tasks and columns.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use crm_kanban::projection::BoardView;
use crm_kanban::{Column, Task};

/// Widest a card title may get inside a board cell
const CARD_TITLE_WIDTH: usize = 32;

/// Create a table that wraps its content to the terminal width.
pub fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Truncate a string to `max` characters, appending "..." if truncated.
///
/// Safe for multi-byte (UTF-8) strings.
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// One-line label for a card
pub fn card_label(task: &Task) -> String {
    let mut label = format!("#{} {}", task.id, truncate_str(&task.title, CARD_TITLE_WIDTH));
    if let Some(parent) = &task.parent_id {
        label.push_str(&format!(" (sub of #{})", parent));
    }
    if let Some(due) = task.due_date {
        label.push_str(&format!("\n  due {}", due));
    }
    label
}

/// The board laid out side by side, one table column per board column
pub fn board_table(board: &BoardView<'_>) -> Table {
    let mut table = new_table();
    table.set_header(
        board
            .columns
            .iter()
            .map(|c| Cell::new(format!("{} ({})", c.title, c.count))),
    );

    let depth = board.columns.iter().map(|c| c.tasks.len()).max().unwrap_or(0);
    for row in 0..depth {
        table.add_row(board.columns.iter().map(|c| {
            c.tasks
                .get(row)
                .map(|card| Cell::new(card_label(card.task)))
                .unwrap_or_else(|| Cell::new(""))
        }));
    }
    table
}

/// All fields of a task, followed by its subtasks
pub fn task_detail(task: &Task, subtasks: &[&Task]) -> String {
    let mut out = String::new();
    out.push_str(&format!("#{} {}\n", task.id, task.title));
    out.push_str(&format!("  status:    {}\n", task.status));
    out.push_str(&format!("  priority:  {}\n", task.priority));
    if !task.assigned_to.is_empty() {
        out.push_str(&format!("  assigned:  {}\n", task.assigned_to));
    }
    if let Some(start) = task.start_date {
        out.push_str(&format!("  start:     {}\n", start));
    }
    if let Some(due) = task.due_date {
        out.push_str(&format!("  due:       {}\n", due));
    }
    if !task.tags.is_empty() {
        out.push_str(&format!("  tags:      {}\n", task.tags.join(", ")));
    }
    if let Some(parent) = &task.parent_id {
        out.push_str(&format!("  parent:    #{}\n", parent));
    }
    if !task.description.is_empty() {
        out.push_str(&format!("\n{}\n", task.description));
    }
    if !subtasks.is_empty() {
        out.push_str("\nSubtasks:\n");
        for sub in subtasks {
            out.push_str(&format!("  #{} {} [{}]\n", sub.id, sub.title, sub.status));
        }
    }
    out
}

/// Columns with their member counts
pub fn columns_table(columns: &[Column]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Id", "Title", "Tasks", "Permanent"]);
    for column in columns {
        table.add_row(vec![
            column.id.to_string(),
            column.title.clone(),
            column.task_ids.len().to_string(),
            if column.is_permanent() { "yes" } else { "" }.to_string(),
        ]);
    }
    table
}
