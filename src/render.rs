//! Text rendering of tasks.

use std::fmt::Write;

use todo_core::{Task, Timestamp};

const OVERDUE: &str = "OVERDUE";

/// One-line summary: `[x] #3 Title [Category] priority: none, status: done`.
pub fn task_line(task: &Task, now: Timestamp) -> String {
    let marker = if task.completed { "[x]" } else { "[ ]" };
    let mut line = format!(
        "{marker} #{} {} [{}] priority: {}, status: {}",
        task.id, task.title, task.category, task.priority, task.status
    );
    if let Some(due) = task.due_date {
        let _ = write!(line, ", due: {due}");
    }
    if task.is_overdue_at(now) {
        line.push_str("  ");
        line.push_str(OVERDUE);
    }
    line
}

/// Multi-line view used by `show`.
pub fn task_detail(task: &Task, now: Timestamp) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Task #{}", task.id);
    let _ = writeln!(out, "  Title:       {}", task.title);
    if !task.description.is_empty() {
        let _ = writeln!(out, "  Description: {}", task.description);
    }
    let _ = writeln!(out, "  Category:    {}", task.category);
    let _ = writeln!(out, "  Priority:    {}", task.priority);
    let _ = writeln!(out, "  Status:      {}", task.status);
    match task.due_date {
        Some(due) if task.is_overdue_at(now) => {
            let _ = writeln!(out, "  Due:         {due} ({OVERDUE})");
        }
        Some(due) => {
            let _ = writeln!(out, "  Due:         {due}");
        }
        None => {}
    }
    if let Some(created) = task.created_at {
        let _ = writeln!(out, "  Created:     {created}");
    }
    out
}
