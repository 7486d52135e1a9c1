//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use todo_core::TaskId;

/// Personal task tracker.
#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Personal task tracker")]
pub struct Cli {
    /// Path to the `SQLite` database (overrides settings).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every task.
    List,

    /// Add a task.
    Add {
        /// Task title.
        title: String,
        /// Longer description.
        #[arg(short, long, default_value = "")]
        description: String,
        /// Category name.
        #[arg(short, long)]
        category: Option<String>,
        /// urgent, important, normal, or none.
        #[arg(short, long)]
        priority: Option<String>,
        /// Due date: YYYY-MM-DD [HH:MM[:SS]].
        #[arg(long)]
        due: Option<String>,
    },

    /// Show one task in full.
    Show {
        /// Task id.
        id: TaskId,
    },

    /// Change a task's title, description, category, priority, or due date.
    Edit {
        /// Task id.
        id: TaskId,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New category.
        #[arg(long)]
        category: Option<String>,
        /// New priority.
        #[arg(long)]
        priority: Option<String>,
        /// New due date.
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
    },

    /// Set a task's status (not_started, in_progress, done).
    Status {
        /// Task id.
        id: TaskId,
        /// New status.
        status: String,
    },

    /// Flip a task between done and not started.
    Toggle {
        /// Task id.
        id: TaskId,
    },

    /// Delete a task.
    Rm {
        /// Task id.
        id: TaskId,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Find tasks whose title or description contains QUERY.
    Search {
        /// Text to look for (case-insensitive).
        query: String,
    },

    /// List tasks matching every given criterion.
    Filter {
        /// Category name, or "all".
        #[arg(long)]
        category: Option<String>,
        /// Priority, or "all".
        #[arg(long)]
        priority: Option<String>,
        /// Status, or "all".
        #[arg(long)]
        status: Option<String>,
        /// Earliest due date (inclusive).
        #[arg(long)]
        from: Option<String>,
        /// Latest due date (inclusive).
        #[arg(long)]
        to: Option<String>,
        /// Newest first.
        #[arg(long)]
        desc: bool,
    },

    /// Manage categories.
    Categories {
        #[command(subcommand)]
        action: CategoryCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// List categories alphabetically.
    List,
    /// Add a category.
    Add {
        /// Category name.
        name: String,
    },
    /// Delete a category; its tasks move to Uncategorized.
    Rm {
        /// Category name.
        name: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}
