//! Command handlers. Each validates its input, calls the store, and prints the
//! outcome; nothing is cached between commands.

use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use serde_json::json;
use todo_core::{
    DEFAULT_CATEGORY, NewTask, SortOrder, Task, TaskEdit, TaskFilter, TaskId, TaskPriority,
    TaskStatus, Timestamp, parse_criterion, validate_category_name, validate_title,
};
use todo_store::TaskStore;

use crate::cli::{CategoryCommand, Command};
use crate::render;

/// Output and prompt plumbing shared by every command.
pub struct Runner<'a, W, R> {
    store: &'a TaskStore,
    json: bool,
    out: W,
    input: R,
}

impl<'a, W: Write, R: BufRead> Runner<'a, W, R> {
    pub fn new(store: &'a TaskStore, json: bool, out: W, input: R) -> Self {
        Self {
            store,
            json,
            out,
            input,
        }
    }

    pub fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::List => {
                let tasks = self.store.tasks().get_all()?;
                self.print_tasks(&tasks)
            }
            Command::Add {
                title,
                description,
                category,
                priority,
                due,
            } => self.add(&title, description, category, priority, due),
            Command::Show { id } => self.show(id),
            Command::Edit {
                id,
                title,
                description,
                category,
                priority,
                due,
                clear_due,
            } => {
                let task = self.require(id)?;
                let mut edit = TaskEdit::from(&task);
                if let Some(title) = title {
                    edit.title = validate_title(&title)?;
                }
                if let Some(description) = description {
                    edit.description = description;
                }
                if let Some(category) = category {
                    edit.category = validate_category_name(&category)?;
                }
                if let Some(priority) = priority {
                    edit.priority = priority.parse()?;
                }
                if clear_due {
                    edit.due_date = None;
                } else if let Some(due) = due {
                    edit.due_date = Some(Timestamp::parse(&due)?);
                }
                if !self.store.tasks().update(id, &edit)? {
                    bail!("task #{id} not found");
                }
                self.report(json!({ "id": id, "updated": true }), &format!("Updated task #{id}"))
            }
            Command::Status { id, status } => {
                let status: TaskStatus = status.parse()?;
                if !self.store.tasks().update_status(id, status)? {
                    bail!("task #{id} not found");
                }
                self.report(
                    json!({ "id": id, "status": status }),
                    &format!("Task #{id} is now {status}"),
                )
            }
            Command::Toggle { id } => match self.store.tasks().toggle(id)? {
                Some(completed) => {
                    let word = if completed { "done" } else { "not done" };
                    self.report(
                        json!({ "id": id, "completed": completed }),
                        &format!("Task #{id} marked {word}"),
                    )
                }
                None => bail!("task #{id} not found"),
            },
            Command::Rm { id, yes } => {
                let task = self.require(id)?;
                if !yes && !self.confirm(&format!("Delete task #{id} \"{}\"?", task.title))? {
                    return self.aborted();
                }
                let _ = self.store.tasks().delete(id)?;
                self.report(json!({ "id": id, "deleted": true }), &format!("Deleted task #{id}"))
            }
            Command::Search { query } => {
                let tasks = self.store.tasks().search(&query)?;
                self.print_tasks(&tasks)
            }
            Command::Filter {
                category,
                priority,
                status,
                from,
                to,
                desc,
            } => {
                let filter = TaskFilter {
                    category,
                    priority: criterion::<TaskPriority>(priority.as_deref())?,
                    status: criterion::<TaskStatus>(status.as_deref())?,
                    date_from: from.as_deref().map(Timestamp::parse).transpose()?,
                    date_to: to.as_deref().map(Timestamp::parse).transpose()?,
                    sort_order: if desc {
                        SortOrder::Descending
                    } else {
                        SortOrder::Ascending
                    },
                };
                let tasks = self.store.tasks().filter(&filter)?;
                self.print_tasks(&tasks)
            }
            Command::Categories { action } => self.categories(action),
        }
    }

    fn add(
        &mut self,
        title: &str,
        description: String,
        category: Option<String>,
        priority: Option<String>,
        due: Option<String>,
    ) -> Result<()> {
        let mut draft = NewTask::new(validate_title(title)?).description(description);
        if let Some(category) = category {
            draft = draft.category(validate_category_name(&category)?);
        }
        if let Some(priority) = priority {
            draft = draft.priority(priority.parse()?);
        }
        if let Some(due) = due {
            draft = draft.due(Timestamp::parse(&due)?);
        }
        let id = self.store.tasks().add(&draft)?;
        self.report(json!({ "id": id }), &format!("Added task #{id}"))
    }

    fn show(&mut self, id: TaskId) -> Result<()> {
        let task = self.require(id)?;
        if self.json {
            writeln!(self.out, "{}", serde_json::to_string_pretty(&task)?)?;
        } else {
            write!(self.out, "{}", render::task_detail(&task, Timestamp::now()))?;
        }
        Ok(())
    }

    fn categories(&mut self, action: CategoryCommand) -> Result<()> {
        match action {
            CategoryCommand::List => {
                let names = self.store.categories().list()?;
                if self.json {
                    writeln!(self.out, "{}", serde_json::to_string_pretty(&names)?)?;
                } else {
                    for name in names {
                        writeln!(self.out, "{name}")?;
                    }
                }
                Ok(())
            }
            CategoryCommand::Add { name } => {
                let name = validate_category_name(&name)?;
                self.store.categories().add(&name)?;
                self.report(
                    json!({ "category": name, "added": true }),
                    &format!("Added category {name}"),
                )
            }
            CategoryCommand::Rm { name, yes } => {
                let prompt = format!("Delete category \"{name}\"? Its tasks move to {DEFAULT_CATEGORY}.");
                if !yes && !self.confirm(&prompt)? {
                    return self.aborted();
                }
                let moved = self.store.categories().delete(&name)?;
                self.report(
                    json!({ "category": name, "reassigned": moved }),
                    &format!("Deleted category {name}; {moved} task(s) moved to {DEFAULT_CATEGORY}"),
                )
            }
        }
    }

    fn require(&self, id: TaskId) -> Result<Task> {
        match self.store.tasks().get_by_id(id)? {
            Some(task) => Ok(task),
            None => bail!("task #{id} not found"),
        }
    }

    fn print_tasks(&mut self, tasks: &[Task]) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", serde_json::to_string_pretty(tasks)?)?;
            return Ok(());
        }
        if tasks.is_empty() {
            writeln!(self.out, "No tasks.")?;
            return Ok(());
        }
        let now = Timestamp::now();
        for task in tasks {
            writeln!(self.out, "{}", render::task_line(task, now))?;
        }
        Ok(())
    }

    fn report(&mut self, value: serde_json::Value, text: &str) -> Result<()> {
        if self.json {
            writeln!(self.out, "{value}")?;
        } else {
            writeln!(self.out, "{text}")?;
        }
        Ok(())
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        write!(self.out, "{prompt} [y/N] ")?;
        self.out.flush()?;
        let mut answer = String::new();
        let _ = self.input.read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn aborted(&mut self) -> Result<()> {
        writeln!(self.out, "Aborted.")?;
        Ok(())
    }
}

fn criterion<T>(raw: Option<&str>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(raw.map(parse_criterion::<T>).transpose()?.flatten())
}
