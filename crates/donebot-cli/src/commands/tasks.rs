//! Local task registry administration.

use std::path::Path;

use clap::Subcommand;
use donebot_core::{Config, FileBlobStore, RunSettings, TaskAdmin};

use super::CliResult;

#[derive(Subcommand)]
pub enum TasksAction {
    /// List tasks in reminder order
    List {
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a task
    Add {
        /// Task key (a-z, 0-9, _ or -)
        key: String,
        /// Display label
        #[arg(num_args = 1.., required = true)]
        label: Vec<String>,
    },
    /// Remove a task and its completion record
    Remove {
        key: String,
    },
    /// Change a task's label
    Label {
        key: String,
        #[arg(num_args = 1.., required = true)]
        label: Vec<String>,
    },
    /// Set the task a bare /done marks
    Default {
        key: String,
    },
}

pub fn run(config_path: &Path, action: TasksAction) -> CliResult {
    let config = Config::load_from(config_path)?;
    let store = FileBlobStore::new(config.blob_dir()?);
    let admin = TaskAdmin::new(&store, RunSettings::local(&config)?);

    match action {
        TasksAction::List { json } => {
            let registry = admin.registry()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&registry)?);
            } else if registry.is_empty() {
                println!("no tasks");
            } else {
                for row in registry.list() {
                    let marker = if row.is_default { " (default)" } else { "" };
                    println!("{}: {}{marker}", row.key, row.label);
                }
            }
        }
        TasksAction::Add { key, label } => println!("{}", admin.add(&key, &label.join(" "))?),
        TasksAction::Remove { key } => println!("{}", admin.remove(&key)?),
        TasksAction::Label { key, label } => {
            println!("{}", admin.set_label(&key, &label.join(" "))?)
        }
        TasksAction::Default { key } => println!("{}", admin.set_default(&key)?),
    }
    Ok(())
}
