use crate::config::ConfigOverrides;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use todo_core::error::AppError;
use todo_core::model::TaskId;
use todo_core::view::FilterMode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task due on a date
    ///
    /// Example: todo add "Buy milk" 2025-01-10
    Add {
        text: Option<String>,
        /// Due date (YYYY-MM-DD)
        date: Option<String>,
    },
    /// Mark a task as completed, or reopen a completed one
    ///
    /// Example: todo toggle 1736467200000
    Toggle { id: TaskId },
    /// Delete a task after confirmation
    ///
    /// Example: todo delete 1736467200000
    /// Example: todo delete 1736467200000 --yes
    Delete {
        id: TaskId,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// List tasks ordered by due date
    ///
    /// Example: todo list
    /// Example: todo list --filter pending
    List {
        #[arg(short, long, value_parser = parse_filter_mode)]
        filter: Option<FilterMode>,
    },
    /// Switch the active filter and list tasks
    ///
    /// Example: todo filter completed
    Filter {
        #[arg(value_parser = parse_filter_mode)]
        mode: FilterMode,
    },
}

fn parse_filter_mode(raw: &str) -> Result<FilterMode, String> {
    raw.parse::<FilterMode>()
        .map_err(|err| err.message().to_string())
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    DefaultFilter,
    StorePath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "filter" | "default_filter" => ConfigOverrideTarget::DefaultFilter,
        "store" | "store_path" => ConfigOverrideTarget::StorePath,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("{field} override requires a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` argument into one set of overrides.
/// Later arguments win over earlier ones.
pub fn overrides_from_args(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for argument in raw {
        let parsed = parse_config_override(argument).map_err(|message| {
            AppError::invalid_input(format!("{CONFIG_OVERRIDE_FLAG}: {message}"))
        })?;

        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value.parse()?),
            ConfigOverrideTarget::DefaultFilter => {
                overrides.default_filter = Some(parsed.value.parse()?);
            }
            ConfigOverrideTarget::StorePath => {
                overrides.store_path = Some(PathBuf::from(parsed.value));
            }
        }
    }

    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
