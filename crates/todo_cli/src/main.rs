use clap::{CommandFactory, Parser};
use std::io::{self, BufRead, Write};
use todo_cli::cli::{Cli, Command, overrides_from_args};
use todo_cli::config::{self, Palette};
use todo_cli::render;
use todo_core::error::AppError;
use todo_core::model::{Task, TaskId};
use todo_core::repository::TaskRepository;
use todo_core::storage::{JsonFileStore, SlotStore};
use todo_core::view::{FilterMode, project};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV_VAR: &str = "TODOAPP_LOG";

/// Repository, active filter and palette for one run of the program.
struct Session {
    repo: TaskRepository<SlotStore<JsonFileStore>>,
    filter: FilterMode,
    palette: Palette,
}

impl Session {
    fn open(raw_overrides: &[String]) -> Result<Self, AppError> {
        let loaded = config::load_config();
        if let Some(err) = loaded.error {
            warn!(error = %err, "ignoring unreadable config");
        }

        let overrides = overrides_from_args(raw_overrides)?;
        let config = config::merge_overrides(&loaded.config, &overrides);
        let store = JsonFileStore::new(config::store_path(&config)?);
        debug!(path = %store.path().display(), "opening task store");

        Ok(Self {
            repo: TaskRepository::open(SlotStore::new(store)),
            filter: config.default_filter.unwrap_or_default(),
            palette: config.theme.unwrap_or_default().palette(),
        })
    }

    fn run(
        &mut self,
        command: Command,
        json: bool,
        input: &mut dyn BufRead,
    ) -> Result<(), AppError> {
        match command {
            Command::Add { text, date } => {
                let task = self.repo.add(text.as_deref().unwrap_or(""), date.as_deref())?;
                if json {
                    println!("{}", render::task_json(&task)?);
                } else {
                    println!(
                        "Added task: {} ({}) due {}",
                        describe(&task),
                        task.id,
                        due(&task)?
                    );
                }
            }
            Command::Toggle { id } => match self.repo.toggle_completed(id)? {
                Some(task) if json => println!("{}", render::task_json(&task)?),
                Some(task) => {
                    let verb = if task.completed { "Completed" } else { "Reopened" };
                    println!("{verb} task: {} ({})", describe(&task), task.id);
                }
                None => print_missing(id, json),
            },
            Command::Delete { id, yes } => {
                let Some(task) = self.repo.get(id).cloned() else {
                    print_missing(id, json);
                    return Ok(());
                };

                if !yes && !confirm("Delete this task? [y/N] ", input)? {
                    println!("Kept task: {} ({})", describe(&task), task.id);
                    return Ok(());
                }

                if let Some(removed) = self.repo.remove(id)? {
                    if json {
                        println!("{}", render::task_json(&removed)?);
                    } else {
                        println!("Deleted task: {} ({})", describe(&removed), removed.id);
                    }
                }
            }
            Command::List { filter } => self.print_list(filter.unwrap_or(self.filter), json)?,
            Command::Filter { mode } => {
                self.filter = mode;
                self.print_list(mode, json)?;
            }
        }

        Ok(())
    }

    fn print_list(&self, filter: FilterMode, json: bool) -> Result<(), AppError> {
        let projection = project(self.repo.list(), filter);
        if json {
            println!("{}", render::list_json(&projection)?);
        } else {
            println!("{}", render::render_list(&projection, &self.palette)?);
        }
        Ok(())
    }
}

fn describe(task: &Task) -> String {
    render::escape_text(&task.text)
}

fn due(task: &Task) -> Result<String, AppError> {
    todo_core::view::format_due_date(task.date)
}

fn print_missing(id: TaskId, json: bool) {
    if json {
        println!("{}", render::missing_json(id));
    } else {
        println!("No task with id {id}");
    }
}

fn confirm(prompt: &str, input: &mut dyn BufRead) -> Result<bool, AppError> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
    println!("Session commands: help, ?, exit, quit");
}

fn run_interactive() -> Result<(), AppError> {
    let mut session = Session::open(&[])?;
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("todo".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if !err.use_stderr() => {
                println!("{err}");
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input("config overrides apply at startup only")
            );
            continue;
        }

        if let Err(err) = session.run(cli.command, cli.json, &mut stdin_lock) {
            eprintln!("ERROR: {}", err);
        }
    }

    if session.repo.is_dirty() {
        warn!("leaving with unsaved changes");
        session.repo.flush()?;
    }

    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    let mut session = Session::open(&cli.config_override)?;
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    session.run(cli.command, cli.json, &mut stdin_lock)
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_once(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
