//! Datacake - command-line front end for the client core.
//!
//! Resolves the backend, keeps the session in the platform data
//! directory and exposes the account and task operations as
//! subcommands.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use datacake_application::{ApiClient, ApiError, AuthApi, TasksApi};
use datacake_domain::{Credentials, HttpMethod, Task, TaskDraft, TaskFilter};
use datacake_infrastructure::{ClientConfig, build_client};
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Datacake client
#[derive(Parser)]
#[command(name = "datacake")]
#[command(about = "Talk to a Datacake backend from the terminal")]
#[command(version)]
struct Cli {
    /// Backend URL, skipping discovery
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved backend address
    Status,
    /// Look for a reachable backend on the development hosts
    Probe,
    /// Log in and store the session
    Login {
        /// Username or email
        #[arg(short, long)]
        identifier: String,
        /// Password
        #[arg(short, long, env = "DATACAKE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the logged-in user
    Me,
    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Send a raw request below the API root and print the response body
    Request {
        /// GET, POST, PUT, PATCH or DELETE
        method: HttpMethod,
        /// Path below the API root, e.g. tasks/
        path: String,
        /// JSON body
        #[arg(short, long)]
        data: Option<String>,
        /// Query parameter as key=value; repeatable
        #[arg(short, long = "query", value_parser = parse_query_pair)]
        query: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// List tasks
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Filter by importance
        #[arg(long)]
        importance: Option<String>,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
    },
    /// Create a task
    Add {
        /// Title
        title: String,
        /// Importance (baixa, media, alta)
        #[arg(long)]
        importance: Option<String>,
        /// Category
        #[arg(long)]
        category: Option<String>,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Mark a task done or pending
    Toggle {
        /// Task id
        id: i64,
    },
    /// Delete a task
    Delete {
        /// Task id
        id: i64,
    },
}

fn setup_logging(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env().context("invalid configuration")?;
    if cli.api_url.is_some() {
        config.api_url = cli.api_url;
    }

    let client = Arc::new(build_client(&config).context("could not create the HTTP client")?);
    let _session_end =
        client.subscribe_unauthorized(|| warn!("session ended, run `datacake login` again"));

    match cli.command {
        Command::Status => print_meta(&client)?,
        Command::Probe => {
            let resolution = client.ensure_base_url_resolved().await;
            print_meta(&client)?;
            if resolution.discovery_failed() {
                anyhow::bail!("no backend answered; pass --api-url or set DATACAKE_API_URL");
            }
        }
        Command::Login {
            identifier,
            password,
        } => {
            client.ensure_base_url_resolved().await;
            AuthApi::new(client.clone())
                .login(&Credentials::new(identifier, password))
                .await
                .map_err(|e| friendly(&e, "login failed"))?;
            println!("logged in");
        }
        Command::Logout => {
            AuthApi::new(client.clone()).logout().await;
            println!("logged out");
        }
        Command::Me => {
            client.ensure_base_url_resolved().await;
            match AuthApi::new(client.clone())
                .current_user()
                .await
                .map_err(|e| friendly(&e, "could not load the profile"))?
            {
                Some(user) => println!(
                    "{} <{}> (id {})",
                    user.username,
                    user.email.unwrap_or_default(),
                    user.id
                ),
                None => println!("not logged in"),
            }
        }
        Command::Tasks { command } => {
            client.ensure_base_url_resolved().await;
            run_tasks(TasksApi::new(client.clone()), command).await?;
        }
        Command::Request {
            method,
            path,
            data,
            query,
        } => {
            let body = match data {
                Some(_) if !method.has_body() => {
                    anyhow::bail!("{method} requests do not take a body")
                }
                Some(raw) => Some(serde_json::from_str(&raw).context("--data is not valid JSON")?),
                None => None,
            };
            let query: Vec<(&str, &str)> = query
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();

            client.ensure_base_url_resolved().await;
            let response = client
                .request(method, &path, body, &query)
                .await
                .map_err(|e| friendly(&e, "request failed"))?;
            println!("{}", response.text());
        }
    }

    Ok(())
}

async fn run_tasks(tasks: TasksApi, command: TaskCommand) -> anyhow::Result<()> {
    match command {
        TaskCommand::List {
            status,
            importance,
            category,
        } => {
            let filter = TaskFilter {
                status,
                importance,
                category,
                ..TaskFilter::default()
            };
            let list = tasks
                .list(&filter)
                .await
                .map_err(|e| friendly(&e, "could not load tasks"))?;
            if list.is_empty() {
                println!("no tasks");
            }
            for task in &list {
                println!("{}", task_line(task));
            }
        }
        TaskCommand::Add {
            title,
            importance,
            category,
            due,
        } => {
            let mut draft = TaskDraft::new(title);
            if let Some(importance) = importance {
                draft.importance = importance;
            }
            if let Some(category) = category {
                draft.category = category;
            }
            draft.due_date = due;
            let task = tasks
                .create(&draft)
                .await
                .map_err(|e| friendly(&e, "could not create the task"))?;
            println!("{}", task_line(&task));
        }
        TaskCommand::Toggle { id } => {
            let task = tasks
                .toggle(id)
                .await
                .map_err(|e| friendly(&e, "could not update the task"))?;
            println!("{}", task_line(&task));
        }
        TaskCommand::Delete { id } => {
            tasks
                .delete(id)
                .await
                .map_err(|e| friendly(&e, "could not delete the task"))?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn parse_query_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn print_meta(client: &ApiClient) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&client.base_url_meta())?);
    Ok(())
}

fn task_line(task: &Task) -> String {
    let due = task
        .due_date
        .map(|d| format!(", due {d}"))
        .unwrap_or_default();
    format!(
        "{:>5}  [{}] {} ({}, {}{due})",
        task.id, task.status, task.title, task.importance, task.category
    )
}

/// Turns an API error into the message the backend gave, when it gave one.
fn friendly(error: &ApiError, fallback: &str) -> anyhow::Error {
    match error.server_message() {
        Some(message) => anyhow::anyhow!("{fallback}: {message}"),
        None => anyhow::anyhow!("{fallback}: {error}"),
    }
}
