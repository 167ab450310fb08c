use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use backlog_core::ports::{HttpClient, HttpRequestParams};
use backlog_core::runner::payloads::{
    DeletePushNotificationQueueTaskData, IdentifyProfileQueueTaskData,
    RegisterPushNotificationQueueTaskData, TrackEventQueueTaskData,
};
use backlog_core::{AddTaskResult, HttpError, Queue, QueueBuilder, QueueConfig, QueueTaskGroup};

/// Enqueue SDK calls into a durable local backlog and replay them.
#[derive(Parser)]
#[command(name = "backlog")]
#[command(version)]
struct Cli {
    /// Queue configuration file (TOML)
    #[arg(short, long, env = "BACKLOG_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Answer every request with "no response", as if the device were offline
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify a profile
    Identify {
        identifier: String,
        /// Profile attributes as a JSON object
        #[arg(long)]
        attributes: Option<String>,
    },

    /// Track an event for an identified profile
    Track {
        identifier: String,
        name: String,
        /// Event data as a JSON object
        #[arg(long)]
        data: Option<String>,
    },

    /// Register a push token for a profile
    RegisterToken { identifier: String, token: String },

    /// Delete a push token from a profile
    DeleteToken { identifier: String, token: String },

    /// Run the backlog now
    Run,

    /// Print the queue status
    Status,
}

/// Stand-in transport: logs each request instead of sending it.
struct StubHttpClient {
    offline: bool,
}

#[async_trait]
impl HttpClient for StubHttpClient {
    async fn request(&self, params: HttpRequestParams) -> Result<Vec<u8>, HttpError> {
        if self.offline {
            return Err(HttpError::NoResponse("offline".into()));
        }
        info!(
            method = %params.method,
            path = %params.path,
            body_bytes = params.body.as_ref().map_or(0, Vec::len),
            "request sent"
        );
        Ok(b"{}".to_vec())
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<QueueConfig> {
    match path {
        Some(path) => QueueConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(QueueConfig {
            storage_dir: Some(PathBuf::from(".backlog")),
            ..QueueConfig::default()
        }),
    }
}

fn parse_json_object(raw: Option<&str>) -> anyhow::Result<serde_json::Value> {
    match raw {
        Some(raw) => serde_json::from_str(raw).with_context(|| format!("not valid JSON: {raw}")),
        None => Ok(json!({})),
    }
}

/// Waits for the pass `add_task` started so the process does not exit mid-run.
async fn report_added(queue: &Queue, added: AddTaskResult) -> anyhow::Result<()> {
    anyhow::ensure!(added.success, "task could not be added to the queue");
    println!(
        "queued ({} pending in {})",
        added.status.num_tasks_in_queue, added.status.queue_id
    );
    if added.status.num_tasks_in_queue >= queue.config().min_tasks_to_run {
        let summary = queue.run().await;
        println!("{summary:?}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let http = Arc::new(StubHttpClient {
        offline: cli.offline,
    });
    let queue = QueueBuilder::new(config)
        .with_api_runner(http)?
        .open_configured()
        .await?;

    match cli.command {
        Commands::Identify {
            identifier,
            attributes,
        } => {
            let attributes = match attributes.as_deref() {
                Some(raw) => Some(parse_json_object(Some(raw))?.to_string()),
                None => None,
            };
            let group = QueueTaskGroup::IdentifiedProfile(identifier.clone());
            let added = queue
                .add(
                    &IdentifyProfileQueueTaskData {
                        identifier,
                        attributes_json_string: attributes,
                    },
                    Some(group),
                    &[],
                )
                .await;
            report_added(&queue, added).await?;
        }
        Commands::Track {
            identifier,
            name,
            data,
        } => {
            let body = json!({
                "name": name,
                "data": parse_json_object(data.as_deref())?,
            });
            let blocking = [QueueTaskGroup::IdentifiedProfile(identifier.clone())];
            let added = queue
                .add(
                    &TrackEventQueueTaskData {
                        identifier,
                        attributes_json_string: body.to_string(),
                    },
                    None,
                    &blocking,
                )
                .await;
            report_added(&queue, added).await?;
        }
        Commands::RegisterToken { identifier, token } => {
            let body = json!({ "device": { "id": token } });
            let group = QueueTaskGroup::RegisteredPushToken(token);
            let blocking = [QueueTaskGroup::IdentifiedProfile(identifier.clone())];
            let added = queue
                .add(
                    &RegisterPushNotificationQueueTaskData {
                        profile_identifier: identifier,
                        attributes_json_string: body.to_string(),
                    },
                    Some(group),
                    &blocking,
                )
                .await;
            report_added(&queue, added).await?;
        }
        Commands::DeleteToken { identifier, token } => {
            let blocking = [
                QueueTaskGroup::IdentifiedProfile(identifier.clone()),
                QueueTaskGroup::RegisteredPushToken(token.clone()),
            ];
            let added = queue
                .add(
                    &DeletePushNotificationQueueTaskData {
                        profile_identifier: identifier,
                        device_token: token,
                    },
                    None,
                    &blocking,
                )
                .await;
            report_added(&queue, added).await?;
        }
        Commands::Run => {
            let summary = queue.run().await;
            println!("{summary:?}");
        }
        Commands::Status => {
            let status = queue.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
