use crate::assistant::ask_havi;
use crate::child_stage::child_stage_report;
use crate::cli::CommonArgs;
use crate::family_access::{resolve_active_family, FamilyMembership};
use crate::family_guard::{decide, GuardInput, GuardRoutes};
use crate::model_request::{
    build_havi_model_request_at, ChildProfile, ModelRequestInput,
};
use crate::openai::real::maybe_create_openai_client;
use crate::openai::OpenAIClientTrait;
use crate::time_util;
use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use tracing_subscriber::{prelude::*, Registry};
use tracing_tree::HierarchicalLayer;

#[derive(Parser, Debug)]
#[command(author, version, about = "HAVI decision tools", long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InputArgs {
    /// JSON input file; reads stdin when omitted or "-"
    #[arg(long, short)]
    pub input: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Decide the next navigation action for the app shell
    Guard {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Build the message list for an assistant turn
    Request {
        #[command(flatten)]
        input: InputArgs,

        /// Date to compute ages against (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Resolve the family an API request acts on
    ResolveFamily {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Report a child's age in weeks and development stage
    ChildStage {
        #[command(flatten)]
        input: InputArgs,

        /// Date to compute ages against (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Build a request and send it to the assistant model
    Chat {
        #[command(flatten)]
        input: InputArgs,
    },
}

impl Command {
    fn input(&self) -> &InputArgs {
        match self {
            Command::Guard { input }
            | Command::Request { input, .. }
            | Command::ResolveFamily { input }
            | Command::ChildStage { input, .. }
            | Command::Chat { input } => input,
        }
    }
}

/// Input for `guard`: the session snapshot plus optional route overrides.
#[derive(Debug, Deserialize)]
struct GuardRequest {
    #[serde(flatten)]
    state: GuardInput,
    #[serde(default)]
    routes: Option<GuardRoutes>,
}

#[derive(Debug, Deserialize)]
struct ResolveFamilyRequest {
    #[serde(default)]
    requested_family_id: Option<String>,
    #[serde(default)]
    memberships: Vec<FamilyMembership>,
}

#[derive(Debug, Serialize)]
struct ResolveFamilyResponse {
    family_id: String,
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("Failed to read {}: {}", path.display(), e)
            })
        }
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("Invalid JSON input: {}", e))
}

/// Run one subcommand against already-read `raw` input and return what
/// should be printed. The client factory is only invoked for `chat`.
#[instrument(skip(common, raw, client_factory))]
pub async fn execute<F>(
    common: &CommonArgs,
    command: &Command,
    raw: &str,
    client_factory: F,
) -> Result<String>
where
    F: FnOnce(&CommonArgs) -> Result<Arc<dyn OpenAIClientTrait>>,
{
    let timezone = time_util::get_local_timezone(common.timezone.as_deref());
    debug!("Using timezone {}", timezone);

    let output = match command {
        Command::Guard { .. } => {
            let request: GuardRequest = parse_json(raw)?;
            let routes = request.routes.unwrap_or_default();
            serde_json::to_string_pretty(&decide(&request.state, &routes))?
        }
        Command::Request { today, .. } => {
            let input: ModelRequestInput = parse_json(raw)?;
            let today = today.unwrap_or_else(|| time_util::today_in(timezone));
            let request = build_havi_model_request_at(&input, today, timezone);
            serde_json::to_string_pretty(&request)?
        }
        Command::ResolveFamily { .. } => {
            let request: ResolveFamilyRequest = parse_json(raw)?;
            let family_id = resolve_active_family(
                request.requested_family_id.as_deref(),
                &request.memberships,
            )?;
            serde_json::to_string_pretty(&ResolveFamilyResponse { family_id })?
        }
        Command::ChildStage { today, .. } => {
            let child: ChildProfile = parse_json(raw)?;
            let today = today.unwrap_or_else(|| time_util::today_in(timezone));
            let report = child_stage_report(
                child.dob.as_deref(),
                child.due_date.as_deref(),
                today,
                timezone,
            );
            serde_json::to_string_pretty(&report)?
        }
        Command::Chat { .. } => {
            let input: ModelRequestInput = parse_json(raw)?;
            let request = build_havi_model_request_at(
                &input,
                time_util::today_in(timezone),
                timezone,
            );
            let client = client_factory(common)?;
            ask_havi(client, &common.model, &request).await?
        }
    };

    Ok(output)
}

fn init_logging() {
    let subscriber = Registry::default()
        .with(
            HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Tracing subscriber already set");
    }
}

pub async fn run() -> Result<()> {
    init_logging();

    let args = Args::parse();
    info!("Running {:?}", args.command);

    let raw = read_input(args.command.input().input.as_deref())?;
    let output = execute(&args.common, &args.command, &raw, |common| {
        maybe_create_openai_client(
            common.openai_api_key.clone(),
            common.openai_api_base.clone(),
        )
    })
    .await?;

    println!("{}", output);
    Ok(())
}
