//! Command-line interface definition and dispatch.

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, instrument};

use marketo_client::api::resources;
use marketo_client::api::types::{Activity, ActivityRequest, LeadsRequest};
use marketo_client::api::{delete_secret, store_secret, ApiEnvelope, ApiError, MarketoClient, Pager};
use marketo_client::config::{Config, Profile};
use marketo_client::error::{AppError, Result};

/// Command-line access to the Marketo REST API.
#[derive(Debug, Parser)]
#[command(name = "mkto", version, about)]
pub struct Cli {
    /// Profile to use (defaults to the configured default profile).
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a client secret from stdin and store it in the OS keyring.
    SetSecret,
    /// Remove the profile's client secret from the OS keyring.
    DeleteSecret,
    #[command(flatten)]
    Api(ApiCommand),
}

/// Subcommands that talk to the instance.
#[derive(Debug, Subcommand)]
pub enum ApiCommand {
    /// Obtain an access token and show its metadata.
    Token,
    /// Fetch a lead by id.
    Lead {
        /// The lead id.
        id: String,
    },
    /// Fetch one page of the leads in a static list.
    Leads {
        /// The static list id.
        list_id: String,
        /// Continuation token from a previous page.
        #[arg(long)]
        next: Option<String>,
    },
    /// List activity types.
    ActivityTypes,
    /// Fetch activities since a point in time.
    Activities {
        /// Activity type ids, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        types: Vec<String>,
        /// Start of the window, e.g. "2016-04-07 10:00".
        #[arg(long)]
        since: String,
        /// Restrict to a static list.
        #[arg(long)]
        list: Option<String>,
        /// Restrict to lead ids, comma separated.
        #[arg(long = "lead", value_delimiter = ',')]
        leads: Vec<String>,
        /// Follow continuation tokens until the feed is exhausted.
        #[arg(long)]
        all: bool,
    },
    /// Fetch lead field changes since a point in time.
    LeadChanges {
        /// Start of the window, e.g. "2016-04-07 10:00".
        #[arg(long)]
        since: String,
        /// The static list id.
        #[arg(long)]
        list: String,
        /// Field names to report, comma separated.
        #[arg(long)]
        fields: String,
    },
    /// Show today's API error counts.
    DailyErrors,
}

#[derive(Serialize)]
struct TokenInfo<'a> {
    token_type: &'a str,
    scope: &'a str,
    expires_in_seconds: u64,
}

/// Run a parsed command line.
///
/// # Errors
///
/// Returns any configuration, keyring or API error encountered.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let profile = config.profile(cli.profile.as_deref())?.clone();
    info!(profile = %profile.name, command = ?cli.command, "Running command");

    match cli.command {
        Command::SetSecret => set_secret(&profile),
        Command::DeleteSecret => {
            delete_secret(&profile.name)?;
            eprintln!("Secret removed for profile '{}'.", profile.name);
            Ok(())
        }
        Command::Api(command) => {
            let client = connect(&config, &profile).await?;
            run_api(&client, command).await
        }
    }
}

async fn run_api(client: &MarketoClient, command: ApiCommand) -> Result<()> {
    match command {
        ApiCommand::Token => {
            let token = client.token().await;
            print_json(&TokenInfo {
                token_type: token.token_type(),
                scope: token.scope(),
                expires_in_seconds: token.expires_in_seconds(),
            })
        }
        ApiCommand::Lead { id } => print_json(&resources::lead(client, &id).await?),
        ApiCommand::Leads { list_id, next } => {
            let request = LeadsRequest {
                list_id,
                next_page_token: next,
            };
            print_json(&resources::leads_by_list(client, &request).await?)
        }
        ApiCommand::ActivityTypes => print_json(&resources::activity_types(client).await?),
        ApiCommand::Activities {
            types,
            since,
            list,
            leads,
            all,
        } => {
            let request = ActivityRequest {
                activity_type_ids: types,
                since,
                list_id: list,
                lead_ids: leads,
            };
            if all {
                let activities = all_activities(client, &request).await?;
                print_json(&activities)
            } else {
                print_json(&resources::activities(client, &request).await?)
            }
        }
        ApiCommand::LeadChanges {
            since,
            list,
            fields,
        } => print_json(&resources::lead_changes(client, &since, &list, &fields).await?),
        ApiCommand::DailyErrors => print_json(&resources::daily_errors(client).await?),
    }
}

/// Build a client for a profile, honoring the configured timeout.
async fn connect(config: &Config, profile: &Profile) -> Result<MarketoClient> {
    let credentials = profile.credentials()?;

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.settings.timeout() {
        builder = builder.timeout(timeout);
    }
    let http = builder.build().map_err(ApiError::Network)?;

    Ok(MarketoClient::with_http_client(credentials, http).await?)
}

/// Walk an activity feed to the end, following each page's cursor.
#[instrument(skip(client))]
async fn all_activities(
    client: &MarketoClient,
    request: &ActivityRequest,
) -> Result<Vec<Activity>> {
    if request.activity_type_ids.is_empty() {
        return Err(ApiError::InvalidInput(
            "at least one activity type id is required".to_string(),
        )
        .into());
    }

    let mut pager = Pager::new(client.paging_cursor(&request.since).await?);
    let mut activities = Vec::new();
    let mut pages = 0usize;

    loop {
        let page: ApiEnvelope<_> =
            resources::activities_page(client, request, pager.cursor()).await?;
        let page = page.into_result()?;
        let more = pager.advance(&page);
        activities.extend(page.result_or_default());
        pages += 1;

        if !more {
            break;
        }
    }

    info!(pages, count = activities.len(), "Activity feed exhausted");
    Ok(activities)
}

fn set_secret(profile: &Profile) -> Result<()> {
    eprint!("Client secret for profile '{}': ", profile.name);
    io::stderr().flush()?;

    let mut secret = String::new();
    io::stdin().lock().read_line(&mut secret)?;
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(AppError::other("No secret entered."));
    }

    store_secret(&profile.name, secret)?;
    eprintln!("Secret stored for profile '{}'.", profile.name);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::other(format!("could not format output: {}", e)))?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}
