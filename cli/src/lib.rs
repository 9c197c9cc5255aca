pub mod commands;
pub mod view;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use clap::Parser;
use clap::ValueEnum;
use commands::HELP;
use commands::ShellCommand;
use commands::parse_command;
use obsnav_navigator::EXPORT_NOTICE;
use obsnav_navigator::EventFeed;
use obsnav_navigator::HttpObservationClient;
use obsnav_navigator::InvalidationListener;
use obsnav_navigator::NavCommand;
use obsnav_navigator::Navigator;
use obsnav_navigator::NavigatorConfig;
use obsnav_navigator::NavigatorHandle;
use obsnav_navigator::NavigatorOptions;
use obsnav_navigator::NavigatorRuntime;
use obsnav_navigator::NavigatorSnapshot;
use obsnav_navigator::ObjectEventBus;
use obsnav_navigator::ResortPolicy;
use obsnav_navigator::ScopeRegistry;
use obsnav_navigator::Scopes;
use obsnav_navigator::SharedQuery;
use obsnav_protocol::Direction;
use obsnav_protocol::ObjectId;
use obsnav_protocol::SortKey;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Browse observations held by a server, one at a time.
#[derive(Debug, Parser)]
#[command(name = "obsnav", version)]
pub struct Cli {
    /// TOML configuration file; flags override its values.
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the server.
    #[arg(long = "server-url", value_name = "URL")]
    pub server_url: Option<String>,

    /// Collection type to browse.
    #[arg(long = "otype")]
    pub otype: Option<String>,

    /// Initial search filter.
    #[arg(long = "search")]
    pub search: Option<String>,

    /// Initial sort key: _id, created, modified, modified-by or tags.
    #[arg(long = "sort")]
    pub sort: Option<SortKey>,

    /// Initial sort direction: asc or desc.
    #[arg(long = "direction")]
    pub direction: Option<Direction>,

    /// Observation to show first.
    #[arg(long = "oid")]
    pub oid: Option<String>,

    /// Where the cursor goes when the ordering changes.
    #[arg(long = "resort", value_enum)]
    pub resort: Option<ResortArg>,

    /// Quiet period before filter edits trigger a recount.
    #[arg(long = "quiet-period-ms", value_name = "MS")]
    pub quiet_period_ms: Option<u64>,

    #[arg(long = "username")]
    pub username: Option<String>,

    #[arg(long = "password")]
    pub password: Option<String>,

    /// Do not subscribe to the server's notification stream.
    #[arg(long = "no-events", default_value_t = false)]
    pub no_events: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResortArg {
    KeepIndex,
    FollowRecord,
}

impl From<ResortArg> for ResortPolicy {
    fn from(value: ResortArg) -> Self {
        match value {
            ResortArg::KeepIndex => ResortPolicy::KeepIndex,
            ResortArg::FollowRecord => ResortPolicy::FollowRecord,
        }
    }
}

impl Cli {
    /// Load the configuration file (if any), apply flag overrides and
    /// validate the result.
    pub fn resolve_config(&self) -> Result<NavigatorConfig> {
        let mut config = match &self.config {
            Some(path) => NavigatorConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => NavigatorConfig::default(),
        };
        if let Some(server_url) = &self.server_url {
            config.server_url = server_url.clone();
        }
        if let Some(otype) = &self.otype {
            config.otype = otype.clone();
        }
        if let Some(search) = &self.search {
            config.initial.search = search.clone();
        }
        if let Some(sort) = self.sort {
            config.initial.sort = sort;
        }
        if let Some(direction) = self.direction {
            config.initial.direction = direction;
        }
        if let Some(oid) = &self.oid {
            config.initial.oid = Some(ObjectId::new(oid.clone()));
        }
        if let Some(resort) = self.resort {
            config.resort_policy = resort.into();
        }
        if let Some(quiet_period_ms) = self.quiet_period_ms {
            config.quiet_period_ms = quiet_period_ms;
        }
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        config
            .validate()
            .map_err(|err| anyhow!("invalid configuration: {err}"))?;
        Ok(config)
    }
}

/// Log to stderr so stdout carries only the view.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run_main(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let source =
        Arc::new(HttpObservationClient::new(&config).context("failed to build HTTP client")?);

    let bus = Arc::new(ObjectEventBus::default());
    let listener = InvalidationListener::subscribe(&bus, config.otype.clone());
    let feed = if cli.no_events {
        None
    } else {
        let feed = EventFeed::new(&config).context("failed to set up the event feed")?;
        info!(url = %feed.url(), "subscribing to notifications");
        Some(feed.spawn(Arc::clone(&bus)))
    };

    let navigator = Navigator::new(
        source,
        Scopes {
            attributes: Arc::new(ScopeRegistry::new("attributes")),
            tags: Arc::new(ScopeRegistry::new("tags")),
        },
        SharedQuery::new(config.initial.query()),
        NavigatorOptions {
            otype: config.otype.clone(),
            policy: config.resort_policy,
            initial_oid: config.initial.oid.clone(),
        },
    );
    let (runtime, handle) =
        NavigatorRuntime::new(navigator, Some(listener), config.quiet_period());
    let task = runtime.spawn();
    let printer = tokio::spawn(print_updates(handle.updates()));

    println!("{HELP}");
    let result = read_commands(&handle).await;

    handle.send(NavCommand::Shutdown).await;
    task.await.context("navigator task failed")?;
    printer.abort();
    if let Some(feed) = feed {
        feed.abort();
    }
    result
}

async fn read_commands(handle: &NavigatorHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        if !dispatch(handle, command).await {
            break;
        }
    }
    Ok(())
}

/// Apply one command. Returns `false` when the session should end.
async fn dispatch(handle: &NavigatorHandle, command: ShellCommand) -> bool {
    match command {
        ShellCommand::Nav(NavCommand::Export) => {
            println!("{EXPORT_NOTICE}");
            handle.send(NavCommand::Export).await
        }
        ShellCommand::Nav(command) => handle.send(command).await,
        ShellCommand::Filter(search) => {
            handle.query().set_search(search);
            true
        }
        ShellCommand::Sort(sort) => {
            handle.query().set_sort(sort);
            true
        }
        ShellCommand::Direction(direction) => {
            handle.query().set_direction(direction);
            true
        }
        ShellCommand::Show => {
            println!("{}", view::render(&handle.snapshot()));
            true
        }
        ShellCommand::Help => {
            println!("{HELP}");
            true
        }
        ShellCommand::Quit => false,
    }
}

/// Print the view whenever it settles on something new.
async fn print_updates(mut updates: watch::Receiver<NavigatorSnapshot>) {
    let mut last = String::new();
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        if snapshot.loading {
            continue;
        }
        let text = view::render(&snapshot);
        if text != last {
            println!("\n{text}");
            last = text;
        }
    }
}
