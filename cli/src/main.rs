//! SONGJAM — command-line front end for the voting client.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use songjam_client::{
    Catalog, CatalogLoader, ClientConfig, RestStore, SessionError, SubmitReport, VotingSession,
};
use songjam_types::EntryId;

#[derive(Parser)]
#[command(name = "songjam", about = "Vote in the SONGJAM song contest")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SONGJAM_CONFIG")]
    config: Option<PathBuf>,

    /// Access token issued by the sign-in redirect.
    #[arg(long, env = "SONGJAM_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Base URL of the hosted store.
    #[arg(long, env = "SONGJAM_STORE_URL")]
    store_url: Option<String>,

    /// Public API key of the hosted store.
    #[arg(long, env = "SONGJAM_ANON_KEY", hide_env_values = true)]
    anon_key: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SONGJAM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the link that starts sign-in.
    #[command(name = "login-url")]
    LoginUrl,

    /// Show every entry with your votes and the budget left.
    Ballot {
        /// Seed for the entry order; random when omitted.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Add or take back votes, then submit them.
    Vote {
        /// Entry to give one more vote (repeatable).
        #[arg(long = "add", value_name = "ENTRY")]
        add: Vec<String>,

        /// Entry to take one pending vote back from (repeatable).
        #[arg(long = "remove", value_name = "ENTRY")]
        remove: Vec<String>,
    },

    /// Show the award show announcement.
    #[command(name = "award-show")]
    AwardShow,

    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => ClientConfig::from_toml_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = cli.store_url {
        config.store.url = url;
    }
    if let Some(key) = cli.anon_key {
        config.store.anon_key = key;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate()?;

    songjam_utils::init_logging(config.log_format, &config.log_level);
    if let Some(ref path) = cli.config {
        tracing::debug!("loaded config from {}", path.display());
    }

    let mut store = RestStore::new(config.store.clone())?;
    if let Some(token) = cli.access_token {
        store = store.with_access_token(token);
    }
    let store = Arc::new(store);

    match cli.command {
        Command::LoginUrl => {
            println!("{}", store.authorize_url()?);
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::AwardShow => {
            print_award_show(&config);
        }
        Command::Ballot { seed } => {
            if config.voting.closed {
                print_award_show(&config);
                return Ok(());
            }
            let catalog = CatalogLoader::new(Arc::clone(&store), config.retry)
                .load()
                .await?;
            let session = open_session(&store, &config).await?;
            print_ballot(&session, &catalog, seed);
        }
        Command::Vote { add, remove } => {
            if config.voting.closed {
                print_award_show(&config);
                anyhow::bail!("voting has closed");
            }
            let catalog = CatalogLoader::new(Arc::clone(&store), config.retry)
                .load()
                .await?;
            let session = open_session(&store, &config).await?;

            for raw in &add {
                let entry = EntryId::parse(raw)?;
                if !catalog.contains(&entry) {
                    tracing::warn!(entry = %entry, "not on the ballot, skipped");
                    continue;
                }
                if !session.add(&entry) {
                    println!("refused: +1 for {entry} (budget or per-entry limit reached)");
                }
            }
            for raw in &remove {
                let entry = EntryId::parse(raw)?;
                if !session.remove(&entry) {
                    println!("refused: -1 for {entry} (no pending vote to take back)");
                }
            }

            let report = session.submit_all().await?;
            print_report(&report);
            println!("{} votes left", session.display_remaining());
            if !report.is_complete() {
                anyhow::bail!(
                    "{} of {} entries were not stored; run the same vote again to retry them",
                    report.failures.len(),
                    report.attempted()
                );
            }
        }
    }

    Ok(())
}

async fn open_session(
    store: &Arc<RestStore>,
    config: &ClientConfig,
) -> anyhow::Result<VotingSession<RestStore>> {
    let session = VotingSession::new(Arc::clone(store), config.voting.limits, config.retry);
    session.start(store.as_ref()).await?;
    if session.user().is_none() {
        return Err(SessionError::NotAuthenticated.into());
    }
    Ok(session)
}

fn print_ballot(session: &VotingSession<RestStore>, catalog: &Catalog, seed: Option<u64>) {
    let order = match seed {
        Some(seed) => catalog.display_order(seed),
        None => catalog.shuffled(),
    };
    for entry in order {
        let marks = match (session.can_remove(&entry.id), session.can_add(&entry.id)) {
            (true, true) => "-+",
            (true, false) => "- ",
            (false, true) => " +",
            (false, false) => "  ",
        };
        println!(
            "[{marks}] {votes} {id:<12} {name}",
            votes = session.votes_for(&entry.id),
            id = entry.id,
            name = entry.display_name(),
        );
    }
    println!(
        "{} of {} votes left",
        session.display_remaining(),
        session.limits().max_votes_per_user
    );
}

fn print_report(report: &SubmitReport) {
    println!("stored {} of {} entries", report.success_count, report.attempted());
    for failure in &report.failures {
        println!("  failed {}: {}", failure.entry_id, failure.error);
    }
}

fn print_award_show(config: &ClientConfig) {
    print!(
        "{}",
        config.award_show.render(chrono::Utc::now(), &chrono::Local)
    );
}
