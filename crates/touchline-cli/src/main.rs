//! `touchline`: football odds collector.
//!
//! # Usage
//!
//! ```
//! touchline init
//! touchline fetch-odds -l soccer_epl,soccer_spain_la_liga
//! touchline update-all --scrape
//! touchline reconcile --file results.toml
//! touchline export --out-dir website/public/data
//! ```

mod commands;
mod csv;
mod report;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use commands::{App, ExportKind, ReportSource};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "touchline", version, about = "Football odds collector")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "touchline.toml")]
  config: PathBuf,

  /// Odds API key; overrides `odds_api_key` from the config.
  #[arg(long, global = true, env = "ODDS_API_KEY", hide_env_values = true)]
  api_key: Option<String>,

  /// Log at debug level unless RUST_LOG says otherwise.
  #[arg(long, global = true)]
  debug: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Args, Debug)]
struct LeagueArgs {
  /// League keys to process (comma separated). Defaults to every league.
  #[arg(short, long, value_delimiter = ',')]
  leagues: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create the database and register the configured leagues.
  Init,

  /// Fetch current odds from the odds API.
  FetchOdds {
    #[command(flatten)]
    leagues: LeagueArgs,
  },

  /// Fetch final scores from the odds API.
  FetchResults {
    #[command(flatten)]
    leagues: LeagueArgs,

    /// Days back to include (the API allows 1 to 3).
    #[arg(long, default_value_t = 3)]
    days: u32,
  },

  /// Scrape current odds from the comparison site.
  ScrapeOdds {
    #[command(flatten)]
    leagues: LeagueArgs,
  },

  /// Fetch odds, optionally scrape, then fetch results.
  UpdateAll {
    #[command(flatten)]
    leagues: LeagueArgs,

    /// Also scrape the comparison site.
    #[arg(long)]
    scrape: bool,

    #[arg(long, default_value_t = 3)]
    days: u32,
  },

  /// Match externally reported results to stored fixtures.
  #[command(group(ArgGroup::new("source").required(true).args(["file", "espn_days"])))]
  Reconcile {
    /// TOML file of `[[results]]` entries.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Read the public scoreboard for today and this many days back.
    #[arg(long)]
    espn_days: Option<u32>,
  },

  /// Write the site JSON and CSV exports.
  Export {
    /// Output directory; defaults to `export_dir` from the config.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Restrict to these exports (repeatable). Defaults to all.
    #[arg(long, value_enum)]
    only: Vec<ExportKind>,
  },

  /// Show completed fixtures against the last odds before kick-off.
  ShowResults {
    #[arg(long, default_value_t = 20)]
    limit: usize,
  },

  /// Show the average winning price per bookmaker.
  ShowStats,

  /// List the configured leagues.
  ListLeagues,

  /// List bookmakers seen so far.
  ListBookmakers,

  /// Show the odds API request quota.
  Quota,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .init();

  let mut settings = Settings::load(&cli.config)?;
  if cli.api_key.is_some() {
    settings.odds_api_key = cli.api_key;
  }

  let app = App::open(settings).await?;

  match cli.command {
    Command::Init => commands::init(&app).await?,
    Command::FetchOdds { leagues } => {
      let summary = commands::fetch_odds(&app, &leagues.leagues).await?;
      println!("{}", report::collect_summary("odds API", &summary));
    }
    Command::FetchResults { leagues, days } => {
      let summary = commands::fetch_results(&app, &leagues.leagues, days).await?;
      println!("{}", report::results_summary(&summary));
    }
    Command::ScrapeOdds { leagues } => {
      let summary = commands::scrape_odds(&app, &leagues.leagues).await?;
      println!("{}", report::collect_summary("oddschecker", &summary));
    }
    Command::UpdateAll { leagues, scrape, days } => {
      commands::update_all(&app, &leagues.leagues, scrape, days).await?;
    }
    Command::Reconcile { file, espn_days } => {
      let source = match (file, espn_days) {
        (Some(path), _) => ReportSource::File(path),
        (None, Some(days)) => ReportSource::Espn(days),
        (None, None) => anyhow::bail!("pass --file or --espn-days"),
      };
      let summary = commands::reconcile(&app, source).await?;
      println!("{}", report::reconcile_summary(&summary));
    }
    Command::Export { out_dir, only } => {
      let out_dir = out_dir.unwrap_or_else(|| app.settings.export_dir());
      let kinds = if only.is_empty() { ExportKind::ALL.to_vec() } else { only };
      for (path, rows) in commands::write_exports(&app, &out_dir, &kinds).await? {
        println!("wrote {} ({rows} rows)", path.display());
      }
    }
    Command::ShowResults { limit } => commands::show_results(&app, limit).await?,
    Command::ShowStats => commands::show_stats(&app).await?,
    Command::ListLeagues => commands::list_leagues(&app),
    Command::ListBookmakers => commands::list_bookmakers(&app).await?,
    Command::Quota => commands::quota(&app).await?,
  }

  Ok(())
}
