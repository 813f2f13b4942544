//! Main entry point for the Elo Board leaderboard
//!
//! Serves the HTTP API or runs a single leaderboard command against the
//! configured store, with logging and graceful shutdown.

use anyhow::Result;
use clap::{Parser, Subcommand};
use elo_board::config::{AppConfig, StorageBackend};
use elo_board::metrics::MetricsCollector;
use elo_board::server::{ApiServer, ApiServerConfig};
use elo_board::storage::{InMemoryLedger, MatchLedger, SqliteLedger};
use elo_board::types::{GameResult, Outcome, PlayerRecord};
use elo_board::Leaderboard;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Elo Board - player leaderboard with Elo ratings
#[derive(Parser)]
#[command(
    name = "elo-board",
    version,
    about = "A leaderboard of players, Elo ratings and match history",
    long_about = "Elo Board keeps a store of players and their Elo ratings, records match \
                 results atomically, and serves the leaderboard over a JSON HTTP API."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        global = true,
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// SQLite database override
    #[arg(long, value_name = "PATH", global = true, help = "Override SQLite database path")]
    database: Option<String>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true, help = "Keep players and history in memory only")]
    memory: bool,

    /// Enable debug mode
    #[arg(short, long, global = true, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        global = true,
        help = "Validate configuration and exit without running the command"
    )]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long, value_name = "HOST", help = "Override HTTP bind address")]
        host: Option<String>,
        #[arg(long, value_name = "PORT", help = "Override HTTP port")]
        port: Option<u16>,
    },
    /// Register a new player
    AddPlayer {
        name: String,
        #[arg(long, allow_negative_numbers = true, help = "Starting rating")]
        rating: Option<f64>,
    },
    /// Remove a player (their games stay in the history)
    RemovePlayer { name: String },
    /// Record a match result: a_wins, b_wins or draw
    Record {
        player_a: String,
        player_b: String,
        outcome: String,
    },
    /// Show players by rating
    Standings,
    /// Show the most recent games
    History {
        #[arg(long, help = "Number of games to show")]
        limit: Option<usize>,
    },
    /// Compute new ratings without storing anything
    Calculate {
        #[arg(allow_negative_numbers = true)]
        rating_a: f64,
        #[arg(allow_negative_numbers = true)]
        rating_b: f64,
        /// Player A's score: 1, 0.5 or 0
        score_a: f64,
        #[arg(long, help = "K-factor (defaults to the configured one)")]
        k: Option<f64>,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file/environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(database) = &args.database {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.database_path = database.clone();
    }

    if args.memory {
        config.storage.backend = StorageBackend::Memory;
    }

    if let Command::Serve { host, port } = &args.command {
        if let Some(host) = host {
            config.service.http_host = host.clone();
        }
        if let Some(port) = port {
            config.service.http_port = *port;
        }
    }

    elo_board::config::validate_config(&config)?;
    Ok(config)
}

fn open_ledger(config: &AppConfig) -> Result<Arc<dyn MatchLedger>> {
    let ledger: Arc<dyn MatchLedger> = match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; nothing will be persisted");
            Arc::new(InMemoryLedger::new())
        }
        StorageBackend::Sqlite => Arc::new(SqliteLedger::open(
            &config.storage.database_path,
            config.busy_timeout(),
        )?),
    };
    Ok(ledger)
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Elo Board leaderboard");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   HTTP: {}:{}",
        config.service.http_host, config.service.http_port
    );
    match config.storage.backend {
        StorageBackend::Memory => info!("   Storage: memory"),
        StorageBackend::Sqlite => info!("   Storage: sqlite ({})", config.storage.database_path),
    }
    info!(
        "   K-factor: {}, precision: {:?}, draws: {}",
        config.rating.k_factor, config.rating.precision, config.rating.allow_draws
    );
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

async fn serve(config: &AppConfig, leaderboard: Arc<Leaderboard>) -> Result<()> {
    let server = Arc::new(ApiServer::new(
        ApiServerConfig {
            host: config.service.http_host.clone(),
            port: config.service.http_port,
        },
        leaderboard,
    ));

    let mut server_task = {
        let server = server.clone();
        tokio::spawn(async move { server.start().await })
    };

    info!("Press Ctrl+C to shutdown gracefully...");

    tokio::select! {
        finished = &mut server_task => {
            // The server only returns on its own if it failed to start
            return finished?;
        }
        _ = wait_for_shutdown_signal() => {}
    }

    server.stop();

    match tokio::time::timeout(config.shutdown_timeout(), server_task).await {
        Ok(joined) => joined??,
        Err(_) => warn!("Shutdown timeout exceeded, forcing exit"),
    }

    info!("Elo Board stopped");
    Ok(())
}

fn print_player(rank: Option<usize>, player: &PlayerRecord) {
    let rank = rank.map(|r| format!("{:>3}.", r)).unwrap_or_default();
    println!(
        "{} {:<24} {:>8.1}  games {:>4}  W {:>4}  L {:>4}  D {:>4}",
        rank, player.name, player.rating, player.games_played, player.wins, player.losses, player.draws
    );
}

fn print_game(game: &GameResult) {
    println!(
        "{}  {} vs {}  winner: {}",
        game.timestamp.format("%Y-%m-%d %H:%M:%S"),
        game.player1,
        game.player2,
        game.winner_label()
    );
}

async fn run_command(command: Command, config: &AppConfig, leaderboard: Arc<Leaderboard>) -> Result<()> {
    match command {
        Command::Serve { .. } => serve(config, leaderboard).await?,
        Command::AddPlayer { name, rating } => {
            let player = leaderboard.register_player(&name, rating)?;
            print_player(None, &player);
        }
        Command::RemovePlayer { name } => {
            leaderboard.remove_player(&name).await?;
            println!("Removed {}", name.trim());
        }
        Command::Record {
            player_a,
            player_b,
            outcome,
        } => {
            let outcome: Outcome = outcome.parse()?;
            let applied = leaderboard
                .record_result(&player_a, &player_b, outcome)
                .await?;
            print_game(&applied.game);
            for player in applied.players() {
                print_player(None, player);
            }
        }
        Command::Standings => {
            for (index, player) in leaderboard.standings()?.iter().enumerate() {
                print_player(Some(index + 1), player);
            }
        }
        Command::History { limit } => {
            for game in leaderboard.recent_games(limit)? {
                print_game(&game);
            }
        }
        Command::Calculate {
            rating_a,
            rating_b,
            score_a,
            k,
        } => {
            let (new_a, new_b) = leaderboard.calculate(rating_a, rating_b, score_a, k)?;
            println!("player A: {:.2} -> {:.2}", rating_a, new_a);
            println!("player B: {:.2} -> {:.2}", rating_b, new_b);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without running the command");
        return Ok(());
    }

    if matches!(args.command, Command::Serve { .. }) {
        display_startup_banner(&config);
    }

    let ledger = open_ledger(&config)?;
    let metrics = Arc::new(MetricsCollector::new()?);
    let leaderboard = Arc::new(Leaderboard::new(ledger, &config)?.with_metrics(metrics)?);

    if let Err(e) = run_command(args.command, &config, leaderboard).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
