use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use sat_o_track::config::Config;
use sat_o_track::map::{LatLng, Scene};
use sat_o_track::provider::{N2yoProvider, SatelliteProvider};
use sat_o_track::tracker::{RefreshLoop, SessionOptions, TrackingSession};

#[derive(Parser)]
#[command(name = "sat-o-track")]
#[command(about = "Live satellite tracking map")]
struct Cli {
    /// YAML configuration file; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tracking dashboard
    Serve,
    /// Track a category in the terminal for a number of refresh cycles
    Watch {
        #[arg(short = 'C', long)]
        category: Option<u32>,
        #[arg(short, long)]
        limit: Option<String>,
        #[arg(short, long, default_value_t = 3)]
        ticks: u32,
    },
    /// List the selectable satellite categories
    Categories,
    /// Validate the configuration file
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Watch {
            category,
            limit,
            ticks,
        } => watch(config, category, limit, ticks).await,
        Commands::Categories => categories(config).await,
        Commands::Validate => validate(&config),
    }
}

fn build_provider(config: &Config) -> Result<Arc<dyn SatelliteProvider>, String> {
    let observer = config.observer().map_err(|e| e.to_string())?;
    let api_key = config.api_key().map_err(|e| e.to_string())?;
    let provider = N2yoProvider::new(&config.n2yo, api_key, observer).map_err(|e| e.to_string())?;
    Ok(Arc::new(provider))
}

fn build_session(config: &Config) -> Result<TrackingSession<Scene>, String> {
    let provider = build_provider(config)?;
    let refresh = &config.refresh;
    let options = SessionOptions {
        default_limit: refresh.default_limit,
        trajectory_seconds: refresh.trajectory_seconds,
        trajectory: refresh.trajectory,
        details: refresh.details,
    };
    let session = TrackingSession::new(provider, Scene::new(), options);

    let observer = config.observer().map_err(|e| e.to_string())?;
    session.center_map(
        LatLng {
            lat: observer.latitude_deg,
            lng: observer.longitude_deg,
        },
        config.map.zoom,
    );
    Ok(session)
}

async fn serve(config: Config) -> ExitCode {
    let session = match build_session(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Failures land in the banner; the dashboard still starts.
    let _ = session.load_categories().await;
    let _ = session
        .select_category(config.refresh.initial_category, config.refresh.default_limit)
        .await;

    let refresh = RefreshLoop::spawn(session.clone(), config.refresh.interval);
    let result = sat_o_track::web::run_server(config, session).await;
    refresh.stop().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn watch(
    config: Config,
    category: Option<u32>,
    limit: Option<String>,
    ticks: u32,
) -> ExitCode {
    let session = match build_session(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let category = category.unwrap_or(config.refresh.initial_category);
    let limit = match limit {
        Some(raw) => sat_o_track::tracker::parse_limit(&raw),
        None => config.refresh.default_limit,
    };
    if let Err(e) = session.select_category(category, limit).await {
        eprintln!("Error fetching satellites: {}", e);
        return ExitCode::FAILURE;
    }

    for cycle in 1..=ticks {
        if cycle > 1 {
            tokio::time::sleep(config.refresh.interval).await;
            session.tick().await;
        }
        print_cycle(&session, cycle);
    }
    ExitCode::SUCCESS
}

fn print_cycle(session: &TrackingSession<Scene>, cycle: u32) {
    let snapshot = session.snapshot();
    println!("Cycle {} (generation {})", cycle, snapshot.generation);
    for satellite in &snapshot.satellites {
        match session.last_position(satellite.id) {
            Some(at) => println!(
                "  {:>6}  {:<24} {:>9.4} {:>10.4}  trail {}",
                satellite.id,
                satellite.name,
                at.lat,
                at.lng,
                session.trail_len(satellite.id).unwrap_or(0)
            ),
            None => println!("  {:>6}  {:<24} (no position)", satellite.id, satellite.name),
        }
    }
    if let Some(message) = snapshot.error {
        println!("  ! {}", message);
    }
}

async fn categories(config: Config) -> ExitCode {
    let provider = match build_provider(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match provider.categories().await {
        Ok(categories) => {
            for category in categories {
                println!("  {:>3}  {}", category.id, category.name);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error fetching categories: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(config: &Config) -> ExitCode {
    let observer = match config.observer() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Config is valid");
    println!(
        "  observer: {}, {} @ {} m",
        observer.latitude_deg, observer.longitude_deg, observer.altitude_m
    );
    println!(
        "  refresh every {}, limit {}, trajectory {} s",
        humantime::format_duration(config.refresh.interval),
        config.refresh.default_limit,
        config.refresh.trajectory_seconds
    );
    if config.api_key().is_err() {
        println!("  warning: no API key (set N2YO_API_KEY)");
    }
    ExitCode::SUCCESS
}
