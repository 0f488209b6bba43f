mod mock;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use clustering::{ClusterKey, PointRecord, WallConfig, parse_points};
use enrichment::{Enricher, ExtractiveSummarizer, HttpSummarizer, Summarizer};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use wall::{MemoryWall, SelectOutcome, SharedWall};

const PUMP_INTERVAL: Duration = Duration::from_millis(25);

/// Sweeps a memory wall through camera altitudes and prints each snapshot as
/// one JSON line.
#[derive(Parser, Debug)]
#[command(name = "memwall")]
struct Cli {
    /// JSON array of `{lat, lng, text, color?}` records
    #[arg(long, conflicts_with = "mock")]
    points: Option<PathBuf>,

    /// Generate this many mock memories instead of reading --points
    #[arg(long, default_value_t = 1000)]
    mock: usize,

    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// WallConfig JSON file; WALL_* environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera altitudes to visit, in globe radii
    #[arg(long, value_delimiter = ',', default_value = "2.0,1.0,0.6,0.3,3.0,5.0")]
    altitudes: Vec<f64>,

    /// Summarization endpoint; offline extractive summaries when unset
    #[arg(long, env = "WALL_SUMMARIZER_URL")]
    summarizer_url: Option<String>,

    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Number of largest clusters to select at each altitude
    #[arg(long, default_value_t = 3)]
    select_top: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Cli::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main(cli: Cli) -> Result<(), String> {
    let config = load_config(cli.config.as_ref())?;
    let points = load_points(&cli)?;
    let timeout = Duration::from_millis(cli.timeout_ms);

    let summarizer: Arc<dyn Summarizer> = match &cli.summarizer_url {
        Some(url) => Arc::new(HttpSummarizer::new(url.clone()).with_timeout(timeout)),
        None => Arc::new(ExtractiveSummarizer::default()),
    };
    info!(
        points = points.len(),
        remote = cli.summarizer_url.is_some(),
        "memory wall starting"
    );

    let mut wall = MemoryWall::new(config, points, Enricher::new(summarizer));
    let sampler = wall.on_altitude_sample(|sample| {
        debug!(seq = sample.seq, altitude = sample.altitude, "altitude sample emitted");
    });
    let wall = wall.shared();
    let pump = tokio::spawn(pump_loop(Arc::clone(&wall)));

    for &altitude in &cli.altitudes {
        let selected = {
            let mut w = wall.lock();
            if !w.observe_altitude(altitude) {
                info!(altitude, "altitude change below epsilon; snapshot unchanged");
                continue;
            }
            select_largest(&mut w, cli.select_top)
        };

        wait_for_enrichment(&wall, timeout).await;

        let snapshot = wall.lock().snapshot();
        let line = serde_json::to_string(&*snapshot).map_err(|e| e.to_string())?;
        println!("{line}");
        info!(
            altitude,
            pass = snapshot.pass,
            entities = snapshot.entities.len(),
            selected = selected.len(),
            "pass printed"
        );
    }

    pump.abort();
    let mut w = wall.lock();
    w.unsubscribe(sampler);
    for (name, value) in w.metrics().snapshot() {
        info!(metric = name, value, "final");
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<WallConfig, String> {
    let mut config = match path {
        Some(path) => WallConfig::from_path(path).map_err(|e| e.to_string())?,
        None => WallConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut WallConfig) {
    config.min_clustering_altitude =
        env_var_f64("WALL_MIN_CLUSTERING_ALTITUDE", config.min_clustering_altitude);
    config.max_clustering_altitude =
        env_var_f64("WALL_MAX_CLUSTERING_ALTITUDE", config.max_clustering_altitude);
    config.max_distance_km = env_var_f64("WALL_MAX_DISTANCE_KM", config.max_distance_km);
    config.curve_steepness = env_var_f64("WALL_CURVE_STEEPNESS", config.curve_steepness);
    config.full_collapse_altitude =
        env_var_f64("WALL_FULL_COLLAPSE_ALTITUDE", config.full_collapse_altitude);
    config.saturation_count = env_var_u32("WALL_SATURATION_COUNT", config.saturation_count);
    config.altitude_epsilon = env_var_f64("WALL_ALTITUDE_EPSILON", config.altitude_epsilon);
}

fn load_points(cli: &Cli) -> Result<Vec<PointRecord>, String> {
    match &cli.points {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            parse_points(&text).map_err(|e| format!("invalid points in {}: {e}", path.display()))
        }
        None => Ok(mock::mock_points(cli.mock, cli.seed)),
    }
}

fn select_largest(wall: &mut MemoryWall, top: usize) -> Vec<ClusterKey> {
    let snapshot = wall.snapshot();
    let keys: Vec<ClusterKey> = snapshot
        .clusters_by_size()
        .into_iter()
        .take(top)
        .filter_map(|e| e.key)
        .collect();

    for key in &keys {
        match wall.select_cluster(key) {
            SelectOutcome::Dispatched(req) => info!(%key, %req, "cluster selected"),
            other => info!(%key, outcome = ?other, "cluster selected again"),
        }
    }
    keys
}

async fn pump_loop(wall: SharedWall) {
    loop {
        let applied = wall.lock().pump();
        for key in applied {
            info!(%key, "summary applied");
        }
        tokio::time::sleep(PUMP_INTERVAL).await;
    }
}

async fn wait_for_enrichment(wall: &SharedWall, timeout: Duration) {
    // Every request resolves on its own; the deadline only bounds the demo.
    let deadline = Instant::now() + timeout + PUMP_INTERVAL * 4;
    while wall.lock().in_flight() > 0 {
        if Instant::now() >= deadline {
            warn!("enrichment still in flight; printing raw labels");
            return;
        }
        tokio::time::sleep(PUMP_INTERVAL).await;
    }
}

fn env_var_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::{Cli, load_config};
    use clap::Parser;
    use clustering::WallConfig;

    #[test]
    fn default_sweep_starts_at_two_radii() {
        let cli = Cli::parse_from(["memwall"]);
        assert_eq!(cli.altitudes[0], 2.0);
        assert_eq!(cli.mock, 1000);
        assert!(cli.points.is_none());
    }

    #[test]
    fn altitudes_are_comma_separated() {
        let cli = Cli::parse_from(["memwall", "--altitudes", "0.4,4.6", "--select-top", "1"]);
        assert_eq!(cli.altitudes, vec![0.4, 4.6]);
        assert_eq!(cli.select_top, 1);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let path = std::path::PathBuf::from("/nonexistent/wall.json");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.contains("/nonexistent/wall.json"), "{err}");
    }

    #[test]
    fn no_config_file_means_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.curve_steepness, WallConfig::default().curve_steepness);
    }
}
