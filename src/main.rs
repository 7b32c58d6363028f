use bevy::prelude::*;

use terranav::game::config::TerrainConfig;
use terranav::game::error::SnapshotError;
use terranav::game::map::{load_snapshot, TerrainSnapshot};
use terranav::game::pathfinding::NodeType;
use terranav::game::terrain::{ResourceKind, TileType};
use terranav::game::TerrainAnalysis;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::fs;
use std::path::{Path, PathBuf};

const DEMO_MAP: &str = "
    ..............................
    ..TTTT..........~~~~..........
    ..TTTT..........~~~~.....MM...
    ..TTTT..........~~~~.....MM...
    ................~~~~..........
    ......####......~~~~..........
    ......####......~~~~..........
    ......####....................
    ..............................
    ..GG............~~~~....TTTT..
    ..GG............~~~~....TTTT..
    ................~~~~..........
";

fn setup_file_logging() -> Option<String> {
    let log_dir = PathBuf::from("logs");
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create logs directory: {e}");
        return None;
    }

    // Keep only the last 25 runs
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("terranav_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);
    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("terranav=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(log_path_str)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|s| s.starts_with("terranav") && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

fn load_terrain(path: Option<&str>) -> Result<TerrainSnapshot, SnapshotError> {
    let Some(path) = path else {
        info!("[TERRAIN] No map given, using the built-in demo map");
        return TerrainSnapshot::from_ascii(DEMO_MAP);
    };
    if path.ends_with(".txt") {
        TerrainSnapshot::from_ascii(&fs::read_to_string(path)?)
    } else {
        load_snapshot(path)
    }
}

fn main() {
    let log_file = setup_file_logging();
    if let Some(log_file) = &log_file {
        println!("terranav: logging to {log_file}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let map_path = args.first().map(String::as_str);
    let terrain = match load_terrain(map_path) {
        Ok(terrain) => terrain,
        Err(e) => {
            error!("[TERRAIN] Failed to load map {}: {}", map_path.unwrap_or("<demo>"), e);
            std::process::exit(1);
        }
    };
    let config = match args.get(1) {
        Some(path) => TerrainConfig::load_or_default(path),
        None => TerrainConfig::default(),
    };

    let mut analysis = match TerrainAnalysis::init(&terrain, config) {
        Ok(analysis) => analysis,
        Err(e) => {
            error!("[TERRAIN] Analysis failed: {}", e);
            std::process::exit(1);
        }
    };

    let stats = analysis.graph().stats();
    info!(
        "[GRAPH BUILD] {} walkable, {} unwalkable, {} gates, {} links",
        stats.walkable, stats.unwalkable, stats.gates, stats.links
    );
    info!("[CLUSTERS] {} resource clusters", analysis.clusters().len());
    for cluster in analysis.clusters().iter() {
        debug!(
            "[CLUSTERS] {:?} center {} wood {} metal {} gold {}",
            cluster.id,
            cluster.center(),
            cluster.amount(ResourceKind::Wood),
            cluster.amount(ResourceKind::Metal),
            cluster.amount(ResourceKind::Gold),
        );
    }

    let from = IVec2::ZERO;
    let to = IVec2::new(terrain.width.max(1) - 1, terrain.height.max(1) - 1);
    match analysis.get_shortest_path(from, to, &[]) {
        Some(path) => info!(
            "[PATHFINDING] {} -> {} on foot: {} nodes, {} cells, cost {}",
            from,
            to,
            path.nodes.len(),
            path.length,
            path.cost
        ),
        None => info!("[PATHFINDING] {} -> {}: no land route", from, to),
    }
    let amphibious = analysis.get_paths(from, to, &[TileType::Water]);
    info!("[PATHFINDING] {} alternative amphibious routes", amphibious.len());

    let gates = analysis.get_all_nodes(NodeType::Gate).len();
    info!("[TERRAIN] Done ({} gate nodes)", gates);
}
