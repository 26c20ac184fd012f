use clap::Parser;
use maze_escape_engine::constants::{TICK_RATE, TICK_SECS};
use maze_escape_engine::engine::Simulation;
use maze_escape_engine::error::MazeError;
use maze_escape_engine::grid::Grid;
use maze_escape_engine::server_utils::normalize_level;
use maze_escape_engine::telemetry::{emit_log, LogContext, LogLevel};
use maze_escape_engine::types::{Cell, FrameEvents, GameOverReason, RuntimeEvent, Terminal};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_MAX_TICKS: u64 = TICK_RATE as u64 * 60 * 15;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs autopilot maze scenarios headlessly")]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    level: Option<i64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    level: u32,
    seed: u32,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    level: u32,
    seed: u32,
    outcome: Option<Terminal>,
    reason: Option<GameOverReason>,
    ticks: u64,
    #[serde(rename = "durationSecs")]
    duration_secs: f64,
    score: i32,
    health: i32,
    #[serde(rename = "hasKey")]
    has_key: bool,
    #[serde(rename = "coinsCollected")]
    coins_collected: usize,
    #[serde(rename = "treasuresCollected")]
    treasures_collected: usize,
    #[serde(rename = "damageTaken")]
    damage_taken: i32,
    #[serde(rename = "enemySightings")]
    enemy_sightings: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let started_at = now_iso();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, now_ms()));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        let context = LogContext {
            match_id: Some(match_id.as_str()),
            scenario: Some(scenario.name.as_str()),
            seed: Some(scenario.seed),
            ..LogContext::default()
        };
        emit_log(
            LogLevel::Info,
            "scenario_started",
            context,
            json!({
                "level": scenario.level,
                "maxTicks": scenario.max_ticks,
            }),
        );

        let scenario_run = match run_scenario(&scenario) {
            Ok(run) => run,
            Err(error) => {
                emit_log(
                    LogLevel::Error,
                    "generation_failed",
                    context,
                    json!({ "error": error.to_string() }),
                );
                has_anomaly = true;
                continue;
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                LogLevel::Warn,
                "anomaly_detected",
                LogContext {
                    tick: Some(anomaly.tick),
                    ..context
                },
                json!({ "message": anomaly.message }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks;
        *reason_counts
            .entry(reason_key(scenario_run.result.reason))
            .or_insert(0) += 1;

        emit_log(
            LogLevel::Info,
            "scenario_finished",
            LogContext {
                tick: Some(scenario_run.result.ticks),
                ..context
            },
            json!({
                "outcome": scenario_run.result.outcome,
                "reason": scenario_run.result.reason,
                "score": scenario_run.result.score,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                LogLevel::Error,
                "result_encode_failed",
                context,
                json!({ "error": error.to_string() }),
            ),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        started_at,
        now_iso(),
        scenario_results,
        reason_counts,
        total_anomalies,
        total_ticks,
    );

    let run_context = LogContext {
        match_id: Some(match_id.as_str()),
        ..LogContext::default()
    };
    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                LogLevel::Error,
                "summary_write_failed",
                run_context,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        LogLevel::Info,
        "run_finished",
        run_context,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicks": summary.average_ticks,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> Result<ScenarioRunResult, MazeError> {
    let mut sim = Simulation::new(scenario.level, scenario.seed)?;

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut previous_score = 0;
    let mut enemy_sightings = 0usize;

    while !sim.is_ended() {
        let frame = sim.tick(sim.autopilot_intents(), TICK_SECS);
        for message in collect_frame_anomalies(&frame, previous_score, &sim.world().grid) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                frame.tick,
                message,
            );
        }
        previous_score = frame.score;
        enemy_sightings += frame
            .events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::EnemySpotted { .. }))
            .count();

        if frame.tick >= scenario.max_ticks && !sim.is_ended() {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                frame.tick,
                "tick limit reached before the level ended".to_string(),
            );
            break;
        }
    }

    let summary = sim.build_summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            level: summary.level,
            seed: summary.seed,
            outcome: summary.outcome,
            reason: summary.reason,
            ticks: summary.ticks,
            duration_secs: (summary.duration_secs * 100.0).round() / 100.0,
            score: summary.score,
            health: summary.health,
            has_key: summary.has_key,
            coins_collected: summary.coins_collected,
            treasures_collected: summary.treasures_collected,
            damage_taken: summary.damage_taken,
            enemy_sightings,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_frame_anomalies(frame: &FrameEvents, previous_score: i32, grid: &Grid) -> Vec<String> {
    let mut anomalies = Vec::new();
    if !(0..=100).contains(&frame.hero_health) {
        anomalies.push(format!("hero health out of range: {}", frame.hero_health));
    }
    if frame.score < previous_score {
        anomalies.push(format!(
            "score decreased: {previous_score} -> {}",
            frame.score
        ));
    }
    if !grid.is_open(frame.hero_cell) {
        anomalies.push(format!(
            "hero inside wall: ({}, {})",
            frame.hero_cell.row, frame.hero_cell.col
        ));
    }
    for enemy in &frame.enemies {
        let cell = Cell::new(enemy.row, enemy.col);
        if !grid.is_enemy_passable(cell) {
            anomalies.push(format!(
                "enemy {} on impassable cell: ({}, {})",
                enemy.id, enemy.row, enemy.col
            ));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));
    let max_ticks = cli.max_ticks.unwrap_or(DEFAULT_MAX_TICKS).max(1);

    if cli.single || cli.level.is_some() {
        let level = normalize_level(cli.level);
        return vec![Scenario {
            name: format!("custom-level{level}"),
            level,
            seed,
            max_ticks,
        }];
    }

    (1..=3u32)
        .map(|level| Scenario {
            name: format!("autopilot-level{level}"),
            level,
            seed: normalize_seed(seed as u64 + level as u64 - 1),
            max_ticks,
        })
        .collect()
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count,
        average_ticks,
        reason_counts,
        scenarios,
    }
}

fn reason_key(reason: Option<GameOverReason>) -> String {
    reason.map(GameOverReason::key).unwrap_or("unfinished").to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
