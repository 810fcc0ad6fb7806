#![deny(warnings)]

//! Headless CLI driving the boundary calculator and the idle session.

use anyhow::{bail, Context, Result};
use fold_runtime::{Session, SessionConfig};
use grade_core::{
    cohort_stats, compute_boundaries, default_standard, generic_stats, synthetic_cohort,
    validate_standard, GradeBoundary, GradingStandard, Mode,
};
use persistence::FileStore;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage:
  cli boundaries [--mode generic|data-driven] [--total-marks N]
                 [--scores \"95, 89, 87\"] [--scores-file PATH]
                 [--standard PATH.yaml] [--sample N] [--seed S] [--json]
  cli play       [--play-ticks N] [--clicks-per-tick N] [--auto-hire]
                 [--save-dir PATH] [--save-name NAME] [--reset]";

/// Demo cohort used by data-driven mode when no scores are supplied.
const DEMO_SCORES: [i64; 30] = [
    95, 89, 87, 84, 82, 78, 76, 73, 71, 68, 65, 62, 58, 55, 52, 48, 45, 42, 38, 35, 32, 28, 25,
    22, 18, 15, 12, 8, 5, 2,
];

struct Args {
    command: String,
    mode: Mode,
    total_marks: u32,
    scores: Option<String>,
    scores_file: Option<PathBuf>,
    standard_file: Option<PathBuf>,
    sample: Option<usize>,
    seed: u64,
    json: bool,
    play_ticks: u32,
    clicks_per_tick: u32,
    auto_hire: bool,
    save_dir: PathBuf,
    save_name: String,
    reset: bool,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            command: "boundaries".to_string(),
            mode: Mode::Generic,
            total_marks: 100,
            scores: None,
            scores_file: None,
            standard_file: None,
            sample: None,
            seed: 42,
            json: false,
            play_ticks: 60,
            clicks_per_tick: 1,
            auto_hire: false,
            save_dir: PathBuf::from("saves"),
            save_name: persistence::DEFAULT_SAVE_NAME.to_string(),
            reset: false,
        }
    }
}

fn next_value<T: std::str::FromStr>(
    it: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T> {
    it.next()
        .and_then(|s| s.parse().ok())
        .with_context(|| format!("{flag} expects a value\n{USAGE}"))
}

fn parse_args(raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut it = raw.peekable();
    if let Some(first) = it.peek() {
        if !first.starts_with("--") {
            args.command = it.next().unwrap_or_default();
        }
    }
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--mode" => {
                args.mode = match it.next().as_deref() {
                    Some("generic") => Mode::Generic,
                    Some("data-driven") => Mode::DataDriven,
                    other => bail!("unknown mode {other:?}\n{USAGE}"),
                }
            }
            "--total-marks" => args.total_marks = next_value(&mut it, "--total-marks")?,
            "--scores" => args.scores = it.next(),
            "--scores-file" => args.scores_file = it.next().map(PathBuf::from),
            "--standard" => args.standard_file = it.next().map(PathBuf::from),
            "--sample" => args.sample = Some(next_value(&mut it, "--sample")?),
            "--seed" => args.seed = next_value(&mut it, "--seed")?,
            "--json" => args.json = true,
            "--play-ticks" => args.play_ticks = next_value(&mut it, "--play-ticks")?,
            "--clicks-per-tick" => args.clicks_per_tick = next_value(&mut it, "--clicks-per-tick")?,
            "--auto-hire" => args.auto_hire = true,
            "--save-dir" => args.save_dir = next_value(&mut it, "--save-dir")?,
            "--save-name" => args.save_name = next_value(&mut it, "--save-name")?,
            "--reset" => args.reset = true,
            _ => {}
        }
    }
    Ok(args)
}

fn load_standard(args: &Args) -> Result<GradingStandard> {
    let standard = match &args.standard_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading standard {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("parsing standard {}", path.display()))?
        }
        None => default_standard(),
    };
    validate_standard(&standard)?;
    Ok(standard)
}

fn gather_scores(args: &Args) -> Result<Vec<i64>> {
    if let Some(path) = &args.scores_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scores {}", path.display()))?;
        return Ok(score_ingest::parse_scores(&text)?);
    }
    if let Some(raw) = &args.scores {
        return Ok(score_ingest::parse_scores(raw)?);
    }
    if let Some(count) = args.sample {
        return Ok(synthetic_cohort(count, args.total_marks, args.seed));
    }
    if args.mode == Mode::DataDriven {
        info!("no scores supplied, using the built-in demo cohort");
        return Ok(DEMO_SCORES.to_vec());
    }
    Ok(Vec::new())
}

fn print_table(standard: &GradingStandard, boundaries: &[GradeBoundary]) {
    println!("{} | bands: {}", standard.name, boundaries.len());
    println!(
        "{:<6} {:<14} {:>11} {:>6} {:>9}",
        "Grade", "Description", "Range", "Min %", "Students"
    );
    for b in boundaries {
        let students = b
            .students_in_grade
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<14} {:>5}-{:<5} {:>5}% {:>9}",
            b.letter_grade, b.description, b.min_score, b.max_score, b.percentage, students
        );
    }
}

fn run_boundaries(args: &Args) -> Result<()> {
    let standard = load_standard(args)?;
    let scores = gather_scores(args)?;
    let boundaries = compute_boundaries(args.mode, args.total_marks, &standard, &scores)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&boundaries)?);
    } else {
        print_table(&standard, &boundaries);
    }

    match args.mode {
        Mode::DataDriven => {
            if let Some(stats) = cohort_stats(&scores, &boundaries) {
                println!(
                    "Cohort | students: {} | mean: {} | median: {} | pass 4+: {}% | 7+: {}% | 8+: {}%",
                    stats.total_students,
                    stats.mean_score,
                    stats.median_score,
                    stats.pass_rate,
                    stats.high_achievers,
                    stats.top_grades
                );
            }
        }
        Mode::Generic => {
            let rates = generic_stats();
            println!(
                "Typical rates | pass 4+: {}% | 7+: {}% | 8+: {}%",
                rates.pass_rate, rates.high_achievers, rates.top_grades
            );
        }
    }
    Ok(())
}

fn run_play(args: &Args) -> Result<()> {
    let store = FileStore::new(&args.save_dir);
    let config = SessionConfig {
        save_name: args.save_name.clone(),
        ..SessionConfig::default()
    };
    let mut session = Session::open(store, config)?;
    if args.reset {
        session.reset()?;
    }

    for _ in 0..args.play_ticks {
        for _ in 0..args.clicks_per_tick {
            session.click();
        }
        if args.auto_hire {
            while session.hire_assistant().is_ok() {}
        }
        for set in session.tick()? {
            println!("Completed: {set}");
        }
    }
    session.save()?;

    let s = session.summary();
    let next = match &s.next_set {
        Some(name) => format!(" | next: {} ({}%)", name, s.next_set_percent),
        None => String::new(),
    };
    println!(
        "KPI | folds: {:.0} | rate: {:.1}/s | assistants: {} | skill points: {} | prestige: {} | sets: {}/{}{}",
        s.fold_count,
        s.folds_per_second,
        s.assistant_level,
        s.skill_points,
        s.prestige_count,
        s.completed_sets,
        s.total_sets,
        next
    );
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(command = %args.command, "starting CLI");
    match args.command.as_str() {
        "boundaries" => run_boundaries(&args),
        "play" => run_play(&args),
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }
}
