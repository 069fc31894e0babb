//! experiment-runner: headless runner for one outreach experiment batch.
//!
//! Usage:
//!   experiment-runner --seed 42
//!   experiment-runner --seed 42 --count 20 --db run.db
//!   experiment-runner --csv leads.csv --live --show-messages
//!
//! Without --csv or --count the fixed 5-lead demo batch is used.
//! --live enables the real generation backend when ANTHROPIC_API_KEY is
//! set; otherwise every stage runs in deterministic fallback mode.

use anyhow::Result;
use outreach_core::{
    config::ExperimentConfig,
    engine::ExperimentEngine,
    generation::{ApiTextGenerator, TextGenerator},
    leadgen::LeadGenerator,
    model::{Experiment, Lead},
    report::FunnelReport,
    rng::{RngBank, StageSlot},
    store::ExperimentStore,
};
use std::env;
use std::sync::Arc;

const DEFAULT_VARIANT_A: &str = "Focus on ROI and efficiency gains.";
const DEFAULT_VARIANT_B: &str = "Focus on peer validation and social proof.";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let count = flag_value(&args, "--count").map(|v| v.parse::<usize>()).transpose()?;
    let csv_path = flag_value(&args, "--csv");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let config_path = flag_value(&args, "--config");
    let live = args.iter().any(|a| a == "--live");
    let show_messages = args.iter().any(|a| a == "--show-messages");
    let variant_a_desc = flag_value(&args, "--variant-a").unwrap_or(DEFAULT_VARIANT_A);
    let variant_b_desc = flag_value(&args, "--variant-b").unwrap_or(DEFAULT_VARIANT_B);

    let config = match config_path {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::default(),
    };

    // Key handling stays at this boundary; core never touches the
    // environment.
    let generator: Option<Arc<dyn TextGenerator>> = if live {
        match env::var("ANTHROPIC_API_KEY") {
            Ok(key) if !key.is_empty() => Some(Arc::new(ApiTextGenerator::new(
                config.generation.clone(),
                key,
            )?)),
            _ => {
                log::warn!("--live requested but ANTHROPIC_API_KEY is unset; running in fallback mode");
                None
            }
        }
    } else {
        None
    };

    let leads = match (csv_path, count) {
        (Some(path), _) => read_csv_leads(path)?,
        (None, Some(n)) => {
            let mut rng = RngBank::new(seed).for_stage(StageSlot::LeadGen);
            LeadGenerator::generate(n, &mut rng)
        }
        (None, None) => LeadGenerator::sample_batch(),
    };

    let run_id = format!("run-{}", uuid::Uuid::new_v4());
    println!("outreach experiment-runner");
    println!("  run_id:  {run_id}");
    println!("  seed:    {seed}");
    println!("  leads:   {}", leads.len());
    println!("  db:      {db}");
    println!("  backend: {}", if generator.is_some() { "live" } else { "fallback" });
    println!();

    let store = ExperimentStore::open(db)?;
    store.migrate()?;
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;

    let mut engine = ExperimentEngine::new(run_id, seed, &config, generator, store);
    let experiment = engine.run(leads, variant_a_desc, variant_b_desc)?;

    print_summary(&experiment);
    if show_messages {
        print_messages(&experiment);
    }

    Ok(())
}

fn print_summary(experiment: &Experiment) {
    let report = FunnelReport::from_results(&experiment.results);

    println!("=== RUN SUMMARY ===");
    println!("  sent:     {}", report.total_sent);
    println!(
        "  opened:   {:<4} ({:.1}%)",
        report.total_opened,
        percentage(report.total_opened, report.total_sent)
    );
    println!(
        "  replied:  {:<4} ({:.1}%)",
        report.total_replied,
        percentage(report.total_replied, report.total_sent)
    );
    println!(
        "  meetings: {:<4} ({:.1}%)",
        report.total_meetings,
        percentage(report.total_meetings, report.total_sent)
    );

    println!();
    println!("=== VARIANT PERFORMANCE ===");
    for summary in &report.variants {
        println!(
            "  {} | sent: {:<4} open: {:>5.1}%  reply: {:>5.1}%  meeting: {:>5.1}%",
            summary.variant,
            summary.sent,
            summary.open_rate * 100.0,
            summary.reply_rate * 100.0,
            summary.meeting_rate * 100.0,
        );
    }

    println!();
    match report.winner {
        Some(winner) => {
            println!("Winning strategy: Variant {winner}");
            println!("Recommendation: scale this messaging for the next batch.");
        }
        None => println!("No results — no winner declared."),
    }
}

fn print_messages(experiment: &Experiment) {
    println!();
    println!("=== MESSAGE LOG ===");
    for message in &experiment.messages {
        println!("To: {} | Variant: {}", message.lead_id, message.variant_type);
        println!("Subject: {}", message.subject_line);
        println!("Reasoning: {}", message.reasoning);
        println!("{}", message.content);
        println!("---");
    }
}

/// Read leads from a `name,title,company[,linkedin_url,email]` file.
/// A header row is tolerated.
fn read_csv_leads(path: &str) -> Result<Vec<Lead>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;

    let mut leads = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line_no == 0 && line.to_lowercase().starts_with("name,") {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            anyhow::bail!("{path}:{}: expected name,title,company", line_no + 1);
        }
        let mut lead = Lead::new(fields[0], fields[1], fields[2]);
        lead.linkedin_url = fields.get(3).filter(|f| !f.is_empty()).map(|f| f.to_string());
        lead.email = fields.get(4).filter(|f| !f.is_empty()).map(|f| f.to_string());
        leads.push(lead);
    }

    if leads.is_empty() {
        anyhow::bail!("{path}: no leads found");
    }
    Ok(leads)
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
