mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use logic::{
    PlayerPolicy, SessionOutcome, SimulationConfig, aggregate, resolve_seed_inputs, run_session,
};

#[derive(Debug, Parser)]
#[command(name = "chronoquest-tester", version = "0.1.0")]
#[command(about = "Headless QA for the ChronoQuest engine - deterministic session sweeps")]
struct Args {
    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Extra derived iterations per base seed
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Simulated wall-clock budget per session, in ticks of one second
    #[arg(long, default_value_t = 900)]
    ticks: u64,

    /// Scripted player behavior
    #[arg(long, value_enum, default_value_t = PlayerPolicy::Perfect)]
    policy: PlayerPolicy,

    /// Retries after a defeat before giving up
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seeds = resolve_seed_inputs(&args.seeds, args.iterations)
        .context("failed to resolve seed inputs")?;
    log::info!(
        "running {} sessions (policy {:?}, {} ticks each)",
        seeds.len(),
        args.policy,
        args.ticks
    );

    let mut reports = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let config = SimulationConfig {
            seed,
            ticks: args.ticks,
            policy: args.policy,
            retries: args.retries,
        };
        reports.push(run_session(&config));
    }

    match args.report.as_str() {
        "json" => {
            let summary = aggregate(&reports);
            let document = serde_json::json!({
                "sessions": reports,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        _ => {
            print_console(&reports);
        }
    }
    Ok(())
}

fn print_console(reports: &[logic::SessionReport]) {
    println!("{}", "ChronoQuest logic sweep".bold());
    println!(
        "{:>18}  {:>8}  {:>7}  {:>6}  {:>5}  {:>8}  top competitor",
        "seed", "outcome", "ticks", "score", "rank", "energy"
    );
    for report in reports {
        let outcome = match report.outcome {
            SessionOutcome::Victory => "victory".green(),
            SessionOutcome::Defeat => "defeat".red(),
            SessionOutcome::TimedOut => "timeout".yellow(),
        };
        println!(
            "{:>18}  {:>8}  {:>7}  {:>6}  {:>5}  {:>8}  {} ({})",
            format!("{:#x}", report.seed),
            outcome,
            report.ticks_used,
            report.final_score,
            report
                .final_rank
                .map_or_else(|| "-".to_string(), |rank| format!("#{rank}")),
            report.final_energy,
            report.top_competitor,
            report.top_competitor_score,
        );
    }

    let summary = aggregate(reports);
    println!();
    println!(
        "{} {} victories / {} defeats / {} timeouts, avg score {}, avg rank {:.1}",
        "summary:".bold(),
        summary.victories,
        summary.defeats,
        summary.timeouts,
        summary.average_score,
        summary.average_rank,
    );
}
