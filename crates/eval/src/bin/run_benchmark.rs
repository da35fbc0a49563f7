use anyhow::{Context, Result};
use clap::Parser;
use eval::{BenchmarkConfig, BenchmarkReport, BenchmarkRunner, BenchmarkSuite, MatchMode};
use extract::TypeVocabulary;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Score extraction benchmark suites against their ground truth.
#[derive(Parser)]
#[command(name = "run_benchmark", version, about)]
struct Cli {
    /// Suite file (.json) or a directory of suites
    #[arg(short, long)]
    dataset: PathBuf,

    /// Benchmark config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Type vocabulary file (JSON), used when a suite has none
    #[arg(long)]
    vocabulary: Option<PathBuf>,

    /// Match mode: strict, partial, type_only, direction_agnostic
    #[arg(short, long)]
    mode: Option<String>,

    /// Similarity threshold for fuzzy modes
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Minimum score for a case to pass
    #[arg(long)]
    pass_threshold: Option<f64>,

    /// Evaluate documents in parallel
    #[arg(long)]
    parallel: bool,

    /// Worker threads for parallel evaluation
    #[arg(long)]
    threads: Option<usize>,

    /// Write a Markdown summary to this file
    #[arg(long)]
    markdown: Option<PathBuf>,

    /// Output reports as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(&cli)?;
    let vocabulary = match &cli.vocabulary {
        Some(path) => TypeVocabulary::from_file(path)?,
        None => TypeVocabulary::default(),
    };

    let suites = if cli.dataset.is_dir() {
        BenchmarkSuite::load_directory(&cli.dataset).await?
    } else {
        vec![BenchmarkSuite::load(&cli.dataset).await?]
    };
    info!(suites = suites.len(), mode = %config.options.mode, "Loaded benchmark suites");

    let runner = BenchmarkRunner::new(config).with_vocabulary(vocabulary);
    let reports: Vec<BenchmarkReport> = suites.iter().map(|suite| runner.run_suite(suite)).collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_results(report);
        }
    }

    if let Some(path) = &cli.markdown {
        let content: String = reports.iter().map(BenchmarkReport::to_markdown).collect::<Vec<_>>().join("\n");
        std::fs::write(path, content).context(format!("Failed to write {:?}", path))?;
        println!("✅ Markdown summary saved to {}", path.display());
    }

    if reports.iter().any(|r| !r.all_passed()) {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<BenchmarkConfig> {
    let mut config = match &cli.config {
        Some(path) => BenchmarkConfig::from_file(path)?,
        None => BenchmarkConfig::default(),
    };

    if let Some(mode) = &cli.mode {
        config.options.mode = MatchMode::parse_lenient(mode);
    }
    if let Some(threshold) = cli.threshold {
        config.options.similarity_threshold = threshold;
    }
    config.options.validate()?;
    if let Some(pass_threshold) = cli.pass_threshold {
        config.pass_threshold = pass_threshold;
    }
    if cli.parallel {
        config.concurrency.parallel = true;
    }
    if cli.threads.is_some() {
        config.concurrency.num_threads = cli.threads;
    }
    Ok(config)
}

fn print_results(report: &BenchmarkReport) {
    println!("\n=== {} ===\n", report.suite);

    for case in &report.cases {
        let scores = case.result.scores();
        println!("{} {}", if case.passed { "✅" } else { "❌" }, case.id);
        println!("  {:?}: {:.3} (threshold {:.2})", case.metric, case.score, case.pass_threshold);
        println!(
            "  P/R/F1: {:.3} / {:.3} / {:.3}  (TP {} FP {} FN {})",
            scores.precision,
            scores.recall,
            scores.f1,
            scores.true_positives,
            scores.false_positives,
            scores.false_negatives
        );
        if let Some(direction) = scores.direction_accuracy {
            println!("  Direction Accuracy: {:.3}", direction);
        }
        println!("  Macro F1: {:.3} over {} types", scores.macro_average.f1, scores.macro_average.types);
    }

    println!("\n📊 SUMMARY:");
    println!("  Passed: {}/{} ({:.1}%)", report.passed, report.total_cases, report.pass_rate * 100.0);
    println!("  Mean Score: {:.3}", report.mean_score);
    println!("  Avg Latency: {:.1} ms", report.latency.avg_ms);
    println!("  P95 Latency: {:.1} ms", report.latency.p95_ms);
}
