use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wordgraph_ai::{OpenAiGateway, PromptLibrary};
use wordgraph_batch::{
    analyze, create_prompt_batch, load_batches, load_word_entries, normalize, simple_word_list,
    write_batches, CombinationGenerator, NormalizeRules, RawRecord,
};
use wordgraph_core::{Taxonomy, WordEntry, WordGraphConfig, WordGraphError};
use wordgraph_pipeline::{GraphStore, Pipeline, PipelineReport};

#[derive(Parser)]
#[command(
    name = "wordgraph",
    version,
    about = "WordGraph CLI - candidate batch management and word graph construction",
    long_about = None
)]
struct Cli {
    /// Configuration file path (defaults to wordgraph.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Canonicalize, deduplicate and re-shard the candidate batches
    Normalize {
        /// JSON file overriding the built-in canonicalization rules
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Generate a batch of unique tag-combination prompts
    NewBatch {
        /// Number of prompts to generate
        #[arg(short, long, default_value = "50")]
        count: usize,

        /// JSON file overriding the built-in tag taxonomy
        #[arg(long)]
        taxonomy: Option<PathBuf>,
    },

    /// Shard a flat candidate-word JSON array into batch files
    Split {
        /// JSON file holding an array of word records
        input: PathBuf,
    },

    /// Run the two-phase graph construction against the inference service
    Build,

    /// Print the tag diversity distribution of the candidate corpus
    Analyze {
        /// JSON file overriding the built-in tag taxonomy
        #[arg(long)]
        taxonomy: Option<PathBuf>,
    },

    /// Export the plain word list consumed by the game
    WordList {
        /// Output file
        #[arg(short, long, default_value = "words.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let config =
        WordGraphConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match &cli.command {
        Commands::Normalize { rules } => run_normalize(&config, rules.as_deref()),
        Commands::NewBatch { count, taxonomy } => {
            run_new_batch(&config, *count, taxonomy.as_deref())
        }
        Commands::Split { input } => run_split(&config, input),
        Commands::Build => run_build(&config).await,
        Commands::Analyze { taxonomy } => run_analyze(&config, taxonomy.as_deref()),
        Commands::WordList { output } => run_word_list(&config, output),
    }
}

fn load_taxonomy(path: Option<&Path>) -> Result<Taxonomy> {
    Ok(match path {
        Some(path) => Taxonomy::from_file(path)?,
        None => Taxonomy::default(),
    })
}

fn run_normalize(config: &WordGraphConfig, rules_path: Option<&Path>) -> Result<()> {
    let rules = match rules_path {
        Some(path) => NormalizeRules::from_file(path)?,
        None => NormalizeRules::default(),
    };

    let loaded = load_batches(&config.paths.batches_dir)
        .with_context(|| format!("cannot load batches from {}", config.paths.batches_dir.display()))?;
    let (batches, report) = normalize(&loaded, &rules, config.batch.batch_size);
    write_batches(&config.paths.batches_dir, &batches)?;

    println!("{}", "Normalization complete".green().bold());
    println!("  source batches:      {}", report.source_batches);
    println!("  source records:      {}", report.source_records);
    println!("  duplicate words:     {}", report.duplicate_words);
    println!("  canonical collisions: {}", report.canonical_collisions);
    println!("  removed:             {}", report.removed);
    println!("  replaced:            {}", report.replaced);
    println!("  space-converted:     {}", report.space_converted);
    println!("  unfilled dropped:    {}", report.empty_dropped);
    println!("  skipped files:       {}", report.skipped_files);
    println!(
        "  {} words across {} batches",
        report.words, report.batches
    );
    Ok(())
}

fn run_new_batch(config: &WordGraphConfig, count: usize, taxonomy_path: Option<&Path>) -> Result<()> {
    let taxonomy = load_taxonomy(taxonomy_path)?;
    let generator = CombinationGenerator::new(
        &taxonomy,
        config.combo_sizes(),
        config.batch.sample_retry_ceiling,
    );
    let (index, path) = create_prompt_batch(&config.paths.batches_dir, count, &generator)?;
    println!(
        "{} {} prompts in batch {} ({})",
        "Created".green().bold(),
        count,
        index,
        path.display()
    );
    Ok(())
}

fn run_split(config: &WordGraphConfig, input: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let records: Vec<RawRecord> = serde_json::from_str(&raw)
        .map_err(|e| WordGraphError::CorruptInput(format!("{}: {}", input.display(), e)))?;

    let entries: Vec<WordEntry> = records.into_iter().map(RawRecord::into_entry).collect();
    let batches: Vec<Vec<WordEntry>> = entries
        .chunks(config.batch.batch_size)
        .map(|chunk| chunk.to_vec())
        .collect();
    write_batches(&config.paths.batches_dir, &batches)?;

    println!(
        "{} {} words into {} batch files under {}",
        "Split".green().bold(),
        entries.len(),
        batches.len(),
        config.paths.batches_dir.display()
    );
    Ok(())
}

async fn run_build(config: &WordGraphConfig) -> Result<()> {
    let candidates = load_word_entries(&config.paths.batches_dir)
        .with_context(|| format!("cannot load batches from {}", config.paths.batches_dir.display()))?;
    if candidates.is_empty() {
        bail!(
            "no candidate words found in {}",
            config.paths.batches_dir.display()
        );
    }

    let prompts = PromptLibrary::load(&config.paths.links_prompt, &config.paths.description_prompt)?;
    let gateway = Arc::new(OpenAiGateway::new(config.gateway.clone(), prompts)?);
    let store = GraphStore::load_or_seed(&config.paths.graph_file, &candidates)?;

    let mut pipeline = Pipeline::new(
        store,
        gateway,
        config.pipeline.max_connections,
        Duration::from_secs(config.pipeline.seconds_between_calls),
    );
    let report = pipeline.run().await?;

    print_build_report(&report);
    println!(
        "Word graph saved to {}",
        config.paths.graph_file.display()
    );
    Ok(())
}

fn print_build_report(report: &PipelineReport) {
    println!("{}", "Graph construction complete".green().bold());
    println!(
        "  connections:  {} generated, {} skipped, {} failed, {} empty",
        report.connections.generated,
        report.connections.skipped,
        report.connections.failed,
        report.connections.empty
    );
    println!(
        "  descriptions: {} generated, {} skipped, {} failed, {} without connections",
        report.descriptions.generated,
        report.descriptions.skipped,
        report.descriptions.failed,
        report.descriptions.empty
    );
    if report.connections.failed > 0 || report.descriptions.failed > 0 {
        println!("  re-run `wordgraph build` to retry the failed words");
    }
}

fn run_analyze(config: &WordGraphConfig, taxonomy_path: Option<&Path>) -> Result<()> {
    let taxonomy = load_taxonomy(taxonomy_path)?;
    let entries = load_word_entries(&config.paths.batches_dir)?;
    let report = analyze(&entries, &taxonomy);

    println!(
        "Analyzing {} words for diversity distribution",
        report.total_words
    );
    for breakdown in &report.dimensions {
        println!("\n{}", breakdown.dimension.cyan().bold());
        for (value, count) in &breakdown.counts {
            println!(
                "  {:<28} {:>4} words ({:.1}%)",
                value,
                count,
                report.percentage(*count)
            );
        }
    }
    Ok(())
}

fn run_word_list(config: &WordGraphConfig, output: &Path) -> Result<()> {
    let entries = load_word_entries(&config.paths.batches_dir)?;
    let words = simple_word_list(&entries);
    std::fs::write(output, serde_json::to_string_pretty(&words)?)
        .with_context(|| format!("cannot write {}", output.display()))?;

    println!(
        "{} {} words to {}",
        "Exported".green().bold(),
        words.len(),
        output.display()
    );
    Ok(())
}
