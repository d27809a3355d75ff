//! mtwalk - reproduce wallets created from a weakly seeded MT19937.
//!
//! Walks the 32-bit seed space and decodes target address lines.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mtwalk::entropy::{EntropyLength, Extraction};
use mtwalk::mnemonic::{Dictionary, Language};
use mtwalk::output::{ConsoleOutput, Format, Output};
use mtwalk::target::{Target, TargetSet, Wallet};
use mtwalk::walker::{RunOptions, SeedRange, WalkConfig, Walker, DEFAULT_CHUNK_SIZE};

#[derive(Parser)]
#[command(name = "mtwalk")]
#[command(about = "Reproduce wallets created from a weakly seeded MT19937")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Entropy size, as a word count or a bit count.
#[derive(clap::Args, Clone, Copy)]
struct LengthArgs {
    /// Mnemonic length (12, 15, 18, 21, 24)
    #[arg(long, default_value_t = 24, conflicts_with = "bits")]
    words: usize,

    /// Entropy size in bits (128, 160, 192, 224, 256)
    #[arg(long)]
    bits: Option<usize>,
}

impl LengthArgs {
    fn length(&self) -> Result<EntropyLength> {
        let length = match self.bits {
            Some(bits) => EntropyLength::from_bits(bits)?,
            None => EntropyLength::from_words(self.words)?,
        };
        Ok(length)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Enumerate seeds and print their mnemonics
    Walk {
        /// First seed
        #[arg(long, default_value_t = 0)]
        start: u64,

        /// Last seed (inclusive)
        #[arg(long, default_value_t = u32::MAX as u64)]
        end: u64,

        /// Start date (YYYY-MM-DD, UTC), replaces --start/--end
        #[arg(long, requires = "to_date", conflicts_with_all = ["start", "end"])]
        from_date: Option<String>,

        /// End date (YYYY-MM-DD, UTC, inclusive)
        #[arg(long, requires = "from_date")]
        to_date: Option<String>,

        #[command(flatten)]
        length: LengthArgs,

        /// Byte extraction rule
        #[arg(long, value_enum, default_value_t = Extraction::Libstdcxx)]
        extraction: Extraction,

        /// Bundled wordlist
        #[arg(long, value_enum, default_value_t = Language::English)]
        language: Language,

        /// Custom wordlist file (2048 words, one per line)
        #[arg(long, conflicts_with = "language")]
        wordlist: Option<PathBuf>,

        /// Row format
        #[arg(long, value_enum, default_value_t = Format::Mnemonic)]
        format: Format,

        /// Worker threads (default: all cores)
        #[arg(long)]
        threads: Option<usize>,

        /// Single-threaded walk
        #[arg(long)]
        sequential: bool,

        /// Seeds per work unit
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: u32,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Decode target lines ($trustwallet$... / $cakewallet$...) to fingerprints
    Decode {
        /// Target lines
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        lines: Vec<String>,

        /// Targets file (one line per target)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Fail if any line is rejected
        #[arg(long)]
        strict: bool,
    },

    /// Print entropy and mnemonic for one seed
    Single {
        /// The seed
        seed: u32,

        #[command(flatten)]
        length: LengthArgs,

        /// Byte extraction rule
        #[arg(long, value_enum, default_value_t = Extraction::Libstdcxx)]
        extraction: Extraction,
    },

    /// Run benchmark
    Bench {
        #[command(flatten)]
        length: LengthArgs,

        /// Byte extraction rule
        #[arg(long, value_enum, default_value_t = Extraction::Libstdcxx)]
        extraction: Extraction,

        /// Output JSON for benchmark runner
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Walk {
            start,
            end,
            from_date,
            to_date,
            length,
            extraction,
            language,
            wordlist,
            format,
            threads,
            sequential,
            chunk_size,
            output,
            no_progress,
        } => {
            let range = match (from_date, to_date) {
                (Some(from), Some(to)) => SeedRange::from_dates(&from, &to)?,
                _ => SeedRange::new(start, end)?,
            };
            let config = WalkConfig::default()
                .with_range(range)
                .with_length(length.length()?)
                .with_extraction(extraction);

            let dictionary = match wordlist {
                Some(path) => Dictionary::from_file(&path)?,
                None => Dictionary::for_language(language).clone(),
            };

            if let Some(n) = threads {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build_global()
                    .context("Failed to configure thread pool")?;
            }

            let out: Box<dyn Output> = match output {
                Some(path) => Box::new(ConsoleOutput::to_file(&path, format)?),
                None => Box::new(ConsoleOutput::new(format)),
            };

            let options = RunOptions {
                chunk_size,
                parallel: !sequential,
                progress: !no_progress,
                ..RunOptions::default()
            };

            run_walk(config, &dictionary, out.as_ref(), &options)
        }

        Command::Decode { lines, file, strict } => run_decode(lines, file, strict),

        Command::Single {
            seed,
            length,
            extraction,
        } => run_single(seed, length.length()?, extraction),

        Command::Bench {
            length,
            extraction,
            json,
        } => mtwalk::benchmark::run_benchmark(length.length()?, extraction, json),
    }
}

fn run_walk(config: WalkConfig, dictionary: &Dictionary, output: &dyn Output, options: &RunOptions) -> Result<()> {
    let walker = Walker::new(config, dictionary)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::Relaxed);
    })
    .context("Failed to install Ctrl-C handler")?;

    let stats = walker.run(output, &stop, options)?;

    info!(
        seeds = stats.seeds_processed,
        completed = stats.completed,
        elapsed_secs = stats.elapsed.as_secs_f64(),
        "done"
    );
    if let (false, Some(seed)) = (stats.completed, stats.last_seed) {
        eprintln!("Interrupted. Resume with --start {}", seed as u64 + 1);
    }

    Ok(())
}

fn run_decode(lines: Vec<String>, file: Option<PathBuf>, strict: bool) -> Result<()> {
    let set = match file {
        Some(path) => TargetSet::load(&path)?,
        None => TargetSet::from_lines(&lines),
    };

    for target in set.targets() {
        println!("{}", describe(target));
    }

    let rejected = set.rejected().len();
    info!(accepted = set.count(), rejected, "decoded targets");

    if strict && rejected > 0 {
        bail!("{} target line(s) rejected", rejected);
    }

    Ok(())
}

fn describe(target: &Target) -> String {
    let meta = match target.wallet {
        Wallet::TrustWallet { purpose, timestamp } => {
            format!("{} purpose={} timestamp={}", target.wallet.as_str(), purpose, timestamp)
        }
        Wallet::CakeWallet => target.wallet.as_str().to_string(),
    };
    format!("{},{},{}", target.fingerprint, target.kind.as_str(), meta)
}

fn run_single(seed: u32, length: EntropyLength, extraction: Extraction) -> Result<()> {
    let config = WalkConfig::default()
        .with_range(SeedRange::new(seed as u64, seed as u64)?)
        .with_length(length)
        .with_extraction(extraction);
    let walker = Walker::new(config, Dictionary::english())?;
    let record = walker.record(seed);

    println!("Seed:       {}", record.seed);
    println!("Extraction: {}", extraction.as_str());
    println!("Entropy:    {}", hex::encode(&record.entropy));
    println!("Mnemonic:   {}", record.mnemonic);

    Ok(())
}
