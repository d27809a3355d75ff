//! Benchmark for walker throughput.

use anyhow::Result;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::entropy::{EntropyLength, Extraction};
use crate::mnemonic::Dictionary;
use crate::walker::{SeedRange, WalkConfig, Walker};

const BATCH: u32 = 1000;

/// Seeds per second for one configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchResult {
    pub seeds: u64,
    pub duration: Duration,
}

impl BenchResult {
    pub fn per_sec(&self) -> f64 {
        self.seeds as f64 / self.duration.as_secs_f64().max(f64::EPSILON)
    }
}

/// Walk batches of seeds in parallel until `budget` has elapsed.
pub fn measure(length: EntropyLength, extraction: Extraction, budget: Duration) -> Result<BenchResult> {
    let config = WalkConfig::default()
        .with_length(length)
        .with_extraction(extraction);
    let walker = Walker::new(config, Dictionary::english())?;

    let counter = AtomicU64::new(0);
    let start = Instant::now();

    SeedRange::FULL
        .chunks(BATCH)
        .par_bridge()
        .take_any_while(|_| start.elapsed() < budget)
        .for_each(|chunk| {
            let mut words = 0usize;
            for seed in chunk.start()..=chunk.end() {
                words += walker.record(seed).mnemonic.word_count();
            }
            debug_assert_eq!(words as u64, chunk.len() * length.word_count() as u64);
            counter.fetch_add(chunk.len(), Ordering::Relaxed);
        });

    let result = BenchResult {
        seeds: counter.load(Ordering::Relaxed),
        duration: start.elapsed(),
    };
    debug!(seeds = result.seeds, duration = ?result.duration, "benchmark pass");
    Ok(result)
}

/// Run standardized benchmark for a walk configuration.
pub fn run_benchmark(length: EntropyLength, extraction: Extraction, json: bool) -> Result<()> {
    if !json {
        println!("Running Benchmark for {} ({})...", length, extraction.as_str());
        println!("Time: 2s warmup + 5s measure (approx)");
    }

    measure(length, extraction, Duration::from_secs(2))?;
    let result = measure(length, extraction, Duration::from_secs(5))?;
    let speed = result.per_sec();
    let duration = result.duration.as_secs_f64();

    if json {
        println!(
            "{{ \"name\": \"walk-{}-{}\", \"ops_per_sec\": {}, \"total_ops\": {}, \"duration_secs\": {} }}",
            length.bits(),
            extraction.as_str(),
            speed as u64,
            result.seeds,
            duration
        );
    } else {
        println!("------------------------------------------------");
        println!("Result: {:.2} Thousand Seeds/sec", speed / 1_000.0);
        println!("Total:  {} seeds in {:.2}s", result.seeds, duration);
        println!("------------------------------------------------");
    }

    Ok(())
}
