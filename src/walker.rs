//! Seed-space walker - enumerate seeds and reproduce their mnemonics.
//!
//! [`Walker::walk`] is a lazy, single-threaded sequence that the caller can
//! stop at any point by dropping it. [`Walker::run`] covers the same range
//! with rayon and writes every record to an [`Output`] in seed order.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::entropy::{self, EntropyLength, Extraction};
use crate::error::ConfigError;
use crate::mnemonic::{self, Dictionary, Mnemonic};
use crate::output::Output;

/// Seeds per work unit in [`Walker::run`].
pub const DEFAULT_CHUNK_SIZE: u32 = 4096;

/// Inclusive, non-empty range of 32-bit seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedRange {
    start: u32,
    end: u32,
}

impl SeedRange {
    /// The whole 32-bit seed space.
    pub const FULL: SeedRange = SeedRange { start: 0, end: u32::MAX };

    pub fn new(start: u64, end: u64) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::EmptyRange { start, end });
        }
        let start = u32::try_from(start).map_err(|_| ConfigError::SeedOutOfRange(start))?;
        let end = u32::try_from(end).map_err(|_| ConfigError::SeedOutOfRange(end))?;
        Ok(Self { start, end })
    }

    /// Unix seconds from `start_date` 00:00:00 to `end_date` 23:59:59 UTC.
    pub fn from_dates(start_date: &str, end_date: &str) -> Result<Self, ConfigError> {
        let start = unix_seconds(start_date, NaiveTime::MIN)?;
        let end = unix_seconds(end_date, day_end())?;
        Self::new(start, end)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of seeds, `end - start + 1` (up to 2^32).
    pub fn len(&self) -> u64 {
        self.end as u64 - self.start as u64 + 1
    }

    pub fn contains(&self, seed: u32) -> bool {
        (self.start..=self.end).contains(&seed)
    }

    /// Consecutive sub-ranges of at most `size` seeds covering this range.
    pub fn chunks(&self, size: u32) -> impl Iterator<Item = SeedRange> {
        let size = size.max(1) as u64;
        let end = self.end as u64;
        (self.start as u64..=end)
            .step_by(size as usize)
            .map(move |start| SeedRange {
                start: start as u32,
                end: (start + size - 1).min(end) as u32,
            })
    }
}

fn day_end() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

fn unix_seconds(date: &str, time: NaiveTime) -> Result<u64, ConfigError> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| ConfigError::InvalidDate(format!("{}: {}", date, e)))?;
    let timestamp = date.and_time(time).and_utc().timestamp();
    u64::try_from(timestamp)
        .map_err(|_| ConfigError::InvalidDate(format!("{} is before the Unix epoch", date)))
}

/// Parameters of one walk, validated by [`Walker::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkConfig {
    pub start: u64,
    pub end: u64,
    pub length: EntropyLength,
    pub extraction: Extraction,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            start: SeedRange::FULL.start as u64,
            end: SeedRange::FULL.end as u64,
            length: EntropyLength::default(),
            extraction: Extraction::default(),
        }
    }
}

impl WalkConfig {
    /// Range with an entropy size given in bytes.
    pub fn new(start: u64, end: u64, entropy_bytes: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            start,
            end,
            length: EntropyLength::from_bytes(entropy_bytes)?,
            extraction: Extraction::default(),
        })
    }

    pub fn with_range(mut self, range: SeedRange) -> Self {
        self.start = range.start as u64;
        self.end = range.end as u64;
        self
    }

    pub fn with_length(mut self, length: EntropyLength) -> Self {
        self.length = length;
        self
    }

    pub fn with_extraction(mut self, extraction: Extraction) -> Self {
        self.extraction = extraction;
        self
    }
}

/// One walked seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'d> {
    pub seed: u32,
    pub entropy: Vec<u8>,
    pub mnemonic: Mnemonic<'d>,
}

/// Tuning for [`Walker::run`].
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Seeds per chunk
    pub chunk_size: u32,
    /// Chunks processed concurrently before their records are written
    pub window: usize,
    pub parallel: bool,
    pub progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            window: rayon::current_num_threads() * 4,
            parallel: true,
            progress: true,
        }
    }
}

/// Result of [`Walker::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// Records written, always a prefix of the range
    pub seeds_processed: u64,
    /// Last seed written, if any
    pub last_seed: Option<u32>,
    /// False when the stop flag ended the walk
    pub completed: bool,
    pub elapsed: Duration,
}

/// Reproduces mnemonics for every seed of a validated range.
#[derive(Debug, Clone)]
pub struct Walker<'d> {
    range: SeedRange,
    length: EntropyLength,
    extraction: Extraction,
    dictionary: &'d Dictionary,
}

impl<'d> Walker<'d> {
    pub fn new(config: WalkConfig, dictionary: &'d Dictionary) -> Result<Self, ConfigError> {
        Ok(Self {
            range: SeedRange::new(config.start, config.end)?,
            length: config.length,
            extraction: config.extraction,
            dictionary,
        })
    }

    pub fn range(&self) -> SeedRange {
        self.range
    }

    pub fn length(&self) -> EntropyLength {
        self.length
    }

    pub fn extraction(&self) -> Extraction {
        self.extraction
    }

    /// Entropy and mnemonic for a single seed.
    pub fn record(&self, seed: u32) -> Record<'d> {
        let entropy = entropy::generate_with(seed, self.length, self.extraction);
        let mnemonic = mnemonic::encode_valid(&entropy, self.length, self.dictionary);
        Record { seed, entropy, mnemonic }
    }

    /// Lazy walk over the whole range, in increasing seed order.
    pub fn walk(&self) -> Walk<'d> {
        Walk {
            walker: self.clone(),
            next: self.range.start as u64,
            end: self.range.end as u64,
        }
    }

    /// Walk the range with rayon, writing records to `output` in seed order.
    ///
    /// Chunks are processed a window at a time; a window is written out before
    /// the next one starts, so at most `window * chunk_size` records are held
    /// in memory. `stop` is polled between seeds. When it is raised, the
    /// records written so far are still a contiguous prefix of the range.
    pub fn run(&self, output: &dyn Output, stop: &AtomicBool, options: &RunOptions) -> Result<WalkStats> {
        let started = Instant::now();
        let total = self.range.len();

        let pb = if options.progress {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(crate::default_progress_style());

        info!(
            start = self.range.start,
            end = self.range.end,
            seeds = total,
            length = %self.length,
            extraction = self.extraction.as_str(),
            parallel = options.parallel,
            "walk started"
        );

        let window = options.window.max(1);
        let mut chunks = self.range.chunks(options.chunk_size);
        let mut processed = 0u64;
        let mut last_seed = None;
        let mut completed = true;

        'windows: loop {
            let batch: Vec<SeedRange> = chunks.by_ref().take(window).collect();
            let Some(first) = batch.first() else {
                break;
            };
            debug!(chunks = batch.len(), first_seed = first.start, "processing window");

            let results: Vec<(Vec<Record<'d>>, bool)> = if options.parallel {
                batch.par_iter().map(|chunk| self.collect_chunk(*chunk, stop)).collect()
            } else {
                batch.iter().map(|chunk| self.collect_chunk(*chunk, stop)).collect()
            };

            for (records, finished) in &results {
                output.records(records)?;
                processed += records.len() as u64;
                pb.inc(records.len() as u64);
                if let Some(record) = records.last() {
                    last_seed = Some(record.seed);
                }
                if !finished {
                    completed = false;
                    break 'windows;
                }
            }
        }

        output.flush()?;
        pb.finish_and_clear();

        let stats = WalkStats {
            seeds_processed: processed,
            last_seed,
            completed,
            elapsed: started.elapsed(),
        };

        if completed {
            info!(seeds = processed, elapsed = ?stats.elapsed, "walk finished");
        } else {
            warn!(seeds = processed, last_seed = ?last_seed, "walk stopped early");
        }

        Ok(stats)
    }

    /// Records for one chunk, and whether the chunk ran to the end.
    fn collect_chunk(&self, chunk: SeedRange, stop: &AtomicBool) -> (Vec<Record<'d>>, bool) {
        let mut records = Vec::with_capacity(chunk.len() as usize);
        let mut entropy = vec![0u8; self.length.byte_len()];

        for seed in chunk.start..=chunk.end {
            if stop.load(Ordering::Relaxed) {
                return (records, false);
            }
            entropy::generate_into(seed, self.extraction, &mut entropy);
            let mnemonic = mnemonic::encode_valid(&entropy, self.length, self.dictionary);
            records.push(Record {
                seed,
                entropy: entropy.clone(),
                mnemonic,
            });
        }

        (records, true)
    }
}

/// Lazy record sequence returned by [`Walker::walk`].
#[derive(Debug, Clone)]
pub struct Walk<'d> {
    walker: Walker<'d>,
    next: u64,
    end: u64,
}

impl Walk<'_> {
    /// Seeds not yet yielded, up to 2^32.
    pub fn remaining(&self) -> u64 {
        (self.end + 1).saturating_sub(self.next)
    }
}

impl<'d> Iterator for Walk<'d> {
    type Item = Record<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.end {
            return None;
        }
        // next <= end <= u32::MAX
        let seed = self.next as u32;
        self.next += 1;
        Some(self.walker.record(seed))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

// 2^32 seeds do not fit a 32-bit usize.
#[cfg(target_pointer_width = "64")]
impl ExactSizeIterator for Walk<'_> {}

impl FusedIterator for Walk<'_> {}

/// Walk `[start, end]` with the English dictionary and `bx seed` extraction.
pub fn walk(start: u64, end: u64, entropy_bytes: usize) -> Result<Walk<'static>, ConfigError> {
    let config = WalkConfig::new(start, end, entropy_bytes)?;
    Ok(Walker::new(config, Dictionary::english())?.walk())
}
