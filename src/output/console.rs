//! Console output handler.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::Output;
use crate::walker::Record;

/// Second column of each output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// `seed,word word ...`
    #[default]
    Mnemonic,
    /// `seed,entropy_hex`
    Entropy,
}

/// CSV-style rows to stdout, a file or memory.
pub struct ConsoleOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    format: Format,
}

impl ConsoleOutput {
    /// Create console output to stdout.
    pub fn new(format: Format) -> Self {
        Self::with_writer(Box::new(BufWriter::new(io::stdout())), format)
    }

    /// Create output to a file, truncating it.
    pub fn to_file<P: AsRef<Path>>(path: P, format: Format) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self::with_writer(Box::new(BufWriter::new(file)), format))
    }

    /// Create output collecting rows in memory.
    pub fn in_memory(format: Format) -> (Self, MemoryBuffer) {
        let buffer = MemoryBuffer::default();
        (Self::with_writer(Box::new(buffer.clone()), format), buffer)
    }

    pub fn with_writer(writer: Box<dyn Write + Send>, format: Format) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn Write + Send>>> {
        self.writer.lock().map_err(|_| anyhow!("output writer lock poisoned"))
    }

    fn write_row(&self, w: &mut dyn Write, record: &Record<'_>) -> io::Result<()> {
        match self.format {
            Format::Mnemonic => writeln!(w, "{},{}", record.seed, record.mnemonic),
            Format::Entropy => writeln!(w, "{},{}", record.seed, hex::encode(&record.entropy)),
        }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(Format::default())
    }
}

impl Output for ConsoleOutput {
    fn record(&self, record: &Record<'_>) -> Result<()> {
        let mut w = self.lock()?;
        self.write_row(&mut **w, record)?;
        Ok(())
    }

    fn records(&self, records: &[Record<'_>]) -> Result<()> {
        let mut w = self.lock()?;
        for record in records {
            self.write_row(&mut **w, record)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut w = self.lock()?;
        w.flush()?;
        Ok(())
    }
}

/// Shared in-memory writer.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer(Arc<Mutex<Vec<u8>>>);

impl MemoryBuffer {
    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for MemoryBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::other("buffer lock poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
