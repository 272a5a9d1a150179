//! Shared weight storage for n-tuple networks.
//!
//! A [`WeightStore`] is a list of tables of `f32` weights. Each weight is kept
//! in an [`AtomicU32`] holding its bit pattern, so agents on different threads
//! can read and accumulate into the same store through an `Arc` without locks
//! and without losing concurrent additions.
//!
//! # File format
//!
//! Weight files are little-endian:
//!
//! ```text
//! u32             table count
//! per table:
//!   u64           entry count
//!   f32 × count   weights
//! ```

use std::{
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
    sync::atomic::{AtomicU32, Ordering},
};

use crate::{ConfigurationError, IndexOutOfRange, PersistenceError};

const READ_CHUNK: usize = 4096;

/// Location of one weight: a table and a key inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Feature {
    pub table: usize,
    pub key: usize,
}

/// One table of atomically updated weights.
pub struct WeightTable {
    weights: Box<[AtomicU32]>,
}

impl fmt::Debug for WeightTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightTable")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl WeightTable {
    /// Creates a table of `len` zero weights.
    ///
    /// The memory comes from a zeroed allocation and is not touched here, so
    /// large tables only cost what is later written to.
    fn zeroed(len: usize) -> Self {
        Self {
            weights: bytemuck::allocation::zeroed_slice_box(len),
        }
    }

    fn from_weights(weights: Vec<AtomicU32>) -> Self {
        Self {
            weights: weights.into_boxed_slice(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Returns the weight at `key`, or `None` if it is out of range.
    #[must_use]
    pub fn get(&self, key: usize) -> Option<f32> {
        self.weights
            .get(key)
            .map(|cell| f32::from_bits(cell.load(Ordering::Relaxed)))
    }

    /// Iterates over every weight in key order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.weights
            .iter()
            .map(|cell| f32::from_bits(cell.load(Ordering::Relaxed)))
    }

    fn add(cell: &AtomicU32, delta: f32) {
        // The closure never declines, so the update always succeeds.
        let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f32::from_bits(bits) + delta).to_bits())
        });
    }
}

/// Ordered list of weight tables shared by every agent in a run.
///
/// A store starts out uninitialized. It gets its shape either from
/// [`WeightStore::initialize`] or by being read from a file with
/// [`WeightStore::load`].
#[derive(Debug, Default)]
pub struct WeightStore {
    tables: Vec<WeightTable>,
}

impl WeightStore {
    /// Creates an uninitialized store with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with one zeroed table per entry of `sizes`.
    pub fn with_sizes(sizes: &[usize]) -> Result<Self, ConfigurationError> {
        let mut store = Self::new();
        store.initialize(sizes)?;
        Ok(store)
    }

    /// Creates one zeroed table per entry of `sizes`, in order.
    ///
    /// Fails if `sizes` is empty or has a zero, or if the store already has
    /// tables.
    pub fn initialize(&mut self, sizes: &[usize]) -> Result<(), ConfigurationError> {
        if self.is_initialized() {
            return Err(ConfigurationError::AlreadyInitialized);
        }
        if sizes.is_empty() {
            return Err(ConfigurationError::MissingSizes);
        }
        if sizes.contains(&0) {
            return Err(ConfigurationError::NonPositiveSize);
        }
        self.tables = sizes.iter().map(|&len| WeightTable::zeroed(len)).collect();
        log::info!(
            "initialized {} weight tables, {} weights in total",
            sizes.len(),
            sizes.iter().sum::<usize>()
        );
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.tables.is_empty()
    }

    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn table_sizes(&self) -> Vec<usize> {
        self.tables.iter().map(WeightTable::len).collect()
    }

    #[must_use]
    pub fn table(&self, index: usize) -> Option<&WeightTable> {
        self.tables.get(index)
    }

    #[must_use]
    pub fn tables(&self) -> &[WeightTable] {
        &self.tables
    }

    /// Returns the weight at `key` of table `table`.
    pub fn read(&self, table: usize, key: usize) -> Result<f32, IndexOutOfRange> {
        self.tables
            .get(table)
            .and_then(|t| t.get(key))
            .ok_or(IndexOutOfRange { table, key })
    }

    /// Adds `delta` to the weight at `key` of table `table`.
    ///
    /// Concurrent calls on the same weight are all reflected in the result.
    pub fn accumulate(&self, table: usize, key: usize, delta: f32) -> Result<(), IndexOutOfRange> {
        let cell = self
            .tables
            .get(table)
            .and_then(|t| t.weights.get(key))
            .ok_or(IndexOutOfRange { table, key })?;
        WeightTable::add(cell, delta);
        Ok(())
    }

    /// Returns the weight of a feature produced by a network whose layout was
    /// checked against this store.
    ///
    /// # Panics
    ///
    /// Panics if the feature is out of range.
    pub(crate) fn weight(&self, feature: Feature) -> f32 {
        f32::from_bits(self.tables[feature.table].weights[feature.key].load(Ordering::Relaxed))
    }

    /// Adds `delta` to the weight of a feature, see [`WeightStore::weight`].
    pub(crate) fn add(&self, feature: Feature, delta: f32) {
        WeightTable::add(&self.tables[feature.table].weights[feature.key], delta);
    }

    /// Reads a complete store from `path`.
    ///
    /// The result is either the whole file or an error; a partially read
    /// store is never returned.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let io_error = |source| PersistenceError::Io {
            path: path.to_owned(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        let file_len = file.metadata().map_err(io_error)?.len();
        let mut reader = BufReader::new(file);
        let store = read_tables(&mut reader, file_len).map_err(|e| match e {
            ReadError::Io(source) => io_error(source),
            ReadError::Format(reason) => PersistenceError::Format {
                path: path.to_owned(),
                reason,
            },
        })?;
        log::info!(
            "loaded {} weight tables from {}",
            store.table_count(),
            path.display()
        );
        Ok(store)
    }

    /// Writes every table to `path`, replacing the file.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let io_error = |source| PersistenceError::Io {
            path: path.to_owned(),
            source,
        };
        let count = u32::try_from(self.tables.len()).map_err(|_| PersistenceError::Format {
            path: path.to_owned(),
            reason: format!("too many tables ({})", self.tables.len()),
        })?;
        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        write_tables(&mut writer, count, &self.tables).map_err(io_error)?;
        log::info!(
            "saved {} weight tables to {}",
            self.table_count(),
            path.display()
        );
        Ok(())
    }
}

enum ReadError {
    Io(io::Error),
    Format(String),
}

impl From<io::Error> for ReadError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::Format("unexpected end of file".to_owned())
        } else {
            Self::Io(e)
        }
    }
}

fn read_tables<R>(reader: &mut R, file_len: u64) -> Result<WeightStore, ReadError>
where
    R: Read,
{
    let mut remaining = file_len;
    let mut take = |n: u64| {
        remaining = remaining
            .checked_sub(n)
            .ok_or_else(|| ReadError::Format("unexpected end of file".to_owned()))?;
        Ok::<_, ReadError>(())
    };

    let mut word = [0; 4];
    take(4)?;
    reader.read_exact(&mut word)?;
    let count = u32::from_le_bytes(word);
    if count == 0 {
        return Err(ReadError::Format("file holds no tables".to_owned()));
    }

    let mut tables = Vec::new();
    let mut buf = vec![0; READ_CHUNK * 4];
    for index in 0..count {
        let mut long = [0; 8];
        take(8)?;
        reader.read_exact(&mut long)?;
        let len = u64::from_le_bytes(long);
        if len == 0 {
            return Err(ReadError::Format(format!("table {index} is empty")));
        }
        take(len.saturating_mul(4))?;
        let len = usize::try_from(len)
            .map_err(|_| ReadError::Format(format!("table {index} is too large")))?;

        let mut weights = Vec::with_capacity(len);
        while weights.len() < len {
            let chunk = (len - weights.len()).min(READ_CHUNK);
            let bytes = &mut buf[..chunk * 4];
            reader.read_exact(bytes)?;
            weights.extend(
                bytes
                    .chunks_exact(4)
                    .map(|b| AtomicU32::new(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))),
            );
        }
        tables.push(WeightTable::from_weights(weights));
    }
    Ok(WeightStore { tables })
}

fn write_tables<W>(writer: &mut W, count: u32, tables: &[WeightTable]) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(&count.to_le_bytes())?;
    for table in tables {
        writer.write_all(&(table.len() as u64).to_le_bytes())?;
        for weight in table.iter() {
            writer.write_all(&weight.to_le_bytes())?;
        }
    }
    writer.flush()
}
