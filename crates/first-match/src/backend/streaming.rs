//! Chunked streaming backend.
//!
//! A is consumed one chunk at a time. For each A chunk, B is replayed
//! chunk by chunk in arrival order and probed with the fused
//! first-before operator; the first B chunk that yields a survivor for an
//! A row holds that row's earliest survivor, so later chunks only fill
//! rows that are still open. The replay stops once every row of the A
//! chunk is matched.
//!
//! Live state is one A chunk, one B chunk and its hash table, plus the
//! accumulated result.

use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use arrow::datatypes::UInt64Type;

use super::frame::{column, pairs_batch, result_pairs, result_table, stream_frame, A_IDX, B_IDX};
use super::ops::probe_first_before;
use super::JoinBackend;
use crate::error::{MatchError, Result};
use crate::io::{batch_to_stream, open_ipc, ColumnNames};
use crate::stream::EventStream;
use crate::table::MatchTable;

/// Fallible iterator of stream-frame chunks.
pub type Chunks<'a> = Box<dyn Iterator<Item = Result<RecordBatch>> + 'a>;

/// Something that can replay a stream as frames of bounded size.
///
/// Each call to [`ChunkSource::chunks`] starts again from row 0. Frames
/// carry `index_column` holding absolute row positions.
pub trait ChunkSource {
    fn chunks(&self, index_column: &'static str, chunk_size: usize) -> Result<Chunks<'_>>;
}

/// In-memory stream; each chunk is framed on demand from its row range.
#[derive(Debug, Clone)]
pub struct MemorySource<'s> {
    stream: &'s EventStream,
}

impl<'s> MemorySource<'s> {
    pub fn new(stream: &'s EventStream) -> Self {
        Self { stream }
    }
}

impl ChunkSource for MemorySource<'_> {
    fn chunks(&self, index_column: &'static str, chunk_size: usize) -> Result<Chunks<'_>> {
        let rows = self.stream.len();
        let chunk_size = chunk_size.max(1);
        Ok(Box::new((0..rows).step_by(chunk_size).map(
            move |offset| -> Result<RecordBatch> {
                let end = (offset + chunk_size).min(rows);
                stream_frame(&self.stream.slice(offset..end), index_column, offset as u64)
            },
        )))
    }
}

/// Arrow IPC file read one record batch at a time.
#[derive(Debug, Clone)]
pub struct IpcSource {
    path: PathBuf,
    names: ColumnNames,
}

impl IpcSource {
    pub fn new(path: impl Into<PathBuf>, names: ColumnNames) -> Self {
        Self {
            path: path.into(),
            names,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChunkSource for IpcSource {
    fn chunks(&self, index_column: &'static str, chunk_size: usize) -> Result<Chunks<'_>> {
        let reader = open_ipc(&self.path)?;
        let mut next_row = 0u64;
        let names = &self.names;
        let chunk_size = chunk_size.max(1);
        let frames = reader.map(move |batch| -> Result<Vec<RecordBatch>> {
            let stream = batch_to_stream(&batch?, names)?;
            let frame = stream_frame(&stream, index_column, next_row)?;
            next_row += stream.len() as u64;
            let rows = frame.num_rows();
            Ok((0..rows)
                .step_by(chunk_size)
                .map(|offset| frame.slice(offset, chunk_size.min(rows - offset)))
                .collect())
        });
        Ok(Box::new(frames.flat_map(|chunks| match chunks {
            Ok(chunks) => chunks.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        })))
    }
}

/// Streaming backend with a fixed chunk size.
#[derive(Debug, Clone, Copy)]
pub struct StreamingBackend {
    chunk_size: usize,
}

impl StreamingBackend {
    /// # Errors
    ///
    /// [`MatchError::InvalidChunkSize`] if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(MatchError::InvalidChunkSize);
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Run over two chunk sources. Returns the number of A rows seen and
    /// the matched pairs ordered by `a_idx`.
    pub fn execute_sources(
        &self,
        a: &dyn ChunkSource,
        b: &dyn ChunkSource,
    ) -> Result<(usize, RecordBatch)> {
        let mut a_rows = 0usize;
        let mut results = Vec::new();
        let mut b_passes = 0usize;

        for a_chunk in a.chunks(A_IDX, self.chunk_size)? {
            let a_chunk = a_chunk?;
            let rows = a_chunk.num_rows();
            a_rows += rows;
            if rows == 0 {
                continue;
            }
            let first = column::<UInt64Type>(&a_chunk, A_IDX)?.value(0);
            let mut best: Vec<Option<u64>> = vec![None; rows];
            let mut open = rows;

            for b_chunk in b.chunks(B_IDX, self.chunk_size)? {
                if open == 0 {
                    break;
                }
                b_passes += 1;
                let found = probe_first_before(&a_chunk, &b_chunk?)?;
                for (a_idx, b_idx) in result_pairs(&found)? {
                    let slot = &mut best[(a_idx - first) as usize];
                    if slot.is_none() {
                        *slot = Some(b_idx);
                        open -= 1;
                    }
                }
            }

            let pairs: Vec<(u64, u64)> = best
                .iter()
                .enumerate()
                .filter_map(|(i, b)| b.map(|b| (first + i as u64, b)))
                .collect();
            results.push(pairs_batch(&pairs)?);
        }

        let merged = concat_batches(&MatchTable::schema(), &results)?;
        tracing::debug!(
            chunk_size = self.chunk_size,
            a_rows,
            b_passes,
            matched = merged.num_rows(),
            "streaming backend"
        );
        Ok((a_rows, merged))
    }

    /// Run directly over two IPC files without loading either stream.
    pub fn execute_ipc(&self, a: &Path, b: &Path, names: &ColumnNames) -> Result<MatchTable> {
        let (a_rows, batch) = self.execute_sources(
            &IpcSource::new(a, names.clone()),
            &IpcSource::new(b, names.clone()),
        )?;
        result_table(a_rows, &batch)
    }
}

impl JoinBackend for StreamingBackend {
    fn name(&self) -> &'static str {
        "streaming"
    }

    fn execute(&self, a: &EventStream, b: &EventStream) -> Result<MatchTable> {
        let (a_rows, batch) = self.execute_sources(&MemorySource::new(a), &MemorySource::new(b))?;
        result_table(a_rows, &batch)
    }
}
