//! Chunked result streaming.
//!
//! A connector produces native rows in bounded chunks and pushes them into a
//! [`chunk_channel`]. [`stream_chunks`] turns the receiving end into a
//! [`DataResult`]: it waits for the first non-empty chunk to learn the
//! columns, then yields one decoded row per pull. The channel holds a
//! single chunk, so the producer is never more than one chunk ahead of the
//! consumer. Dropping the row stream closes the channel, and the producer
//! observes that on its next send.

use crate::data_source::{DataColumn, DataResult, DataRow, DataSourceError};
use futures::{StreamExt, stream};
use tokio::sync::mpsc;

type ChunkResult<R> = Result<Vec<R>, DataSourceError>;

///
/// RowDecoder
///
/// Backend-side normalisation of native rows into canonical columns and
/// values.
///

pub trait RowDecoder: Send + Sync + 'static {
    type Row: Send + 'static;

    /// Column descriptors derived from the first row of the result.
    fn columns(&self, first: &Self::Row) -> Result<Vec<DataColumn>, DataSourceError>;

    /// Decode one row against the columns reported by `columns`.
    fn decode(&self, row: Self::Row, columns: &[DataColumn]) -> Result<DataRow, DataSourceError>;
}

/// Bounded channel carrying native chunks from a producer to the consumer.
#[must_use]
pub fn chunk_channel<R>() -> (ChunkSender<R>, ChunkReceiver<R>) {
    let (tx, rx) = mpsc::channel(1);

    (ChunkSender { tx }, ChunkReceiver { rx })
}

///
/// ChunkSender
///
/// Producer half. Both send flavours return `false` once the consumer has
/// gone away; producers should stop at that point.
///

#[derive(Debug)]
pub struct ChunkSender<R> {
    tx: mpsc::Sender<ChunkResult<R>>,
}

impl<R> ChunkSender<R> {
    pub async fn send(&self, chunk: ChunkResult<R>) -> bool {
        self.tx.send(chunk).await.is_ok()
    }

    /// For producers running on a blocking thread.
    pub fn blocking_send(&self, chunk: ChunkResult<R>) -> bool {
        self.tx.blocking_send(chunk).is_ok()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

///
/// ChunkReceiver
///

#[derive(Debug)]
pub struct ChunkReceiver<R> {
    rx: mpsc::Receiver<ChunkResult<R>>,
}

impl<R> ChunkReceiver<R> {
    /// Pull the next chunk; `Ok(None)` once the producer has finished.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<R>>, DataSourceError> {
        self.rx.recv().await.transpose()
    }
}

// Row iteration state threaded through the unfold.
struct RowCursor<D: RowDecoder> {
    decoder: D,
    chunks: ChunkReceiver<D::Row>,
    pending: std::vec::IntoIter<D::Row>,
    columns: Vec<DataColumn>,
}

impl<D: RowDecoder> RowCursor<D> {
    async fn next_row(&mut self) -> Result<Option<DataRow>, DataSourceError> {
        loop {
            if let Some(row) = self.pending.next() {
                return self.decoder.decode(row, &self.columns).map(Some);
            }

            match self.chunks.next_chunk().await? {
                Some(chunk) => self.pending = chunk.into_iter(),
                None => return Ok(None),
            }
        }
    }
}

/// Build a [`DataResult`] over a chunk channel.
///
/// Errors carried by chunks before the first row fail this call; later ones
/// surface from the row stream and end it. A result with no rows reports no
/// columns.
pub async fn stream_chunks<D: RowDecoder>(
    decoder: D,
    mut chunks: ChunkReceiver<D::Row>,
) -> Result<DataResult, DataSourceError> {
    // skip empty chunks until the first row arrives
    let first = loop {
        match chunks.next_chunk().await? {
            Some(chunk) if chunk.is_empty() => {}
            Some(chunk) => break chunk,
            None => return Ok(DataResult::empty()),
        }
    };

    let columns = match first.first() {
        Some(row) => decoder.columns(row)?,
        None => Vec::new(),
    };

    let cursor = RowCursor {
        decoder,
        chunks,
        pending: first.into_iter(),
        columns: columns.clone(),
    };

    let data = stream::try_unfold(cursor, |mut cursor| async move {
        let row = cursor.next_row().await?;
        Ok::<_, DataSourceError>(row.map(|row| (row, cursor)))
    })
    .boxed();

    Ok(DataResult::new(columns, data))
}
