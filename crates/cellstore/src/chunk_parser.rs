//! Reassembly of streamed cell chunks into complete rows.
//!
//! The parser is an explicit, resumable state object: it holds the buffer
//! of partially received cell data and the last committed row key across
//! stream breaks. Resuming after a break is just constructing a new stream
//! with an updated start key and feeding it to the same parser, after
//! discarding any uncommitted row.

use bytes::{Bytes, BytesMut};

use cellstore_protocol::{Cell, CellChunk, Row, RowStatus};

use crate::error::{Error, Result};

/// A cell whose value is still arriving in fragments.
struct CellInProgress {
    timestamp_micros: i64,
    value: BytesMut,
}

/// A row whose commit chunk has not arrived yet.
struct RowInProgress {
    key: String,
    cells: Vec<Cell>,
    /// Carry-over column family for chunks that omit it.
    family: Option<String>,
    /// Carry-over column qualifier for chunks that omit it.
    qualifier: Option<Bytes>,
    cell: Option<CellInProgress>,
}

/// Incremental parser turning a chunk stream into complete [`Row`] values.
///
/// A single row may span many chunks and a single response may complete
/// several rows; the parser yields each row the moment its commit marker
/// arrives. Malformed streams surface as [`Error::Protocol`] and are never
/// silently dropped.
pub(crate) struct ChunkParser {
    last_committed_key: Option<String>,
    row: Option<RowInProgress>,
}

impl ChunkParser {
    pub(crate) fn new() -> Self {
        Self {
            last_committed_key: None,
            row: None,
        }
    }

    /// The key of the last fully committed row, i.e. the resume point.
    pub(crate) fn last_committed_key(&self) -> Option<&str> {
        self.last_committed_key.as_deref()
    }

    /// Discard any partially received row.
    ///
    /// Called when the underlying stream breaks: the reopened stream
    /// re-sends the interrupted row from its beginning.
    pub(crate) fn cancel_row(&mut self) {
        self.row = None;
    }

    /// Record that the server has scanned up to `key` even though no row
    /// was produced for it (e.g. the filter removed it). Advances the
    /// resume point.
    pub(crate) fn note_last_scanned(&mut self, key: &str) {
        // While a row is mid-flight the marker is ambiguous; skip it. Stale
        // markers never move the resume point backwards.
        if self.row.is_some() {
            return;
        }
        if let Some(last) = &self.last_committed_key
            && key <= last.as_str()
        {
            return;
        }
        self.last_committed_key = Some(key.to_owned());
    }

    /// Feed one chunk; returns a row when the chunk committed one.
    pub(crate) fn handle_chunk(&mut self, chunk: CellChunk) -> Result<Option<Row>> {
        if chunk.row_status == Some(RowStatus::ResetRow) {
            return self.handle_reset(chunk);
        }

        self.establish_row(&chunk)?;
        let Some(row) = self.row.as_mut() else {
            return Err(Error::Internal("row state missing after establish_row".into()));
        };

        if row.cell.is_some() {
            // Continuation of a fragmented cell value.
            if chunk.family_name.is_some() || chunk.column_qualifier.is_some() {
                return Err(Error::Protocol(
                    "new column started while a cell value is incomplete".into(),
                ));
            }
            if chunk.value_continues {
                if let Some(cell) = row.cell.as_mut() {
                    cell.value.extend_from_slice(&chunk.value);
                }
            } else if let Some(mut cell) = row.cell.take() {
                cell.value.extend_from_slice(&chunk.value);
                row.cells.push(Cell {
                    family_name: row.family.clone().ok_or_else(missing_family)?,
                    column_qualifier: row.qualifier.clone().ok_or_else(missing_qualifier)?,
                    timestamp_micros: cell.timestamp_micros,
                    value: cell.value.freeze(),
                });
            }
        } else if starts_cell(&chunk) {
            if chunk.family_name.is_some() && chunk.column_qualifier.is_none() {
                return Err(Error::Protocol(
                    "chunk sets a column family without a qualifier".into(),
                ));
            }
            if let Some(family) = chunk.family_name {
                row.family = Some(family);
            }
            if let Some(qualifier) = chunk.column_qualifier {
                row.qualifier = Some(qualifier);
            }
            if chunk.value_continues {
                let mut value = BytesMut::with_capacity(chunk.value.len());
                value.extend_from_slice(&chunk.value);
                row.cell = Some(CellInProgress {
                    timestamp_micros: chunk.timestamp_micros,
                    value,
                });
            } else {
                row.cells.push(Cell {
                    family_name: row.family.clone().ok_or_else(missing_family)?,
                    column_qualifier: row.qualifier.clone().ok_or_else(missing_qualifier)?,
                    timestamp_micros: chunk.timestamp_micros,
                    value: chunk.value,
                });
            }
        }

        match chunk.row_status {
            Some(RowStatus::CommitRow) => {
                let Some(row) = self.row.take() else {
                    return Err(Error::Internal("row state missing at commit".into()));
                };
                if row.cell.is_some() {
                    return Err(Error::Protocol(
                        "row committed while a cell value is incomplete".into(),
                    ));
                }
                self.last_committed_key = Some(row.key.clone());
                Ok(Some(Row::new(row.key, row.cells)))
            }
            _ => Ok(None),
        }
    }

    /// The stream completed; verify no row was left unfinished.
    pub(crate) fn handle_end_of_stream(&self) -> Result<()> {
        if self.row.is_some() {
            return Err(Error::Protocol(
                "stream ended with a row still in progress".into(),
            ));
        }
        Ok(())
    }

    fn handle_reset(&mut self, chunk: CellChunk) -> Result<Option<Row>> {
        if self.row.is_none() {
            return Err(Error::Protocol("reset_row with no row in progress".into()));
        }
        let carries_data = chunk.row_key.is_some()
            || chunk.family_name.is_some()
            || chunk.column_qualifier.is_some()
            || !chunk.value.is_empty()
            || chunk.value_continues;
        if carries_data {
            return Err(Error::Protocol("reset_row chunk carries data".into()));
        }
        self.row = None;
        Ok(None)
    }

    fn establish_row(&mut self, chunk: &CellChunk) -> Result<()> {
        match (&chunk.row_key, &mut self.row) {
            (Some(key), Some(row)) => {
                if *key != row.key {
                    return Err(Error::Protocol(
                        "new row key received before the previous row committed".into(),
                    ));
                }
                Ok(())
            }
            (Some(key), row_slot @ None) => {
                if let Some(last) = &self.last_committed_key
                    && key.as_str() <= last.as_str()
                {
                    return Err(Error::Protocol(format!(
                        "row keys out of order: {key:?} after {last:?}"
                    )));
                }
                *row_slot = Some(RowInProgress {
                    key: key.clone(),
                    cells: Vec::new(),
                    family: None,
                    qualifier: None,
                    cell: None,
                });
                Ok(())
            }
            (None, Some(_)) => Ok(()),
            (None, None) => Err(Error::Protocol(
                "chunk carries no row key and no row is in progress".into(),
            )),
        }
    }
}

/// Whether a chunk carries cell data, as opposed to a bare commit marker.
fn starts_cell(chunk: &CellChunk) -> bool {
    chunk.family_name.is_some()
        || chunk.column_qualifier.is_some()
        || !chunk.value.is_empty()
        || chunk.value_continues
}

fn missing_family() -> Error {
    Error::Protocol("cell data received before any column family".into())
}

fn missing_qualifier() -> Error {
    Error::Protocol("cell data received before any column qualifier".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(row_key: Option<&str>) -> CellChunk {
        CellChunk {
            row_key: row_key.map(str::to_owned),
            ..CellChunk::default()
        }
    }

    fn full_cell_chunk(row_key: Option<&str>, family: &str, qualifier: &str, value: &str) -> CellChunk {
        CellChunk {
            row_key: row_key.map(str::to_owned),
            family_name: Some(family.to_owned()),
            column_qualifier: Some(Bytes::copy_from_slice(qualifier.as_bytes())),
            timestamp_micros: 1000,
            value: Bytes::copy_from_slice(value.as_bytes()),
            value_continues: false,
            row_status: None,
        }
    }

    #[test]
    fn single_chunk_row() {
        let mut parser = ChunkParser::new();
        let mut c = full_cell_chunk(Some("r1"), "fam", "col", "value");
        c.row_status = Some(RowStatus::CommitRow);

        let row = parser.handle_chunk(c).unwrap().expect("row committed");
        assert_eq!(row.row_key(), "r1");
        assert_eq!(row.cells().len(), 1);
        assert_eq!(row.cells()[0].value, Bytes::from_static(b"value"));
        assert_eq!(parser.last_committed_key(), Some("r1"));
        parser.handle_end_of_stream().unwrap();
    }

    #[test]
    fn fragmented_value_is_reassembled() {
        let mut parser = ChunkParser::new();
        let mut first = full_cell_chunk(Some("r1"), "fam", "col", "hel");
        first.value_continues = true;
        assert!(parser.handle_chunk(first).unwrap().is_none());

        let mut last = chunk(None);
        last.value = Bytes::from_static(b"lo");
        last.row_status = Some(RowStatus::CommitRow);
        let row = parser.handle_chunk(last).unwrap().expect("row committed");
        assert_eq!(row.cells()[0].value, Bytes::from_static(b"hello"));
        assert_eq!(row.cells()[0].timestamp_micros, 1000);
    }

    #[test]
    fn family_and_qualifier_carry_over() {
        let mut parser = ChunkParser::new();
        assert!(
            parser
                .handle_chunk(full_cell_chunk(Some("r1"), "fam", "c1", "v1"))
                .unwrap()
                .is_none()
        );

        // Same family, new qualifier only.
        let mut second = chunk(None);
        second.column_qualifier = Some(Bytes::from_static(b"c2"));
        second.value = Bytes::from_static(b"v2");
        second.row_status = Some(RowStatus::CommitRow);
        let row = parser.handle_chunk(second).unwrap().expect("row committed");
        assert_eq!(row.cells().len(), 2);
        assert_eq!(row.cells()[1].family_name, "fam");
        assert_eq!(row.cells()[1].column_qualifier, Bytes::from_static(b"c2"));
    }

    #[test]
    fn one_response_may_complete_multiple_rows() {
        let mut parser = ChunkParser::new();
        let mut first = full_cell_chunk(Some("r1"), "fam", "col", "a");
        first.row_status = Some(RowStatus::CommitRow);
        let mut second = full_cell_chunk(Some("r2"), "fam", "col", "b");
        second.row_status = Some(RowStatus::CommitRow);

        assert!(parser.handle_chunk(first).unwrap().is_some());
        let row = parser.handle_chunk(second).unwrap().expect("second row");
        assert_eq!(row.row_key(), "r2");
    }

    #[test]
    fn reset_discards_partial_row() {
        let mut parser = ChunkParser::new();
        parser
            .handle_chunk(full_cell_chunk(Some("r1"), "fam", "col", "v"))
            .unwrap();

        let mut reset = chunk(None);
        reset.row_status = Some(RowStatus::ResetRow);
        assert!(parser.handle_chunk(reset).unwrap().is_none());

        // The row is re-sent from the start.
        let mut resent = full_cell_chunk(Some("r1"), "fam", "col", "v");
        resent.row_status = Some(RowStatus::CommitRow);
        let row = parser.handle_chunk(resent).unwrap().expect("row committed");
        assert_eq!(row.cells().len(), 1);
    }

    #[test]
    fn out_of_order_row_keys_are_a_protocol_error() {
        let mut parser = ChunkParser::new();
        let mut first = full_cell_chunk(Some("r2"), "fam", "col", "v");
        first.row_status = Some(RowStatus::CommitRow);
        parser.handle_chunk(first).unwrap();

        let second = full_cell_chunk(Some("r1"), "fam", "col", "v");
        assert!(matches!(
            parser.handle_chunk(second),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn commit_mid_fragment_is_a_protocol_error() {
        let mut parser = ChunkParser::new();
        let mut c = full_cell_chunk(Some("r1"), "fam", "col", "partial");
        c.value_continues = true;
        c.row_status = Some(RowStatus::CommitRow);
        assert!(matches!(parser.handle_chunk(c), Err(Error::Protocol(_))));
    }

    #[test]
    fn end_of_stream_mid_row_is_a_protocol_error() {
        let mut parser = ChunkParser::new();
        parser
            .handle_chunk(full_cell_chunk(Some("r1"), "fam", "col", "v"))
            .unwrap();
        assert!(matches!(
            parser.handle_end_of_stream(),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn missing_initial_row_key_is_a_protocol_error() {
        let mut parser = ChunkParser::new();
        let c = chunk(None);
        assert!(matches!(parser.handle_chunk(c), Err(Error::Protocol(_))));
    }

    #[test]
    fn cancel_row_preserves_resume_point() {
        let mut parser = ChunkParser::new();
        let mut first = full_cell_chunk(Some("r1"), "fam", "col", "v");
        first.row_status = Some(RowStatus::CommitRow);
        parser.handle_chunk(first).unwrap();
        parser
            .handle_chunk(full_cell_chunk(Some("r2"), "fam", "col", "v"))
            .unwrap();

        parser.cancel_row();
        assert_eq!(parser.last_committed_key(), Some("r1"));
        parser.handle_end_of_stream().unwrap();
    }

    #[test]
    fn last_scanned_key_advances_resume_point() {
        let mut parser = ChunkParser::new();
        let mut first = full_cell_chunk(Some("r1"), "fam", "col", "v");
        first.row_status = Some(RowStatus::CommitRow);
        parser.handle_chunk(first).unwrap();

        parser.note_last_scanned("r5");
        assert_eq!(parser.last_committed_key(), Some("r5"));

        // Stale markers do not move the point backwards.
        parser.note_last_scanned("r3");
        assert_eq!(parser.last_committed_key(), Some("r5"));
    }
}
