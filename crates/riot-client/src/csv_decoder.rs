//! Incremental CSV record decoding
//!
//! Dataset bodies arrive in chunks that split records at arbitrary bytes.
//! The decoder keeps the partial record between chunks and hands back every
//! record a chunk completes.

use csv_core::{ReadRecordResult, Reader, ReaderBuilder};

use crate::error::{ClientError, Result};

const INITIAL_RECORD_BYTES: usize = 1024;
const INITIAL_FIELDS: usize = 16;

pub struct CsvRecordDecoder {
    reader: Reader,
    output: Vec<u8>,
    ends: Vec<usize>,
    output_len: usize,
    ends_len: usize,
    finished: bool,
}

impl Default for CsvRecordDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvRecordDecoder {
    pub fn new() -> Self {
        Self {
            reader: ReaderBuilder::new().build(),
            output: vec![0; INITIAL_RECORD_BYTES],
            ends: vec![0; INITIAL_FIELDS],
            output_len: 0,
            ends_len: 0,
            finished: false,
        }
    }

    /// Feed the next chunk of the body
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Vec<String>>> {
        // An empty input is how csv-core is told the body ended
        if chunk.is_empty() || self.finished {
            return Ok(Vec::new());
        }
        self.drive(chunk, false)
    }

    /// Signal the end of the body; yields a last record not ended by a newline
    pub fn finish(&mut self) -> Result<Vec<Vec<String>>> {
        if self.finished {
            return Ok(Vec::new());
        }
        self.drive(&[], true)
    }

    fn drive(&mut self, mut input: &[u8], eof: bool) -> Result<Vec<Vec<String>>> {
        let mut records = Vec::new();

        while !input.is_empty() || eof {
            let (result, consumed, written, ended) = self.reader.read_record(
                input,
                &mut self.output[self.output_len..],
                &mut self.ends[self.ends_len..],
            );
            input = &input[consumed..];
            self.output_len += written;
            self.ends_len += ended;

            match result {
                ReadRecordResult::InputEmpty => {
                    if eof {
                        break;
                    }
                }
                ReadRecordResult::OutputFull => {
                    let len = self.output.len();
                    self.output.resize(len * 2, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = self.ends.len();
                    self.ends.resize(len * 2, 0);
                }
                ReadRecordResult::Record => records.push(self.take_record()?),
                ReadRecordResult::End => {
                    self.finished = true;
                    break;
                }
            }
        }

        Ok(records)
    }

    fn take_record(&mut self) -> Result<Vec<String>> {
        let mut fields = Vec::with_capacity(self.ends_len);
        let mut start = 0;

        // Field ends are offsets into the whole record, not the last call's slice
        for &end in &self.ends[..self.ends_len] {
            let field = std::str::from_utf8(&self.output[start..end])
                .map_err(|e| ClientError::Decode(format!("dataset is not UTF-8: {e}")))?;
            fields.push(field.to_string());
            start = end;
        }

        self.output_len = 0;
        self.ends_len = 0;
        Ok(fields)
    }
}
