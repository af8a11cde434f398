//! Drives whole streams of lines through the decoder and resolver and hands
//! the resolved data to a [`FlashWriter`].
//!
//! Bad lines never stop a load. Each one becomes a [`Warning`] that is logged
//! and returned to the caller, and the next line is read as if nothing
//! happened. Only the writer, or the reader underneath [`Loader::load`], can
//! end a load early.

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::resolver::{dispatch, DecoderState, DispatchAction};
use crate::{decode_line, Warning, WarningKind};

#[cfg(feature = "std")]
use crate::record::MAX_LINE_LENGTH;
#[cfg(feature = "std")]
use crate::DecodeError;
#[cfg(feature = "std")]
use std::{io, io::BufRead, vec::Vec};

/// The memory being programmed.
pub trait FlashWriter {
    type Error;

    fn write(&mut self, address: u32, payload: &[u8]) -> Result<(), Self::Error>;
}

impl<W: FlashWriter + ?Sized> FlashWriter for &mut W {
    type Error = W::Error;

    fn write(&mut self, address: u32, payload: &[u8]) -> Result<(), Self::Error> {
        (**self).write(address, payload)
    }
}

/// What became of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Write { address: u32, length: usize },
    AddressUpdated(u32),
    EndOfFile,
    /// Blank line.
    Skipped,
    Warning(Warning),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub lines: usize,
    pub records: usize,
    pub bytes_written: usize,
    pub warnings: usize,
    pub end_of_file: bool,
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("writing {length} bytes at {address:#010x} failed: {error}")]
pub struct WriteFailed<E> {
    pub address: u32,
    pub length: usize,
    pub error: E,
}

#[cfg(feature = "std")]
#[derive(Debug, Error)]
pub enum LoadError<E> {
    #[error(transparent)]
    Write(#[from] WriteFailed<E>),
    #[error("failed to read input")]
    Io(#[from] io::Error),
}

pub struct Loader<W> {
    writer: W,
    state: DecoderState,
    summary: Summary,
    finished: bool,
}

impl<W: FlashWriter> Loader<W> {
    pub fn new(writer: W) -> Self {
        Loader {
            writer,
            state: DecoderState::new(),
            summary: Summary::default(),
            finished: false,
        }
    }

    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Decodes and dispatches the next line of input. A trailing line
    /// terminator is allowed.
    pub fn feed_line<T: AsRef<[u8]>>(&mut self, line: T) -> Result<Event, WriteFailed<W::Error>> {
        let line = line.as_ref();

        self.summary.lines += 1;
        let number = self.summary.lines;

        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(Event::Skipped);
        }

        let record = match decode_line(line) {
            Ok(record) => record,
            Err(err) => return Ok(Event::Warning(self.warn(number, err.into()))),
        };

        self.summary.records += 1;

        match dispatch(&mut self.state, record) {
            Ok(DispatchAction::WriteAt { address, payload }) => {
                let length = payload.len();
                trace!(line = number, address, length, "writing");

                self.writer
                    .write(address, &payload)
                    .map_err(|error| WriteFailed {
                        address,
                        length,
                        error,
                    })?;
                self.summary.bytes_written += length;

                Ok(Event::Write { address, length })
            }
            Ok(DispatchAction::AddressUpdated(base)) => {
                debug!(line = number, base, "base address updated");

                Ok(Event::AddressUpdated(base))
            }
            Ok(DispatchAction::Finish) => {
                debug!(line = number, "end of file record");
                self.summary.end_of_file = true;

                Ok(Event::EndOfFile)
            }
            Err(err) => Ok(Event::Warning(self.warn(number, err.into()))),
        }
    }

    /// Marks the end of input. Returns the truncated stream warning the first
    /// time it is called on a stream without an end-of-file record.
    pub fn finish(&mut self) -> Option<Warning> {
        if self.finished {
            return None;
        }
        self.finished = true;

        match self.state.finish() {
            Ok(()) => None,
            Err(err) => Some(self.warn(self.summary.lines, err.into())),
        }
    }

    fn warn(&mut self, line: usize, kind: WarningKind) -> Warning {
        self.summary.warnings += 1;
        warn!(line, "{}", kind);

        Warning { line, kind }
    }
}

#[cfg(feature = "std")]
impl<W: FlashWriter> Loader<W> {
    /// Reads `reader` to the end, line by line, then calls
    /// [`finish`](Loader::finish).
    pub fn load<R: BufRead>(&mut self, reader: R) -> Result<Summary, LoadError<W::Error>> {
        self.load_with(reader, |_| {})
    }

    /// Like [`load`](Loader::load), showing every event to `on_event` as it
    /// happens.
    pub fn load_with<R, F>(&mut self, mut reader: R, mut on_event: F) -> Result<Summary, LoadError<W::Error>>
    where
        R: BufRead,
        F: FnMut(&Event),
    {
        let limit = MAX_LINE_LENGTH;
        let mut line = Vec::with_capacity(limit);

        while let Some(length) = read_line(&mut reader, &mut line, limit)? {
            let event = if length > line.len() {
                self.summary.lines += 1;
                let number = self.summary.lines;

                Event::Warning(self.warn(number, DecodeError::LineTooLong { length }.into()))
            } else {
                self.feed_line(&line)?
            };

            on_event(&event);
        }

        if let Some(warning) = self.finish() {
            on_event(&Event::Warning(warning));
        }

        Ok(self.summary)
    }
}

/// Reads up to and including the next `\n`. The terminator and any trailing
/// whitespace are dropped, and at most `limit` bytes of what is left are kept
/// in `line`. Returns the length of the line without them, or `None` at the
/// end of input.
#[cfg(feature = "std")]
fn read_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>, limit: usize) -> io::Result<Option<usize>> {
    line.clear();
    let mut read = false;
    let mut position = 0;
    let mut length = 0;

    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };

        if available.is_empty() {
            break;
        }
        read = true;

        let (content, used, done) = match available.iter().position(|&c| c == b'\n') {
            Some(end) => (&available[..end], end + 1, true),
            None => (available, available.len(), false),
        };

        if let Some(last) = content.iter().rposition(|c| !c.is_ascii_whitespace()) {
            length = position + last + 1;
        }

        let room = limit.saturating_sub(line.len());
        line.extend_from_slice(&content[..content.len().min(room)]);
        position += content.len();

        reader.consume(used);

        if done {
            break;
        }
    }

    line.truncate(length);

    Ok(if read { Some(length) } else { None })
}
