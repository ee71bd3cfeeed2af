// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Replay of raw unsigned 8-bit interleaved I/Q captures (the format written
//! by `rtl_sdr`), from a file or stdin.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::{Duration, Instant};

use sdr_audio_core::{CancelFlag, SampleSource, SourceError};
use tracing::{debug, info};

/// I/Q source backed by any byte reader.
pub struct ReaderSource<R> {
    reader: R,
    label: String,
    /// When set, buffers are released no faster than this I/Q sample rate.
    pace_hz: Option<u32>,
}

impl ReaderSource<Box<dyn Read + Send>> {
    /// Open a capture file, or stdin when `path` is `-`.
    ///
    /// Cancellation is checked between reads. A read blocked on an idle pipe
    /// cannot be interrupted, so with stdin the source stops only once more
    /// bytes or EOF arrive.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        if path.as_os_str() == "-" {
            return Ok(Self::new(Box::new(io::stdin()), "stdin"));
        }
        let file = File::open(path)
            .map_err(|e| SourceError::Open(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(
            Box::new(BufReader::new(file)),
            path.display().to_string(),
        ))
    }
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            pace_hz: None,
        }
    }

    /// Release buffers at the rate they would arrive from hardware running
    /// at `sample_rate_hz`.
    pub fn paced(mut self, sample_rate_hz: u32) -> Self {
        self.pace_hz = (sample_rate_hz > 0).then_some(sample_rate_hz);
        self
    }

    /// Where the samples come from, for log lines.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Read until `buf` is full, the reader is exhausted, or `cancel` is set.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8], cancel: &CancelFlag) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() && !cancel.is_set() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<R: Read> SampleSource for ReaderSource<R> {
    fn read_async(
        &mut self,
        buf_len: usize,
        cancel: &CancelFlag,
        on_buffer: &mut dyn FnMut(&[u8]),
    ) -> Result<(), SourceError> {
        let mut buf = vec![0u8; buf_len];
        let period = self
            .pace_hz
            .map(|rate| Duration::from_secs_f64(buf_len as f64 / 2.0 / f64::from(rate)));
        let started = Instant::now();
        let mut delivered: u32 = 0;

        loop {
            if cancel.is_set() {
                return Ok(());
            }

            let n = fill(&mut self.reader, &mut buf, cancel)?;
            if cancel.is_set() {
                debug!("{}: cancelled with {} bytes buffered", self.label, n);
                return Ok(());
            }
            if n < buf_len {
                if n > 0 {
                    debug!("{}: dropping trailing {} bytes", self.label, n);
                }
                info!("{}: end of input after {} buffers", self.label, delivered);
                return Ok(());
            }

            if let Some(period) = period {
                let due = started + period * delivered;
                let now = Instant::now();
                if due > now {
                    std::thread::sleep(due - now);
                }
            }

            on_buffer(&buf);
            delivered = delivered.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out at most `chunk` bytes per call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.chunk).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn delivers_whole_buffers_and_drops_tail() {
        let data: Vec<u8> = (0..25u8).collect();
        let mut source = ReaderSource::new(Cursor::new(data), "test");
        let mut seen: Vec<Vec<u8>> = Vec::new();
        source
            .read_async(10, &CancelFlag::new(), &mut |buf: &[u8]| seen.push(buf.to_vec()))
            .unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (0..10u8).collect::<Vec<_>>());
        assert_eq!(seen[1], (10..20u8).collect::<Vec<_>>());
    }

    #[test]
    fn reassembles_short_reads() {
        let data: Vec<u8> = (0..40u8).collect();
        let mut source = ReaderSource::new(
            Trickle {
                data,
                pos: 0,
                chunk: 3,
            },
            "trickle",
        );
        let mut lens = Vec::new();
        source
            .read_async(8, &CancelFlag::new(), &mut |buf: &[u8]| lens.push(buf.len()))
            .unwrap();
        assert_eq!(lens, vec![8; 5]);
    }

    #[test]
    fn stops_at_next_buffer_after_cancel() {
        let data = vec![127u8; 100];
        let mut source = ReaderSource::new(Cursor::new(data), "test");
        let cancel = CancelFlag::new();
        let mut count = 0;
        source
            .read_async(10, &cancel, &mut |_buf: &[u8]| {
                count += 1;
                if count == 3 {
                    cancel.set();
                }
            })
            .unwrap();
        assert_eq!(count, 3);
    }

    /// Reader that raises `cancel` after `cancel_after` reads of 10 bytes.
    struct CancelMidBuffer<'a> {
        cancel: &'a CancelFlag,
        reads: usize,
        cancel_after: usize,
    }

    impl Read for CancelMidBuffer<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.reads == self.cancel_after {
                self.cancel.set();
            }
            let n = buf.len().min(10);
            buf[..n].fill(127);
            Ok(n)
        }
    }

    #[test]
    fn cancel_is_seen_between_partial_reads() {
        let cancel = CancelFlag::new();
        let mut source = ReaderSource::new(
            CancelMidBuffer {
                cancel: &cancel,
                reads: 0,
                cancel_after: 2,
            },
            "slow pipe",
        );
        let mut count = 0;
        source
            .read_async(100, &cancel, &mut |_buf: &[u8]| count += 1)
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(source.reader.reads, 2);
    }

    #[test]
    fn pacing_spaces_buffers() {
        // 40 bytes = 20 I/Q pairs; at 1 kHz that is 20 ms per buffer.
        let data = vec![127u8; 120];
        let mut source = ReaderSource::new(Cursor::new(data), "paced").paced(1_000);
        let started = Instant::now();
        let mut count = 0;
        source
            .read_async(40, &CancelFlag::new(), &mut |_buf: &[u8]| count += 1)
            .unwrap();
        assert_eq!(count, 3);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn open_missing_file_fails() {
        let err = ReaderSource::open(Path::new("/nonexistent/capture.cu8"))
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::Open(_)));
    }
}
