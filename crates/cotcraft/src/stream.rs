//! Re-assembling frames from a byte stream such as a serial link.

use std::time::{Duration, Instant};

use tracing::warn;

use crate::{errors::ProbeError, interpreter::Interpreter};

/// Cuts a byte stream into frames using [Interpreter::expected_length].
///
/// Bytes that cannot start a known message are discarded. A partial frame that
/// sees no new bytes for `max_idle` is dropped on the next push.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    buf: Vec<u8>,
    expected: Option<usize>,
    last: Option<Instant>,
    max_idle: Duration,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(2);

    pub fn new() -> Self {
        Self::with_max_idle(Self::DEFAULT_MAX_IDLE)
    }

    pub fn with_max_idle(max_idle: Duration) -> Self {
        Self {
            buf: Vec::new(),
            expected: None,
            last: None,
            max_idle,
        }
    }

    /// Bytes buffered towards the next frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn push(&mut self, interp: &Interpreter, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.push_at(interp, chunk, Instant::now())
    }

    /// Like [FrameAssembler::push], with the arrival time supplied by the caller.
    pub fn push_at(&mut self, interp: &Interpreter, chunk: &[u8], now: Instant) -> Vec<Vec<u8>> {
        if let Some(last) = self.last {
            if !self.buf.is_empty() && now.saturating_duration_since(last) > self.max_idle {
                warn!(bytes = self.buf.len(), "dropping stale partial frame");
                self.reset();
            }
        }
        self.last = Some(now);
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while !self.buf.is_empty() {
            let expected = match self.expected {
                Some(expected) => expected,
                None => match interp.expected_length(&self.buf) {
                    Ok(len) if len >= 2 => len,
                    Ok(len) => {
                        warn!(declared = len, bytes = self.buf.len(), "discarding frame with invalid length");
                        self.reset();
                        break;
                    }
                    Err(ProbeError::TooShort) => break,
                    Err(ProbeError::UnknownType(id)) => {
                        warn!(type_id = id, bytes = self.buf.len(), "discarding bytes of unknown message type");
                        self.reset();
                        break;
                    }
                },
            };

            if self.buf.len() < expected {
                self.expected = Some(expected);
                break;
            }

            frames.push(self.buf.drain(..expected).collect());
            self.expected = None;
        }

        frames
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.expected = None;
    }
}
