//! Background image import.
//!
//! Decoding runs on worker threads; completions come back over a channel and
//! are applied by the editor when it polls. Nothing touches the scene until
//! then, and cancelled or orphaned completions are dropped.

use crate::shapes::{Image, ImageFormat};
use kurbo::Point;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Image import errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Image has no pixels")]
    Empty,
}

/// Result type for image import.
pub type ImportResult<T> = Result<T, ImportError>;

/// What a decoder learned about an image.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// The original encoded bytes, stored in the project as-is.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl DecodedImage {
    /// Build an image object geometry scaled to `width`, keeping the aspect ratio.
    pub fn to_image(&self, width: f64) -> Image {
        Image::new(&self.bytes, self.width, self.height, self.format).fit_width(width)
    }
}

/// Decodes encoded image bytes. Runs on a worker thread.
pub type Decoder = Arc<dyn Fn(&[u8]) -> ImportResult<DecodedImage> + Send + Sync>;

/// Handle for one submitted import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportTicket(u64);

/// A finished decode, delivered on the editor thread.
#[derive(Debug)]
pub struct ImportCompletion {
    pub ticket: ImportTicket,
    /// Where the user dropped the image, if anywhere.
    pub position: Option<Point>,
    pub result: ImportResult<DecodedImage>,
}

/// Outstanding imports and the channel their results arrive on.
pub struct ImportQueue {
    decoder: Decoder,
    sender: Sender<ImportCompletion>,
    receiver: Receiver<ImportCompletion>,
    pending: HashSet<ImportTicket>,
    next_ticket: u64,
}

impl std::fmt::Debug for ImportQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportQueue")
            .field("pending", &self.pending)
            .field("next_ticket", &self.next_ticket)
            .finish()
    }
}

impl ImportQueue {
    pub fn new(decoder: Decoder) -> Self {
        let (sender, receiver) = channel();
        Self {
            decoder,
            sender,
            receiver,
            pending: HashSet::new(),
            next_ticket: 0,
        }
    }

    /// Start decoding `bytes` on a worker thread.
    pub fn submit(&mut self, bytes: Vec<u8>, position: Option<Point>) -> ImportTicket {
        let ticket = ImportTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.insert(ticket);

        let decoder = Arc::clone(&self.decoder);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = decoder(&bytes);
            // The receiver is gone when the editor was dropped; the result is discarded.
            let _ = sender.send(ImportCompletion {
                ticket,
                position,
                result,
            });
        });
        log::debug!("Submitted image import {:?}", ticket);
        ticket
    }

    /// Abandon a pending import. Returns false if it was not pending.
    pub fn cancel(&mut self, ticket: ImportTicket) -> bool {
        let cancelled = self.pending.remove(&ticket);
        if cancelled {
            log::debug!("Cancelled image import {:?}", ticket);
        }
        cancelled
    }

    /// Abandon every pending import.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, ticket: ImportTicket) -> bool {
        self.pending.contains(&ticket)
    }

    /// Drain finished imports without blocking.
    pub fn poll(&mut self) -> Vec<ImportCompletion> {
        let mut done = Vec::new();
        while let Ok(completion) = self.receiver.try_recv() {
            self.accept(completion, &mut done);
        }
        done
    }

    /// Block until every pending import finishes or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Vec<ImportCompletion> {
        let deadline = Instant::now() + timeout;
        let mut done = self.poll();
        while !self.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completion) => self.accept(completion, &mut done),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        done
    }

    fn accept(&mut self, completion: ImportCompletion, done: &mut Vec<ImportCompletion>) {
        if self.pending.remove(&completion.ticket) {
            done.push(completion);
        } else {
            log::debug!("Discarding completion of cancelled import {:?}", completion.ticket);
        }
    }
}
