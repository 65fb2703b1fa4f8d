//! Background image decoding.
//!
//! Requests go to one named thread; the UI polls finished results each frame
//! and installs them into the session in one step.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use image::ImageFormat;

use crate::error::LoadError;
use crate::session::LoadedImage;

struct DecodeRequest {
    name: String,
    bytes: Vec<u8>,
}

pub type DecodeResult = Result<LoadedImage, LoadError>;

/// Base name for the exported config: the file name up to its first dot.
pub fn image_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split('.').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("image_config")
        .to_string()
}

/// Reject files whose extension is not a known image format.
pub fn check_image_path(path: &Path) -> Result<(), LoadError> {
    match ImageFormat::from_path(path) {
        Ok(format) if format.reading_enabled() => Ok(()),
        _ => Err(LoadError::NotAnImage {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }),
    }
}

fn decode(request: DecodeRequest) -> DecodeResult {
    log::debug!("Decoding '{}' ({} bytes)", request.name, request.bytes.len());
    let decoded = image::load_from_memory(&request.bytes)?;
    Ok(LoadedImage::new(request.name, decoded.to_rgba8()))
}

pub struct ImageLoader {
    request_tx: Option<Sender<DecodeRequest>>,
    result_rx: Receiver<DecodeResult>,
    thread_handle: Option<JoinHandle<()>>,
    pending: usize,
}

impl ImageLoader {
    pub fn spawn() -> Result<Self, LoadError> {
        let (request_tx, request_rx) = mpsc::channel::<DecodeRequest>();
        let (result_tx, result_rx) = mpsc::channel::<DecodeResult>();

        let thread_handle = thread::Builder::new()
            .name("image-decoder".to_string())
            .spawn(move || {
                // Ends when the sender side is dropped.
                while let Ok(request) = request_rx.recv() {
                    if result_tx.send(decode(request)).is_err() {
                        log::warn!("Result channel closed, decoder thread exiting");
                        break;
                    }
                }
                log::debug!("Decoder thread exiting");
            })?;

        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            thread_handle: Some(thread_handle),
            pending: 0,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.pending > 0
    }

    /// Queue already-read bytes for decoding.
    pub fn request_bytes(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<(), LoadError> {
        let tx = self.request_tx.as_ref().ok_or(LoadError::WorkerGone)?;
        tx.send(DecodeRequest {
            name: name.into(),
            bytes,
        })
        .map_err(|_| LoadError::WorkerGone)?;
        self.pending += 1;
        Ok(())
    }

    /// Check the extension, read the file and queue it.
    pub fn request_path(&mut self, path: &Path) -> Result<(), LoadError> {
        check_image_path(path)?;
        let bytes = std::fs::read(path)?;
        log::info!("Loading {}", path.display());
        self.request_bytes(image_name(path), bytes)
    }

    /// Next finished decode, if any.
    pub fn poll(&mut self) -> Option<DecodeResult> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.pending = self.pending.saturating_sub(1);
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) if self.pending > 0 => {
                self.pending = 0;
                Some(Err(LoadError::WorkerGone))
            }
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        self.request_tx.take();
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}
