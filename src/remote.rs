//! Background task bridge between the tokio runtime and the egui thread.
//!
//! Network calls never run on the UI thread: each load/save is spawned on
//! the runtime, its outcome is sent back over a channel, and the UI is woken
//! with a repaint request. Teardown cancels the token and aborts in-flight
//! tasks so a late response can never mutate a stale session.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::api::{AnnotationRecord, ApiClient, SaveRequest};
use crate::error::{AnnotateError, Result};

/// Cooperative cancellation flag shared between the UI and in-flight tasks.
/// All clones observe the same state.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A fetched image, decoded off the UI thread. Pixels are straight RGBA.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub enum RemoteEvent {
    AnnotationLoaded(Result<AnnotationRecord>),
    ImageLoaded(Result<DecodedImage>),
    SaveFinished(Result<()>),
}

pub struct RemoteBridge {
    runtime: Handle,
    client: Arc<ApiClient>,
    egui_ctx: egui::Context,
    tx: Sender<RemoteEvent>,
    rx: Receiver<RemoteEvent>,
    cancel: CancelToken,
    tasks: Vec<JoinHandle<()>>,
}

impl RemoteBridge {
    pub fn new(runtime: Handle, client: ApiClient, egui_ctx: egui::Context) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            runtime,
            client: Arc::new(client),
            egui_ctx,
            tx,
            rx,
            cancel: CancelToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Non-blocking; the UI drains events at the top of each frame.
    pub fn poll(&mut self) -> Option<RemoteEvent> {
        self.rx.try_recv().ok()
    }

    pub fn load_annotation(&mut self, job_id: u64) {
        let client = self.client.clone();
        self.dispatch(async move {
            RemoteEvent::AnnotationLoaded(client.fetch_annotation(job_id).await)
        });
    }

    pub fn load_image(&mut self, image_path: String) {
        let client = self.client.clone();
        self.dispatch(async move {
            let result = match client.fetch_image(&image_path).await {
                Ok(bytes) => decode_image(&bytes),
                Err(err) => Err(err),
            };
            RemoteEvent::ImageLoaded(result)
        });
    }

    pub fn save(&mut self, annotation_id: i64, request: SaveRequest) {
        let client = self.client.clone();
        self.dispatch(async move {
            RemoteEvent::SaveFinished(client.save_annotation(annotation_id, &request).await)
        });
    }

    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn dispatch(&mut self, fut: impl Future<Output = RemoteEvent> + Send + 'static) {
        let tx = self.tx.clone();
        let ctx = self.egui_ctx.clone();
        let cancel = self.cancel.clone();

        let task = self.runtime.spawn(async move {
            let event = fut.await;
            if cancel.is_cancelled() {
                tracing::debug!("dropping response for a cancelled session");
                return;
            }
            if tx.send(event).is_ok() {
                ctx.request_repaint();
            }
        });
        self.tasks.push(task);
    }
}

impl Drop for RemoteBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn decode_image(bytes: &[u8]) -> Result<DecodedImage> {
    let image = image::load_from_memory(bytes).map_err(AnnotateError::from)?;
    let rgba = image.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_decode_image_reports_native_dimensions() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(6, 4, image::Rgba([10, 20, 30, 255]))
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageFormat::Png,
            )
            .unwrap();

        let decoded = decode_image(&png).unwrap();
        assert_eq!((decoded.width, decoded.height), (6, 4));
        assert_eq!(decoded.pixels.len(), 6 * 4 * 4);
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(decode_image(b"not an image").is_err());
    }
}
