//! Export engine: a composed scene -> PNG bytes plus a suggested filename.
//!
//! Capture fidelity is independent of how the scene is being displayed: the
//! backend renders from the scene's logical layout at a fixed pixel density,
//! so a thumbnail-scaled tile and a full-size modal export identical pixels,
//! and the enclosing viewport's scroll state never crops or pads the output.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use futures::future::BoxFuture;
use log::{debug, warn};

use crate::rendering::raster;
use crate::rendering::template::CardScene;
use crate::{CardConfig, Error, GreetingRecord, Notification, NotifyHandler, Result};

/// Tagged busy state for one capture target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    InFlight,
    Failed,
}

/// Options handed to the capture facility.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Opaque background the source styling is composited onto
    pub background: (u8, u8, u8),
    /// Fixed multiplier above the logical layout size
    pub pixel_density: u32,
}

/// The consumed raster capture facility.
///
/// The scene is an explicit capability passed at call time, so one backend
/// serves any template instance, thumbnail or modal, without special-casing.
pub trait CaptureBackend: Send + Sync {
    fn capture(&self, scene: &CardScene, opts: &CaptureOptions) -> BoxFuture<'static, Result<Vec<u8>>>;
}

/// Default backend: the crate's own rasterizer, run off the async caller.
pub struct RasterBackend;

impl CaptureBackend for RasterBackend {
    fn capture(&self, scene: &CardScene, opts: &CaptureOptions) -> BoxFuture<'static, Result<Vec<u8>>> {
        let scene = scene.clone();
        let opts = opts.clone();
        Box::pin(async move {
            let image = tokio::task::spawn_blocking(move || {
                raster::render_scene(&scene, opts.pixel_density.max(1) as f32, Some(opts.background))
            })
            .await
            .map_err(|e| Error::Export(format!("capture task failed: {}", e)))??;
            Ok(image.png_data)
        })
    }
}

/// Raster image bytes plus the derived filename.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub filename: String,
    pub png_data: Vec<u8>,
}

impl ExportOutput {
    /// Encode as a `data:image/png;base64,...` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png_data)
        )
    }

    /// File-save trigger: write the bytes under the derived filename.
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.filename);
        std::fs::write(&path, &self.png_data)
            .map_err(|e| Error::Export(format!("failed to write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

/// Derive the suggested filename for a record.
///
/// Fixed prefix, version/year tag, then the name with every whitespace run
/// collapsed to a single separator. Pure and deterministic.
pub fn derive_filename(record: &GreetingRecord, config: &CardConfig) -> String {
    let name = record.name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}_{}_{}.png", config.filename_prefix, config.year_tag, name)
}

/// Export engine bound to one capture target.
///
/// Re-entrant triggers while a capture is in flight are ignored, not queued;
/// the busy state is reset on every exit path, success or failure.
pub struct Exporter {
    backend: Arc<dyn CaptureBackend>,
    config: CardConfig,
    state: Mutex<CaptureState>,
    on_notify: Mutex<Option<NotifyHandler>>,
}

impl Exporter {
    pub fn new(config: CardConfig) -> Self {
        Self::with_backend(Arc::new(RasterBackend), config)
    }

    pub fn with_backend(backend: Arc<dyn CaptureBackend>, config: CardConfig) -> Self {
        Self {
            backend,
            config,
            state: Mutex::new(CaptureState::Idle),
            on_notify: Mutex::new(None),
        }
    }

    pub fn state(&self) -> CaptureState {
        *self.state.lock().unwrap()
    }

    /// Register a callback for notifications (fire-and-forget surface).
    pub fn on_notify<F>(&self, cb: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        *self.on_notify.lock().unwrap() = Some(Arc::new(cb));
    }

    /// Remove a previously registered notification callback if any
    pub fn clear_on_notify(&self) {
        *self.on_notify.lock().unwrap() = None;
    }

    /// Capture the scene at full fidelity.
    ///
    /// Returns `Ok(None)` when a capture for this target is already in
    /// flight. On failure the error is returned after the busy state is
    /// cleared and a notification is emitted; no partial output exists.
    pub async fn export(&self, scene: &CardScene) -> Result<Option<ExportOutput>> {
        {
            let mut state = self.state.lock().unwrap();
            if *state == CaptureState::InFlight {
                debug!("export skipped: capture already in flight");
                return Ok(None);
            }
            *state = CaptureState::InFlight;
        }

        let opts = CaptureOptions {
            background: self.config.background,
            pixel_density: self.config.pixel_density.max(1),
        };
        match self.backend.capture(scene, &opts).await {
            Ok(png_data) => {
                *self.state.lock().unwrap() = CaptureState::Idle;
                self.notify(Notification::success(
                    "Downloaded!",
                    "Greeting card saved successfully.",
                ));
                Ok(Some(ExportOutput {
                    filename: derive_filename(&scene.record, &self.config),
                    png_data,
                }))
            }
            Err(err) => {
                warn!("capture failed: {}", err);
                *self.state.lock().unwrap() = CaptureState::Failed;
                self.notify(Notification::error(
                    "Download Failed",
                    "Could not download the card.",
                ));
                Err(err)
            }
        }
    }

    fn notify(&self, notification: Notification) {
        let handler = self.on_notify.lock().unwrap().clone();
        if let Some(cb) = handler {
            cb(&notification);
        }
    }
}
