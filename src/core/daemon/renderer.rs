//! Render dispatch to whatever actually draws the panel.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::layout::Geometry;
use crate::core::metrics::MetricsSnapshot;
use crate::error::PanelError;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("module '{module}' failed: {reason}")]
    Module { module: String, reason: String },

    #[error("frame not started")]
    NoFrame,

    #[error("could not write frame: {0}")]
    Io(#[from] io::Error),

    #[error("could not encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RenderError {
    pub fn module<M: Into<String>, R: Into<String>>(module: M, reason: R) -> Self {
        RenderError::Module {
            module: module.into(),
            reason: reason.into(),
        }
    }
}

impl From<RenderError> for PanelError {
    fn from(err: RenderError) -> Self {
        PanelError::render_dispatch(err.to_string())
    }
}

/// One frame is `begin_frame`, one `render` per active module, then `present`.
/// `present` is only called when every module rendered.
pub trait Renderer {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn render(
        &mut self,
        module_id: &str,
        geometry: &Geometry,
        snapshot: &MetricsSnapshot,
    ) -> Result<(), RenderError>;

    fn present(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Dry run: logs what would be drawn
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: usize,
    current: Vec<String>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames presented so far
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.current.clear();
        Ok(())
    }

    fn render(
        &mut self,
        module_id: &str,
        geometry: &Geometry,
        _snapshot: &MetricsSnapshot,
    ) -> Result<(), RenderError> {
        log::info!(
            "[dry-run] {} at ({}, {}) {}x{}",
            module_id,
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height
        );
        self.current.push(module_id.to_string());
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.frames += 1;
        log::info!("[dry-run] frame {}: {}", self.frames, self.current.join(", "));
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameModule {
    pub id: String,
    #[serde(flatten)]
    pub geometry: Geometry,
}

/// What [`FrameFileRenderer`] writes for the external drawing process
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDescription {
    pub generated_at: DateTime<Local>,
    pub modules: Vec<FrameModule>,
    pub metrics: MetricsSnapshot,
}

/// Writes each presented frame as JSON. The file is replaced atomically so a
/// reader never sees half a frame.
#[derive(Debug)]
pub struct FrameFileRenderer {
    path: PathBuf,
    pending: Option<FrameDescription>,
}

impl FrameFileRenderer {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pending: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Renderer for FrameFileRenderer {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.pending = Some(FrameDescription {
            generated_at: Local::now(),
            modules: Vec::new(),
            metrics: MetricsSnapshot::new(),
        });
        Ok(())
    }

    fn render(
        &mut self,
        module_id: &str,
        geometry: &Geometry,
        snapshot: &MetricsSnapshot,
    ) -> Result<(), RenderError> {
        let frame = self.pending.as_mut().ok_or(RenderError::NoFrame)?;
        frame.modules.push(FrameModule {
            id: module_id.to_string(),
            geometry: *geometry,
        });
        if frame.metrics.is_empty() {
            frame.metrics = snapshot.clone();
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let frame = self.pending.take().ok_or(RenderError::NoFrame)?;
        let json = serde_json::to_string_pretty(&frame)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        log::info!("Wrote frame with {} module(s) to {}", frame.modules.len(), self.path.display());
        Ok(())
    }
}
