use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rayon::iter::{IntoParallelIterator as _, ParallelIterator as _};

use crate::{
    animation::{DecodeError, SourceAnimation},
    grid::{Grid, GridError, GridLayout, PartCell},
    image_util::{self, ImgUtilError, QuantSettings},
    part::{EncodedPart, PartEncoder},
};

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("invalid grid: {0}")]
    InvalidGrid(#[from] GridError),

    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    Settings(#[from] ImgUtilError),

    #[error("part {}: {source}", .index + 1)]
    Part { index: usize, source: ImgUtilError },

    #[error("part {}, frame {}: {source}", .index + 1, .frame + 1)]
    Frame {
        index: usize,
        frame: usize,
        source: ImgUtilError,
    },

    #[error("split was cancelled")]
    Cancelled,
}

/// Progress notifications emitted while splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitEvent {
    /// The grid is valid and work on the parts begins.
    Started { parts: usize, frames: usize },

    /// One frame of one part has been encoded.
    FrameFinished { cell: PartCell, frame: usize },

    /// A part received all frames and was finalized into `size` bytes.
    PartFinished { cell: PartCell, size: usize },
}

/// Receives [`SplitEvent`]s. Parts are processed in parallel, so events of
/// different parts interleave. Events of a single part arrive in frame order.
pub trait SplitObserver: Sync {
    fn on_event(&self, event: &SplitEvent);
}

impl<F> SplitObserver for F
where
    F: Fn(&SplitEvent) + Sync,
{
    fn on_event(&self, event: &SplitEvent) {
        self(event);
    }
}

/// Shared flag to stop a running split at the next frame boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Splits an animation into a grid of independently encoded animations.
pub struct Splitter<'a> {
    grid: Grid,
    settings: QuantSettings,
    cancel: CancelToken,
    observer: Option<&'a dyn SplitObserver>,
}

impl<'a> Splitter<'a> {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            settings: QuantSettings::default(),
            cancel: CancelToken::default(),
            observer: None,
        }
    }

    #[must_use]
    pub const fn with_settings(mut self, settings: QuantSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn SplitObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn split_bytes(&self, bytes: &[u8]) -> Result<Vec<EncodedPart>, SplitError> {
        let source = SourceAnimation::from_bytes(bytes)?;
        self.split(&source)
    }

    /// Returns one part per grid cell in row-major order.
    ///
    /// Nothing is encoded if the grid is too fine for the source. Any failing
    /// frame aborts the whole split, parts never miss frames.
    pub fn split(&self, source: &SourceAnimation) -> Result<Vec<EncodedPart>, SplitError> {
        let layout = self.grid.layout(source.width(), source.height())?;

        debug!(
            "splitting {}x{}px into {}x{} parts of {}x{}px",
            source.width(),
            source.height(),
            self.grid.rows(),
            self.grid.columns(),
            layout.part_width(),
            layout.part_height()
        );

        let (dropped_x, dropped_y) = layout.dropped();
        if dropped_x > 0 || dropped_y > 0 {
            debug!("ignoring trailing {dropped_x}px columns and {dropped_y}px rows");
        }

        // validate once up front, each part builds its own instance
        image_util::quantization_attributes(&self.settings)?;

        if self.cancel.is_cancelled() {
            return Err(SplitError::Cancelled);
        }

        self.notify(&SplitEvent::Started {
            parts: self.grid.cell_count(),
            frames: source.frame_count(),
        });

        layout
            .cells()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|cell| self.split_cell(source, &layout, cell))
            .collect()
    }

    fn split_cell(
        &self,
        source: &SourceAnimation,
        layout: &GridLayout,
        cell: PartCell,
    ) -> Result<EncodedPart, SplitError> {
        let part_err = |source: ImgUtilError| SplitError::Part {
            index: cell.index,
            source,
        };

        let rect = layout.rect(cell);
        trace!("part {} ({}, {}) covers {rect}", cell.index, cell.row, cell.column);

        let quant = image_util::quantization_attributes(&self.settings).map_err(part_err)?;
        let mut encoder = PartEncoder::new(cell, rect.width, rect.height).map_err(part_err)?;

        for (idx, frame) in source.frames().iter().enumerate() {
            let image = image_util::crop(&frame.image, rect).map_err(part_err)?;

            image_util::quantize(&image, &quant, self.settings.dithering)
                .and_then(|indexed| encoder.append_frame(&indexed, frame.delay))
                .map_err(|source| SplitError::Frame {
                    index: cell.index,
                    frame: idx,
                    source,
                })?;

            self.checkpoint(cell, idx)?;
        }

        let part = encoder.finish().map_err(part_err)?;

        self.notify(&SplitEvent::PartFinished {
            cell,
            size: part.bytes().len(),
        });

        Ok(part)
    }

    /// Frame boundary: the only place a split may be interrupted.
    fn checkpoint(&self, cell: PartCell, frame: usize) -> Result<(), SplitError> {
        self.notify(&SplitEvent::FrameFinished { cell, frame });

        if self.cancel.is_cancelled() {
            debug!("part {}: cancelled after frame {frame}", cell.index);
            return Err(SplitError::Cancelled);
        }

        // let other queued parts make progress
        let _ = rayon::yield_now();

        Ok(())
    }

    fn notify(&self, event: &SplitEvent) {
        if let Some(observer) = self.observer {
            observer.on_event(event);
        }
    }
}
