//! Split an animated gif into a grid of smaller animated gifs.
//!
//! Every part keeps all frames of the source together with their original
//! delays. Each frame of each part is quantized on its own, so parts do not
//! share a palette.
//!
//! ```rust,no_run
//! use gif_splitter::{Grid, SourceAnimation, Splitter};
//!
//! let source = SourceAnimation::open("cat.gif")?;
//! let grid = Grid::try_new(2, 3).ok_or("empty grid")?;
//!
//! for part in Splitter::new(grid).split(&source)? {
//!     std::fs::write(format!("part_{}.gif", part.index() + 1), part.bytes())?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
extern crate log;

pub mod animation;
pub mod grid;
pub mod image_util;
pub mod output;
pub mod part;
pub mod splitter;

pub use animation::{FrameDelay, SourceAnimation};
pub use grid::{Grid, PartCell};
pub use part::EncodedPart;
pub use splitter::{CancelToken, SplitError, SplitEvent, SplitObserver, Splitter};
