mod info;
mod split;

pub use info::*;
pub use split::*;

use std::{num::NonZeroU32, path::PathBuf};

use clap::{Args, Subcommand};

use gif_splitter::{animation::DecodeError, output::ArchiveError, Grid, SplitError};

#[derive(Subcommand, Debug)]
pub enum SplitterCommand {
    /// Split a gif into a grid of smaller gifs.
    ///
    /// Every part keeps all frames and the original frame timing.
    /// Trailing pixels are dropped when the gif size is not divisible by the grid size.
    Split {
        // args
        #[clap(flatten)]
        args: SplitArgs,
    },

    /// Show information about a gif and the part size a grid would produce.
    Info {
        // args
        #[clap(flatten)]
        args: InfoArgs,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    DecodeError(#[from] DecodeError),

    #[error("{0}")]
    SplitError(#[from] SplitError),

    #[error("{0}")]
    ArchiveError(#[from] ArchiveError),

    #[error("output path is not a directory")]
    OutputPathNotDir,
}

#[derive(Args, Debug)]
pub struct SharedArgs {
    /// The gif to split.
    pub source: PathBuf,

    /// Number of rows to split the gif into.
    #[clap(short, long, default_value = "1")]
    pub rows: NonZeroU32,

    /// Number of columns to split the gif into.
    #[clap(short, long, default_value = "1")]
    pub columns: NonZeroU32,
}

impl SharedArgs {
    pub const fn grid(&self) -> Grid {
        Grid::new(self.rows, self.columns)
    }
}
