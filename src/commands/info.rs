use clap::Args;

use super::{CommandError, SharedArgs};
use gif_splitter::{SourceAnimation, SplitError};

#[derive(Args, Debug)]
pub struct InfoArgs {
    // shared args
    #[clap(flatten)]
    shared: SharedArgs,
}

impl std::ops::Deref for InfoArgs {
    type Target = SharedArgs;

    fn deref(&self) -> &Self::Target {
        &self.shared
    }
}

pub fn info(args: &InfoArgs) -> Result<(), CommandError> {
    let source = SourceAnimation::open(&args.source)?;

    info!(
        "{}: {}x{}px, {} frames, {:.2}s",
        args.source.display(),
        source.width(),
        source.height(),
        source.frame_count(),
        source.duration().as_secs_f64()
    );

    let delays = source
        .delays()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    debug!("frame delays: {}", delays.join(", "));

    let grid = args.grid();
    let layout = grid
        .layout(source.width(), source.height())
        .map_err(SplitError::from)?;

    info!(
        "{}x{} grid: {} parts of {}x{}px",
        grid.rows(),
        grid.columns(),
        grid.cell_count(),
        layout.part_width(),
        layout.part_height()
    );

    let (dropped_x, dropped_y) = layout.dropped();
    if dropped_x > 0 || dropped_y > 0 {
        warn!(
            "size is not divisible by the grid, the last {dropped_x}px columns and {dropped_y}px rows are dropped"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;
    use tempfile::tempdir;

    use super::*;
    use crate::{
        commands::{fixtures, SplitterCommand},
        Cli,
    };

    fn run(source: &str, grid: &[&str]) -> Result<(), CommandError> {
        let cli = Cli::try_parse_from(["gif-splitter", "info", source].iter().chain(grid)).unwrap();

        match cli.command {
            SplitterCommand::Info { args } => info(&args),
            SplitterCommand::Split { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_info() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.gif");
        fixtures::write_gif(&source, 10, 10, &[5, 5]);
        let source = source.to_str().unwrap();

        assert!(run(source, &["-r", "3", "-c", "2"]).is_ok());
        assert!(matches!(
            run(source, &["-r", "20"]),
            Err(CommandError::SplitError(SplitError::InvalidGrid(_)))
        ));
    }

    #[test]
    fn test_info_missing_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.gif");

        assert!(matches!(
            run(missing.to_str().unwrap(), &[]),
            Err(CommandError::DecodeError(_))
        ));
    }
}
