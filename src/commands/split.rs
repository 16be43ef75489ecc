use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use clap::Args;

use super::{CommandError, SharedArgs};
use gif_splitter::{
    image_util::QuantSettings,
    output::{self, ARCHIVE_NAME, PREVIEW_NAME},
    EncodedPart, SourceAnimation, SplitEvent, SplitObserver, Splitter,
};

#[derive(Args, Debug)]
pub struct SplitArgs {
    // shared args
    #[clap(flatten)]
    shared: SharedArgs,

    /// Output folder.
    pub output: PathBuf,

    /// Prefix to add to the output file names.
    #[clap(short, long, default_value_t = String::new())]
    pub prefix: String,

    /// Additionally bundle all parts into a single zip archive.
    #[clap(short, long, action)]
    pub zip: bool,

    /// Only write the zip archive, skip the individual part files.
    /// Has no effect without --zip.
    #[clap(long, action, verbatim_doc_comment)]
    pub no_files: bool,

    /// Write a html page that shows all parts laid out as the grid.
    #[clap(long, action)]
    pub preview: bool,

    /// Target quality of the per frame color reduction [0-100].
    #[clap(short, long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: u8,

    /// Quantization speed [1-10]. Lower values are slower but produce better palettes.
    #[clap(short, long, default_value_t = 4, value_parser = clap::value_parser!(i32).range(1..=10))]
    pub speed: i32,

    /// Dithering level [0.0-1.0].
    #[clap(short, long, default_value_t = 1.0, value_parser = parse_dithering)]
    pub dithering: f32,
}

impl std::ops::Deref for SplitArgs {
    type Target = SharedArgs;

    fn deref(&self) -> &Self::Target {
        &self.shared
    }
}

impl SplitArgs {
    pub const fn quant_settings(&self) -> QuantSettings {
        QuantSettings {
            quality: self.quality,
            speed: self.speed,
            dithering: self.dithering,
        }
    }
}

fn parse_dithering(value: &str) -> Result<f32, String> {
    let level = value.parse::<f32>().map_err(|err| err.to_string())?;

    if (0.0..=1.0).contains(&level) {
        Ok(level)
    } else {
        Err(format!("{level} is not in 0.0..=1.0"))
    }
}

/// Logs split progress, one line per finished part.
#[derive(Default)]
struct LogProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl SplitObserver for LogProgress {
    fn on_event(&self, event: &SplitEvent) {
        match event {
            SplitEvent::Started { parts, frames } => {
                self.total.store(*parts, Ordering::Relaxed);
                info!("encoding {parts} parts with {frames} frames each");
            }
            SplitEvent::FrameFinished { cell, frame } => {
                trace!("part {}: frame {} done", cell.index + 1, frame + 1);
            }
            SplitEvent::PartFinished { cell, size } => {
                let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
                info!(
                    "[{done}/{}] part {} (row {}, column {}): {}",
                    self.total.load(Ordering::Relaxed),
                    cell.index + 1,
                    cell.row + 1,
                    cell.column + 1,
                    human_readable_bytes(*size as u64)
                );
            }
        }
    }
}

pub fn split(args: &SplitArgs) -> Result<(), CommandError> {
    if args.output.exists() && !args.output.is_dir() {
        return Err(CommandError::OutputPathNotDir);
    }

    let write_files = if args.no_files && !args.zip {
        warn!("--no-files requires --zip, writing part files anyway");
        true
    } else {
        !args.no_files
    };

    if args.preview && !write_files {
        warn!("preview needs the individual part files, skipping preview");
    }

    let source = SourceAnimation::open(&args.source)?;
    info!(
        "{}: {}x{}px, {} frames",
        args.source.display(),
        source.width(),
        source.height(),
        source.frame_count()
    );

    let progress = LogProgress::default();
    let parts = Splitter::new(args.grid())
        .with_settings(args.quant_settings())
        .with_observer(&progress)
        .split(&source)?;

    fs::create_dir_all(&args.output)?;

    if write_files {
        write_parts(args, &parts)?;

        if args.preview {
            let path = args.output.join(format!("{}{PREVIEW_NAME}", args.prefix));
            fs::write(&path, output::render_preview(&parts, args.columns.get(), &args.prefix))?;
            info!("preview written to {}", path.display());
        }
    }

    if args.zip {
        let path = args.output.join(format!("{}{ARCHIVE_NAME}", args.prefix));
        let archive = output::archive_parts(&parts)?;
        fs::write(&path, &archive)?;
        info!(
            "archive written to {} ({})",
            path.display(),
            human_readable_bytes(archive.len() as u64)
        );
    }

    let total = parts.iter().map(|part| part.bytes().len() as u64).sum();
    info!(
        "completed {} parts of {}x{}px, {} total",
        parts.len(),
        parts.first().map_or(0, |part| part.dimensions().0),
        parts.first().map_or(0, |part| part.dimensions().1),
        human_readable_bytes(total)
    );

    Ok(())
}

fn write_parts(args: &SplitArgs, parts: &[EncodedPart]) -> Result<(), CommandError> {
    for part in parts {
        let path = args
            .output
            .join(output::part_file_name(&args.prefix, part.index()));

        fs::write(&path, part.bytes())?;
        debug!("{}: {} frames", path.display(), part.frame_count());
    }

    Ok(())
}

fn human_readable_bytes(bytes: u64) -> String {
    static UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

    if bytes < 1000 {
        return format!("{bytes}{}", UNITS[0]);
    }

    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1000.0 && unit < UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }

    format!("{:.2}{}", size, UNITS[unit])
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

    fn parse(args: &[&str]) -> SplitArgs {
        let cli = Cli::try_parse_from(["gif-splitter", "split"].iter().chain(args)).unwrap();

        match cli.command {
            SplitterCommand::Split { args } => args,
            SplitterCommand::Info { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_split_writes_parts() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.gif");
        let out = dir.path().join("out");
        fixtures::write_gif(&source, 100, 60, &[10, 20, 30]);

        let args = parse(&[
            source.to_str().unwrap(),
            out.to_str().unwrap(),
            "-r",
            "2",
            "-c",
            "2",
            "--zip",
            "--preview",
        ]);
        split(&args).unwrap();

        for idx in 1..=4 {
            let part = SourceAnimation::open(out.join(format!("part_{idx}.gif"))).unwrap();
            assert_eq!((part.width(), part.height()), (50, 30));
            assert_eq!(part.frame_count(), 3);
        }
        assert!(!out.join("part_5.gif").exists());
        assert!(out.join(ARCHIVE_NAME).is_file());
        assert!(out.join(PREVIEW_NAME).is_file());
    }

    #[test]
    fn test_split_zip_only() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.gif");
        let out = dir.path().join("out");
        fixtures::write_gif(&source, 20, 20, &[5]);

        let args = parse(&[
            source.to_str().unwrap(),
            out.to_str().unwrap(),
            "--columns",
            "4",
            "--zip",
            "--no-files",
            "--prefix",
            "x_",
        ]);
        split(&args).unwrap();

        let archive = fs::File::open(out.join("x_generated_gifs.zip")).unwrap();
        let archive = zip::ZipArchive::new(archive).unwrap();
        let mut names = archive.file_names().collect::<Vec<_>>();
        names.sort_unstable();
        assert_eq!(names, ["part_1.gif", "part_2.gif", "part_3.gif", "part_4.gif"]);

        assert!(!out.join("x_part_1.gif").exists());
    }

    #[test]
    fn test_split_invalid_grid_writes_nothing() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.gif");
        let out = dir.path().join("out");
        fixtures::write_gif(&source, 10, 10, &[5]);

        let args = parse(&[
            source.to_str().unwrap(),
            out.to_str().unwrap(),
            "-r",
            "20",
        ]);

        assert!(matches!(split(&args), Err(CommandError::SplitError(_))));
        assert!(!out.exists());
    }

    #[test]
    fn test_split_output_is_file() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.gif");
        fixtures::write_gif(&source, 10, 10, &[5]);

        let args = parse(&[source.to_str().unwrap(), source.to_str().unwrap()]);
        assert!(matches!(split(&args), Err(CommandError::OutputPathNotDir)));
    }

    #[test]
    fn test_arg_validation() {
        let base = ["gif-splitter", "split", "a.gif", "out"];

        assert!(Cli::try_parse_from(base.iter().chain(&["-r", "0"])).is_err());
        assert!(Cli::try_parse_from(base.iter().chain(&["-q", "101"])).is_err());
        assert!(Cli::try_parse_from(base.iter().chain(&["-d", "1.5"])).is_err());
        assert!(Cli::try_parse_from(base.iter().chain(&["-s", "0"])).is_err());
        assert!(Cli::try_parse_from(base.iter().chain(&["--alpha-threshold", "8"])).is_err());

        let args = parse(&["a.gif", "out"]);
        assert_eq!(args.grid().cell_count(), 1);
        assert_eq!(args.quant_settings(), QuantSettings::default());
    }

    #[test]
    fn test_human_readable_bytes() {
        assert_eq!(human_readable_bytes(999), "999B");
        assert_eq!(human_readable_bytes(1500), "1.50kB");
        assert_eq!(human_readable_bytes(2_000_000), "2.00MB");
    }
}
