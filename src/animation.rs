use std::{fmt, fs, io::Cursor, path::Path, time::Duration};

use image::{codecs::gif::GifDecoder, AnimationDecoder, Delay, ImageDecoder as _, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("unable to decode gif: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("gif contains no frames")]
    NoFrames,
}

/// Display time of a frame in gif centiseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameDelay(u16);

impl FrameDelay {
    pub const fn from_centis(centis: u16) -> Self {
        Self(centis)
    }

    pub const fn centis(self) -> u16 {
        self.0
    }

    pub fn duration(self) -> Duration {
        Duration::from_millis(u64::from(self.0) * 10)
    }
}

impl From<Delay> for FrameDelay {
    fn from(delay: Delay) -> Self {
        let (numer, denom) = delay.numer_denom_ms();
        let centis = (f64::from(numer) / f64::from(denom) / 10.0).round();

        Self(centis.clamp(0.0, f64::from(u16::MAX)) as u16)
    }
}

impl fmt::Display for FrameDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", u32::from(self.0) * 10)
    }
}

/// A fully composited source frame.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub image: RgbaImage,
    pub delay: FrameDelay,
}

/// A decoded gif. Every frame is stored at the full canvas size with all
/// previous frames and disposal methods already applied.
#[derive(Debug, Clone)]
pub struct SourceAnimation {
    width: u32,
    height: u32,
    frames: Vec<SourceFrame>,
}

impl SourceAnimation {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        let (width, height) = decoder.dimensions();

        let frames = decoder
            .into_frames()
            .map(|frame| {
                frame.map(|frame| SourceFrame {
                    delay: frame.delay().into(),
                    image: frame.into_buffer(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if frames.is_empty() {
            return Err(DecodeError::NoFrames);
        }

        debug!("decoded {width}x{height}px gif with {} frames", frames.len());

        Ok(Self {
            width,
            height,
            frames,
        })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[SourceFrame] {
        &self.frames
    }

    pub fn delays(&self) -> Vec<FrameDelay> {
        self.frames.iter().map(|frame| frame.delay).collect()
    }

    pub fn duration(&self) -> Duration {
        self.frames.iter().map(|frame| frame.delay.duration()).sum()
    }
}
