use std::fmt;

use image::{imageops, Rgba, RgbaImage};

/// Upper bound for the palette size of a single gif frame.
pub const MAX_COLORS: u32 = 256;

#[derive(Debug, thiserror::Error)]
pub enum ImgUtilError {
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("quantization error: {0}")]
    QuantError(#[from] imagequant::Error),

    #[error("gif encoding error: {0}")]
    EncodingError(#[from] gif::EncodingError),

    #[error("crop region {rect} is outside of the {width}x{height}px source")]
    CropOutOfBounds { rect: Rect, width: u32, height: u32 },

    #[error("{0}x{1}px exceeds the maximum gif size")]
    TooLarge(u32, u32),

    #[error("frame is {0}x{1}px but the part is {2}x{3}px")]
    FrameSizeMismatch(u32, u32, u32, u32),

    #[error("dithering level {0} is not in 0.0..=1.0")]
    InvalidDithering(f32),
}

pub type ImgUtilResult<T> = std::result::Result<T, ImgUtilError>;

/// Axis aligned pixel rectangle inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }

    /// Checks that the rectangle is non-empty and lies fully inside a `width` x `height` area.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);

        self.width > 0
            && self.height > 0
            && right.is_some_and(|right| right <= width)
            && bottom.is_some_and(|bottom| bottom <= height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Copies `rect` out of `image`.
///
/// The region must lie fully inside the source. It is never clamped, a shifted
/// or shrunk region would break the alignment between neighbouring parts.
pub fn crop(image: &RgbaImage, rect: Rect) -> ImgUtilResult<RgbaImage> {
    let (width, height) = image.dimensions();

    if !rect.fits_within(width, height) {
        return Err(ImgUtilError::CropOutOfBounds {
            rect,
            width,
            height,
        });
    }

    Ok(imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Tuning knobs for the per frame palette reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantSettings {
    /// Target quality [0-100].
    pub quality: u8,

    /// Speed / quality trade-off [1-10], 1 is the slowest.
    pub speed: i32,

    /// Dithering level [0.0-1.0].
    pub dithering: f32,
}

impl Default for QuantSettings {
    fn default() -> Self {
        Self {
            quality: 100,
            speed: 4,
            dithering: 1.0,
        }
    }
}

/// Checks `settings` and builds the quantizer configuration for them.
pub fn quantization_attributes(settings: &QuantSettings) -> ImgUtilResult<imagequant::Attributes> {
    // only applied after quantizing, so imagequant can't reject it here
    if !(0.0..=1.0).contains(&settings.dithering) {
        return Err(ImgUtilError::InvalidDithering(settings.dithering));
    }

    let mut attr = imagequant::new();
    attr.set_max_colors(MAX_COLORS)?;
    attr.set_quality(0, settings.quality)?;
    attr.set_speed(settings.speed)?;

    Ok(attr)
}

/// A palette reduced frame, every pixel is an index into `palette`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    width: u32,
    height: u32,
    palette: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

impl IndexedFrame {
    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> &[[u8; 4]] {
        &self.palette
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Palette as packed RGB triplets, the layout gif color tables use.
    pub fn rgb_palette(&self) -> Vec<u8> {
        self.palette
            .iter()
            .flat_map(|&[r, g, b, _]| [r, g, b])
            .collect()
    }

    /// First fully transparent palette entry, if any.
    pub fn transparent_index(&self) -> Option<u8> {
        self.palette
            .iter()
            .position(|color| color[3] == 0)
            .map(|idx| idx as u8)
    }
}

/// Reduces `image` to at most [`MAX_COLORS`] colors.
pub fn quantize(
    image: &RgbaImage,
    quant: &imagequant::Attributes,
    dithering: f32,
) -> ImgUtilResult<IndexedFrame> {
    let (width, height) = image.dimensions();

    let mut img = quant.new_image(image.to_quant_img(), width as usize, height as usize, 0.0)?;
    let mut qres = quant.quantize(&mut img)?;
    qres.set_dithering_level(dithering)?;

    let (palette, indices) = qres.remapped(&mut img)?;
    trace!("quantized {width}x{height}px to {} colors", palette.len());

    Ok(IndexedFrame {
        width,
        height,
        palette: convert_palette(&palette),
        indices,
    })
}

pub fn convert_palette(palette: &[imagequant::RGBA]) -> Vec<[u8; 4]> {
    palette.iter().map(|c| [c.r, c.g, c.b, c.a]).collect()
}

pub trait ImageBufferExt {
    fn to_quant_img(&self) -> Vec<imagequant::RGBA>;
}

impl ImageBufferExt for RgbaImage {
    fn to_quant_img(&self) -> Vec<imagequant::RGBA> {
        self.pixels()
            .map(|&Rgba([r, g, b, a])| imagequant::RGBA::new(r, g, b, a))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_crop_copies_region() {
        let img = gradient(10, 8);
        let part = crop(&img, Rect::new(4, 2, 3, 5)).unwrap();

        assert_eq!(part.dimensions(), (3, 5));
        assert_eq!(part.get_pixel(0, 0), &Rgba([4, 2, 0, 255]));
        assert_eq!(part.get_pixel(2, 4), &Rgba([6, 6, 0, 255]));
    }

    #[test]
    fn test_crop_full_frame_is_identity() {
        let img = gradient(7, 3);
        let part = crop(&img, Rect::new(0, 0, 7, 3)).unwrap();

        assert_eq!(part, img);
    }

    #[test]
    fn test_crop_rejects_out_of_bounds() {
        let img = gradient(10, 8);

        for rect in [
            Rect::new(8, 0, 3, 1),
            Rect::new(0, 6, 1, 3),
            Rect::new(0, 0, 0, 4),
            Rect::new(u32::MAX, 0, 2, 2),
        ] {
            assert!(
                matches!(crop(&img, rect), Err(ImgUtilError::CropOutOfBounds { .. })),
                "{rect} should not be croppable"
            );
        }
    }

    #[test]
    fn test_quantization_attributes_rejects_dithering() {
        for dithering in [-0.1, 1.5, f32::NAN] {
            let settings = QuantSettings {
                dithering,
                ..QuantSettings::default()
            };

            assert!(
                matches!(
                    quantization_attributes(&settings),
                    Err(ImgUtilError::InvalidDithering(_))
                ),
                "dithering {dithering} should be rejected"
            );
        }

        let settings = QuantSettings {
            dithering: 0.0,
            ..QuantSettings::default()
        };
        assert!(quantization_attributes(&settings).is_ok());
    }

    #[test]
    fn test_quantize_small_palette() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        for x in 0..4 {
            img.put_pixel(x, 0, Rgba([0, 0, 255, 255]));
        }

        let quant = quantization_attributes(&QuantSettings::default()).unwrap();
        let indexed = quantize(&img, &quant, 1.0).unwrap();

        assert_eq!((indexed.width(), indexed.height()), (4, 4));
        assert_eq!(indexed.indices().len(), 16);
        assert!(indexed.palette().len() <= MAX_COLORS as usize);
        assert_eq!(indexed.rgb_palette().len(), indexed.palette().len() * 3);
        assert!(indexed
            .indices()
            .iter()
            .all(|&idx| usize::from(idx) < indexed.palette().len()));
        assert_eq!(indexed.transparent_index(), None);
    }

    #[test]
    fn test_quantize_keeps_transparency() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 0]));

        let quant = quantization_attributes(&QuantSettings::default()).unwrap();
        let indexed = quantize(&img, &quant, 0.0).unwrap();

        let transparent = indexed.transparent_index().unwrap();
        assert_eq!(indexed.indices()[4 + 1], transparent);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(2, 3, 2, 1);

        assert!(rect.contains(2, 3));
        assert!(rect.contains(3, 3));
        assert!(!rect.contains(4, 3));
        assert!(!rect.contains(2, 4));
        assert!(!rect.contains(1, 3));
    }
}
