use std::borrow::Cow;

use gif::{DisposalMethod, Encoder, Frame, Repeat};

use crate::{
    animation::FrameDelay,
    grid::PartCell,
    image_util::{ImgUtilError, ImgUtilResult, IndexedFrame},
};

/// Finished animation for one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPart {
    cell: PartCell,
    width: u32,
    height: u32,
    delays: Vec<FrameDelay>,
    bytes: Vec<u8>,
}

impl EncodedPart {
    pub const fn cell(&self) -> PartCell {
        self.cell
    }

    pub const fn index(&self) -> usize {
        self.cell.index
    }

    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn delays(&self) -> &[FrameDelay] {
        &self.delays
    }

    pub fn frame_count(&self) -> usize {
        self.delays.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Streams indexed frames of one cell into a looping gif.
pub struct PartEncoder {
    cell: PartCell,
    width: u16,
    height: u16,
    encoder: Encoder<Vec<u8>>,
    delays: Vec<FrameDelay>,
}

impl PartEncoder {
    pub fn new(cell: PartCell, width: u32, height: u32) -> ImgUtilResult<Self> {
        let (Ok(gif_width), Ok(gif_height)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(ImgUtilError::TooLarge(width, height));
        };

        // no global palette, every frame carries its own
        let mut encoder = Encoder::new(Vec::new(), gif_width, gif_height, &[])?;
        encoder.set_repeat(Repeat::Infinite)?;

        Ok(Self {
            cell,
            width: gif_width,
            height: gif_height,
            encoder,
            delays: Vec::new(),
        })
    }

    pub fn append_frame(&mut self, frame: &IndexedFrame, delay: FrameDelay) -> ImgUtilResult<()> {
        let (width, height) = (u32::from(self.width), u32::from(self.height));
        if frame.width() != width || frame.height() != height {
            return Err(ImgUtilError::FrameSizeMismatch(
                frame.width(),
                frame.height(),
                width,
                height,
            ));
        }

        // frames cover the whole canvas, clearing keeps transparent pixels from showing the previous frame
        let gif_frame = Frame {
            width: self.width,
            height: self.height,
            delay: delay.centis(),
            dispose: DisposalMethod::Background,
            transparent: frame.transparent_index(),
            palette: Some(frame.rgb_palette()),
            buffer: Cow::Borrowed(frame.indices()),
            ..Frame::default()
        };

        self.encoder.write_frame(&gif_frame)?;
        self.delays.push(delay);

        trace!(
            "part {}: appended frame {} ({delay})",
            self.cell.index,
            self.delays.len()
        );

        Ok(())
    }

    pub fn finish(self) -> ImgUtilResult<EncodedPart> {
        let bytes = self.encoder.into_inner()?;

        Ok(EncodedPart {
            cell: self.cell,
            width: u32::from(self.width),
            height: u32::from(self.height),
            delays: self.delays,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::{
        animation::SourceAnimation,
        image_util::{quantization_attributes, quantize, QuantSettings},
    };

    const CELL: PartCell = PartCell {
        row: 0,
        column: 0,
        index: 0,
    };

    fn indexed(width: u32, height: u32, color: [u8; 4]) -> IndexedFrame {
        let quant = quantization_attributes(&QuantSettings::default()).unwrap();
        quantize(&RgbaImage::from_pixel(width, height, Rgba(color)), &quant, 1.0).unwrap()
    }

    #[test]
    fn test_encode_decodes_back() {
        let mut encoder = PartEncoder::new(CELL, 8, 6).unwrap();
        encoder
            .append_frame(&indexed(8, 6, [255, 0, 0, 255]), FrameDelay::from_centis(5))
            .unwrap();
        encoder
            .append_frame(&indexed(8, 6, [0, 0, 255, 255]), FrameDelay::from_centis(12))
            .unwrap();

        let part = encoder.finish().unwrap();
        assert_eq!(part.frame_count(), 2);
        assert_eq!(part.dimensions(), (8, 6));

        let decoded = SourceAnimation::from_bytes(part.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
        assert_eq!(decoded.delays(), part.delays());
        assert_eq!(decoded.frames()[0].image.get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
        assert_eq!(decoded.frames()[1].image.get_pixel(3, 3), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_rejects_mismatched_frame() {
        let mut encoder = PartEncoder::new(CELL, 8, 6).unwrap();
        let res = encoder.append_frame(&indexed(6, 8, [0, 0, 0, 255]), FrameDelay::default());

        assert!(matches!(res, Err(ImgUtilError::FrameSizeMismatch(6, 8, 8, 6))));
    }

    #[test]
    fn test_rejects_oversized_part() {
        assert!(matches!(
            PartEncoder::new(CELL, 70_000, 10),
            Err(ImgUtilError::TooLarge(70_000, 10))
        ));
    }
}
