// flat RGBA8 raster, row-major, row 0 at the top of the image

use bevy::color::Srgba;

pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&pixel);
    }

    /// Overwrites every pixel of rows `rows`.
    pub fn fill_rows(&mut self, rows: std::ops::Range<u32>, pixel: [u8; 4]) {
        let start = rows.start.min(self.height) as usize * self.width as usize * 4;
        let end = rows.end.min(self.height) as usize * self.width as usize * 4;
        for chunk in self.data[start..end].chunks_exact_mut(4) {
            chunk.copy_from_slice(&pixel);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize * self.width as usize + x as usize) * 4
    }
}

// buffers can be large, keep Debug output short
impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

pub fn quantize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn opaque(color: Srgba) -> [u8; 4] {
    [quantize(color.red), quantize(color.green), quantize(color.blue), 255]
}

// channel math on rgb only, alpha is decided by the caller
pub fn scale(color: Srgba, factor: f32) -> Srgba {
    Srgba::new(color.red * factor, color.green * factor, color.blue * factor, color.alpha)
}

pub fn lerp(a: Srgba, b: Srgba, t: f32) -> Srgba {
    Srgba::new(
        a.red + (b.red - a.red) * t,
        a.green + (b.green - a.green) * t,
        a.blue + (b.blue - a.blue) * t,
        a.alpha + (b.alpha - a.alpha) * t,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_buffer_has_uniform_pixels() {
        let buffer = PixelBuffer::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(buffer.as_bytes().len(), 3 * 2 * 4);
        assert_eq!(buffer.get(2, 1), [1, 2, 3, 4]);
    }

    #[test]
    fn set_is_row_major() {
        let mut buffer = PixelBuffer::filled(4, 4, TRANSPARENT);
        buffer.set(1, 2, [9, 9, 9, 9]);
        let i = (2 * 4 + 1) * 4;
        assert_eq!(&buffer.as_bytes()[i..i + 4], &[9, 9, 9, 9]);
    }

    #[test]
    fn fill_rows_clamps_to_height() {
        let mut buffer = PixelBuffer::filled(2, 3, TRANSPARENT);
        buffer.fill_rows(1..10, [7, 7, 7, 255]);
        assert_eq!(buffer.get(0, 0), TRANSPARENT);
        assert_eq!(buffer.get(1, 2), [7, 7, 7, 255]);
    }

    #[test]
    fn quantize_clamps() {
        assert_eq!(quantize(-0.5), 0);
        assert_eq!(quantize(1.2), 255);
        assert_eq!(quantize(0.5), 128);
    }
}
