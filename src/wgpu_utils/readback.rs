// src/wgpu_utils/readback.rs
//! Helpers for copying textures back to the CPU
//!
//! Texture-to-buffer copies require every row to start on a
//! `COPY_BYTES_PER_ROW_ALIGNMENT` (256 byte) boundary.

/// Row stride of a texture copy for `width` pixels of `bytes_per_pixel`
pub fn padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    let unpadded = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strips the per-row padding from a mapped readback buffer
pub fn unpad_rows(data: &[u8], width: u32, height: u32, bytes_per_pixel: u32) -> Vec<u8> {
    let unpadded = (width * bytes_per_pixel) as usize;
    let padded = padded_bytes_per_row(width, bytes_per_pixel) as usize;

    let mut pixels = Vec::with_capacity(unpadded * height as usize);
    for row in data.chunks(padded).take(height as usize) {
        pixels.extend_from_slice(&row[..unpadded]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_aligned_to_256_bytes() {
        assert_eq!(padded_bytes_per_row(64, 4), 256);
        assert_eq!(padded_bytes_per_row(65, 4), 512);
        assert_eq!(padded_bytes_per_row(1, 4), 256);
        assert_eq!(padded_bytes_per_row(256, 4), 1024);
    }

    #[test]
    fn padding_is_removed() {
        let (width, height) = (3u32, 2u32);
        let stride = padded_bytes_per_row(width, 4) as usize;
        let mut data = vec![0xAAu8; stride * height as usize];
        for y in 0..height as usize {
            for x in 0..(width * 4) as usize {
                data[y * stride + x] = (y * 100 + x) as u8;
            }
        }

        let pixels = unpad_rows(&data, width, height, 4);

        assert_eq!(pixels.len(), 24);
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[11], 11);
        assert_eq!(pixels[12], 100);
        assert!(!pixels.contains(&0xAA));
    }
}
