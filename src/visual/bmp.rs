//! Hand-rolled 24-bit uncompressed BMP writer: standard 54-byte header,
//! rows padded to a 4-byte boundary, bottom-up row order, RGB stored as
//! BGR.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// An RGB framebuffer, row-major, top-down in memory (row 0 = top row).
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 3]>,
}

impl Image {
    pub fn new(width: usize, height: usize, fill: [u8; 3]) -> Self {
        Image {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    pub fn set(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        self.pixels[idx] = color;
    }

    pub fn get(&self, x: i64, y: i64) -> Option<[u8; 3]> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width + x as usize])
    }

    pub fn write_bmp(&self, path: &Path) -> Result<()> {
        let row_size = ((self.width * 3 + 3) / 4) * 4;
        let pixel_data_size = row_size * self.height;
        let file_size = 54 + pixel_data_size;

        let mut buf = Vec::with_capacity(file_size);
        buf.extend_from_slice(b"BM");
        buf.extend_from_slice(&(file_size as u32).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&54u32.to_le_bytes());

        buf.extend_from_slice(&40u32.to_le_bytes());
        buf.extend_from_slice(&(self.width as i32).to_le_bytes());
        buf.extend_from_slice(&(self.height as i32).to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&24u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&(pixel_data_size as u32).to_le_bytes());
        buf.extend_from_slice(&2835i32.to_le_bytes());
        buf.extend_from_slice(&2835i32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());

        let padding = row_size - self.width * 3;
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let [r, g, b] = self.pixels[y * self.width + x];
                buf.push(b);
                buf.push(g);
                buf.push(r);
            }
            for _ in 0..padding {
                buf.push(0);
            }
        }

        let mut file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(&buf)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
