use crate::color::{OutputColor, COLOR_CHANNELS};
use ultraviolet::Vec2;

/// 8bpp RGB image, rows top to bottom.
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, background: OutputColor) -> Self {
        let pixels = background
            .iter()
            .copied()
            .cycle()
            .take(width * height * COLOR_CHANNELS)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<OutputColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * COLOR_CHANNELS;
        let mut color = [0; COLOR_CHANNELS];
        color.copy_from_slice(&self.pixels[i..][..COLOR_CHANNELS]);
        Some(color)
    }

    fn set(&mut self, x: i64, y: i64, color: OutputColor) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * COLOR_CHANNELS;
        self.pixels[i..][..COLOR_CHANNELS].copy_from_slice(&color);
    }

    /// Draws a one pixel wide line, skipping whatever falls outside the canvas.
    pub fn line(&mut self, a: Vec2, b: Vec2, color: OutputColor) {
        let (a, b) = match self.clip(a, b) {
            Some(clipped) => clipped,
            None => return,
        };

        // Bresenham
        let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
        let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.set(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Liang-Barsky clip of segment `a..b` to the canvas rectangle.
    fn clip(&self, a: Vec2, b: Vec2) -> Option<(Vec2, Vec2)> {
        let max = Vec2::new(self.width as f32 - 1., self.height as f32 - 1.);
        let d = b - a;
        let mut t0 = 0f32;
        let mut t1 = 1f32;

        for &(p, q) in [
            (-d.x, a.x),
            (d.x, max.x - a.x),
            (-d.y, a.y),
            (d.y, max.y - a.y),
        ]
        .iter()
        {
            if p == 0. {
                if q < 0. {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0. {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }

        Some((a + d * t0, a + d * t1))
    }
}
