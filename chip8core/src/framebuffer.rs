use std::slice::Chunks;

pub const GFX_W: usize = 64;
pub const GFX_H: usize = 32;

/// Monochrome 64x32 display, row-major (`y * GFX_W + x`).
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [bool; GFX_W * GFX_H],
}

impl Default for Framebuffer {
    fn default() -> Framebuffer {
        Framebuffer { pixels: [false; GFX_W * GFX_H] }
    }
}

impl Framebuffer {
    pub fn new() -> Framebuffer {
        Default::default()
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.iter_mut() {
            *pixel = false;
        }
    }

    /// Pixel at `(x, y)`. Out-of-range coordinates read as dark.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < GFX_W && y < GFX_H && self.pixels[y * GFX_W + x]
    }

    /// XORs `bit` into the pixel at `(x, y)`, which must be in range.
    /// Returns true if a lit pixel was turned off.
    pub fn flip(&mut self, x: usize, y: usize, bit: bool) -> bool {
        let idx = y * GFX_W + x;
        let erased = bit && self.pixels[idx];
        self.pixels[idx] ^= bit;
        erased
    }

    pub fn rows(&self) -> Chunks<bool> {
        self.pixels.chunks(GFX_W)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.pixels
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| !p)
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&on| if on { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_framebuffer_is_blank() {
        let fb = Framebuffer::new();
        assert!(fb.is_blank());
        assert_eq!(fb.rows().count(), GFX_H);
        assert!(fb.rows().all(|r| r.len() == GFX_W));
    }

    #[test]
    fn flip_xors_and_reports_erasure() {
        let mut fb = Framebuffer::new();

        assert!(!fb.flip(3, 2, true));
        assert!(fb.get(3, 2));
        assert_eq!(fb.as_slice()[2 * GFX_W + 3], true);

        // a dark sprite bit leaves the pixel alone
        assert!(!fb.flip(3, 2, false));
        assert!(fb.get(3, 2));

        assert!(fb.flip(3, 2, true));
        assert!(!fb.get(3, 2));
        assert!(fb.is_blank());
    }

    #[test]
    fn get_out_of_range_is_dark() {
        let fb = Framebuffer::new();
        assert!(!fb.get(GFX_W, 0));
        assert!(!fb.get(0, GFX_H));
    }

    #[test]
    fn clear_turns_everything_off() {
        let mut fb = Framebuffer::new();
        fb.flip(0, 0, true);
        fb.flip(63, 31, true);
        fb.clear();
        assert!(fb.is_blank());
    }
}
