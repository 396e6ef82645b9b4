use std::io::{self, Write};

use chip8core::{Framebuffer, GFX_W};

/// Where the runner sends each finished frame.
pub trait FrameSink {
    fn present(&mut self, frame: &Framebuffer) -> io::Result<()>;
}

impl<'a, S: FrameSink + ?Sized> FrameSink for &'a mut S {
    fn present(&mut self, frame: &Framebuffer) -> io::Result<()> {
        (**self).present(frame)
    }
}

const LIT: char = '█';
const DARK: char = ' ';

/// Renders frames as text, one line per pixel row, followed by a rule.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> TextSink<W> {
        TextSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for TextSink<W> {
    fn present(&mut self, frame: &Framebuffer) -> io::Result<()> {
        let mut text = String::new();
        for row in frame.rows() {
            text.extend(row.iter().map(|&on| if on { LIT } else { DARK }));
            text.push('\n');
        }
        text.extend(std::iter::repeat('-').take(GFX_W));
        text.push('\n');

        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}

/// Discards frames; for running without a display.
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &Framebuffer) -> io::Result<()> {
        Ok(())
    }
}
