use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::{execute, queue};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use std::io::Write;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is used by the driver to put the machine's bitmap on a screen.
/// It should abstract the implementation details, so a variety of kinds of
/// screen would work. Displays only ever read the bitmap.
pub trait Display {
    /// blank the screen, e.g. when a new program is loaded
    fn reset(&mut self) -> Result<(), io::Error>;

    /// draw a frame: one byte per pixel (0 or 1), row-major, at the
    /// resolution the display was built with
    fn render(&mut self, cells: &[u8]) -> Result<(), io::Error>;

    /// take over the whole screen, where that means anything
    fn fullscreen(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}

// width and height in pixels
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every cell holding `value`; y grows downward on
    /// the machine but upward on the canvas
    fn bitplane_from_cells<'a>(
        &self,
        cells: &'a [u8],
        value: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let w = self.0;
        cells
            .iter()
            .enumerate()
            .filter(move |&(_, &c)| c == value)
            .map(move |(i, _)| ((i % w) as f64, -1.0 * (i / w) as f64))
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    alternate_screen: bool,
}

impl TermDisplay {
    pub fn new(x: usize, y: usize) -> Result<TermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(TermDisplay {
            terminal,
            resolution: Resolution(x, y),
            alternate_screen: false,
        })
    }
}

impl Display for TermDisplay {
    fn reset(&mut self) -> Result<(), io::Error> {
        self.terminal.clear()
    }

    fn render(&mut self, cells: &[u8]) -> Result<(), io::Error> {
        // make sure we're given exactly the right amount of data to draw
        assert_eq!(
            cells.len(),
            self.resolution.pixel_count(),
            "TermDisplay must have correct-sized data to draw"
        );
        let lit = self.resolution.bitplane_from_cells(cells, 1).collect::<Vec<_>>();
        let unlit = self.resolution.bitplane_from_cells(cells, 0).collect::<Vec<_>>();
        let x_bounds = self.resolution.x_bounds();
        let y_bounds = self.resolution.y_bounds();
        let size = Rect::new(
            0,
            0,
            2 + self.resolution.0 as u16,
            2 + self.resolution.1 as u16,
        );

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &unlit,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::Green,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }

    /// switch to the alternate screen so the frame doesn't scroll
    fn fullscreen(&mut self) -> Result<(), io::Error> {
        if !self.alternate_screen {
            execute!(io::stdout(), EnterAlternateScreen, Hide)?;
            self.alternate_screen = true;
        }
        self.terminal.clear()
    }
}

impl Drop for TermDisplay {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        }
    }
}

/// plain text frames: 'X' for a lit pixel, ' ' otherwise, one line per row
pub struct AsciiDisplay<W: Write> {
    out: W,
    width: usize,
    line_end: &'static str,
    home: bool,
}

impl<W: Write> AsciiDisplay<W> {
    pub fn new(out: W, width: usize) -> Self {
        AsciiDisplay {
            out,
            width,
            line_end: "\n",
            home: false,
        }
    }

    /// for a terminal in raw mode, where a bare newline doesn't return the
    /// cursor to the left edge; every frame overdraws the last one
    pub fn raw(mut self) -> Self {
        self.line_end = "\r\n";
        self.home = true;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn frame(&self, cells: &[u8]) -> String {
        let mut output = String::with_capacity(cells.len() + cells.len() / self.width);
        for row in cells.chunks(self.width) {
            output.extend(row.iter().map(|&c| if c > 0 { 'X' } else { ' ' }));
            output.push_str(self.line_end);
        }
        output
    }
}

impl<W: Write> Display for AsciiDisplay<W> {
    fn reset(&mut self) -> Result<(), io::Error> {
        self.out.flush()
    }

    fn render(&mut self, cells: &[u8]) -> Result<(), io::Error> {
        let frame = self.frame(cells);
        if self.home {
            queue!(self.out, MoveTo(0, 0))?;
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }
}

/// useful for testing non-display routines; remembers what it was asked to do
#[derive(Default)]
pub struct DummyDisplay {
    pub frames: usize,
    pub resets: usize,
    pub last_frame: Vec<u8>,
}

impl DummyDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for DummyDisplay {
    fn reset(&mut self) -> Result<(), io::Error> {
        self.resets += 1;
        self.last_frame.clear();
        Ok(())
    }

    fn render(&mut self, cells: &[u8]) -> Result<(), io::Error> {
        self.frames += 1;
        self.last_frame = cells.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Resolution tests
    #[test]
    fn test_pixel_count() {
        let r = Resolution(64, 32);
        assert_eq!(r.pixel_count(), 2048)
    }

    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_bitplane() {
        let r = Resolution(4, 2);
        let cells = [1, 0, 0, 0, 0, 0, 0, 1];
        let lit: Vec<_> = r.bitplane_from_cells(&cells, 1).collect();
        assert_eq!(lit, vec![(0.0, 0.0), (3.0, -1.0)]);
        assert_eq!(r.bitplane_from_cells(&cells, 0).count(), 6);
    }

    // AsciiDisplay tests
    #[test]
    fn test_ascii_frame() -> Result<(), io::Error> {
        let mut d = AsciiDisplay::new(Vec::new(), 4);
        d.render(&[1, 0, 0, 1, 0, 1, 1, 0])?;
        let out = String::from_utf8(d.into_inner()).unwrap();
        assert_eq!(out, "X  X\n XX \n");
        Ok(())
    }

    #[test]
    fn test_ascii_raw_line_ends() -> Result<(), io::Error> {
        let mut d = AsciiDisplay::new(Vec::new(), 2).raw();
        d.render(&[1, 1, 0, 0])?;
        let out = String::from_utf8(d.into_inner()).unwrap();
        assert!(out.ends_with("XX\r\n  \r\n"));
        assert!(out.starts_with("\x1b["));
        Ok(())
    }

    #[test]
    fn test_ascii_blank_frame() -> Result<(), io::Error> {
        let mut d = AsciiDisplay::new(Vec::new(), 64);
        d.reset()?;
        d.render(&[0; 64 * 32])?;
        let out = String::from_utf8(d.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 32);
        assert!(out.lines().all(|l| l.len() == 64 && l.trim().is_empty()));
        Ok(())
    }

    #[test]
    fn test_dummy_counts() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new();
        d.render(&[1, 0])?;
        d.render(&[0, 1])?;
        assert_eq!(d.frames, 2);
        assert_eq!(d.last_frame, vec![0, 1]);
        d.reset()?;
        assert_eq!(d.resets, 1);
        assert!(d.last_frame.is_empty());
        Ok(())
    }

    // TermDisplay tests
    #[test]
    #[should_panic]
    fn test_draw_rejects_wrong_data() {
        let mut d = TermDisplay::new(64, 32).unwrap();
        let _ = d.render(&[0; 257]);
    }
}
