use crate::instruction::Op;
use crate::interpreter::{Chip8Interpreter, RunState};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::text::Spans;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// Display is used by the interpreter to draw things on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    /// draw one byte per pixel (0 or 1), plus machine state if asked for
    fn draw(&mut self, screen: &[u8], overlay: Option<&Overlay>) -> Result<(), io::Error>;
}

// store useful metadata about the screen
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

    /// canvas coordinates of every pixel with the given value
    fn bitplane_from_data<'a>(
        &self,
        data: &'a [u8],
        bitplane: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let w = self.0;
        data.iter()
            .enumerate()
            .filter(move |(_, px)| **px == bitplane)
            .map(move |(n, _)| {
                (
                    (n % w) as f64,        // x
                    -1.0 * (n / w) as f64, // y
                )
            })
    }
}

/// one line of the disassembly listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingLine {
    pub addr: u16,
    pub word: u16,
    pub op: Op,
    /// next to execute
    pub current: bool,
}

/// Machine state captured between steps, for the debug pane
#[derive(Clone, Debug)]
pub struct Overlay {
    pub registers: [u8; 16],
    pub program_counter: u16,
    pub i: u16,
    pub cir: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: Vec<u16>,
    pub keys: u16,
    pub state: RunState,
    pub listing: Vec<ListingLine>,
}

impl Overlay {
    /// snapshot `machine`, listing `radius` instructions either side of PC
    pub fn capture(machine: &Chip8Interpreter, radius: usize) -> Self {
        let cpu = machine.cpu();
        let pc = cpu.program_counter;
        let start = pc.saturating_sub(2 * radius as u16);
        let listing = (0..=2 * radius as u16)
            .map(|n| start.wrapping_add(2 * n))
            .filter_map(|addr| {
                machine.disassemble(addr).map(|(word, op)| ListingLine {
                    addr,
                    word,
                    op,
                    current: addr == pc,
                })
            })
            .collect();
        Overlay {
            registers: cpu.v,
            program_counter: pc,
            i: cpu.i,
            cir: cpu.cir,
            delay_timer: cpu.delay_timer,
            sound_timer: cpu.sound_timer,
            stack: machine.stack().to_vec(),
            keys: machine.keys(),
            state: machine.state().clone(),
            listing,
        }
    }

    /// plain text rendition, one string per line
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (n, regs) in self.registers.chunks(4).enumerate() {
            lines.push(
                regs.iter()
                    .enumerate()
                    .map(|(k, v)| format!("v{:x}={:02x}", n * 4 + k, v))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        lines.push(format!(
            "pc={:03x} i={:03x} cir={:04x}",
            self.program_counter, self.i, self.cir
        ));
        lines.push(format!(
            "dt={:02x} st={:02x} keys={:016b}",
            self.delay_timer, self.sound_timer, self.keys
        ));
        let stack = self
            .stack
            .iter()
            .map(|a| format!("{:03x}", a))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("stack[{}] {}", self.stack.len(), stack));
        lines.push(match &self.state {
            RunState::Running => "running".to_string(),
            RunState::AwaitingKey(x) => format!("waiting for key -> v{:x}", x),
            RunState::Faulted(fault) => format!("halted: {}", fault),
        });
        lines.push(String::new());
        for l in &self.listing {
            lines.push(format!(
                "{} {:03x} {:04x}  {}",
                if l.current { ">" } else { " " },
                l.addr,
                l.word,
                l.op
            ));
        }
        lines
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new(x: usize, y: usize) -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(x, y),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, screen: &[u8], overlay: Option<&Overlay>) -> Result<(), io::Error> {
        // make sure we're given exactly the right amount of data to draw
        assert_eq!(
            screen.len(),
            self.resolution.pixel_count(),
            "MonoTermDisplay must have correct-sized data to draw"
        );

        let resolution = &self.resolution;
        let off: Vec<(f64, f64)> = resolution.bitplane_from_data(screen, 0).collect();
        let on: Vec<(f64, f64)> = resolution.bitplane_from_data(screen, 1).collect();
        let lines = overlay.map(|o| o.lines());
        let title = match overlay {
            Some(o) if o.sound_timer > 0 => "CHIP-8 *beep*",
            _ => "CHIP-8",
        };

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let area = f.size();
            let screen_area = Rect::new(
                0,
                0,
                2 + resolution.0 as u16,
                2 + resolution.1 as u16,
            )
            .intersection(area);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title(title)
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &off,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &on,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, screen_area);

            if let Some(lines) = &lines {
                let info_area = Rect::new(
                    screen_area.width,
                    0,
                    area.width.saturating_sub(screen_area.width),
                    area.height,
                );
                if info_area.width > 2 {
                    let text: Vec<Spans> = lines.iter().map(|l| Spans::from(l.as_str())).collect();
                    let info = Paragraph::new(text)
                        .block(Block::default().title("state").borders(Borders::ALL));
                    f.render_widget(info, info_area);
                }
            }
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
pub struct DummyDisplay {
    frames: usize,
    last: Vec<u8>,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay {
            frames: 0,
            last: Vec::new(),
        }
    }

    /// how many times draw was called
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// the most recent screen contents
    #[cfg(test)]
    pub fn last(&self) -> &[u8] {
        &self.last
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, screen: &[u8], _overlay: Option<&Overlay>) -> Result<(), io::Error> {
        self.frames += 1;
        self.last = screen.to_vec();
        Ok(())
    }
}
