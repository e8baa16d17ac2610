use chip_8_vm::emulator::screen::{Screen, SCREEN_HEIGHT, SCREEN_WIDTH};
use chip_8_vm::emulator::Emulator;

use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, style::Print};
use std::io::{stdout, Stdout, Write};

/// The first terminal column right of the screen border.
const PANEL_COLUMN: u16 = 2 * SCREEN_WIDTH as u16 + 3;

/// Draws the emulator screen into the terminal, two characters per pixel,
/// inside a border with a diagnostic panel to its right.
pub struct CrosstermOutput {
    stdout: Stdout,
    last_frame: Option<Screen>,
}

impl CrosstermOutput {
    pub fn new() -> crossterm::Result<CrosstermOutput> {
        let mut stdout = stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;

        let mut output = CrosstermOutput {
            stdout,
            last_frame: None,
        };
        output.draw_border()?;
        Ok(output)
    }

    fn draw_border(&mut self) -> crossterm::Result<()> {
        let right = 2 * SCREEN_WIDTH as u16 + 1;
        let bottom = SCREEN_HEIGHT as u16 + 1;
        let horizontal = "━".repeat(2 * SCREEN_WIDTH);

        queue!(self.stdout, cursor::MoveTo(0, 0), Print(format!("┏{}┓", horizontal)))?;
        for y in 1..bottom {
            queue!(
                self.stdout,
                cursor::MoveTo(0, y),
                Print('┃'),
                cursor::MoveTo(right, y),
                Print('┃')
            )?;
        }
        queue!(self.stdout, cursor::MoveTo(0, bottom), Print(format!("┗{}┛", horizontal)))?;
        self.stdout.flush()?;
        Ok(())
    }

    /// Redraw the rows that changed since the last refresh, and the panel.
    pub fn refresh(&mut self, emulator: &Emulator, panel: &[String]) -> crossterm::Result<()> {
        let screen = emulator.screen();
        for y in 0..SCREEN_HEIGHT {
            let unchanged = self
                .last_frame
                .map(|frame| frame.row(y) == screen.row(y))
                .unwrap_or(false);
            if unchanged {
                continue;
            }

            let line: String = (0..SCREEN_WIDTH)
                .map(|x| if screen.pixel(x, y) { "██" } else { "  " })
                .collect();
            queue!(self.stdout, cursor::MoveTo(1, y as u16 + 1), Print(line))?;
        }
        self.last_frame = Some(*screen);

        for (y, line) in panel.iter().enumerate() {
            queue!(
                self.stdout,
                cursor::MoveTo(PANEL_COLUMN, y as u16),
                Print(line),
                Clear(ClearType::UntilNewLine)
            )?;
        }
        self.stdout.flush()?;
        Ok(())
    }

    /// Ring the terminal bell, standing in for the buzzer.
    pub fn bell(&mut self) -> crossterm::Result<()> {
        queue!(self.stdout, Print('\x07'))?;
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for CrosstermOutput {
    fn drop(&mut self) {
        let restored = execute!(self.stdout, LeaveAlternateScreen, cursor::Show)
            .and_then(|_| terminal::disable_raw_mode());
        if let Err(e) = restored {
            log::error!("Could not restore terminal: {}", e);
        }
    }
}
