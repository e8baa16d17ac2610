use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// The monochrome display. Each row is a 64-bit mask where the most
/// significant bit is the leftmost column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    rows: [u64; SCREEN_HEIGHT],
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Screen {
        Screen {
            rows: [0; SCREEN_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.rows = [0; SCREEN_HEIGHT];
    }

    pub fn rows(&self) -> &[u64; SCREEN_HEIGHT] {
        &self.rows
    }

    #[cfg(test)]
    pub(crate) fn rows_mut(&mut self) -> &mut [u64; SCREEN_HEIGHT] {
        &mut self.rows
    }

    /// The row at `y`, wrapping vertically.
    pub fn row(&self, y: usize) -> u64 {
        self.rows[y % SCREEN_HEIGHT]
    }

    /// Whether the pixel at column `x`, row `y` is lit. Out of range coordinates are never lit.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return false;
        }
        self.rows[y] & (1 << (SCREEN_WIDTH - 1 - x)) != 0
    }

    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|row| *row == 0)
    }

    /// XOR one byte of sprite data onto the screen with its most significant bit at column `x`.
    /// Rows wrap vertically, columns past the right edge are clipped.
    /// Returns whether any lit pixel was hit.
    pub fn draw_sprite_row(&mut self, x: u8, y: usize, sprite: u8) -> bool {
        let mask = ((sprite as u64) << (SCREEN_WIDTH - 8))
            .checked_shr(x as u32)
            .unwrap_or(0);
        let row = &mut self.rows[y % SCREEN_HEIGHT];
        let collision = *row & mask != 0;
        *row ^= mask;
        collision
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                write!(f, "{}", if self.pixel(x, y) { "#" } else { " " })?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sprite_is_left_aligned_to_column() {
        let mut screen = Screen::new();
        assert!(!screen.draw_sprite_row(0, 0, 0xF0));
        assert_eq!(screen.row(0), 0xF000_0000_0000_0000);
        assert!(screen.pixel(0, 0));
        assert!(screen.pixel(3, 0));
        assert!(!screen.pixel(4, 0));
    }

    #[test]
    fn sprite_is_clipped_at_right_edge() {
        let mut screen = Screen::new();
        screen.draw_sprite_row(60, 0, 0xFF);
        assert_eq!(screen.row(0), 0x0000_0000_0000_000F);
    }

    #[test]
    fn sprite_past_right_edge_draws_nothing() {
        let mut screen = Screen::new();
        assert!(!screen.draw_sprite_row(64, 3, 0xFF));
        assert!(!screen.draw_sprite_row(200, 3, 0xFF));
        assert!(screen.is_blank());
    }

    #[test]
    fn rows_wrap_vertically() {
        let mut screen = Screen::new();
        screen.draw_sprite_row(8, 33, 0x80);
        assert!(screen.pixel(8, 1));
    }

    #[test]
    fn display_renders_lit_pixels() {
        let mut screen = Screen::new();
        screen.draw_sprite_row(0, 0, 0xC0);
        let rendered = screen.to_string();
        let first_line = rendered.lines().next().unwrap();
        assert!(first_line.starts_with("## "));
        assert_eq!(first_line.len(), SCREEN_WIDTH);
        assert_eq!(rendered.lines().count(), SCREEN_HEIGHT);
    }

    proptest! {
        #[test]
        fn drawing_twice_restores_row(
            existing in any::<u64>(),
            x in any::<u8>(),
            sprite in any::<u8>(),
        ) {
            let mut screen = Screen::new();
            screen.rows[5] = existing;
            screen.draw_sprite_row(x, 5, sprite);
            screen.draw_sprite_row(x, 5, sprite);
            prop_assert_eq!(screen.row(5), existing);
        }
    }
}
