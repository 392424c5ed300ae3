//! The local sensor window delivered each tick.
//!
//! Cells are stored agent-relative exactly as the engine sends them: row 0 is
//! the row furthest ahead of the agent, column 0 is on its left hand side and
//! the centre cell is the agent itself.

use crate::{Direction, ViewConfig, is_window_side, map::Grid};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("window is {width}x{height}, sides must be odd and at least 3")]
    BadSize { width: usize, height: usize },
    #[error("frame has {found} cells, expected {expected}")]
    WrongLength { expected: usize, found: usize },
    #[error("window row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    cells: Grid<char>,
}

impl View {
    /// Callers guarantee odd sides of at least 3.
    pub(crate) fn new(cells: Grid<char>) -> Self {
        View { cells }
    }

    /// Decodes one wire frame: every cell in row-major order except the centre.
    pub fn from_frame(config: ViewConfig, frame: &[u8]) -> Result<View, ViewError> {
        if !config.is_valid() {
            return Err(ViewError::BadSize {
                width: config.width,
                height: config.height,
            });
        }
        if frame.len() != config.frame_len() {
            return Err(ViewError::WrongLength {
                expected: config.frame_len(),
                found: frame.len(),
            });
        }
        let (cx, cy) = (config.width / 2, config.height / 2);
        let mut bytes = frame.iter();
        let cells = Grid::from_generator(config.width, config.height, |x, y| {
            if (x, y) == (cx, cy) {
                '^'
            } else {
                bytes.next().map_or(' ', |b| *b as char)
            }
        });
        Ok(View { cells })
    }

    /// Builds a window from text rows, mostly for tests and the simulator.
    pub fn from_rows(rows: &[&str]) -> Result<View, ViewError> {
        let width = rows.first().map_or(0, |row| row.chars().count());
        if !is_window_side(width) || !is_window_side(rows.len()) {
            return Err(ViewError::BadSize {
                width,
                height: rows.len(),
            });
        }
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(ViewError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
        }
        let chars: Vec<Vec<char>> = rows.iter().map(|row| row.chars().collect()).collect();
        Ok(View {
            cells: Grid::from_generator(width, rows.len(), |x, y| chars[y][x]),
        })
    }

    /// Encodes the window the way the engine sends it.
    pub fn to_frame(&self) -> Vec<u8> {
        let centre = self.centre();
        self.cells
            .enumerate()
            .filter(|(coords, _)| *coords != centre)
            .map(|(_, c)| *c as u8)
            .collect()
    }

    pub fn width(&self) -> usize {
        self.cells.width()
    }

    pub fn height(&self) -> usize {
        self.cells.height()
    }

    pub fn centre(&self) -> (usize, usize) {
        (self.cells.width() / 2, self.cells.height() / 2)
    }

    pub fn cells(&self) -> &Grid<char> {
        &self.cells
    }

    /// Reorients the window so that `(x, y)` corresponds to the world offset
    /// `(x - centre_x, y - centre_y)` from the agent.
    pub fn oriented(&self, facing: Direction) -> Grid<char> {
        match facing {
            Direction::North => self.cells.clone(),
            Direction::East => self.cells.transpose().flip_horizontal(),
            Direction::South => self.cells.flip_horizontal().flip_vertical(),
            Direction::West => self.cells.transpose().flip_vertical(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked() -> View {
        // 'A' ahead, 'R' right, 'B' behind, 'L' left.
        View::from_rows(&["     ", "  A  ", " L^R ", "  B  ", "     "]).unwrap()
    }

    #[test]
    fn facing_north_keeps_layout() {
        let world = marked().oriented(Direction::North);
        assert_eq!(world[(2, 1)], 'A');
        assert_eq!(world[(3, 2)], 'R');
    }

    #[test]
    fn facing_east_puts_ahead_on_positive_x() {
        let world = marked().oriented(Direction::East);
        assert_eq!(world[(3, 2)], 'A');
        assert_eq!(world[(2, 3)], 'R');
        assert_eq!(world[(1, 2)], 'B');
        assert_eq!(world[(2, 1)], 'L');
    }

    #[test]
    fn facing_south_and_west_rotate_consistently() {
        let south = marked().oriented(Direction::South);
        assert_eq!(south[(2, 3)], 'A');
        assert_eq!(south[(1, 2)], 'R');
        let west = marked().oriented(Direction::West);
        assert_eq!(west[(1, 2)], 'A');
        assert_eq!(west[(2, 1)], 'R');
        assert_eq!(west[(2, 3)], 'L');
    }

    #[test]
    fn windows_without_a_centre_are_rejected() {
        assert_eq!(
            View::from_rows(&[]),
            Err(ViewError::BadSize {
                width: 0,
                height: 0,
            })
        );
        assert_eq!(
            View::from_rows(&["    ", "    ", "  ^ ", "    "]),
            Err(ViewError::BadSize {
                width: 4,
                height: 4,
            })
        );
        assert_eq!(
            View::from_rows(&["^"]),
            Err(ViewError::BadSize {
                width: 1,
                height: 1,
            })
        );
        let flat = ViewConfig {
            width: 5,
            height: 0,
        };
        assert_eq!(
            View::from_frame(flat, &[]),
            Err(ViewError::BadSize {
                width: 5,
                height: 0,
            })
        );
        assert!(View::from_rows(&["   ", " ^ ", "   "]).is_ok());
    }

    #[test]
    fn frame_round_trip_skips_centre() {
        let view = marked();
        let frame = view.to_frame();
        assert_eq!(frame.len(), 24);
        let decoded = View::from_frame(ViewConfig::default(), &frame).unwrap();
        assert_eq!(decoded, view);
        assert_eq!(
            View::from_frame(ViewConfig::default(), &frame[1..]),
            Err(ViewError::WrongLength {
                expected: 24,
                found: 23,
            })
        );
    }
}
