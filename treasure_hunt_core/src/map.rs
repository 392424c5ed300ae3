use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// A generic dense 2D grid.
///
/// Stores elements of type `T` in a flat vector using row-major order and is
/// addressed by `(x, y)` where `x` is the column and `y` the row. Used for the
/// sensor window and for the simulator's ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self
    where
        T: Clone,
    {
        Grid {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    /// Creates a new grid with the specified dimensions, filled by a generator function.
    ///
    /// The generator function `f` takes `(x, y)` coordinates and returns the value for that cell.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts (x, y) coordinates to a flat vector index.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    #[inline]
    pub fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Same as [`Grid::is_valid`] for signed coordinates.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && self.is_valid(x as usize, y as usize)
    }

    /// Gets an immutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get(index)
    }

    /// Gets a mutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get_mut(index)
    }

    /// Returns an iterator that yields `((x, y), &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| ((index % width, index / width), cell))
    }
}

impl<T: Clone> Grid<T> {
    /// Swaps the axes: the cell at `(x, y)` moves to `(y, x)`.
    pub fn transpose(&self) -> Grid<T> {
        Grid::from_generator(self.height, self.width, |x, y| self[(y, x)].clone())
    }

    /// Mirrors the grid left to right.
    pub fn flip_horizontal(&self) -> Grid<T> {
        let last = self.width - 1;
        Grid::from_generator(self.width, self.height, |x, y| self[(last - x, y)].clone())
    }

    /// Mirrors the grid top to bottom.
    pub fn flip_vertical(&self) -> Grid<T> {
        let last = self.height - 1;
        Grid::from_generator(self.width, self.height, |x, y| self[(x, last - y)].clone())
    }
}

/// Allows indexing the grid using `(usize, usize)` coordinates for immutable access.
impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let (x, y) = index;
        match self.coords_to_index(x, y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, self.width, self.height
            ),
        }
    }
}

/// Allows indexing the grid using `(usize, usize)` coordinates for mutable access.
impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let (x, y) = index;
        let width = self.width;
        let height = self.height;
        match self.coords_to_index(x, y) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, width, height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid<u8> {
        // 0 1 2
        // 3 4 5
        Grid::from_generator(3, 2, |x, y| (y * 3 + x) as u8)
    }

    #[test]
    fn transpose_swaps_axes() {
        let t = sample().transpose();
        assert_eq!((t.width(), t.height()), (2, 3));
        assert_eq!(t[(0, 2)], 2);
        assert_eq!(t[(1, 0)], 3);
    }

    #[test]
    fn flips_mirror_one_axis() {
        let h = sample().flip_horizontal();
        assert_eq!(h[(0, 0)], 2);
        assert_eq!(h[(2, 1)], 3);
        let v = sample().flip_vertical();
        assert_eq!(v[(0, 0)], 3);
        assert_eq!(v[(2, 1)], 2);
    }

    #[test]
    fn lookups_outside_the_grid_miss() {
        let mut grid = sample();
        assert_eq!(grid.get(3, 0), None);
        assert!(grid.get_mut(0, 2).is_none());
        if let Some(cell) = grid.get_mut(2, 1) {
            *cell = 9;
        }
        assert_eq!(grid[(2, 1)], 9);
        assert!(!grid.contains(-1, 0));
        assert!(grid.contains(2, 1));
    }
}
