use crate::core::errors::{LifeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Byte value of a live cell, as exchanged with the I/O collaborator
pub const ALIVE: u8 = 0xFF;
/// Byte value of a dead cell
pub const DEAD: u8 = 0x00;

/// Position of a cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Read-only copy of the board, frozen at the start of a turn.
///
/// Every transition computed during a turn reads from exactly one snapshot,
/// so results written back during that turn can never leak into another
/// cell's computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Snapshot {
    /// An all-dead board
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![DEAD; width * height],
        }
    }

    /// Wrap a row-major byte stream, checking its length
    pub fn from_bytes(width: usize, height: usize, cells: Vec<u8>) -> Result<Self> {
        let expected = width * height;
        if cells.len() != expected {
            return Err(LifeError::invalid_seed(expected, cells.len()));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a board from a list of live cells
    pub fn from_alive(width: usize, height: usize, alive: &[Cell]) -> Self {
        let mut snapshot = Self::new(width, height);
        for cell in alive {
            snapshot.cells[cell.y * width + cell.x] = ALIVE;
        }
        snapshot
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw cell byte at (x, y)
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.width + x]
    }

    #[inline]
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == ALIVE
    }

    #[inline]
    pub(crate) fn set(&mut self, x: usize, y: usize, state: u8) {
        self.cells[y * self.width + x] = state;
    }

    /// Number of live cells
    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&b| b == ALIVE).count()
    }

    /// Live cells in row-major order
    pub fn alive_cells(&self) -> Vec<Cell> {
        alive_in(self.width, &self.cells)
    }

    /// Row-major byte stream, as handed to the I/O collaborator
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.cells
    }
}

/// Double-buffered board: a live buffer written by the control loop and a
/// shared snapshot read by workers.
#[derive(Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    live: Vec<u8>,
    snapshot: Arc<Snapshot>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            live: vec![DEAD; width * height],
            snapshot: Arc::new(Snapshot::new(width, height)),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.live.len()
    }

    /// Populate the live buffer from a row-major seed stream.
    ///
    /// Any non-zero byte seeds a live cell; bytes other than 0xFF are
    /// normalized and reported. Returns the seeded live cells.
    pub fn seed(&mut self, bytes: &[u8]) -> Result<Vec<Cell>> {
        if bytes.len() != self.live.len() {
            return Err(LifeError::invalid_seed(self.live.len(), bytes.len()));
        }

        let mut seeded = Vec::new();
        for (idx, &value) in bytes.iter().enumerate() {
            if value == DEAD {
                self.live[idx] = DEAD;
                continue;
            }
            let cell = Cell::new(idx % self.width, idx / self.width);
            if value != ALIVE {
                warn!(%cell, value, "Non-standard seed byte treated as alive");
            }
            debug!(%cell, "Alive cell at seed");
            self.live[idx] = ALIVE;
            seeded.push(cell);
        }
        Ok(seeded)
    }

    /// Copy the whole live buffer into a fresh snapshot.
    ///
    /// This is the only point where workers' view of the board changes.
    pub fn freeze(&mut self) -> Arc<Snapshot> {
        self.snapshot = Arc::new(Snapshot {
            width: self.width,
            height: self.height,
            cells: self.live.clone(),
        });
        self.snapshot.clone()
    }

    /// The snapshot for the turn in progress
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    /// Write one computed cell into the live buffer
    #[inline]
    pub fn write(&mut self, cell: Cell, state: u8) {
        self.live[cell.y * self.width + cell.x] = state;
    }

    /// Copy of the live buffer, e.g. for final output
    pub fn live_snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.width,
            height: self.height,
            cells: self.live.clone(),
        }
    }

    /// Live cells of the live buffer in row-major order
    pub fn alive_cells(&self) -> Vec<Cell> {
        alive_in(self.width, &self.live)
    }
}

fn alive_in(width: usize, cells: &[u8]) -> Vec<Cell> {
    cells
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b != DEAD)
        .map(|(idx, _)| Cell::new(idx % width, idx / width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn seed_normalizes_nonstandard_bytes() {
        let mut grid = Grid::new(3, 2);
        let seeded = grid.seed(&[0, 0xFF, 0, 7, 0, 0]).unwrap();

        assert_eq!(seeded, vec![Cell::new(1, 0), Cell::new(0, 1)]);
        let live = grid.live_snapshot();
        assert_eq!(live.as_bytes(), &[0, 0xFF, 0, 0xFF, 0, 0]);
    }

    #[test]
    fn seed_rejects_wrong_length() {
        let mut grid = Grid::new(4, 4);
        let err = grid.seed(&[0; 15]).unwrap_err();
        assert!(matches!(
            err,
            LifeError::InvalidSeed {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn freeze_isolates_snapshot_from_live_writes() {
        let mut grid = Grid::new(4, 4);
        grid.seed(&[0xFF; 16]).unwrap();
        let snapshot = grid.freeze();

        grid.write(Cell::new(2, 3), DEAD);

        assert!(snapshot.is_alive(2, 3));
        assert!(grid.snapshot().is_alive(2, 3));
        assert_eq!(grid.alive_cells().len(), 15);
        assert_eq!(snapshot.alive_count(), 16);
    }

    #[test]
    fn alive_cells_are_row_major() {
        let snapshot = Snapshot::from_alive(
            5,
            5,
            &[Cell::new(4, 1), Cell::new(0, 3), Cell::new(2, 1)],
        );
        assert_eq!(
            snapshot.alive_cells(),
            vec![Cell::new(2, 1), Cell::new(4, 1), Cell::new(0, 3)]
        );
    }

    #[test]
    fn from_bytes_checks_length() {
        assert!(Snapshot::from_bytes(2, 2, vec![0; 4]).is_ok());
        assert!(Snapshot::from_bytes(2, 2, vec![0; 5]).is_err());
    }
}
