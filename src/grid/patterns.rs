use super::board::{Cell, Snapshot, ALIVE, DEAD};

/// A named arrangement of live cells, as (x, y) offsets from an origin
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

pub const BLOCK: Pattern = Pattern {
    name: "block",
    cells: &[(0, 0), (1, 0), (0, 1), (1, 1)],
};

pub const BLINKER: Pattern = Pattern {
    name: "blinker",
    cells: &[(0, 0), (1, 0), (2, 0)],
};

pub const TOAD: Pattern = Pattern {
    name: "toad",
    cells: &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
};

pub const BEACON: Pattern = Pattern {
    name: "beacon",
    cells: &[(0, 0), (1, 0), (0, 1), (1, 1), (2, 2), (3, 2), (2, 3), (3, 3)],
};

/// Travels one cell down and right every four generations
pub const GLIDER: Pattern = Pattern {
    name: "glider",
    cells: &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
};

pub const PATTERNS: &[Pattern] = &[BLOCK, BLINKER, TOAD, BEACON, GLIDER];

impl Pattern {
    /// Look up a pattern by name
    pub fn find(name: &str) -> Option<&'static Pattern> {
        PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Absolute live cells with the pattern placed at `origin`, wrapping
    /// around the board edges.
    pub fn place(&self, width: usize, height: usize, origin: Cell) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .cells
            .iter()
            .map(|&(dx, dy)| Cell::new((origin.x + dx) % width, (origin.y + dy) % height))
            .collect();
        cells.sort_by_key(|c| (c.y, c.x));
        cells.dedup();
        cells
    }

    /// Row-major seed stream containing only this pattern
    pub fn stamp(&self, width: usize, height: usize, origin: Cell) -> Vec<u8> {
        Snapshot::from_alive(width, height, &self.place(width, height, origin)).into_bytes()
    }
}

/// Pseudo-random seed stream where roughly `density` of the cells are alive
pub fn random_soup(width: usize, height: usize, density: f64, seed: u64) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..width * height)
        .map(|_| if rng.f64() < density { ALIVE } else { DEAD })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::rules::step;
    use pretty_assertions::assert_eq;

    #[test]
    fn find_is_case_insensitive() {
        assert_eq!(Pattern::find("Glider").map(|p| p.name), Some("glider"));
        assert!(Pattern::find("gosper").is_none());
    }

    #[test]
    fn place_wraps_at_edges() {
        let cells = BLOCK.place(4, 4, Cell::new(3, 3));
        assert_eq!(
            cells,
            vec![
                Cell::new(0, 0),
                Cell::new(3, 0),
                Cell::new(0, 3),
                Cell::new(3, 3)
            ]
        );
    }

    #[test]
    fn oscillators_have_period_two() {
        for pattern in [&BLINKER, &TOAD, &BEACON] {
            let start = Snapshot::from_bytes(12, 12, pattern.stamp(12, 12, Cell::new(4, 4))).unwrap();
            let one = step(&start);
            assert_ne!(one, start, "{} should change", pattern.name);
            assert_eq!(step(&one), start, "{} should return", pattern.name);
        }
    }

    #[test]
    fn glider_translates_after_four_generations() {
        let start = Snapshot::from_bytes(10, 10, GLIDER.stamp(10, 10, Cell::new(2, 2))).unwrap();
        let mut board = start;
        for _ in 0..4 {
            board = step(&board);
        }
        assert_eq!(board.alive_cells(), GLIDER.place(10, 10, Cell::new(3, 3)));
    }

    #[test]
    fn random_soup_is_reproducible() {
        let a = random_soup(32, 32, 0.3, 7);
        let b = random_soup(32, 32, 0.3, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|&v| v == ALIVE || v == DEAD));
        assert!(a.iter().any(|&v| v == ALIVE));
    }
}
