use super::board::{Snapshot, ALIVE, DEAD};

const OFFSETS: [isize; 3] = [-1, 0, 1];

/// Count live cells among the eight neighbours of (x, y).
///
/// Coordinates wrap in both axes, so the board behaves as a torus.
pub fn neighbor_count(x: usize, y: usize, snapshot: &Snapshot) -> u8 {
    let width = snapshot.width() as isize;
    let height = snapshot.height() as isize;
    let mut count = 0u8;

    for dy in OFFSETS {
        for dx in OFFSETS {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = (x as isize + dx).rem_euclid(width) as usize;
            let ny = (y as isize + dy).rem_euclid(height) as usize;
            if snapshot.is_alive(nx, ny) {
                count += 1;
            }
        }
    }

    count
}

/// Next state of (x, y) under B3/S23.
pub fn next_state(x: usize, y: usize, snapshot: &Snapshot) -> u8 {
    let alive = snapshot.is_alive(x, y);
    match (alive, neighbor_count(x, y, snapshot)) {
        (true, 2) | (true, 3) => ALIVE,
        (false, 3) => ALIVE,
        _ => DEAD,
    }
}

/// Single-threaded reference step over the whole board.
pub fn step(snapshot: &Snapshot) -> Snapshot {
    let mut next = Snapshot::new(snapshot.width(), snapshot.height());
    for y in 0..snapshot.height() {
        for x in 0..snapshot.width() {
            next.set(x, y, next_state(x, y, snapshot));
        }
    }
    next
}
