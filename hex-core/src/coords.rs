//! Hex grid geometry on a brick-offset cell grid
//!
//! The hex board is projected onto a 5x9 grid of cells so that every hex
//! has a linear index. Player caches are prepended to the same cell array:
//!
//! ```text
//!     2          row 0
//!   1   3        row 1
//! 0   2   4      row 2
//!   1   3        ...
//! 0   2   4
//!   1   3
//! 0   2   4
//!   1   3
//!     2          row 8
//! ```

use serde::{Deserialize, Serialize};

/// Width of the cell grid used by the hex board
pub const BOARD_WIDTH: i32 = 5;
/// Height of the cell grid used by the hex board
pub const BOARD_HEIGHT: i32 = 9;
/// Maximum number of players in a match
pub const MAX_PLAYERS: usize = 4;
/// Number of token slots in a player's cache
pub const CACHE_SIZE: usize = 3;
/// Number of cells used for the caches
pub const CACHE_CELLS: usize = MAX_PLAYERS * CACHE_SIZE;
/// Total size of the game cells array
pub const CELLS_SIZE: usize = CACHE_CELLS + (BOARD_WIDTH * BOARD_HEIGHT) as usize;

/// Index into the game cells array
pub type Pos = usize;

/// Seat index of a player
pub type PlayerId = usize;

/// Neighbour offsets by facing (dx, dy)
/// Index: 0=up, 1=up-right, 2=down-right, 3=down, 4=down-left, 5=up-left
pub const DIRECTIONS: [(i32, i32); 6] = [
    (0, -2),
    (1, -1),
    (1, 1),
    (0, 2),
    (-1, 1),
    (-1, -1),
];

/// Grid coordinates of a board cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

impl Coordinates {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Check if these coordinates name a real hex
    pub fn is_valid(&self) -> bool {
        is_valid_hex(self.x, self.y)
    }

    /// Cell array index (meaningful only for valid hexes)
    pub fn to_index(&self) -> Pos {
        to_index(self.x, self.y)
    }

    /// Get neighbour in facing (0-5), which may be off the board
    pub fn neighbor(&self, facing: u8) -> Coordinates {
        let (dx, dy) = DIRECTIONS[facing as usize % 6];
        Coordinates::new(self.x + dx, self.y + dy)
    }

    /// Facing that points from `self` at an adjacent `other`
    pub fn facing_to(&self, other: Coordinates) -> Option<u8> {
        let delta = (other.x - self.x, other.y - self.y);
        DIRECTIONS.iter().position(|&d| d == delta).map(|f| f as u8)
    }

    /// Cells along a straight line from `self` (exclusive) in the given facing
    pub fn ray(self, facing: u8) -> impl Iterator<Item = Coordinates> {
        let mut current = self;
        std::iter::from_fn(move || {
            current = current.neighbor(facing);
            current.is_valid().then_some(current)
        })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Check whether grid coordinates correspond to a hex
pub fn is_valid_hex(x: i32, y: i32) -> bool {
    if !(0..BOARD_WIDTH).contains(&x) || !(0..BOARD_HEIGHT).contains(&y) {
        return false;
    }
    if y % 2 == 1 {
        x % 2 == 1
    } else if y == 0 || y == BOARD_HEIGHT - 1 {
        x == 2
    } else {
        x % 2 == 0
    }
}

/// Translate grid coordinates into a cell array index
pub fn to_index(x: i32, y: i32) -> Pos {
    CACHE_CELLS + (y * BOARD_WIDTH + x) as usize
}

/// Translate a cell array index into grid coordinates
///
/// Returns `None` for cache slots and indices past the end of the array.
pub fn from_index(pos: Pos) -> Option<Coordinates> {
    if is_cache_slot(pos) || pos >= CELLS_SIZE {
        return None;
    }
    let offset = (pos - CACHE_CELLS) as i32;
    Some(Coordinates::new(offset % BOARD_WIDTH, offset / BOARD_WIDTH))
}

/// Check whether the index is a real hex on the board
pub fn is_board_pos(pos: Pos) -> bool {
    from_index(pos).is_some_and(|c| c.is_valid())
}

/// Check whether the index is a cache slot
pub fn is_cache_slot(pos: Pos) -> bool {
    pos < CACHE_CELLS
}

/// Player owning the cache slot at `pos`
pub fn cache_owner(pos: Pos) -> Option<PlayerId> {
    is_cache_slot(pos).then_some(pos / CACHE_SIZE)
}

/// Cell array index of slot `i` in a player's cache
pub fn cache_slot(player: PlayerId, i: usize) -> Pos {
    player * CACHE_SIZE + i
}

/// All valid board hexes in row-major order (y, then x)
pub fn board_hexes() -> impl Iterator<Item = Coordinates> {
    (0..BOARD_HEIGHT)
        .flat_map(|y| (0..BOARD_WIDTH).map(move |x| Coordinates::new(x, y)))
        .filter(|c| c.is_valid())
}
