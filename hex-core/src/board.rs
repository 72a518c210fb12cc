//! Sparse board of placed units, caches included

use serde::{Deserialize, Serialize};

use crate::coords::{board_hexes, cache_slot, Coordinates, PlayerId, Pos, CACHE_SIZE, CELLS_SIZE};
use crate::hex::Hex;

/// Cell array holding every cache slot and board hex
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    cells: Vec<Option<Hex>>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    pub fn new() -> Self {
        Self {
            cells: vec![None; CELLS_SIZE],
        }
    }

    pub fn get(&self, pos: Pos) -> Option<&Hex> {
        self.cells.get(pos).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut Hex> {
        self.cells.get_mut(pos).and_then(Option::as_mut)
    }

    pub fn is_empty_at(&self, pos: Pos) -> bool {
        self.get(pos).is_none()
    }

    /// Place a unit, refusing to overwrite an occupant or write out of range
    pub fn put(&mut self, pos: Pos, hex: Hex) -> bool {
        match self.cells.get_mut(pos) {
            Some(cell @ None) => {
                *cell = Some(hex);
                true
            }
            _ => false,
        }
    }

    /// Take the unit at `pos`, if any
    pub fn remove(&mut self, pos: Pos) -> Option<Hex> {
        self.cells.get_mut(pos).and_then(Option::take)
    }

    /// Visit occupied board hexes in row-major order
    pub fn for_each_occupied_hex(&self, mut f: impl FnMut(&Hex, Coordinates)) {
        for (hex, coords) in self.occupied() {
            f(hex, coords);
        }
    }

    /// Occupied board hexes in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = (&Hex, Coordinates)> + '_ {
        board_hexes().filter_map(|c| self.get(c.to_index()).map(|h| (h, c)))
    }

    /// Positions of occupied board hexes in row-major order
    pub fn occupied_positions(&self) -> Vec<Pos> {
        self.occupied().map(|(_, c)| c.to_index()).collect()
    }

    /// Check whether every board hex holds a unit
    pub fn is_full(&self) -> bool {
        board_hexes().all(|c| !self.is_empty_at(c.to_index()))
    }

    /// Cache slot positions of a player
    pub fn cache_positions(player: PlayerId) -> impl Iterator<Item = Pos> {
        (0..CACHE_SIZE).map(move |i| cache_slot(player, i))
    }

    /// Number of occupied slots in a player's cache
    pub fn cache_count(&self, player: PlayerId) -> usize {
        Self::cache_positions(player)
            .filter(|&pos| !self.is_empty_at(pos))
            .count()
    }

    /// Units in a player's cache
    pub fn cache(&self, player: PlayerId) -> impl Iterator<Item = &Hex> + '_ {
        Self::cache_positions(player).filter_map(move |pos| self.get(pos))
    }

    /// Total number of units on the board hexes
    pub fn unit_count(&self) -> usize {
        self.occupied().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{to_index, CACHE_CELLS};
    use crate::token::Token;

    fn unit(player: PlayerId, id: &str) -> Hex {
        let def = serde_json::from_value(serde_json::json!({ "id": id })).unwrap();
        Hex::new(player, "test", Token::from_def(&def).unwrap())
    }

    #[test]
    fn test_put_remove() {
        let mut board = BoardState::new();
        let pos = to_index(2, 4);

        assert!(board.put(pos, unit(0, "a")));
        assert!(!board.put(pos, unit(1, "b")));
        assert_eq!(board.get(pos).unwrap().token.id, "a");

        let removed = board.remove(pos).unwrap();
        assert_eq!(removed.token.id, "a");
        assert!(board.remove(pos).is_none());
        assert!(board.is_empty_at(pos));
    }

    #[test]
    fn test_put_out_of_range() {
        let mut board = BoardState::new();
        assert!(!board.put(CELLS_SIZE, unit(0, "a")));
        assert!(board.get(CELLS_SIZE).is_none());
    }

    #[test]
    fn test_occupied_row_major() {
        let mut board = BoardState::new();
        board.put(to_index(4, 6), unit(0, "c"));
        board.put(to_index(1, 1), unit(1, "a"));
        board.put(to_index(0, 6), unit(0, "b"));
        // Cache units are not part of the board walk
        board.put(cache_slot(0, 0), unit(0, "cached"));

        let mut seen = Vec::new();
        board.for_each_occupied_hex(|hex, coords| seen.push((hex.token.id.clone(), coords)));
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), Coordinates::new(1, 1)),
                ("b".to_string(), Coordinates::new(0, 6)),
                ("c".to_string(), Coordinates::new(4, 6)),
            ]
        );
        assert_eq!(board.unit_count(), 3);
    }

    #[test]
    fn test_cache_helpers() {
        let mut board = BoardState::new();
        board.put(cache_slot(1, 0), unit(1, "x"));
        board.put(cache_slot(1, 2), unit(1, "y"));
        assert_eq!(board.cache_count(1), 2);
        assert_eq!(board.cache_count(0), 0);
        let ids: Vec<_> = board.cache(1).map(|h| h.token.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert!(BoardState::cache_positions(3).all(|p| p < CACHE_CELLS));
    }

    #[test]
    fn test_is_full() {
        let mut board = BoardState::new();
        assert!(!board.is_full());
        for c in board_hexes() {
            board.put(c.to_index(), unit(0, "u"));
        }
        assert!(board.is_full());
    }
}
