//! Board model: rows of tiles, each tile a back-to-front stack of layers.

use serde::{Deserialize, Serialize};

/// Tile position as (row, column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub column: usize,
}

impl Coord {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// One identified piece inside a tile. Only `id` takes part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    #[serde(alias = "group_name")]
    pub group_name: String,
    #[serde(default)]
    pub svg: String,
}

/// Layers in z-order (index 0 is the back).
pub type Tile = Vec<Layer>;

/// Fixed-shape grid of tiles. `rows[r][c]` is the tile at row `r`, column `c`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: Vec<Vec<Tile>>,
}

impl Board {
    pub fn new(rows: Vec<Vec<Tile>>) -> Self {
        Self { rows }
    }

    /// Chunk a flat, row-major tile list into rows of `columns` tiles.
    pub fn from_tiles(tiles: Vec<Tile>, columns: usize) -> Self {
        if columns == 0 {
            return Self { rows: Vec::new() };
        }
        let mut rows = Vec::with_capacity(tiles.len().div_ceil(columns));
        let mut iter = tiles.into_iter().peekable();
        while iter.peek().is_some() {
            rows.push(iter.by_ref().take(columns).collect());
        }
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row (rows are normally all the same width).
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<Tile>] {
        &self.rows
    }

    #[inline]
    pub fn tile(&self, coord: Coord) -> Option<&Tile> {
        self.rows.get(coord.row).and_then(|row| row.get(coord.column))
    }

    #[inline]
    fn tile_mut(&mut self, coord: Coord) -> Option<&mut Tile> {
        self.rows
            .get_mut(coord.row)
            .and_then(|row| row.get_mut(coord.column))
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.tile(coord).is_some()
    }

    /// Layer ids at `coord` in z-order; empty when out of range.
    pub fn layer_ids_at(&self, coord: Coord) -> Vec<&str> {
        self.tile(coord)
            .map(|tile| tile.iter().map(|layer| layer.id.as_str()).collect())
            .unwrap_or_default()
    }

    /// Out-of-range coordinates count as empty.
    pub fn is_empty_at(&self, coord: Coord) -> bool {
        self.tile(coord).is_none_or(Vec::is_empty)
    }

    /// Number of layers left at `coord` if every id in `ids` were removed.
    pub fn remaining_after_removal(&self, coord: Coord, ids: &[String]) -> usize {
        self.tile(coord)
            .map(|tile| tile.iter().filter(|l| !ids.contains(&l.id)).count())
            .unwrap_or(0)
    }

    /// Drop every layer whose id is in `ids`, keeping the order of the rest.
    pub fn remove_ids(&mut self, coord: Coord, ids: &[String]) {
        if let Some(tile) = self.tile_mut(coord) {
            tile.retain(|layer| !ids.contains(&layer.id));
        }
    }

    /// True once every tile is empty.
    pub fn is_cleared(&self) -> bool {
        self.rows.iter().flatten().all(Vec::is_empty)
    }

    pub fn layer_count(&self) -> usize {
        self.rows.iter().flatten().map(Vec::len).sum()
    }
}

#[cfg(test)]
pub(crate) fn layer(id: &str) -> Layer {
    Layer {
        id: id.to_string(),
        group_name: "test".to_string(),
        svg: String::new(),
    }
}

#[cfg(test)]
pub(crate) fn tile_of(ids: &[&str]) -> Tile {
    ids.iter().map(|id| layer(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Board {
        Board::new(vec![
            vec![tile_of(&["a", "b"]), tile_of(&["b", "c"])],
            vec![tile_of(&[]), tile_of(&["a", "a", "d"])],
        ])
    }

    #[test]
    fn test_layer_ids_in_order() {
        let board = sample();
        assert_eq!(board.layer_ids_at(Coord::new(1, 1)), vec!["a", "a", "d"]);
    }

    #[test]
    fn test_out_of_range_is_empty() {
        let board = sample();
        assert!(board.layer_ids_at(Coord::new(5, 0)).is_empty());
        assert!(board.is_empty_at(Coord::new(0, 9)));
        assert!(board.is_empty_at(Coord::new(1, 0)));
        assert!(!board.is_empty_at(Coord::new(0, 0)));
    }

    #[test]
    fn test_remove_ids_keeps_order_and_duplicates_go_together() {
        let mut board = sample();
        board.remove_ids(Coord::new(1, 1), &["a".to_string()]);
        assert_eq!(board.layer_ids_at(Coord::new(1, 1)), vec!["d"]);
        board.remove_ids(Coord::new(7, 7), &["d".to_string()]);
        assert_eq!(board.layer_count(), 5);
    }

    #[test]
    fn test_remaining_after_removal() {
        let board = sample();
        let ids = vec!["b".to_string(), "c".to_string()];
        assert_eq!(board.remaining_after_removal(Coord::new(0, 1), &ids), 0);
        assert_eq!(board.remaining_after_removal(Coord::new(0, 0), &ids), 1);
    }

    #[test]
    fn test_from_tiles_chunks_row_major() {
        let tiles = (0..6).map(|i| tile_of(&[&i.to_string()])).collect();
        let board = Board::from_tiles(tiles, 3);
        assert_eq!(board.row_count(), 2);
        assert_eq!(board.column_count(), 3);
        assert_eq!(board.layer_ids_at(Coord::new(1, 0)), vec!["3"]);
    }

    #[test]
    fn test_board_json_shape() {
        let json = r#"[[[{"id":"x","groupName":"g","svg":"<svg/>"}],[]]]"#;
        let board: Board = serde_json::from_str(json).unwrap();
        assert_eq!(board.row_count(), 1);
        assert_eq!(board.tile(Coord::new(0, 0)).unwrap()[0].group_name, "g");
        assert!(board.is_empty_at(Coord::new(0, 1)));
        let back = serde_json::to_string(&board).unwrap();
        assert!(back.contains("\"groupName\":\"g\""));
    }

    #[test]
    fn test_snake_case_group_name_accepted() {
        let json = r#"[[[{"id":"x","group_name":"g","svg":""}]]]"#;
        let board: Board = serde_json::from_str(json).unwrap();
        assert_eq!(board.tile(Coord::new(0, 0)).unwrap()[0].group_name, "g");
    }

    #[test]
    fn test_is_cleared() {
        let mut board = Board::new(vec![vec![tile_of(&["a"]), tile_of(&[])]]);
        assert!(!board.is_cleared());
        board.remove_ids(Coord::new(0, 0), &["a".to_string()]);
        assert!(board.is_cleared());
    }
}
