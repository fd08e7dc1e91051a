//! Board generation: every layer group is spread over the board in matching pairs.
//!
//! For each group the board gets `rows * columns / 2` variants (the group's variants
//! shuffled and repeated as often as needed), and each variant lands on two tiles
//! that do not yet carry a layer from that group. Every tile therefore ends up with
//! exactly one layer per group, and every id occurs an even number of times.

use crate::board::{Board, Layer, Tile};
use crate::theme::{LayerGroup, Theme, Variant};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("number of tiles must be an even number (got {rows} x {columns})")]
    OddTileCount { rows: usize, columns: usize },
    #[error("board needs at least one row and one column")]
    ZeroSize,
    #[error("board of {rows} x {columns} tiles is too large")]
    TooLarge { rows: usize, columns: usize },
    #[error("layer group '{0}' has no variants")]
    EmptyLayerGroup(String),
}

/// Check that a `rows` x `columns` board can be split into pairs.
pub fn validate_dimensions(rows: usize, columns: usize) -> Result<(), GenerateError> {
    if rows == 0 || columns == 0 {
        return Err(GenerateError::ZeroSize);
    }
    let Some(tiles) = rows.checked_mul(columns) else {
        return Err(GenerateError::TooLarge { rows, columns });
    };
    if tiles % 2 != 0 {
        return Err(GenerateError::OddTileCount { rows, columns });
    }
    Ok(())
}

/// Shuffled-pair board generator for a fixed board size.
#[derive(Debug)]
pub struct BoardGenerator {
    rows: usize,
    columns: usize,
    rng: StdRng,
}

impl BoardGenerator {
    /// Fails immediately when the board cannot be split into pairs.
    pub fn new(rows: usize, columns: usize, seed: Option<u64>) -> Result<Self, GenerateError> {
        validate_dimensions(rows, columns)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self { rows, columns, rng })
    }

    fn tile_count(&self) -> usize {
        self.rows * self.columns
    }

    pub fn generate(&mut self, theme: &Theme) -> Result<Board, GenerateError> {
        let mut tiles: Vec<Tile> = vec![Vec::new(); self.tile_count()];
        let pairs = self.tile_count() / 2;
        for group in &theme.layer_groups {
            let variants = self.randomized_variants(group, pairs)?;
            for variant in variants {
                self.place_pair(&mut tiles, &group.name, &variant);
            }
        }
        debug!(
            theme = %theme.name,
            rows = self.rows,
            columns = self.columns,
            groups = theme.layer_groups.len(),
            "board generated"
        );
        Ok(Board::from_tiles(tiles, self.columns))
    }

    /// `count` variants: the group's variants shuffled, repeated until there are enough.
    fn randomized_variants(
        &mut self,
        group: &LayerGroup,
        count: usize,
    ) -> Result<Vec<Variant>, GenerateError> {
        if group.variants.is_empty() {
            return Err(GenerateError::EmptyLayerGroup(group.name.clone()));
        }
        let mut out = Vec::with_capacity(count + group.variants.len());
        let mut variants = group.variants.clone();
        while out.len() < count {
            variants.shuffle(&mut self.rng);
            out.extend(variants.iter().cloned());
        }
        out.truncate(count);
        Ok(out)
    }

    /// Put `variant` on two random tiles still missing a layer from `group_name`.
    fn place_pair(&mut self, tiles: &mut [Tile], group_name: &str, variant: &Variant) {
        let mut candidates: Vec<usize> = tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| !tile.iter().any(|l| l.group_name == group_name))
            .map(|(i, _)| i)
            .collect();
        candidates.shuffle(&mut self.rng);
        for index in candidates.into_iter().take(2) {
            tiles[index].push(Layer {
                id: variant.id.clone(),
                group_name: group_name.to_string(),
                svg: variant.svg.clone(),
            });
        }
    }
}
