// File: grid.rs
use crate::cell::{Cell, CellDynamics, CellStyle, LayerId};
use crate::constants::MAX_GRID_SLOTS;
use crate::error::{EngineError, EngineResult};
use crate::sprites::{Sprite, TextureId};
use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use winit::dpi::PhysicalSize;

pub type GridKey = (u32, u32);

/// Counts from one [`Grid::apply_rules`] pass.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub survivors: usize,
    pub births: usize,
    pub deaths: usize,
}

/// One layer's toroidal lattice of optional cells.
#[derive(Debug, Clone)]
pub struct Grid {
    layer: LayerId,
    width: u32,
    height: u32,
    cell_size: f32,
    depth: f32,
    slots: Vec<Option<Cell>>,
    next_slots: Vec<Option<Cell>>,
}

/// `(coord + delta + dimension) mod dimension`
#[inline]
pub fn wrap(coord: u32, delta: i32, dimension: u32) -> u32 {
    let dimension = dimension as i64;
    ((coord as i64 + delta as i64 + dimension).rem_euclid(dimension)) as u32
}

impl Grid {
    /// Sizes the lattice as `viewport / cell_size`, rounded down.
    pub fn new(
        layer: LayerId,
        viewport: PhysicalSize<u32>,
        cell_size: f32,
        depth: f32,
    ) -> EngineResult<Self> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(EngineError::EmptyViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let width = if cell_size > 0.0 {
            (viewport.width as f32 / cell_size).floor() as u32
        } else {
            0
        };
        let height = if cell_size > 0.0 {
            (viewport.height as f32 / cell_size).floor() as u32
        } else {
            0
        };
        if width == 0 || height == 0 {
            return Err(EngineError::EmptyGrid {
                layer,
                width: viewport.width,
                height: viewport.height,
                cell_size,
            });
        }

        let capacity = (width as usize)
            .checked_mul(height as usize)
            .filter(|&slots| slots <= MAX_GRID_SLOTS)
            .ok_or(EngineError::GridTooLarge {
                layer,
                columns: width,
                rows: height,
            })?;
        log::info!(
            "Layer {} grid {}x{} (cell size {:.1}, depth {:.2})",
            layer,
            width,
            height,
            cell_size,
            depth
        );
        Ok(Self {
            layer,
            width,
            height,
            cell_size,
            depth: depth.clamp(0.0, 1.0),
            slots: vec![None; capacity],
            next_slots: vec![None; capacity],
        })
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }
    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }
    pub fn depth(&self) -> f32 {
        self.depth
    }
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    fn key(&self, index: usize) -> GridKey {
        (index as u32 % self.width, index as u32 / self.width)
    }

    /// Slot contents; coordinates wrap.
    pub fn get(&self, x: u32, y: u32) -> Option<&Cell> {
        let (x, y) = (x % self.width, y % self.height);
        self.slots[self.index(x, y)].as_ref()
    }

    #[inline]
    pub fn is_live(&self, x: u32, y: u32) -> bool {
        self.get(x, y).is_some_and(Cell::is_live)
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().filter(|cell| cell.is_live()).count()
    }

    /// Live plus dying occupants.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.slots.iter().flatten()
    }

    pub fn live_neighbors(&self, x: u32, y: u32) -> u8 {
        let mut count = 0;
        for dy in -1..=1 {
            let ny = wrap(y, dy, self.height);
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = wrap(x, dx, self.width);
                if self.slots[self.index(nx, ny)]
                    .as_ref()
                    .is_some_and(Cell::is_live)
                {
                    count += 1;
                }
            }
        }
        count
    }

    pub fn live_positions(&self) -> Vec<GridKey> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(Cell::is_live))
            .map(|(index, _)| self.key(index))
            .collect()
    }

    /// Slots without a live occupant (empty or dying).
    pub fn vacant_positions(&self) -> Vec<GridKey> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.as_ref().is_some_and(Cell::is_live))
            .map(|(index, _)| self.key(index))
            .collect()
    }

    /// Vacant slots that the birth rule would fill next generation.
    pub fn birth_sites(&self) -> Vec<GridKey> {
        self.vacant_positions()
            .into_iter()
            .filter(|&(x, y)| self.live_neighbors(x, y) == 3)
            .collect()
    }

    /// Places a newborn cell at a vacant slot with a random texture.
    /// Returns false if the slot is live or no textures are available.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        x: u32,
        y: u32,
        textures: &[TextureId],
        rng: &mut R,
    ) -> bool {
        let (x, y) = (x % self.width, y % self.height);
        if self.is_live(x, y) {
            return false;
        }
        let Some(&texture) = textures.choose(rng) else {
            log::warn!(
                "Layer {}: texture pool is empty, cannot spawn at ({}, {})",
                self.layer,
                x,
                y
            );
            return false;
        };
        let index = self.index(x, y);
        self.slots[index] = Some(self.new_cell(x, y, texture));
        true
    }

    /// Starts the death animation of a live occupant.
    pub fn kill(&mut self, x: u32, y: u32) -> bool {
        let (x, y) = (x % self.width, y % self.height);
        let index = self.index(x, y);
        match self.slots[index].as_mut() {
            Some(cell) if cell.is_live() => {
                cell.die();
                true
            }
            _ => false,
        }
    }

    fn new_cell(&self, x: u32, y: u32, texture: TextureId) -> Cell {
        Cell::new(x, y, self.cell_size, self.layer, self.depth, texture)
    }

    /// One synchronous B3/S23 generation. Counts come from the current
    /// lattice, results go into a fresh one, then the two are swapped.
    pub fn apply_rules<R: Rng + ?Sized>(
        &mut self,
        textures: &[TextureId],
        rng: &mut R,
    ) -> RuleOutcome {
        let mut outcome = RuleOutcome::default();
        if self.live_count() == 0 {
            return outcome;
        }

        let neighbor_counts: Vec<u8> = (0..self.capacity())
            .into_par_iter()
            .map(|index| {
                let (x, y) = self.key(index);
                self.live_neighbors(x, y)
            })
            .collect();

        let mut warned_empty_pool = false;
        for index in 0..self.capacity() {
            let (x, y) = self.key(index);
            let current = self.slots[index].take();
            let count = neighbor_counts[index];

            self.next_slots[index] = match current {
                Some(cell) if cell.is_live() => {
                    if count == 2 || count == 3 {
                        outcome.survivors += 1;
                        Some(cell)
                    } else {
                        let mut cell = cell;
                        cell.die();
                        outcome.deaths += 1;
                        Some(cell)
                    }
                }
                vacant if count == 3 => match textures.choose(rng) {
                    Some(&texture) => {
                        outcome.births += 1;
                        Some(self.new_cell(x, y, texture))
                    }
                    None => {
                        if !warned_empty_pool {
                            log::warn!(
                                "Layer {}: texture pool is empty, births skipped",
                                self.layer
                            );
                            warned_empty_pool = true;
                        }
                        vacant
                    }
                },
                // Dying cells keep animating; empty stays empty
                other => other,
            };
        }

        std::mem::swap(&mut self.slots, &mut self.next_slots);
        self.next_slots.fill(None);
        outcome
    }

    pub fn update_cells<R: Rng + ?Sized>(
        &mut self,
        delta_time: f32,
        sound_intensity: f32,
        dynamics: &CellDynamics,
        rng: &mut R,
    ) {
        for cell in self.slots.iter_mut().flatten() {
            cell.update(delta_time, sound_intensity, dynamics, rng);
        }
    }

    /// Clears slots whose death animation has finished.
    pub fn reap(&mut self) -> usize {
        let mut removed = 0;
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(Cell::is_expired) {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    pub fn draw(&self, style: &CellStyle, out: &mut Vec<Sprite>) {
        for cell in self.cells() {
            cell.draw(style, out);
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
    }
}
// --- End of File: grid.rs ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Phase;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    const TEXTURES: [TextureId; 2] = [TextureId(2), TextureId(3)];

    fn board(width: u32, height: u32) -> Grid {
        Grid::new(1, PhysicalSize::new(width * 10, height * 10), 10.0, 0.9).unwrap()
    }

    fn seed(grid: &mut Grid, rng: &mut StdRng, cells: &[GridKey]) {
        for &(x, y) in cells {
            assert!(grid.spawn(x, y, &TEXTURES, rng));
        }
    }

    fn live_set(grid: &Grid) -> BTreeSet<GridKey> {
        grid.live_positions().into_iter().collect()
    }

    #[test]
    fn dimensions_round_down() {
        let grid = Grid::new(2, PhysicalSize::new(1280, 720), 60.0, 0.6).unwrap();
        assert_eq!((grid.width(), grid.height()), (21, 12));
        assert_eq!(grid.capacity(), 252);
        assert_eq!(grid.layer(), 2);
        assert_eq!(grid.cell_size(), 60.0);
        assert_eq!(grid.depth(), 0.6);
    }

    #[test]
    fn oversized_cells_are_rejected() {
        let err = Grid::new(1, PhysicalSize::new(50, 50), 60.0, 0.5).unwrap_err();
        assert!(matches!(err, EngineError::EmptyGrid { layer: 1, .. }));
        let err = Grid::new(1, PhysicalSize::new(0, 50), 10.0, 0.5).unwrap_err();
        assert!(matches!(err, EngineError::EmptyViewport { .. }));
    }

    #[test]
    fn huge_lattices_are_rejected() {
        let err = Grid::new(1, PhysicalSize::new(100_000, 100_000), 1.0, 0.9).unwrap_err();
        assert!(matches!(
            err,
            EngineError::GridTooLarge {
                layer: 1,
                columns: 100_000,
                rows: 100_000
            }
        ));

        let config =
            crate::config::EngineConfig::single_layer(PhysicalSize::new(100_000, 100_000), 1.0);
        assert!(matches!(
            config.validate(),
            Err(EngineError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn wrap_handles_both_edges() {
        assert_eq!(wrap(0, -1, 10), 9);
        assert_eq!(wrap(9, 1, 10), 0);
        assert_eq!(wrap(5, 1, 10), 6);
    }

    #[test]
    fn opposite_corners_are_neighbors() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut grid = board(6, 4);
        seed(&mut grid, &mut rng, &[(5, 3)]);
        assert_eq!(grid.live_neighbors(0, 0), 1);

        let mut grid = board(6, 4);
        seed(&mut grid, &mut rng, &[(0, 0)]);
        assert_eq!(grid.live_neighbors(5, 3), 1);
    }

    #[test]
    fn blinker_oscillates() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut grid = board(10, 10);
        let horizontal: BTreeSet<GridKey> = [(4, 5), (5, 5), (6, 5)].into();
        let vertical: BTreeSet<GridKey> = [(5, 4), (5, 5), (5, 6)].into();
        seed(&mut grid, &mut rng, &[(4, 5), (5, 5), (6, 5)]);

        let outcome = grid.apply_rules(&TEXTURES, &mut rng);
        assert_eq!(live_set(&grid), vertical);
        assert_eq!(
            outcome,
            RuleOutcome {
                survivors: 1,
                births: 2,
                deaths: 2
            }
        );

        grid.apply_rules(&TEXTURES, &mut rng);
        assert_eq!(live_set(&grid), horizontal);
    }

    #[test]
    fn glider_translates_diagonally() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut grid = board(20, 20);
        let glider = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
        seed(&mut grid, &mut rng, &glider);

        for _ in 0..4 {
            grid.apply_rules(&TEXTURES, &mut rng);
        }
        let expected: BTreeSet<GridKey> = glider.iter().map(|&(x, y)| (x + 1, y + 1)).collect();
        assert_eq!(live_set(&grid), expected);
    }

    #[test]
    fn glider_crosses_the_torus_seam() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut grid = board(8, 8);
        let glider = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
        seed(&mut grid, &mut rng, &glider);

        // 32 generations move the glider 8 cells: exactly once around
        for _ in 0..32 {
            grid.apply_rules(&TEXTURES, &mut rng);
        }
        let expected: BTreeSet<GridKey> = glider.into();
        assert_eq!(live_set(&grid), expected);
    }

    #[test]
    fn rule_matches_b3s23_everywhere() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut grid = board(12, 9);
        for _ in 0..40 {
            let x = rng.gen_range(0..12);
            let y = rng.gen_range(0..9);
            grid.spawn(x, y, &TEXTURES, &mut rng);
        }

        for _ in 0..5 {
            let mut expected = BTreeSet::new();
            for y in 0..grid.height() {
                for x in 0..grid.width() {
                    let n = grid.live_neighbors(x, y);
                    let alive = grid.is_live(x, y);
                    if (alive && (n == 2 || n == 3)) || (!alive && n == 3) {
                        expected.insert((x, y));
                    }
                }
            }
            grid.apply_rules(&TEXTURES, &mut rng);
            assert_eq!(live_set(&grid), expected);
        }
    }

    #[test]
    fn empty_grid_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut grid = board(5, 5);
        assert_eq!(grid.apply_rules(&TEXTURES, &mut rng), RuleOutcome::default());
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn deaths_animate_before_the_slot_clears() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = board(10, 10);
        seed(&mut grid, &mut rng, &[(2, 2)]);
        grid.apply_rules(&TEXTURES, &mut rng);

        let cell = grid.get(2, 2).expect("dying cell keeps its slot");
        assert_eq!(cell.phase(), Phase::Dying);
        assert_eq!(grid.live_count(), 0);
        assert_eq!(grid.occupied_count(), 1);

        let dynamics = CellDynamics::from_config(&crate::config::EngineConfig::default());
        grid.update_cells(5.0, 50.0, &dynamics, &mut rng);
        assert_eq!(grid.reap(), 1);
        assert!(grid.get(2, 2).is_none());
    }

    #[test]
    fn births_replace_dying_occupants() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut grid = board(10, 10);
        seed(&mut grid, &mut rng, &[(5, 5)]);
        assert!(grid.kill(5, 5));
        seed(&mut grid, &mut rng, &[(4, 4), (6, 4), (4, 6)]);
        assert!(grid.birth_sites().contains(&(5, 5)));

        grid.apply_rules(&TEXTURES, &mut rng);
        let cell = grid.get(5, 5).unwrap();
        assert_eq!(cell.phase(), Phase::Born);
    }

    #[test]
    fn spawn_without_textures_is_refused() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut grid = board(4, 4);
        assert!(!grid.spawn(1, 1, &[], &mut rng));
        assert_eq!(grid.occupied_count(), 0);
    }
}
