// File: population.rs
use crate::config::{EngineConfig, FloorInjection};
use crate::grid::{Grid, GridKey};
use crate::sprites::TextureId;
use crate::utils::{inverse_lerp, lerp};
use rand::Rng;
use rand::seq::SliceRandom;

/// What one reconciliation pass changed in a grid.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub target: usize,
    pub killed: usize,
    pub revived: usize,
}

/// Maps sound intensity to live-cell targets and steers grids toward them.
#[derive(Debug, Clone)]
pub struct PopulationController {
    min_percentage: f32,
    max_percentage: f32,
    threshold_low: f32,
    threshold_high: f32,
    max_total_cells: usize,
    check_interval: u32,
    injection: FloorInjection,
    generations_since_check: u32,
}

impl PopulationController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            min_percentage: config.min_live_percentage,
            max_percentage: config.max_live_percentage,
            threshold_low: config.sound_threshold_low,
            threshold_high: config.sound_threshold_high,
            max_total_cells: config.max_total_cells,
            check_interval: config.population_check_interval.max(1),
            injection: config.floor_injection,
            generations_since_check: 0,
        }
    }

    pub fn injection(&self) -> FloorInjection {
        self.injection
    }

    /// Desired live percentage for a sound intensity: the minimum below the
    /// low threshold, rising linearly to the maximum at the high threshold.
    pub fn desired_percentage(&self, sound_intensity: f32) -> f32 {
        let intensity = sound_intensity.clamp(0.0, 100.0);
        if intensity < self.threshold_low {
            return self.min_percentage;
        }
        let t = inverse_lerp(self.threshold_low, self.threshold_high, intensity);
        lerp(self.min_percentage, self.max_percentage, t)
    }

    /// True when loud audio should hold the population where it is.
    pub fn is_frozen(&self, sound_intensity: f32) -> bool {
        sound_intensity >= self.threshold_high
    }

    /// A layer's share of the global cell budget, proportional to its size.
    pub fn layer_cap(&self, layer_capacity: usize, total_capacity: usize) -> usize {
        if total_capacity == 0 {
            return 0;
        }
        let share = (self.max_total_cells as u128 * layer_capacity as u128
            / total_capacity as u128) as usize;
        share.min(layer_capacity)
    }

    pub fn layer_caps(&self, grids: &[Grid]) -> Vec<usize> {
        let total_capacity: usize = grids.iter().map(Grid::capacity).sum();
        grids
            .iter()
            .map(|grid| self.layer_cap(grid.capacity(), total_capacity))
            .collect()
    }

    /// Smallest live count that satisfies the minimum percentage.
    pub fn floor_count(&self, capacity: usize) -> usize {
        (self.min_percentage * capacity as f32 / 100.0).ceil() as usize
    }

    pub fn target(
        &self,
        sound_intensity: f32,
        live: usize,
        capacity: usize,
        cap: usize,
    ) -> usize {
        if self.is_frozen(sound_intensity) {
            return live.min(cap);
        }
        let percentage = self.desired_percentage(sound_intensity);
        let desired = (percentage * capacity as f32 / 100.0).floor() as usize;
        desired.min(cap).min(capacity)
    }

    /// Moves a grid's live count to `target` by routing surplus cells through
    /// their death animation or spawning newborns in vacant slots. Falls short
    /// silently when the grid cannot supply enough slots.
    pub fn reconcile<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid,
        target: usize,
        textures: &[TextureId],
        prefer_birth_sites: bool,
        rng: &mut R,
    ) -> Reconciliation {
        let mut result = Reconciliation {
            target,
            ..Reconciliation::default()
        };
        let live = grid.live_count();

        if live > target {
            let mut positions = grid.live_positions();
            let (chosen, _) = positions.partial_shuffle(rng, live - target);
            for &(x, y) in chosen.iter() {
                if grid.kill(x, y) {
                    result.killed += 1;
                }
            }
        } else if live < target {
            if textures.is_empty() {
                log::warn!(
                    "Layer {}: texture pool is empty, {} revivals skipped",
                    grid.layer(),
                    target - live
                );
                return result;
            }
            let candidates = if prefer_birth_sites {
                Self::birth_sites_first(grid, rng)
            } else {
                let mut vacant = grid.vacant_positions();
                vacant.shuffle(rng);
                vacant
            };
            for (x, y) in candidates.into_iter().take(target - live) {
                if grid.spawn(x, y, textures, rng) {
                    result.revived += 1;
                }
            }
        }
        result
    }

    /// Vacant slots in random order, with those already meeting the birth
    /// rule ahead of the rest.
    fn birth_sites_first<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Vec<GridKey> {
        let (mut ready, mut rest): (Vec<GridKey>, Vec<GridKey>) = grid
            .vacant_positions()
            .into_iter()
            .partition(|&(x, y)| grid.live_neighbors(x, y) == 3);
        ready.shuffle(rng);
        rest.shuffle(rng);
        ready.extend(rest);
        ready
    }

    /// Runs once per generation. Every `check_interval` generations, if the
    /// overall live percentage is at or below the minimum, new cells are
    /// injected round-robin across layers until the floor is restored or no
    /// layer can take more. Returns the number of cells injected.
    pub fn enforce_floor<R: Rng + ?Sized>(
        &mut self,
        grids: &mut [Grid],
        textures: &[TextureId],
        rng: &mut R,
    ) -> usize {
        self.generations_since_check += 1;
        if self.generations_since_check < self.check_interval {
            return 0;
        }
        self.generations_since_check = 0;

        let total_capacity: usize = grids.iter().map(Grid::capacity).sum();
        if total_capacity == 0 {
            return 0;
        }
        let live: Vec<usize> = grids.iter().map(Grid::live_count).collect();
        let total_live: usize = live.iter().sum();
        let percentage = total_live as f32 * 100.0 / total_capacity as f32;
        if percentage > self.min_percentage {
            return 0;
        }
        let deficit = self.floor_count(total_capacity).saturating_sub(total_live);
        if deficit == 0 {
            return 0;
        }
        if textures.is_empty() {
            log::warn!("Texture pool is empty, cannot restore the population floor");
            return 0;
        }

        let caps = self.layer_caps(grids);
        let mut room: Vec<usize> = caps
            .iter()
            .zip(&live)
            .map(|(cap, live)| cap.saturating_sub(*live))
            .collect();
        let mut candidates: Vec<Vec<GridKey>> = grids
            .iter()
            .map(|grid| {
                let mut slots = match self.injection {
                    FloorInjection::Anywhere => grid.vacant_positions(),
                    FloorInjection::BirthSitesOnly => grid.birth_sites(),
                };
                slots.shuffle(rng);
                slots
            })
            .collect();
        let mut warned_full = vec![false; grids.len()];

        let mut injected = 0;
        while injected < deficit {
            let mut progressed = false;
            for (index, grid) in grids.iter_mut().enumerate() {
                if injected >= deficit {
                    break;
                }
                if room[index] == 0 {
                    if !warned_full[index] && !candidates[index].is_empty() {
                        log::warn!(
                            "Layer {} is at its cap of {} cells, floor injection skipped",
                            grid.layer(),
                            caps[index]
                        );
                        warned_full[index] = true;
                    }
                    continue;
                }
                while let Some((x, y)) = candidates[index].pop() {
                    // Earlier injections can spoil a listed birth site
                    if self.injection == FloorInjection::BirthSitesOnly
                        && grid.live_neighbors(x, y) != 3
                    {
                        continue;
                    }
                    if grid.spawn(x, y, textures, rng) {
                        injected += 1;
                        room[index] -= 1;
                        progressed = true;
                        break;
                    }
                }
            }
            if !progressed {
                break;
            }
        }

        if injected > 0 {
            log::info!(
                "Population at {:.1}% (floor {:.1}%), injected {} of {} cells",
                percentage,
                self.min_percentage,
                injected,
                deficit
            );
        }
        injected
    }
}
// --- End of File: population.rs ---
