// File: engine.rs
use crate::cell::{CellDynamics, CellStyle, ShadowStyle};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::grid::{Grid, RuleOutcome};
use crate::population::PopulationController;
use crate::sprites::{SharedSprites, Sprite, TextureId, sort_by_depth};
use crate::utils::lerp;
use glam::Vec4;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

pub type SimRng = StdRng;

/// Summary of the most recent generation, for logging and the HUD.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct GenerationReport {
    pub generation: u64,
    pub interval: f32,
    pub rules: RuleOutcome,
    pub killed: usize,
    pub revived: usize,
    pub injected: usize,
    pub live: usize,
}

/// Owns one grid per layer and the sound-driven generation clock.
pub struct AutomatonEngine {
    config: EngineConfig,
    grids: Vec<Grid>,
    styles: Vec<CellStyle>,
    caps: Vec<usize>,
    controller: PopulationController,
    dynamics: CellDynamics,
    textures: Arc<[TextureId]>,
    rng: SimRng,
    generation_timer: f32,
    generation: u64,
    sound_intensity: f32,
    last_report: Option<GenerationReport>,
}

impl AutomatonEngine {
    pub fn new(
        config: EngineConfig,
        textures: Arc<[TextureId]>,
        shared: &SharedSprites,
    ) -> EngineResult<Self> {
        Self::with_rng(config, textures, shared, SimRng::from_entropy())
    }

    /// Same as [`AutomatonEngine::new`] with a caller-supplied generator,
    /// so runs can be reproduced.
    pub fn with_rng(
        config: EngineConfig,
        textures: Arc<[TextureId]>,
        shared: &SharedSprites,
        rng: SimRng,
    ) -> EngineResult<Self> {
        config.validate()?;
        if textures.is_empty() {
            return Err(EngineError::EmptyTexturePool);
        }

        let mut grids = Vec::with_capacity(config.layers.len());
        let mut styles = Vec::with_capacity(config.layers.len());
        for (index, layer) in config.layers.iter().enumerate() {
            let layer_id = (index + 1) as u8;
            grids.push(Grid::new(
                layer_id,
                config.viewport,
                layer.cell_size,
                layer.depth,
            )?);
            styles.push(CellStyle {
                size: layer.cell_size,
                tint: Vec4::from(layer.tint),
                opacity: layer.opacity.clamp(0.0, 1.0),
                shadow: layer.shadow.then_some(ShadowStyle {
                    texture: shared.shadow,
                    offset: config.shadow_offset,
                    opacity: config.shadow_opacity,
                }),
            });
        }

        let controller = PopulationController::new(&config);
        let caps = controller.layer_caps(&grids);
        let dynamics = CellDynamics::from_config(&config);

        let mut engine = Self {
            config,
            grids,
            styles,
            caps,
            controller,
            dynamics,
            textures,
            rng,
            generation_timer: 0.0,
            generation: 0,
            sound_intensity: 0.0,
            last_report: None,
        };
        engine.seed_initial_population();
        log::info!(
            "Automaton engine ready: {} layers, {} slots, {} live cells",
            engine.grids.len(),
            engine.total_capacity(),
            engine.live_count()
        );
        Ok(engine)
    }

    fn seed_initial_population(&mut self) {
        let percentage = self.config.initial_live_percentage;
        for (grid, &cap) in self.grids.iter_mut().zip(&self.caps) {
            let target = ((percentage * grid.capacity() as f32 / 100.0).floor() as usize).min(cap);
            self.controller
                .reconcile(grid, target, &self.textures, false, &mut self.rng);
        }
    }

    /// Clears every layer and reseeds with a fresh generator.
    pub fn restart(&mut self) {
        log::info!("Restarting automaton with new seed...");
        self.rng = SimRng::from_entropy();
        for grid in &mut self.grids {
            grid.clear();
        }
        self.controller = PopulationController::new(&self.config);
        self.generation_timer = 0.0;
        self.generation = 0;
        self.last_report = None;
        self.seed_initial_population();
    }

    /// Seconds between generations: louder audio evolves faster.
    pub fn generation_interval(&self, sound_intensity: f32) -> f32 {
        let t = sound_intensity.clamp(0.0, 100.0) / 100.0;
        let min = self.config.generation_interval_min;
        let max = self.config.generation_interval_max;
        lerp(max, min, t).clamp(min, max)
    }

    /// Advances one frame. Cell animation runs every call; a generation runs
    /// only once the accumulated time reaches the current interval.
    pub fn update(&mut self, delta_time: f32, sound_intensity: f32) {
        let dt = if delta_time.is_finite() {
            delta_time.max(0.0)
        } else {
            0.0
        };
        let intensity = if sound_intensity.is_finite() {
            sound_intensity.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.sound_intensity = intensity;

        self.generation_timer += dt;
        let interval = self.generation_interval(intensity);
        if self.generation_timer >= interval {
            let report = self.step_generation(intensity, interval);
            log::debug!("{:?}", report);
            self.last_report = Some(report);
            self.generation_timer = 0.0;
        }

        for grid in &mut self.grids {
            grid.update_cells(dt, intensity, &self.dynamics, &mut self.rng);
        }
        for grid in &mut self.grids {
            grid.reap();
        }
    }

    fn step_generation(&mut self, intensity: f32, interval: f32) -> GenerationReport {
        let mut report = GenerationReport {
            generation: self.generation + 1,
            interval,
            ..GenerationReport::default()
        };
        // A frozen target holds each layer at its size when the generation began
        let live_at_start: Vec<usize> = self.grids.iter().map(Grid::live_count).collect();

        for ((grid, &cap), &live) in self.grids.iter_mut().zip(&self.caps).zip(&live_at_start) {
            let target = self
                .controller
                .target(intensity, live, grid.capacity(), cap);
            let adjusted =
                self.controller
                    .reconcile(grid, target, &self.textures, false, &mut self.rng);
            report.killed += adjusted.killed;
            report.revived += adjusted.revived;
        }

        for grid in &mut self.grids {
            let outcome = grid.apply_rules(&self.textures, &mut self.rng);
            report.rules.survivors += outcome.survivors;
            report.rules.births += outcome.births;
            report.rules.deaths += outcome.deaths;
        }

        for ((grid, &cap), &live) in self.grids.iter_mut().zip(&self.caps).zip(&live_at_start) {
            let target = self
                .controller
                .target(intensity, live, grid.capacity(), cap);
            let adjusted =
                self.controller
                    .reconcile(grid, target, &self.textures, true, &mut self.rng);
            report.killed += adjusted.killed;
            report.revived += adjusted.revived;
        }

        report.injected =
            self.controller
                .enforce_floor(&mut self.grids, &self.textures, &mut self.rng);

        self.generation += 1;
        report.live = self.live_count();
        report
    }

    /// Appends every visible cell sprite, unsorted.
    pub fn extend_sprites(&self, out: &mut Vec<Sprite>) {
        for (grid, style) in self.grids.iter().zip(&self.styles) {
            grid.draw(style, out);
        }
    }

    /// All visible cells, lowest depth first (drawn behind).
    pub fn draw(&self) -> Vec<Sprite> {
        let mut sprites = Vec::with_capacity(self.occupied_count() * 2);
        self.extend_sprites(&mut sprites);
        sort_by_depth(&mut sprites);
        sprites
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    pub fn controller(&self) -> &PopulationController {
        &self.controller
    }
    pub fn grids(&self) -> &[Grid] {
        &self.grids
    }
    /// Direct access to a layer's lattice, e.g. to place a pattern.
    pub fn grid_mut(&mut self, index: usize) -> Option<&mut Grid> {
        self.grids.get_mut(index)
    }
    pub fn layer_caps(&self) -> &[usize] {
        &self.caps
    }
    pub fn generation(&self) -> u64 {
        self.generation
    }
    pub fn sound_intensity(&self) -> f32 {
        self.sound_intensity
    }
    pub fn last_report(&self) -> Option<&GenerationReport> {
        self.last_report.as_ref()
    }

    pub fn live_count(&self) -> usize {
        self.grids.iter().map(Grid::live_count).sum()
    }
    pub fn occupied_count(&self) -> usize {
        self.grids.iter().map(Grid::occupied_count).sum()
    }
    pub fn total_capacity(&self) -> usize {
        self.grids.iter().map(Grid::capacity).sum()
    }
}
// --- End of File: engine.rs ---

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    fn textures() -> Arc<[TextureId]> {
        Arc::from(vec![TextureId(2), TextureId(3)])
    }

    fn engine(config: EngineConfig, seed: u64) -> AutomatonEngine {
        AutomatonEngine::with_rng(
            config,
            textures(),
            &SharedSprites::new(),
            SimRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn construction_fails_fast() {
        let shared = SharedSprites::new();
        let empty: Arc<[TextureId]> = Arc::from(Vec::new());
        let result = AutomatonEngine::new(EngineConfig::default(), empty, &shared);
        assert!(matches!(result, Err(EngineError::EmptyTexturePool)));

        let config = EngineConfig::new(PhysicalSize::new(0, 0));
        let result = AutomatonEngine::new(config, textures(), &shared);
        assert!(matches!(result, Err(EngineError::EmptyViewport { .. })));

        let config = EngineConfig::single_layer(PhysicalSize::new(40, 40), 60.0);
        let result = AutomatonEngine::new(config, textures(), &shared);
        assert!(matches!(result, Err(EngineError::EmptyGrid { .. })));
    }

    #[test]
    fn initial_population_matches_configuration() {
        let engine = engine(EngineConfig::default(), 1);
        for grid in engine.grids() {
            let expected = (10.0 * grid.capacity() as f32 / 100.0).floor() as usize;
            assert_eq!(grid.live_count(), expected);
        }
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn louder_sound_shortens_the_interval() {
        let engine = engine(EngineConfig::default(), 2);
        assert_eq!(engine.generation_interval(0.0), 1.0);
        assert_eq!(engine.generation_interval(100.0), 0.25);
        assert!(engine.generation_interval(90.0) < engine.generation_interval(5.0));
    }

    #[test]
    fn generation_fires_on_accumulated_time() {
        let mut engine = engine(EngineConfig::default(), 3);
        // Silence: one-second interval
        for _ in 0..3 {
            engine.update(0.25, 0.0);
        }
        assert_eq!(engine.generation(), 0);
        engine.update(0.25, 0.0);
        assert_eq!(engine.generation(), 1);
        assert!(engine.last_report().is_some());
    }

    #[test]
    fn draw_is_depth_sorted_and_layers_are_separated() {
        let mut engine = engine(EngineConfig::default(), 4);
        engine.update(0.6, 0.0);
        let sprites = engine.draw();
        assert!(!sprites.is_empty());
        assert!(sprites.windows(2).all(|w| w[0].depth <= w[1].depth));
        // Layer 3 (depth 0.3) is behind layer 1 (depth 0.9)
        assert!(sprites.first().unwrap().depth < sprites.last().unwrap().depth);
    }

    #[test]
    fn restart_reseeds_the_initial_population() {
        let mut engine = engine(EngineConfig::default(), 5);
        for _ in 0..40 {
            engine.update(0.1, 60.0);
        }
        assert!(engine.generation() > 0);
        engine.restart();
        assert_eq!(engine.generation(), 0);
        let expected: usize = engine
            .grids()
            .iter()
            .map(|grid| (10.0 * grid.capacity() as f32 / 100.0).floor() as usize)
            .sum();
        assert_eq!(engine.live_count(), expected);
    }
}
