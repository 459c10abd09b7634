// --- File: config.rs ---
use crate::constants::*;
use crate::error::{EngineError, EngineResult};
use crate::utils::layer_opacity;
use winit::dpi::PhysicalSize;

/// Where the population floor may place emergency cells.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FloorInjection {
    /// Any empty slot, ignoring the birth rule.
    #[default]
    Anywhere,
    /// Only empty slots that already have exactly three live neighbors.
    BirthSitesOnly,
}

#[derive(Debug, Clone)]
pub struct LayerConfig {
    pub cell_size: f32,
    pub depth: f32,
    pub tint: [f32; 4],
    pub opacity: f32,
    pub shadow: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            cell_size: BASE_CELL_SIZE,
            depth: 0.5,
            tint: LAYER_TINT,
            opacity: CELL_OPACITY,
            shadow: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub viewport: PhysicalSize<u32>,
    pub layers: Vec<LayerConfig>,

    // Percentages of each layer's slot count
    pub initial_live_percentage: f32,
    pub min_live_percentage: f32,
    pub max_live_percentage: f32,
    pub max_total_cells: usize,
    pub population_check_interval: u32,
    pub floor_injection: FloorInjection,

    pub sound_threshold_low: f32,
    pub sound_threshold_high: f32,

    pub generation_interval_min: f32,
    pub generation_interval_max: f32,

    pub birth_duration: f32,
    pub death_duration: f32,

    pub vibration_medium: f32,
    pub vibration_max: f32,
    pub vibration_settle_rate: f32,

    pub shadow_offset: f32,
    pub shadow_opacity: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let layers = LAYER_DEPTHS
            .iter()
            .enumerate()
            .map(|(index, &depth)| LayerConfig {
                cell_size: BASE_CELL_SIZE,
                depth,
                tint: LAYER_TINT,
                opacity: layer_opacity(CELL_OPACITY, LAYER_OPACITY_DIFFERENCE, index),
                shadow: index == 0, // Only the foreground casts shadows
            })
            .collect();

        Self {
            viewport: PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT),
            layers,
            initial_live_percentage: INITIAL_LIVE_CELLS_PERCENTAGE,
            min_live_percentage: MIN_LIVE_CELLS_PERCENTAGE,
            max_live_percentage: MAX_LIVE_CELLS_PERCENTAGE,
            max_total_cells: MAX_CELLS,
            population_check_interval: GENERATIONS_TO_CHECK_POPULATION,
            floor_injection: FloorInjection::default(),
            sound_threshold_low: SOUND_THRESHOLD_LOW,
            sound_threshold_high: SOUND_THRESHOLD_HIGH,
            generation_interval_min: GENERATION_INTERVAL_MIN,
            generation_interval_max: GENERATION_INTERVAL_MAX,
            birth_duration: BIRTH_ANIMATION_SECS,
            death_duration: DEATH_ANIMATION_SECS,
            vibration_medium: CELL_VIBRATION_INTENSITY_MEDIUM,
            vibration_max: CELL_VIBRATION_INTENSITY_MAX,
            vibration_settle_rate: VIBRATION_SETTLE_RATE,
            shadow_offset: SHADOW_OFFSET,
            shadow_opacity: SHADOW_OPACITY,
        }
    }
}

impl EngineConfig {
    pub fn new(viewport: PhysicalSize<u32>) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// One grid covering the whole viewport, useful for small boards.
    pub fn single_layer(viewport: PhysicalSize<u32>, cell_size: f32) -> Self {
        Self {
            viewport,
            layers: vec![LayerConfig {
                cell_size,
                depth: LAYER_DEPTHS[0],
                shadow: true,
                ..LayerConfig::default()
            }],
            ..Self::default()
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(EngineError::EmptyViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        if self.layers.is_empty() {
            return Err(EngineError::config("at least one layer is required"));
        }
        if self.layers.len() > u8::MAX as usize {
            return Err(EngineError::config(format!(
                "{} layers requested, at most {} supported",
                self.layers.len(),
                u8::MAX
            )));
        }
        for (index, layer) in self.layers.iter().enumerate() {
            if !(layer.cell_size.is_finite() && layer.cell_size > 0.0) {
                return Err(EngineError::config(format!(
                    "layer {} cell size must be positive, got {}",
                    index + 1,
                    layer.cell_size
                )));
            }
            let columns = (self.viewport.width as f32 / layer.cell_size).floor() as u32;
            let rows = (self.viewport.height as f32 / layer.cell_size).floor() as u32;
            if (columns as usize).saturating_mul(rows as usize) > MAX_GRID_SLOTS {
                return Err(EngineError::GridTooLarge {
                    layer: (index + 1) as u8,
                    columns,
                    rows,
                });
            }
        }

        let percentages = [
            ("initial_live_percentage", self.initial_live_percentage),
            ("min_live_percentage", self.min_live_percentage),
            ("max_live_percentage", self.max_live_percentage),
        ];
        for (name, value) in percentages {
            if !(0.0..=100.0).contains(&value) {
                return Err(EngineError::config(format!(
                    "{name} must be within 0..=100, got {value}"
                )));
            }
        }
        if self.min_live_percentage > self.max_live_percentage {
            return Err(EngineError::config(format!(
                "min_live_percentage ({}) exceeds max_live_percentage ({})",
                self.min_live_percentage, self.max_live_percentage
            )));
        }

        if !(0.0 <= self.sound_threshold_low
            && self.sound_threshold_low < self.sound_threshold_high
            && self.sound_threshold_high <= 100.0)
        {
            return Err(EngineError::config(format!(
                "sound thresholds must satisfy 0 <= low < high <= 100, got {} / {}",
                self.sound_threshold_low, self.sound_threshold_high
            )));
        }

        if !(self.generation_interval_min > 0.0
            && self.generation_interval_min <= self.generation_interval_max)
        {
            return Err(EngineError::config(format!(
                "generation interval bounds must satisfy 0 < min <= max, got {} / {}",
                self.generation_interval_min, self.generation_interval_max
            )));
        }
        if !(self.birth_duration > 0.0 && self.death_duration > 0.0) {
            return Err(EngineError::config(
                "birth and death animation durations must be positive",
            ));
        }
        if self.population_check_interval == 0 {
            return Err(EngineError::config(
                "population_check_interval must be at least one generation",
            ));
        }
        Ok(())
    }
}
// --- End of File: config.rs ---
