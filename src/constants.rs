// --- File: constants.rs ---
// --- Global Installation Constants ---
pub const BACKGROUND_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};
pub const WINDOW_WIDTH: u32 = 1280;
pub const WINDOW_HEIGHT: u32 = 720;
pub const TARGET_FPS: f64 = 24.0;
pub const FIXED_TIMESTEP: f64 = 1.0 / TARGET_FPS;
pub const FPS_UPDATE_INTERVAL_SECS: f64 = 1.0;
pub const DEFAULT_IMAGES_DIR: &str = "assets/images";

// --- Layers ---
pub const BASE_CELL_SIZE: f32 = 60.0;
pub const TOTAL_LAYERS: usize = 3;
// Layer 1 is the foreground; lower depth draws first (behind).
pub const LAYER_DEPTHS: [f32; TOTAL_LAYERS] = [0.9, 0.6, 0.3];
pub const CELL_OPACITY: f32 = 1.0;
// Each layer behind layer 1 is multiplied by this again.
pub const LAYER_OPACITY_DIFFERENCE: f32 = 0.8;
pub const LAYER_TINT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

// --- Sound Intensity Thresholds (0-100 scale) ---
pub const SOUND_THRESHOLD_LOW: f32 = 10.0;
pub const SOUND_THRESHOLD_HIGH: f32 = 75.0;

// --- Population ---
pub const INITIAL_LIVE_CELLS_PERCENTAGE: f32 = 10.0;
pub const MIN_LIVE_CELLS_PERCENTAGE: f32 = 10.0;
pub const MAX_LIVE_CELLS_PERCENTAGE: f32 = 40.0;
pub const GENERATIONS_TO_CHECK_POPULATION: u32 = 2;
pub const MAX_CELLS: usize = 1000;

// --- Generation Clock (seconds) ---
pub const GENERATION_INTERVAL_MIN: f32 = 0.25;
pub const GENERATION_INTERVAL_MAX: f32 = 1.0;

// --- Lifecycle Animation (seconds for a full zoom) ---
pub const BIRTH_ANIMATION_SECS: f32 = 0.5;
pub const DEATH_ANIMATION_SECS: f32 = 0.5;

// --- Vibration (pixels) ---
pub const CELL_VIBRATION_INTENSITY_MEDIUM: f32 = 5.0;
pub const CELL_VIBRATION_INTENSITY_MAX: f32 = 20.0;
// Fraction of the offset removed per second between the thresholds
pub const VIBRATION_SETTLE_RATE: f32 = 4.0;

// --- Shadows ---
pub const SHADOW_OFFSET: f32 = 5.0;
pub const SHADOW_OPACITY: f32 = 0.5;
pub const SHADOW_DEPTH_BIAS: f32 = 0.001;

// --- Stars ---
pub const STAR_COUNT_PER_LAYER: usize = 100;
pub const STAR_BASE_SPEED_MULTIPLIER: f32 = 15.0;
pub const STAR_SOUND_INTENSITY_MULTIPLIER: f32 = 7.0;
pub const STAR_VIBRATION_MULTIPLIER: f32 = 3.0;
pub const STAR_VIBRATION_THRESHOLD: f32 = 30.0;
pub const STAR_MIN_SIZE: f32 = 1.0;
pub const STAR_MAX_SIZE: f32 = 3.0;
// Stars live below every cell layer.
pub const STARFIELD_DEPTH_SPAN: f32 = 0.1;

// --- HUD ---
pub const SOUND_METER_WIDTH: f32 = 200.0;
pub const SOUND_METER_HEIGHT: f32 = 20.0;
pub const SOUND_METER_MARGIN: f32 = 10.0;
pub const SOUND_METER_TRACK_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
pub const SOUND_METER_FILL_COLOR: [f32; 4] = [0.0, 0.5, 0.0, 1.0];
pub const FADE_IN_DURATION: f32 = 2.0;
pub const HUD_DEPTH: f32 = 1.0;

// Per-layer slot limit; 1 px cells on a 4K display fit well below it
pub const MAX_GRID_SLOTS: usize = 1 << 24;

// --- Textures ---
pub const SPRITE_TEXTURE_SIZE: u32 = 128;
// Default wgpu limit for texture array layers
pub const MAX_SPRITE_LAYERS: u32 = 256;
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

// --- Audio Stand-in ---
pub const DRIFT_METER_INTERVAL_MS: u64 = 10;
pub const DRIFT_METER_STEP: f32 = 2.5;
pub const DRIFT_METER_PEAK_CHANCE: f64 = 0.004;
pub const MANUAL_INTENSITY_STEP: f32 = 5.0;

// --- End of File: constants.rs ---
