//! Sound-driven, multi-layer Game of Life installation.
//!
//! Each depth layer runs its own toroidal B3/S23 automaton. Audio loudness
//! sets both how fast generations tick and how many cells a layer should
//! hold; cells zoom in when born, zoom out when they die, and shake when
//! the room gets loud.

pub mod audio;
pub mod cell;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod grid;
pub mod hud;
pub mod population;
pub mod renderer;
pub mod sprites;
pub mod stars;
pub mod utils;

pub use config::{EngineConfig, FloorInjection, LayerConfig};
pub use engine::{AutomatonEngine, GenerationReport, SimRng};
pub use error::{EngineError, EngineResult};
pub use sprites::{SharedSprites, Sprite, TextureId};
