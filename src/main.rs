// File: main.rs
use migrants::audio::{IntensityInput, SoundIntensitySource, SoundMeter};
use migrants::constants::*;
use migrants::hud::Hud;
use migrants::renderer::Renderer;
use migrants::sprites::{self, SpriteImage, sort_by_depth};
use migrants::stars::Starfield;
use migrants::{AutomatonEngine, EngineConfig, SharedSprites, SimRng, Sprite, TextureId};
use rand::SeedableRng;
use std::path::PathBuf;
use std::{sync::Arc, time::Instant};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

/// Everything the frame loop advances: the automaton plus the decoration
/// drawn around it.
struct Installation {
    engine: AutomatonEngine,
    starfield: Starfield,
    hud: Hud,
    input: IntensityInput,
    textures: Arc<[TextureId]>,
    shared: SharedSprites,
    rng: SimRng,
    is_paused: bool,
    sprites: Vec<Sprite>,
}

impl Installation {
    fn update(&mut self, delta_time: f32) {
        let intensity = self.input.intensity();
        self.engine.update(delta_time, intensity);
        self.starfield.update(delta_time, intensity, &mut self.rng);
        self.hud.update(delta_time);
    }

    fn collect_sprites(&mut self) -> &[Sprite] {
        self.sprites.clear();
        self.starfield.draw(&mut self.sprites);
        self.engine.extend_sprites(&mut self.sprites);
        self.hud
            .draw(self.engine.sound_intensity(), &mut self.sprites);
        sort_by_depth(&mut self.sprites);
        &self.sprites
    }

    fn toggle_pause(&mut self) {
        self.is_paused = !self.is_paused;
        log::info!(
            "Installation {}",
            if self.is_paused { "paused" } else { "resumed" }
        );
    }

    fn restart(&mut self) {
        self.engine.restart();
        self.hud.reset();
    }

    /// Grids are sized to the viewport, so a new window size means a new
    /// engine. Keeps the old one if the new size cannot hold a grid.
    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 || new_size == self.engine.config().viewport
        {
            return;
        }
        self.starfield.resize(new_size);
        self.hud.resize(new_size);
        let mut config = self.engine.config().clone();
        config.viewport = new_size;
        match AutomatonEngine::new(config, self.textures.clone(), &self.shared) {
            Ok(engine) => self.engine = engine,
            Err(err) => log::warn!("Keeping previous grid after resize: {}", err),
        }
    }

    fn title(&self, fps: f64) -> String {
        let manual_text = if self.input.is_manual() { " (manual)" } else { "" };
        let paused_text = if self.is_paused { " [PAUSED]" } else { "" };
        format!(
            "Migrants - Live: {}/{} - Gen: {} - Sound: {:.0}{} - FPS: {:.1}{}",
            self.engine.live_count(),
            self.engine.total_capacity(),
            self.engine.generation(),
            self.engine.sound_intensity(),
            manual_text,
            fps,
            paused_text
        )
    }
}

type TextureSet = (Arc<[TextureId]>, Vec<SpriteImage>);

/// Cell images from `MIGRANTS_IMAGES`, plus the shared textures ahead of them.
fn load_textures(shared: &SharedSprites) -> Result<TextureSet, Box<dyn std::error::Error>> {
    let images_dir = std::env::var_os("MIGRANTS_IMAGES")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR));
    let mut cell_images = sprites::load_images(&images_dir)?;

    let room = (MAX_SPRITE_LAYERS - SharedSprites::FIRST_IMAGE) as usize;
    if cell_images.len() > room {
        log::warn!(
            "Using the first {} of {} images; the texture array is full",
            room,
            cell_images.len()
        );
        cell_images.truncate(room);
    }

    let textures: Arc<[TextureId]> = cell_images.iter().map(|image| image.id).collect();
    let mut all_images = shared.images().to_vec();
    all_images.extend(cell_images);
    Ok((textures, all_images))
}

// --- Main Function ---
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let shared = SharedSprites::new();
    let (textures, images) = load_textures(&shared)?;

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Migrants")
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
            .build(&event_loop)?,
    );
    let mut renderer = pollster::block_on(Renderer::new(window.clone(), &images))?;
    drop(images);

    let config = EngineConfig::new(renderer.size);
    let layer_count = config.layers.len();
    let engine = AutomatonEngine::new(config, textures.clone(), &shared)?;
    let mut rng = SimRng::from_entropy();
    let starfield = Starfield::new(
        STAR_COUNT_PER_LAYER * layer_count,
        renderer.size,
        shared.pixel,
        &mut rng,
    );
    let hud = Hud::new(shared.pixel, renderer.size);
    let mut meter = SoundMeter::open();

    let mut installation = Installation {
        engine,
        starfield,
        hud,
        input: IntensityInput::new(meter.shared()),
        textures,
        shared,
        rng,
        is_paused: false,
        sprites: Vec::new(),
    };

    let mut last_sim_update_time = Instant::now();
    let mut time_accumulator = 0.0;
    let mut last_fps_update_time = Instant::now();
    let mut frames_since_last_fps_update = 0;
    let mut current_fps = 0.0;

    event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::AboutToWait => {
                if !installation.is_paused {
                    let now = Instant::now();
                    let delta_time = now.duration_since(last_sim_update_time).as_secs_f64();
                    last_sim_update_time = now;
                    time_accumulator += delta_time;
                    while time_accumulator >= FIXED_TIMESTEP {
                        installation.update(FIXED_TIMESTEP as f32);
                        time_accumulator -= FIXED_TIMESTEP;
                    }
                } else {
                    last_sim_update_time = Instant::now();
                    time_accumulator = 0.0;
                }
                window.request_redraw();
            }
            Event::LoopExiting => meter.stop(),
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(physical_size) => {
                    renderer.resize(physical_size);
                    installation.resize(physical_size);
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let new_inner_size = window.inner_size();
                    renderer.resize(new_inner_size);
                    installation.resize(new_inner_size);
                }
                WindowEvent::KeyboardInput {
                    event: key_event, ..
                } => {
                    if key_event.state == ElementState::Pressed && !key_event.repeat {
                        match key_event.physical_key {
                            PhysicalKey::Code(KeyCode::ArrowUp) => installation.input.adjust(true),
                            PhysicalKey::Code(KeyCode::ArrowDown) => {
                                installation.input.adjust(false)
                            }
                            PhysicalKey::Code(KeyCode::KeyM) => installation.input.use_meter(),
                            PhysicalKey::Code(KeyCode::Space) => installation.toggle_pause(),
                            PhysicalKey::Code(KeyCode::KeyR) => installation.restart(),
                            PhysicalKey::Code(KeyCode::Escape) => elwt.exit(),
                            _ => {}
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    frames_since_last_fps_update += 1;
                    let now = Instant::now();
                    let elapsed_secs = now.duration_since(last_fps_update_time).as_secs_f64();
                    if elapsed_secs >= FPS_UPDATE_INTERVAL_SECS {
                        current_fps = frames_since_last_fps_update as f64 / elapsed_secs;
                        last_fps_update_time = now;
                        frames_since_last_fps_update = 0;
                        log::info!(
                            "gen {} | live {} | sound {:.0} | fps {:.1}",
                            installation.engine.generation(),
                            installation.engine.live_count(),
                            installation.engine.sound_intensity(),
                            current_fps
                        );
                    }
                    let sprites = installation.collect_sprites();
                    match renderer.render(sprites) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            renderer.reconfigure()
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("WGPU Error: OutOfMemory");
                            elwt.exit();
                        }
                        Err(e) => log::warn!("WGPU Error: {:?}", e),
                    }
                    window.set_title(&installation.title(current_fps));
                }
                _ => {}
            },
            _ => {}
        }
    })?;
    Ok(())
}
