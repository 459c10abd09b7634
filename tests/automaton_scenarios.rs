use migrants::cell::Phase;
use migrants::constants::FIXED_TIMESTEP;
use migrants::grid::GridKey;
use migrants::{AutomatonEngine, EngineConfig, SharedSprites, SimRng, TextureId};
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use winit::dpi::PhysicalSize;

const TICK: f32 = FIXED_TIMESTEP as f32;

fn textures() -> Arc<[TextureId]> {
    Arc::from(vec![TextureId(2), TextureId(3), TextureId(4)])
}

fn build(config: EngineConfig, seed: u64) -> AutomatonEngine {
    AutomatonEngine::with_rng(
        config,
        textures(),
        &SharedSprites::new(),
        SimRng::seed_from_u64(seed),
    )
    .expect("engine should build")
}

/// 10x10 single-layer board that starts empty and never reconciles away
/// from a three-cell population.
fn blinker_config() -> EngineConfig {
    let mut config = EngineConfig::single_layer(PhysicalSize::new(100, 100), 10.0);
    config.initial_live_percentage = 0.0;
    config.min_live_percentage = 3.0;
    config.max_live_percentage = 3.0;
    config.generation_interval_min = 0.1;
    config.generation_interval_max = 0.1;
    config
}

fn place(engine: &mut AutomatonEngine, layer: usize, cells: &[GridKey]) {
    let pool = [TextureId(2)];
    let mut rng = SimRng::seed_from_u64(99);
    let grid = engine.grid_mut(layer).expect("layer exists");
    for &(x, y) in cells {
        assert!(grid.spawn(x, y, &pool, &mut rng));
    }
}

fn sorted_live(engine: &AutomatonEngine, layer: usize) -> Vec<GridKey> {
    let mut live = engine.grids()[layer].live_positions();
    live.sort();
    live
}

#[test]
fn blinker_oscillates_under_steady_sound() {
    let mut engine = build(blinker_config(), 1);
    assert_eq!(engine.live_count(), 0);
    place(&mut engine, 0, &[(4, 5), (5, 5), (6, 5)]);

    engine.update(0.1, 50.0);
    assert_eq!(engine.generation(), 1);
    assert_eq!(sorted_live(&engine, 0), vec![(5, 4), (5, 5), (5, 6)]);
    let report = engine.last_report().expect("a generation ran");
    assert_eq!(report.rules.survivors, 1);
    assert_eq!(report.rules.births, 2);
    assert_eq!(report.rules.deaths, 2);
    assert_eq!(report.killed + report.revived + report.injected, 0);

    engine.update(0.1, 50.0);
    assert_eq!(engine.generation(), 2);
    assert_eq!(sorted_live(&engine, 0), vec![(4, 5), (5, 5), (6, 5)]);

    for _ in 0..6 {
        engine.update(0.1, 50.0);
    }
    assert_eq!(engine.generation(), 8);
    assert_eq!(sorted_live(&engine, 0), vec![(4, 5), (5, 5), (6, 5)]);
}

#[test]
fn loud_jump_speeds_up_and_respects_the_cap() {
    let mut config = EngineConfig::new(PhysicalSize::new(1280, 720));
    config.max_total_cells = 300;
    let mut engine = build(config, 2);

    for _ in 0..48 {
        engine.update(TICK, 5.0);
    }
    let quiet_interval = engine.generation_interval(5.0);
    let loud_interval = engine.generation_interval(90.0);
    assert!(loud_interval < quiet_interval);
    let controller = engine.controller();
    assert!(controller.desired_percentage(90.0) > controller.desired_percentage(5.0));

    let caps = engine.layer_caps().to_vec();
    assert!(caps.iter().sum::<usize>() <= 300);

    let generation_before = engine.generation();
    for _ in 0..96 {
        engine.update(TICK, 90.0);
        assert!(engine.live_count() <= 300);
        for (grid, cap) in engine.grids().iter().zip(&caps) {
            assert!(grid.live_count() <= *cap);
        }
    }
    // Four seconds at quiet pace would be four generations at most
    assert!(engine.generation() - generation_before > 4);
}

#[test]
fn loud_sound_stops_growth() {
    let config = EngineConfig::new(PhysicalSize::new(1280, 720));
    let mut engine = build(config, 7);
    let floor = engine.controller().floor_count(engine.total_capacity());

    // Ten seconds at a mid level
    for _ in 0..240 {
        engine.update(TICK, 50.0);
    }
    let before = engine.live_count();
    let ceiling = before.max(floor);
    let generation_before = engine.generation();

    for _ in 0..480 {
        engine.update(TICK, 95.0);
        assert!(
            engine.live_count() <= ceiling,
            "generation {} grew to {} live cells, ceiling is {}",
            engine.generation(),
            engine.live_count(),
            ceiling
        );
    }
    assert!(engine.generation() - generation_before > 20);
}

#[test]
fn population_stays_within_bounds() {
    let config = EngineConfig::new(PhysicalSize::new(1280, 720));
    let check_interval = config.population_check_interval as u64;
    let mut engine = build(config, 3);
    let caps = engine.layer_caps().to_vec();
    let total_capacity = engine.total_capacity();
    let floor = engine.controller().floor_count(total_capacity);

    let mut sound = SimRng::seed_from_u64(4);
    let mut intensity: f32 = 40.0;
    let mut last_generation = engine.generation();
    for _ in 0..1_200 {
        intensity = (intensity + sound.gen_range(-8.0..=8.0)).clamp(0.0, 100.0);
        engine.update(TICK, intensity);

        for (grid, cap) in engine.grids().iter().zip(&caps) {
            assert!(grid.live_count() <= *cap);
        }
        let generation = engine.generation();
        if generation != last_generation && generation % check_interval == 0 {
            assert!(
                engine.live_count() >= floor,
                "generation {} left {} live cells, floor is {}",
                generation,
                engine.live_count(),
                floor
            );
        }
        last_generation = generation;
    }
}

#[test]
fn zero_time_ticks_change_nothing() {
    let mut config = EngineConfig::new(PhysicalSize::new(640, 480));
    config.generation_interval_min = 0.5;
    config.generation_interval_max = 0.5;
    let mut engine = build(config, 5);

    engine.update(0.5, 50.0);
    assert_eq!(engine.generation(), 1);

    let occupancy: Vec<Vec<GridKey>> = engine
        .grids()
        .iter()
        .map(|grid| grid.live_positions())
        .collect();
    let occupied = engine.occupied_count();
    for _ in 0..25 {
        engine.update(0.0, 50.0);
    }
    assert_eq!(engine.generation(), 1);
    assert_eq!(engine.occupied_count(), occupied);
    let after: Vec<Vec<GridKey>> = engine
        .grids()
        .iter()
        .map(|grid| grid.live_positions())
        .collect();
    assert_eq!(after, occupancy);
}

#[test]
fn dying_cells_shrink_then_leave_the_draw_list() {
    let mut config = EngineConfig::single_layer(PhysicalSize::new(100, 100), 10.0);
    config.initial_live_percentage = 0.0;
    config.min_live_percentage = 0.0;
    config.max_live_percentage = 0.0;
    config.generation_interval_min = 1.0;
    config.generation_interval_max = 1.0;
    config.birth_duration = 0.5;
    config.death_duration = 1.0;
    let mut engine = build(config, 6);
    place(&mut engine, 0, &[(2, 2)]);

    engine.update(0.5, 50.0);
    let cell = engine.grids()[0].get(2, 2).expect("cell placed");
    assert_eq!(cell.phase(), Phase::Alive);
    // Body plus shadow
    assert_eq!(engine.draw().len(), 2);

    // Generation boundary: the target of zero retires the cell
    engine.update(0.5, 50.0);
    assert_eq!(engine.generation(), 1);
    let cell = engine.grids()[0].get(2, 2).expect("still animating");
    assert_eq!(cell.phase(), Phase::Dying);
    let mut progress = cell.progress();
    assert_eq!(engine.live_count(), 0);

    engine.update(0.25, 50.0);
    let cell = engine.grids()[0].get(2, 2).expect("still animating");
    assert!(cell.progress() >= progress);
    progress = cell.progress();
    let sprites = engine.draw();
    assert!(!sprites.is_empty());
    assert!(sprites.iter().all(|s| s.size.x < 10.0));

    engine.update(0.25, 50.0);
    assert!(progress < 1.0);
    assert!(engine.grids()[0].get(2, 2).is_none());
    assert!(engine.draw().is_empty());
}
