// File: audio.rs
//! Sound intensity handoff between a producer thread and the frame loop.
//!
//! The frame loop only ever reads a single `f32` in `0..=100`. Producers
//! publish it through [`SharedIntensity`], which stores the bits in an
//! atomic so no lock is held on either side.

use crate::constants::{
    DRIFT_METER_INTERVAL_MS, DRIFT_METER_PEAK_CHANCE, DRIFT_METER_STEP, MANUAL_INTENSITY_STEP,
};
#[cfg(feature = "capture")]
use crate::error::{EngineError, EngineResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Anything that can report the current loudness on a 0–100 scale.
pub trait SoundIntensitySource {
    fn intensity(&self) -> f32;
}

#[derive(Debug, Clone, Default)]
pub struct SharedIntensity(Arc<AtomicU32>);

impl SharedIntensity {
    pub fn new(initial: f32) -> Self {
        let shared = Self::default();
        shared.store(initial);
        shared
    }

    /// Publishes a new level. Non-finite input is stored as silence.
    pub fn store(&self, intensity: f32) {
        let clamped = if intensity.is_finite() {
            intensity.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.0.store(clamped.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl SoundIntensitySource for SharedIntensity {
    fn intensity(&self) -> f32 {
        self.load()
    }
}

/// Stand-in for a capture callback: a smoothed random walk with the odd
/// loud peak, published every few milliseconds from its own thread.
pub struct DriftMeter {
    level: SharedIntensity,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DriftMeter {
    pub fn spawn(seed: Option<u64>) -> Self {
        let level = SharedIntensity::new(20.0);
        let running = Arc::new(AtomicBool::new(true));
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let producer = level.clone();
        let flag = running.clone();
        let handle = std::thread::spawn(move || {
            let mut current = producer.load();
            while flag.load(Ordering::Relaxed) {
                current = drift_step(current, &mut rng);
                producer.store(current);
                std::thread::sleep(Duration::from_millis(DRIFT_METER_INTERVAL_MS));
            }
            log::debug!("Drift meter stopped");
        });
        log::info!("Drift meter started");

        Self {
            level,
            running,
            handle: Some(handle),
        }
    }

    pub fn shared(&self) -> SharedIntensity {
        self.level.clone()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Drift meter thread panicked");
            }
        }
    }
}

impl SoundIntensitySource for DriftMeter {
    fn intensity(&self) -> f32 {
        self.level.load()
    }
}

impl Drop for DriftMeter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drift_step<R: Rng + ?Sized>(current: f32, rng: &mut R) -> f32 {
    if rng.gen_bool(DRIFT_METER_PEAK_CHANCE) {
        return rng.gen_range(80.0..=100.0);
    }
    // Peaks decay back toward the middle of the range
    let pull = (35.0 - current) * 0.01;
    let step = rng.gen_range(-DRIFT_METER_STEP..=DRIFT_METER_STEP);
    (current + step + pull).clamp(0.0, 100.0)
}

/// Loudest absolute sample of a buffer on the 0–100 scale.
pub fn peak_percent(samples: impl IntoIterator<Item = f32>) -> f32 {
    let peak = samples
        .into_iter()
        .filter(|sample| sample.is_finite())
        .fold(0.0_f32, |peak, sample| peak.max(sample.abs()));
    (peak * 100.0).min(100.0)
}

/// Peak meter on the default input device. Each capture buffer publishes
/// its peak from the audio callback thread.
#[cfg(feature = "capture")]
pub struct CaptureMeter {
    level: SharedIntensity,
    stream: Option<cpal::Stream>,
}

#[cfg(feature = "capture")]
impl CaptureMeter {
    pub fn open_default() -> EngineResult<Self> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| EngineError::audio("no default input device"))?;
        let supported = device
            .default_input_config()
            .map_err(|e| EngineError::audio(format!("no usable input config: {e}")))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let level = SharedIntensity::new(0.0);
        let stream = match sample_format {
            cpal::SampleFormat::F32 => capture_stream::<f32>(&device, &config, level.clone()),
            cpal::SampleFormat::F64 => capture_stream::<f64>(&device, &config, level.clone()),
            cpal::SampleFormat::I16 => capture_stream::<i16>(&device, &config, level.clone()),
            cpal::SampleFormat::I32 => capture_stream::<i32>(&device, &config, level.clone()),
            cpal::SampleFormat::U16 => capture_stream::<u16>(&device, &config, level.clone()),
            cpal::SampleFormat::U8 => capture_stream::<u8>(&device, &config, level.clone()),
            other => {
                return Err(EngineError::audio(format!(
                    "unsupported sample format {other:?}"
                )));
            }
        }
        .map_err(|e| EngineError::audio(format!("failed to open input stream: {e}")))?;
        stream
            .play()
            .map_err(|e| EngineError::audio(format!("failed to start input stream: {e}")))?;

        log::info!(
            "Capturing sound from {} ({} Hz, {} channels)",
            device.name().unwrap_or_else(|_| "unknown device".to_string()),
            config.sample_rate.0,
            config.channels
        );
        Ok(Self {
            level,
            stream: Some(stream),
        })
    }

    pub fn shared(&self) -> SharedIntensity {
        self.level.clone()
    }

    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            self.level.store(0.0);
            log::debug!("Sound capture stopped");
        }
    }
}

#[cfg(feature = "capture")]
fn capture_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    level: SharedIntensity,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    use cpal::Sample;
    use cpal::traits::DeviceTrait;

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            level.store(peak_percent(data.iter().map(|&s| s.to_sample::<f32>())));
        },
        |err| log::warn!("Sound capture error: {}", err),
        None,
    )
}

#[cfg(feature = "capture")]
impl SoundIntensitySource for CaptureMeter {
    fn intensity(&self) -> f32 {
        self.level.load()
    }
}

/// The producer behind the frame loop's level: the input device when one
/// opens, otherwise the drift meter.
pub enum SoundMeter {
    #[cfg(feature = "capture")]
    Capture(CaptureMeter),
    Drift(DriftMeter),
}

impl SoundMeter {
    pub fn open() -> Self {
        #[cfg(feature = "capture")]
        match CaptureMeter::open_default() {
            Ok(meter) => return Self::Capture(meter),
            Err(err) => log::warn!("{}; falling back to the drift meter", err),
        }
        Self::Drift(DriftMeter::spawn(None))
    }

    pub fn shared(&self) -> SharedIntensity {
        match self {
            #[cfg(feature = "capture")]
            Self::Capture(meter) => meter.shared(),
            Self::Drift(meter) => meter.shared(),
        }
    }

    pub fn stop(&mut self) {
        match self {
            #[cfg(feature = "capture")]
            Self::Capture(meter) => meter.stop(),
            Self::Drift(meter) => meter.stop(),
        }
    }

    pub fn is_live_capture(&self) -> bool {
        !matches!(self, Self::Drift(_))
    }
}

impl SoundIntensitySource for SoundMeter {
    fn intensity(&self) -> f32 {
        self.shared().load()
    }
}

/// Where the frame loop reads its level from: the live meter, or a level
/// pinned from the keyboard.
#[derive(Debug, Clone)]
pub enum IntensityInput {
    Meter(SharedIntensity),
    Manual { meter: SharedIntensity, level: f32 },
}

impl IntensityInput {
    pub fn new(meter: SharedIntensity) -> Self {
        Self::Meter(meter)
    }

    /// Switches to manual mode (starting from the current level) and nudges it.
    pub fn adjust(&mut self, increase: bool) {
        let delta = if increase {
            MANUAL_INTENSITY_STEP
        } else {
            -MANUAL_INTENSITY_STEP
        };
        let (meter, level) = match self {
            Self::Meter(meter) => (meter.clone(), meter.load()),
            Self::Manual { meter, level } => (meter.clone(), *level),
        };
        let level = (level + delta).clamp(0.0, 100.0);
        log::info!("Manual sound intensity: {:.0}", level);
        *self = Self::Manual { meter, level };
    }

    pub fn use_meter(&mut self) {
        if let Self::Manual { meter, .. } = self {
            log::info!("Sound intensity follows the meter again");
            *self = Self::Meter(meter.clone());
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }
}

impl SoundIntensitySource for IntensityInput {
    fn intensity(&self) -> f32 {
        match self {
            Self::Meter(meter) => meter.load(),
            Self::Manual { level, .. } => *level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_intensity_clamps_and_sanitizes() {
        let shared = SharedIntensity::new(50.0);
        assert_eq!(shared.load(), 50.0);
        shared.store(140.0);
        assert_eq!(shared.load(), 100.0);
        shared.store(-3.0);
        assert_eq!(shared.load(), 0.0);
        shared.store(f32::NAN);
        assert_eq!(shared.load(), 0.0);
    }

    #[test]
    fn clones_observe_the_same_level() {
        let producer = SharedIntensity::new(0.0);
        let consumer = producer.clone();
        producer.store(42.5);
        assert_eq!(consumer.intensity(), 42.5);
    }

    #[test]
    fn drift_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut level = 50.0;
        for _ in 0..10_000 {
            level = drift_step(level, &mut rng);
            assert!((0.0..=100.0).contains(&level));
        }
    }

    #[test]
    fn drift_meter_stops_cleanly() {
        let mut meter = DriftMeter::spawn(Some(3));
        std::thread::sleep(Duration::from_millis(30));
        let level = meter.intensity();
        assert!((0.0..=100.0).contains(&level));
        meter.stop();
        meter.stop();
    }

    #[test]
    fn peak_tracks_the_loudest_sample() {
        assert_eq!(peak_percent([]), 0.0);
        assert_eq!(peak_percent([0.1, -0.5, 0.25]), 50.0);
        assert_eq!(peak_percent([f32::NAN, 0.2]), 20.0);
        // Clipped input saturates the meter
        assert_eq!(peak_percent([1.7]), 100.0);
    }

    #[test]
    fn meter_without_capture_falls_back_to_drift() {
        let mut meter = SoundMeter::Drift(DriftMeter::spawn(Some(4)));
        assert!(!meter.is_live_capture());
        let shared = meter.shared();
        assert!((0.0..=100.0).contains(&meter.intensity()));
        meter.stop();
        assert!((0.0..=100.0).contains(&shared.load()));
    }

    #[test]
    fn manual_override_and_return() {
        let meter = SharedIntensity::new(30.0);
        let mut input = IntensityInput::new(meter.clone());
        input.adjust(true);
        assert!(input.is_manual());
        assert_eq!(input.intensity(), 35.0);
        meter.store(80.0);
        assert_eq!(input.intensity(), 35.0);
        for _ in 0..30 {
            input.adjust(false);
        }
        assert_eq!(input.intensity(), 0.0);
        input.use_meter();
        assert_eq!(input.intensity(), 80.0);
    }
}
