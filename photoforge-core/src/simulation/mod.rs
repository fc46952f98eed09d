pub mod builder;
pub mod drivers;
pub mod engine;
pub mod kinetics;
pub mod metrics;
pub mod state;

use rand::Rng;

/// Uniform noise in `[-amplitude, amplitude]`; zero when the amplitude is not positive.
pub(crate) fn symmetric_jitter<R: Rng + ?Sized>(rng: &mut R, amplitude: f64) -> f64 {
    if amplitude > 0.0 && amplitude.is_finite() {
        rng.gen_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}
