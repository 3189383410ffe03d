use std::f32::consts::PI;

use crate::beam::geometry::ArrayGeometry;

/// Deterministic broadband test signal: a sum of incommensurate tones,
/// normalized to unit peak.
pub fn multitone(num_samples: usize, sample_rate: u32, freqs_hz: &[f32]) -> Vec<f32> {
    let mut signal: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            freqs_hz.iter().map(|&f| (2.0 * PI * f * t).sin()).sum()
        })
        .collect();

    let peak = signal.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    if peak > 0.0 {
        for s in &mut signal {
            *s /= peak;
        }
    }
    signal
}

/// Per-microphone arrival delays in samples for a far-field source at
/// the given steer direction, normalized so the earliest arrival is 0.
///
/// The wavefront reaches elements closer to the source first, so the
/// per-axis increment carries the opposite sign of the synthesizer's
/// steering delays; a matched steering filter then compensates these
/// arrivals exactly.
pub fn source_delays(geometry: &ArrayGeometry, steer_x: f32, steer_y: f32) -> Vec<f32> {
    let angle_x = steer_x.clamp(-1.0, 1.0) * PI / 2.0;
    let angle_y = steer_y.clamp(-1.0, 1.0) * PI / 2.0;
    let sample_rate = geometry.sample_rate as f32;

    let tau_x = -angle_x.sin() * geometry.spacing_x_m / geometry.sound_speed_mps * sample_rate;
    let tau_y = -angle_y.sin() * geometry.spacing_y_m / geometry.sound_speed_mps * sample_rate;

    let mut delays: Vec<f32> = (0..geometry.rows)
        .flat_map(|row| (0..geometry.cols).map(move |col| tau_x * col as f32 + tau_y * row as f32))
        .collect();

    let min = delays.iter().cloned().fold(f32::INFINITY, f32::min);
    for delay in &mut delays {
        *delay -= min;
    }
    delays
}

/// Simulate the array's capture of a far-field source: each microphone
/// receives the source signal delayed by its arrival time (fractional
/// delays by linear interpolation, silence before the wavefront).
pub fn capture_far_field(
    geometry: &ArrayGeometry,
    signal: &[f32],
    steer_x: f32,
    steer_y: f32,
) -> Vec<Vec<f32>> {
    let delays = source_delays(geometry, steer_x, steer_y);

    delays
        .iter()
        .map(|&delay| {
            (0..signal.len())
                .map(|i| sample_delayed(signal, i as f32 - delay))
                .collect()
        })
        .collect()
}

fn sample_delayed(signal: &[f32], t: f32) -> f32 {
    if t < 0.0 {
        return 0.0;
    }
    let i0 = t as usize;
    let frac = t - i0 as f32;
    let a = signal.get(i0).copied().unwrap_or(0.0);
    let b = signal.get(i0 + 1).copied().unwrap_or(0.0);
    a + frac * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_broadside_source_arrives_simultaneously() {
        let geometry = ArrayGeometry::default();
        let delays = source_delays(&geometry, 0.0, 0.0);
        assert!(delays.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_endfire_wavefront_sweeps_across_array() {
        let geometry = ArrayGeometry {
            rows: 1,
            cols: 8,
            ..Default::default()
        };
        // Positive steer points toward the high-index end, which the
        // wavefront reaches first.
        let delays = source_delays(&geometry, 1.0, 0.0);
        for pair in delays.windows(2) {
            assert!(pair[1] < pair[0]);
        }
        assert_eq!(delays[7], 0.0);
    }

    #[test]
    fn test_opposite_steers_mirror_delays() {
        let geometry = ArrayGeometry {
            rows: 1,
            cols: 6,
            ..Default::default()
        };
        let pos = source_delays(&geometry, 0.7, 0.0);
        let neg = source_delays(&geometry, -0.7, 0.0);
        for mic in 0..6 {
            assert_abs_diff_eq!(pos[mic], neg[5 - mic], epsilon = 1e-4);
        }
    }

    #[test]
    fn test_integer_delay_shifts_exactly() {
        let signal = vec![0.0, 1.0, 0.0, 0.0];
        assert_eq!(sample_delayed(&signal, 1.0), 1.0);
        assert_eq!(sample_delayed(&signal, 0.5), 0.5);
        assert_eq!(sample_delayed(&signal, -0.5), 0.0);
    }

    #[test]
    fn test_multitone_unit_peak() {
        let signal = multitone(4800, 48_000, &[440.0, 1337.0]);
        let peak = signal.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert_abs_diff_eq!(peak, 1.0, epsilon = 1e-6);
    }
}
