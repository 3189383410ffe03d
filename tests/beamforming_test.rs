//! End-to-end beamforming tests: a broadside beam on a uniform linear
//! array must reproduce its input at the engine's fixed latency across
//! block boundaries, and a steered beam must favor a matched far-field
//! source over a mismatched one.

use approx::assert_abs_diff_eq;
use beamgrid::constants::CAUSALITY_MARGIN_TAPS;
use beamgrid::simulation;
use beamgrid::{ArrayGeometry, BeamEngine, BeamParams, EngineConfig};

const BLOCK: usize = 128;

fn linear_array(cols: usize) -> ArrayGeometry {
    ArrayGeometry {
        rows: 1,
        cols,
        ..Default::default()
    }
}

fn test_config(geometry: ArrayGeometry, num_beams: usize) -> EngineConfig {
    EngineConfig {
        geometry,
        block_size: BLOCK,
        num_beams,
        ..Default::default()
    }
}

/// Broadside steering has integer (zero) inter-mic delays, so each
/// steering filter collapses to a scaled delta and the beam output is
/// the input delayed by exactly this many samples.
fn engine_latency_taps(geometry: &ArrayGeometry) -> usize {
    let n = geometry.transform_size(BLOCK);
    let fir_len = geometry.required_fir_len().min(n);
    (n - fir_len) / 2 + CAUSALITY_MARGIN_TAPS
}

/// Run the capture through the engine block by block and collect each
/// beam's full output.
fn render_all(engine: &mut BeamEngine, capture: &[Vec<f32>], num_beams: usize) -> Vec<Vec<f32>> {
    let frames = capture[0].len();
    let mut beams = vec![vec![0.0f32; frames]; num_beams];

    let mut offset = 0;
    while offset + BLOCK <= frames {
        let input: Vec<&[f32]> = capture.iter().map(|c| &c[offset..offset + BLOCK]).collect();
        let mut output: Vec<&mut [f32]> = beams
            .iter_mut()
            .map(|b| &mut b[offset..offset + BLOCK])
            .collect();
        engine.render_block(&input, &mut output).unwrap();
        offset += BLOCK;
    }
    beams
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

#[test]
fn broadside_beam_is_a_pure_delay() {
    let geometry = linear_array(8);
    let latency = engine_latency_taps(&geometry);
    let mut engine = BeamEngine::new(test_config(geometry.clone(), 1)).unwrap();

    let total = 8 * BLOCK;
    let signal = simulation::multitone(total, geometry.sample_rate, &[440.0, 1333.0, 2710.0]);
    let capture = vec![signal.clone(); geometry.num_mics()];

    let beams = render_all(&mut engine, &capture, 1);

    // Silence until the wavefront clears the filter latency, then the
    // input reappears at unit gain, with no seams at block boundaries.
    for &s in &beams[0][..latency] {
        assert_abs_diff_eq!(s, 0.0, epsilon = 1e-3);
    }
    for i in 0..total - latency {
        assert_abs_diff_eq!(beams[0][i + latency], signal[i], epsilon = 1e-3);
    }
}

#[test]
fn matched_steering_outgains_mismatched() {
    let geometry = linear_array(8);
    let config = test_config(geometry.clone(), 2);
    let mut engine = BeamEngine::new(config).unwrap();
    engine
        .set_beam_parameters(0, BeamParams::new(0.5, 0.0, 0.0), 1.0)
        .unwrap();
    engine
        .set_beam_parameters(1, BeamParams::new(-0.5, 0.0, 0.0), 1.0)
        .unwrap();

    let total = 16 * BLOCK;
    let signal = simulation::multitone(total, geometry.sample_rate, &[820.0, 1930.0, 3170.0]);
    let capture = simulation::capture_far_field(&geometry, &signal, 0.5, 0.0);

    let beams = render_all(&mut engine, &capture, 2);

    // Compare steady-state energy, past the filter latency and the
    // wavefront sweep.
    let settle = 4 * BLOCK;
    let matched = rms(&beams[0][settle..]);
    let mismatched = rms(&beams[1][settle..]);

    assert!(
        matched > 2.0 * mismatched,
        "matched {matched}, mismatched {mismatched}"
    );
    // Matched compensation restores the source at roughly unit gain.
    let source_rms = rms(&signal[settle..]);
    assert!((matched / source_rms - 1.0).abs() < 0.15);
}

#[test]
fn extra_input_channels_are_ignored() {
    let geometry = linear_array(4);
    let latency = engine_latency_taps(&geometry);
    let mut engine = BeamEngine::new(test_config(geometry.clone(), 1)).unwrap();

    let total = 4 * BLOCK;
    let signal = simulation::multitone(total, geometry.sample_rate, &[700.0, 1500.0]);
    // Six channels supplied to a four-mic engine: the trailing two must
    // not contribute.
    let mut capture = vec![signal.clone(); 4];
    capture.push(vec![10.0f32; total]);
    capture.push(vec![-10.0f32; total]);

    let beams = render_all(&mut engine, &capture, 1);
    for i in 0..total - latency {
        assert_abs_diff_eq!(beams[0][i + latency], signal[i], epsilon = 1e-3);
    }
}
