//! Tukey window designer
//!
//! Builds the tapered envelope applied to designed FIR filters to
//! suppress circular-wrap artifacts and control how aggressively far
//! time taps are attenuated.

use std::f32::consts::PI;

/// Write a unity-gain Tukey window into `dest`: cosine-tapered ramps of
/// `ramp_len` samples at each end of a `target_len`-sample span, centered
/// within `dest`, zero outside.
///
/// A `ramp_len` of 0 gives a rectangular window; `target_len / 2` gives a
/// fully tapered Hann-like window with no flat top.
///
/// # Panics
/// If `target_len < 3`, `target_len > dest.len()`, or
/// `ramp_len > target_len / 2`.
pub fn design_tukey_window(dest: &mut [f32], target_len: usize, ramp_len: usize) {
    assert!(target_len >= 3, "window target length must be at least 3");
    assert!(
        target_len <= dest.len(),
        "window target length exceeds destination size"
    );
    assert!(
        ramp_len <= target_len / 2,
        "window ramp longer than half the target length"
    );

    dest.fill(0.0);
    let offset = (dest.len() - target_len) / 2;

    for p in 0..target_len {
        let edge_distance = p.min(target_len - 1 - p);
        dest[offset + p] = if ramp_len == 0 || edge_distance >= ramp_len {
            1.0
        } else {
            0.5 * (1.0 - (PI * edge_distance as f32 / ramp_len as f32).cos())
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_ramp_is_rectangular() {
        let mut window = vec![f32::NAN; 16];
        design_tukey_window(&mut window, 8, 0);

        for (i, &w) in window.iter().enumerate() {
            if (4..12).contains(&i) {
                assert_eq!(w, 1.0, "sample {} should be unity", i);
            } else {
                assert_eq!(w, 0.0, "sample {} should be zero", i);
            }
        }
    }

    #[test]
    fn test_half_ramp_has_no_flat_top() {
        let mut window = vec![0.0f32; 32];
        design_tukey_window(&mut window, 32, 16);

        // Fully tapered: only the two center samples may approach unity
        // and the envelope must rise then fall monotonically.
        assert_eq!(window[0], 0.0);
        for i in 1..16 {
            assert!(window[i] > window[i - 1]);
        }
        for i in 17..32 {
            assert!(window[i] < window[i - 1]);
        }
        assert!(window.iter().filter(|&&w| w == 1.0).count() <= 1);
    }

    #[test]
    fn test_window_is_symmetric() {
        let mut window = vec![0.0f32; 64];
        design_tukey_window(&mut window, 33, 10);

        for p in 0..33 {
            let offset = (64 - 33) / 2;
            assert_abs_diff_eq!(
                window[offset + p],
                window[offset + 32 - p],
                epsilon = 1e-6
            );
        }
    }

    #[test]
    #[should_panic(expected = "ramp longer than half")]
    fn test_oversized_ramp_rejected() {
        let mut window = vec![0.0f32; 16];
        design_tukey_window(&mut window, 10, 6);
    }
}
