use rand_distr::{Distribution, Normal};

/// Add white Gaussian noise with the given standard deviation to every
/// channel in place.
pub fn add_gaussian_noise(channels: &mut [Vec<f32>], sigma: f32) {
    if sigma <= 0.0 {
        return;
    }
    let normal = Normal::new(0.0f32, sigma).expect("sigma must be finite and positive");
    let mut rng = rand::rng();

    for channel in channels {
        for sample in channel {
            *sample += normal.sample(&mut rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sigma_is_noop() {
        let mut channels = vec![vec![0.5f32; 64]];
        add_gaussian_noise(&mut channels, 0.0);
        assert!(channels[0].iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_noise_changes_samples() {
        let mut channels = vec![vec![0.0f32; 256]];
        add_gaussian_noise(&mut channels, 0.1);
        let energy: f32 = channels[0].iter().map(|s| s * s).sum();
        assert!(energy > 0.0);
    }
}
