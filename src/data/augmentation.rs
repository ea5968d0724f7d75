//! Training-time augmentation

use crate::matrix::Matrix;
use crate::utils::SeededRng;

/// Add zero-mean Gaussian noise with standard deviation `noise_level` to every
/// pixel, clamping the result to [0, 1]. A level of zero returns a copy.
pub fn add_noise(images: &Matrix, noise_level: f64, rng: &mut SeededRng) -> Matrix {
    let mut noisy = images.clone();
    if noise_level <= 0.0 {
        return noisy;
    }
    for value in noisy.as_mut_slice() {
        *value = (*value + rng.gen_normal(0.0, noise_level)).clamp(0.0, 1.0);
    }
    noisy
}

/// `(x - mean) / std` elementwise. With mean 0.5 and std 0.5, [0, 1] maps to [-1, 1].
pub fn normalize(images: &Matrix, mean: f64, std: f64) -> Matrix {
    images.map(|x| (x - mean) / std)
}
