//! Glide easing curve
//!
//! A sigmoid `x^n / (x^n + (1 - x)^n)` evaluated only over its upper half, so
//! the curve leaves the start point steeply and settles softly into the
//! target. `n` sets the sharpness: 1 is linear, larger values approach a step.

use num_traits::Float;

/// Map glide progress in `[0, 1]` to eased progress in `[0, 1]`.
///
/// Exact at both ends: `ease(0, n) == 0` and `ease(1, n) == 1` for any `n > 0`.
/// Evaluated as `1 / (1 + ((1 - x) / x)^n)`, which stays finite for large `n`
/// where both powers of the plain form underflow to zero.
pub fn ease<T: Float>(progress: T, sharpness: T) -> T {
    let one = T::one();
    let two = one + one;
    let half = one / two;

    let x = progress.max(T::zero()).min(one);
    let upper = half + half * x;

    let ratio = ((one - upper) / upper).powf(sharpness);
    let y = one / (one + ratio);

    (y - half) * two
}
