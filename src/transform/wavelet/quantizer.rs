use super::SubbandPyramid;

/// Divisor of the detail subbands at `level` (0 is the finest), `None` when
/// subband quantization is disabled by a zero multiplier
pub fn subband_divisor(multiplier: f64, level: usize) -> Option<f64> {
    if multiplier == 0.0 {
        return None;
    }
    Some(multiplier * ((level * level) as f64 + 1.0))
}

/// Rounds the approximation and divides every detail level by its divisor
pub fn quantize(pyramid: &SubbandPyramid<f64>, multiplier: f64) -> SubbandPyramid<i32> {
    pyramid.map(
        |value| value.round() as i32,
        |level, value| match subband_divisor(multiplier, level) {
            Some(divisor) => (value / divisor).round() as i32,
            None => value.round() as i32,
        },
    )
}

pub fn dequantize(pyramid: &SubbandPyramid<i32>, multiplier: f64) -> SubbandPyramid<f64> {
    pyramid.map(
        |value| value as f64,
        |level, value| value as f64 * subband_divisor(multiplier, level).unwrap_or(1.0),
    )
}

/// Smallest magnitude among the `ceil(n * quality)` largest magnitudes, or
/// `None` when no coefficient is kept at all
pub fn quality_threshold_value(values: impl Iterator<Item = i32>, quality: f64) -> Option<u32> {
    let mut magnitudes: Vec<u32> = values.map(i32::unsigned_abs).collect();
    let keep = (magnitudes.len() as f64 * quality).ceil() as usize;
    if keep == 0 {
        return None;
    }
    magnitudes.sort_unstable();
    magnitudes.get(magnitudes.len().saturating_sub(keep)).copied()
}

/// Zeroes every coefficient whose magnitude is below the quality threshold
pub fn threshold_by_quality(pyramid: &mut SubbandPyramid<i32>, quality: f64) {
    let values = pyramid.linearize();
    match quality_threshold_value(values.into_iter(), quality) {
        Some(threshold) => threshold_values(pyramid.values_mut(), threshold as f64),
        None => pyramid.values_mut().for_each(|value| *value = 0),
    }
}

/// Zeroes detail coefficients whose magnitude is below `threshold`
pub fn threshold_details(pyramid: &mut SubbandPyramid<i32>, threshold: f64) {
    threshold_values(pyramid.detail_values_mut(), threshold);
}

fn threshold_values<'a>(values: impl Iterator<Item = &'a mut i32>, threshold: f64) {
    for value in values {
        if (value.unsigned_abs() as f64) < threshold {
            *value = 0;
        }
    }
}
