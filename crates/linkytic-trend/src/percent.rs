/// Scale samples to percentages of their maximum.
///
/// Returns the scaled samples and the maximum they were scaled against.
/// Missing samples stay missing. When no present sample is above zero the
/// maximum is 0 and every present sample maps to 0. Negative samples clamp
/// to 0.
pub fn scale_to_percent(samples: &[Option<i64>]) -> (Vec<Option<u8>>, i64) {
    let max = samples.iter().flatten().copied().fold(0i64, i64::max);
    if max == 0 {
        return (samples.iter().map(|s| s.map(|_| 0)).collect(), 0);
    }

    let scaled = samples
        .iter()
        .map(|sample| {
            sample.map(|v| {
                let percent = (i128::from(v) * 100).div_euclid(i128::from(max));
                percent.clamp(0, 100) as u8
            })
        })
        .collect();
    (scaled, max)
}
