//! Composite score: the plain mean of six oscillator-scale inputs.

/// Mean of all inputs, or `None` if any input is undefined.
pub fn score_of(inputs: &[Option<f64>]) -> Option<f64> {
    if inputs.is_empty() {
        return None;
    }
    let mut sum = 0.0;
    for v in inputs {
        sum += (*v)?;
    }
    Some(sum / inputs.len() as f64)
}

/// Row-wise score over equally long series.
///
/// Inputs, in order: index RSI fast, index RSI slow, MFI RSI, NHNL RSI,
/// A/D RSI, breadth above MA.
pub fn composite_score(series: [&[Option<f64>]; 6]) -> Vec<Option<f64>> {
    let len = series.iter().map(|s| s.len()).min().unwrap_or(0);
    (0..len)
        .map(|i| {
            let row = series.map(|s| s[i]);
            score_of(&row)
        })
        .collect()
}
