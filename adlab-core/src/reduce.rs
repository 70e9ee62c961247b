//! Missing-safe reductions.
//!
//! Callers filter missing values out with [`present`] first; the reductions
//! then map an empty input to `None` instead of failing or defaulting to zero.

/// Drop missing values, keeping the present ones in order.
pub fn present<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().collect()
}

/// Arithmetic mean. `None` on empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Maximum value. `None` on empty input.
pub fn max(values: &[f64]) -> Option<f64> {
    argmax(values).map(|(value, _)| value)
}

/// Maximum value and the index of its first occurrence. `None` on empty input.
pub fn argmax(values: &[f64]) -> Option<(f64, usize)> {
    let mut best: Option<(f64, usize)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            None => best = Some((v, i)),
            Some((b, _)) if v > b => best = Some((v, i)),
            Some(_) => {}
        }
    }
    best
}

/// Mean over the present values of a possibly-missing sequence.
pub fn mean_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    mean(&present(values))
}

/// Maximum over the present values of a possibly-missing sequence.
pub fn max_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    max(&present(values))
}
