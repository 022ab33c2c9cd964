//! Quantisation of trend histories into sparkline glyphs.

/// Intensity glyphs, lowest first. The full block `█` is left out so adjacent
/// table rows do not visually merge.
pub const STEPS: [char; 7] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇'];

/// Map `values` onto `0..STEPS.len()` after shifting them so the minimum is 0.
///
/// The scale is closed-open: a value equal to the maximum would land on
/// `STEPS.len()` and is folded into the top level instead. When every value is
/// equal, all of them map to level 0.
///
/// ```
/// use logspark_core::sparkline::levels;
///
/// assert_eq!(levels(&[0u32, 7]), vec![0, 6]);
/// assert_eq!(levels(&[3u32, 3, 3]), vec![0, 0, 0]);
/// ```
pub fn levels<T: Copy + Into<f64>>(values: &[T]) -> Vec<usize> {
    let total = STEPS.len() as f64;

    let min = values
        .iter()
        .map(|&v| v.into())
        .fold(f64::INFINITY, f64::min);
    let mut max = values
        .iter()
        .map(|&v| v.into() - min)
        .fold(0.0, f64::max);
    if max == 0.0 {
        max = 1.0;
    }

    values
        .iter()
        .map(|&v| {
            let x = (v.into() - min) / max * total;
            if x >= total {
                STEPS.len() - 1
            } else {
                x.floor() as usize
            }
        })
        .collect()
}

/// Render `values` as a sparkline string of the same length.
pub fn render<T: Copy + Into<f64>>(values: &[T]) -> String {
    levels(values).into_iter().map(|i| STEPS[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(levels::<u32>(&[]).is_empty());
        assert_eq!(render::<u32>(&[]), "");
    }

    #[test]
    fn test_top_value_folds_into_last_level() {
        assert_eq!(levels(&[0u32, 7]), vec![0, 6]);
        assert_eq!(render(&[0u32, 7]), "▁▇");
    }

    #[test]
    fn test_all_equal_nonzero_is_lowest() {
        assert_eq!(levels(&[5u32; 7]), vec![0; 7]);
        assert_eq!(render(&[5u32; 3]), "▁▁▁");
    }

    #[test]
    fn test_shifted_by_minimum() {
        // 10..=17 behaves exactly like 0..=7.
        let shifted: Vec<u32> = (10..=17).collect();
        let base: Vec<u32> = (0..=7).collect();
        assert_eq!(levels(&shifted), levels(&base));
        assert_eq!(levels(&base), vec![0, 1, 2, 3, 4, 5, 6, 6]);
    }

    #[test]
    fn test_fractional_inputs() {
        assert_eq!(levels(&[0.0f64, 0.5, 1.0]), vec![0, 3, 6]);
    }

    #[test]
    fn test_levels_stay_in_alphabet() {
        let trend = [0u32, 1, 0, 3, 9, 2, 9];
        assert!(levels(&trend).iter().all(|&l| l < STEPS.len()));
        assert_eq!(render(&trend).chars().count(), trend.len());
    }

    #[test]
    fn test_input_not_mutated() {
        let trend = vec![4u32, 6, 8];
        let _ = levels(&trend);
        assert_eq!(trend, vec![4, 6, 8]);
    }
}
