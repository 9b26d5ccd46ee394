/// Centered moving average with edge clamping.
///
/// The window covers `window / 2` samples on each side of the current index
/// and shrinks near the ends instead of padding, so the output has the same
/// length as the input. A window of 0 or 1 returns an unchanged copy.
pub fn smooth(y: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || y.is_empty() {
        return y.to_vec();
    }

    let half = window / 2;
    let last = y.len() - 1;

    (0..y.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(last);
            let span = &y[lo..=hi];
            span.iter().sum::<f64>() / span.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn window_of_one_is_identity() {
        let y = vec![3.0, -1.0, 4.0, 1.5];
        assert_eq!(smooth(&y, 1), y);
        assert_eq!(smooth(&y, 0), y);
    }

    #[test]
    fn three_wide_average_clamps_edges() {
        let out = smooth(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        let expected = [1.5, 2.0, 3.0, 4.0, 4.5];
        for (a, b) in out.iter().zip(expected) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn even_window_uses_floor_half_width() {
        // window 4 -> half 2, same span as window 5
        let y = [0.0, 10.0, 0.0, 10.0, 0.0, 10.0];
        assert_eq!(smooth(&y, 4), smooth(&y, 5));
    }

    #[test]
    fn window_wider_than_input_averages_everything() {
        let out = smooth(&[2.0, 4.0, 6.0], 21);
        for v in out {
            assert_relative_eq!(v, 4.0);
        }
    }

    #[test]
    fn large_leading_value_does_not_leak_into_later_windows() {
        let out = smooth(&[1e16, 1.0, 1.0, 1.0, 1.0], 3);
        assert_relative_eq!(out[0], 5e15, max_relative = 1e-12);
        assert_eq!(out[2], 1.0);
        assert_eq!(out[3], 1.0);
        assert_eq!(out[4], 1.0);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(smooth(&[], 5).is_empty());
    }
}
