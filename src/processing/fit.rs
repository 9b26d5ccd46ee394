use crate::error::PipelineError;
use crate::processing::statistics::mean;

/// Ordinary least-squares line through a set of points.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// `slope * x + intercept` for every input x, in input order.
    pub fitted_y: Vec<f64>,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y = slope * x + intercept` by ordinary least squares.
pub fn fit_linear(x: &[f64], y: &[f64]) -> Result<LinearFit, PipelineError> {
    if x.len() != y.len() {
        return Err(PipelineError::LengthMismatch { x: x.len(), y: y.len() });
    }
    if x.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(PipelineError::NonFiniteInput);
    }

    let x_mean = mean(x)?;
    let y_mean = mean(y)?;

    let (num, den) = x.iter().zip(y).fold((0.0, 0.0), |(num, den), (&xv, &yv)| {
        let dx = xv - x_mean;
        (num + dx * (yv - y_mean), den + dx * dx)
    });

    if den == 0.0 {
        return Err(PipelineError::DegenerateInput);
    }

    let slope = num / den;
    let mut fit = LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
        fitted_y: Vec::with_capacity(x.len()),
    };
    fit.fitted_y = x.iter().map(|&xv| fit.predict(xv)).collect();
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_noiseless_line() {
        let fit = fit_linear(&[0.0, 1.0, 2.0, 3.0], &[0.0, 2.0, 4.0, 6.0]).unwrap();
        assert_relative_eq!(fit.slope, 2.0);
        assert_relative_eq!(fit.intercept, 0.0);
        assert_eq!(fit.fitted_y.len(), 4);
        assert_relative_eq!(fit.fitted_y[3], 6.0);
        assert_relative_eq!(fit.predict(10.0), 20.0);
    }

    #[test]
    fn recovers_offset_and_negative_slope() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 - 1.25 * v).collect();
        let fit = fit_linear(&x, &y).unwrap();
        assert_relative_eq!(fit.slope, -1.25, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_x_is_degenerate() {
        assert_eq!(
            fit_linear(&[2.0, 2.0, 2.0], &[1.0, 5.0, 9.0]),
            Err(PipelineError::DegenerateInput)
        );
        assert_eq!(fit_linear(&[1.0], &[1.0]), Err(PipelineError::DegenerateInput));
    }

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(fit_linear(&[], &[]), Err(PipelineError::EmptyInput));
        assert_eq!(
            fit_linear(&[1.0, 2.0], &[1.0]),
            Err(PipelineError::LengthMismatch { x: 2, y: 1 })
        );
    }
}
