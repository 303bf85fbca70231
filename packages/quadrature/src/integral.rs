use std::num::NonZero;

use tracing::debug;

use crate::{Error, Result};

/// A function of one variable that can be integrated.
pub type Integrand = fn(f64) -> f64;

/// Integrates a function over one closed range with the trapezoidal rule.
///
/// The range is divided into the smallest number of equal steps that are no wider than the
/// requested step size.
///
/// # Example
///
/// ```rust
/// use std::f64::consts::PI;
///
/// use quadrature::IntegralTask;
///
/// let task = IntegralTask::new(0.0, PI, 1e-4, f64::sin).unwrap();
/// assert!((task.compute() - 2.0).abs() < 1e-6);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct IntegralTask {
    start: f64,
    end: f64,
    step_count: usize,
    step: f64,
    integrand: Integrand,
}

impl IntegralTask {
    /// Prepares the integration of `integrand` over `[start, end]` with steps no wider than
    /// `max_step`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if the bounds or step are not finite, if `end` is not
    /// greater than `start` or if `max_step` is not positive.
    pub fn new(start: f64, end: f64, max_step: f64, integrand: Integrand) -> Result<Self> {
        let invalid = |problem| Error::InvalidRange {
            start,
            end,
            step: max_step,
            problem,
        };

        if !start.is_finite() || !end.is_finite() || !max_step.is_finite() {
            return Err(invalid("bounds and step must be finite"));
        }

        if end <= start {
            return Err(invalid("end must be greater than start"));
        }

        if max_step <= 0.0 {
            return Err(invalid("step must be positive"));
        }

        let steps = ((end - start) / max_step).ceil();

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "steps is a positive whole number, saturating on absurd inputs is acceptable"
        )]
        let step_count = (steps as usize).max(1);

        #[expect(
            clippy::cast_precision_loss,
            reason = "step counts are far below the 2^52 limit of exact conversion"
        )]
        let step = (end - start) / step_count as f64;

        Ok(Self {
            start,
            end,
            step_count,
            step,
            integrand,
        })
    }

    /// Computes the integral on the calling thread.
    #[must_use]
    pub fn compute(&self) -> f64 {
        let f = self.integrand;

        (0..self.step_count)
            .map(|i| {
                #[expect(
                    clippy::cast_precision_loss,
                    reason = "step counts are far below the 2^52 limit of exact conversion"
                )]
                let x1 = self.start + i as f64 * self.step;
                let x2 = x1 + self.step;

                (f(x1) + f(x2)) / 2.0 * self.step
            })
            .sum()
    }

    /// Lower bound of the range.
    #[must_use]
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Upper bound of the range.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Number of trapezoids the range is divided into.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Width of each trapezoid.
    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }
}

/// Splits `[start, end]` into `parts` equal sub-ranges and prepares one [`IntegralTask`] for
/// each, in ascending order.
///
/// # Errors
///
/// Returns [`Error::InvalidRange`] under the same conditions as [`IntegralTask::new()`].
pub fn partition(
    start: f64,
    end: f64,
    max_step: f64,
    parts: NonZero<usize>,
    integrand: Integrand,
) -> Result<Vec<IntegralTask>> {
    #[expect(
        clippy::cast_precision_loss,
        reason = "part counts are far below the 2^52 limit of exact conversion"
    )]
    let width = (end - start) / parts.get() as f64;

    (0..parts.get())
        .map(|i| {
            #[expect(
                clippy::cast_precision_loss,
                reason = "part counts are far below the 2^52 limit of exact conversion"
            )]
            let part_start = start + i as f64 * width;
            let part_end = part_start + width;

            let task = IntegralTask::new(part_start, part_end, max_step, integrand)?;

            debug!(
                start = task.start(),
                end = task.end(),
                steps = task.step_count(),
                step = task.step(),
                "prepared integration task"
            );

            Ok(task)
        })
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::f64::consts::PI;

    use testing::relative_diff;

    use super::*;

    #[test]
    fn step_is_shrunk_to_divide_range_evenly() {
        let task = IntegralTask::new(0.0, 1.0, 0.3, f64::sin).unwrap();

        assert_eq!(task.step_count(), 4);
        assert!((task.step() - 0.25).abs() < 1e-15);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "relative_diff returns exactly 0.0 when within tolerance")]
    fn integrates_sine_over_half_period() {
        let task = IntegralTask::new(0.0, PI, 1e-5, f64::sin).unwrap();

        assert_eq!(relative_diff(task.compute(), 2.0, 1e-9), 0.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "relative_diff returns exactly 0.0 when within tolerance")]
    fn linear_function_is_exact() {
        let task = IntegralTask::new(1.0, 3.0, 0.5, |x| 2.0 * x).unwrap();

        assert_eq!(relative_diff(task.compute(), 8.0, 1e-12), 0.0);
    }

    #[test]
    fn rejects_invalid_ranges() {
        assert!(IntegralTask::new(1.0, 1.0, 0.1, f64::sin).is_err());
        assert!(IntegralTask::new(2.0, 1.0, 0.1, f64::sin).is_err());
        assert!(IntegralTask::new(0.0, 1.0, 0.0, f64::sin).is_err());
        assert!(IntegralTask::new(0.0, f64::INFINITY, 0.1, f64::sin).is_err());
        assert!(IntegralTask::new(f64::NAN, 1.0, 0.1, f64::sin).is_err());
    }

    #[test]
    fn partition_covers_range_contiguously() {
        let parts = partition(0.0, PI, 1e-3, NonZero::new(30).unwrap(), f64::sin).unwrap();

        assert_eq!(parts.len(), 30);
        assert!(parts.first().unwrap().start().abs() < 1e-15);
        assert!((parts.last().unwrap().end() - PI).abs() < 1e-12);

        for pair in parts.windows(2) {
            let [left, right] = pair else { unreachable!() };
            assert!((left.end() - right.start()).abs() < 1e-12);
        }
    }
}
