/// Relative-change stall detector over the running best value.
///
/// Each observation compares the new best with the previous one. A relative
/// change below `min_improve_pct` counts as a stall, anything else resets the
/// count, and `patience` consecutive stalls signal convergence.
#[derive(Clone, Debug)]
pub(crate) struct ConvergenceTracker {
    min_improve_pct: Option<f64>,
    patience: usize,
    previous_best: Option<f64>,
    stalled: usize,
}

/// Added to the denominator so a zero best does not divide by zero.
const RELATIVE_EPSILON: f64 = 1e-8;

impl ConvergenceTracker {
    /// `initial_best` is the best seed value, if any seeds were given.
    pub(crate) fn new(
        min_improve_pct: Option<f64>,
        patience: usize,
        initial_best: Option<f64>,
    ) -> Self {
        Self {
            min_improve_pct,
            patience,
            previous_best: initial_best,
            stalled: 0,
        }
    }

    /// Records the best value after an iteration.
    ///
    /// Returns `true` once the stall count reaches `patience`. Always
    /// returns `false` when convergence checking is disabled.
    pub(crate) fn observe(&mut self, best: f64) -> bool {
        let Some(threshold) = self.min_improve_pct else {
            return false;
        };

        match self.previous_best {
            Some(prev) => {
                let relative = (best - prev).abs() / (prev.abs() + RELATIVE_EPSILON);
                if relative < threshold {
                    self.stalled += 1;
                } else {
                    self.stalled = 0;
                }
            }
            // First value ever seen counts as an improvement.
            None => self.stalled = 0,
        }
        self.previous_best = Some(best);

        self.stalled >= self.patience
    }

    /// Consecutive stalled iterations so far.
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn stalled(&self) -> usize {
        self.stalled
    }
}
