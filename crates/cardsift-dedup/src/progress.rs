/// Progress context threaded through one scan.
///
/// Reported fractions are clamped to [0, 1) and never decrease; 1.0 is
/// reserved for [`ScanProgress::finish`], which fires at most once.
pub struct ScanProgress<F> {
    total_seeds: usize,
    batch_size: u64,
    comparisons: u64,
    last_reported: f64,
    finished: bool,
    on_progress: F,
}

impl<F> ScanProgress<F>
where
    F: FnMut(f64),
{
    pub fn new(total_seeds: usize, batch_size: usize, on_progress: F) -> Self {
        Self {
            total_seeds,
            batch_size: batch_size.max(1) as u64,
            comparisons: 0,
            last_reported: 0.0,
            finished: false,
            on_progress,
        }
    }

    /// Counts one pairwise comparison. Returns true when it closes a batch.
    pub fn record_comparison(&mut self) -> bool {
        self.comparisons += 1;
        self.comparisons % self.batch_size == 0
    }

    /// Reports how far the outer loop has advanced: `seed_index / total`.
    pub fn report_seed_position(&mut self, seed_index: usize) {
        if self.total_seeds > 0 {
            self.report(seed_index as f64 / self.total_seeds as f64);
        }
    }

    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.last_reported = 1.0;
        (self.on_progress)(1.0);
    }

    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    pub fn last_reported(&self) -> f64 {
        self.last_reported
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn report(&mut self, fraction: f64) {
        if self.finished || fraction.is_nan() || fraction >= 1.0 {
            return;
        }
        let fraction = fraction.max(self.last_reported).max(0.0);
        self.last_reported = fraction;
        (self.on_progress)(fraction);
    }
}
