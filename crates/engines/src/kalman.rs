/// Scalar random-walk Kalman filter.
#[derive(Debug, Clone, Copy)]
pub struct KalmanFilter {
    pub transition_variance: f64,
    pub observation_variance: f64,
    pub initial_variance: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self {
            transition_variance: 1.0,
            observation_variance: 1.0,
            initial_variance: 1.0,
        }
    }
}

impl KalmanFilter {
    /// Filtered state means, seeded with the first observation.
    pub fn filter(&self, observations: &[f64]) -> Vec<f64> {
        let Some(&first) = observations.first() else {
            return Vec::new();
        };

        let mut mean = first;
        let mut variance = self.initial_variance;
        let mut out = Vec::with_capacity(observations.len());

        for (t, &y) in observations.iter().enumerate() {
            if t > 0 {
                variance += self.transition_variance;
            }
            let gain = variance / (variance + self.observation_variance);
            mean += gain * (y - mean);
            variance *= 1.0 - gain;
            out.push(mean);
        }
        out
    }
}

/// Exponential moving average, used when the filter output is unusable.
pub fn ema_smooth(data: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(data.len());
    for (i, &x) in data.iter().enumerate() {
        if i == 0 {
            out.push(x);
        } else {
            let prev = out[i - 1];
            out.push(alpha * x + (1.0 - alpha) * prev);
        }
    }
    out
}
