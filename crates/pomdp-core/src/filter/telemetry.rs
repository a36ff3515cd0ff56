use super::sampler::FilterStats;
use serde::Serialize;

/// Summary of one particle-generation call, suitable for structured logs.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FilterMetrics {
    pub attempts: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub illegal: usize,
    pub acceptance_rate: f64,
    pub illegal_rate: f64,
}

impl FilterMetrics {
    pub fn from_stats(stats: &FilterStats) -> Self {
        let rate = |count: usize| {
            if stats.attempts == 0 {
                0.0
            } else {
                count as f64 / stats.attempts as f64
            }
        };

        Self {
            attempts: stats.attempts,
            accepted: stats.accepted,
            rejected: stats.rejected,
            illegal: stats.illegal,
            acceptance_rate: rate(stats.accepted),
            illegal_rate: rate(stats.illegal),
        }
    }
}
