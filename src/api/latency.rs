//! In-memory latency histograms, one per listing provider.
//! The orchestrator records every provider attempt, the API reads.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

/// Values stored in microseconds, 1us to 10min, 3 significant figures.
pub struct LatencyStats {
    inner: Mutex<BTreeMap<&'static str, Histogram<u64>>>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ProviderLatency {
    pub samples: u64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn record(&self, provider: &'static str, d: Duration) {
        let us = d.as_micros().clamp(1, u128::from(u64::MAX)) as u64;
        let Ok(mut map) = self.inner.lock() else {
            return;
        };
        if !map.contains_key(provider) {
            let Ok(h) = Histogram::new_with_bounds(1, 600_000_000, 3) else {
                return;
            };
            map.insert(provider, h);
        }
        if let Some(h) = map.get_mut(provider) {
            let _ = h.record(us.min(600_000_000));
        }
    }

    /// Percentiles per provider that has at least one sample.
    pub fn snapshot(&self) -> BTreeMap<&'static str, ProviderLatency> {
        let Ok(map) = self.inner.lock() else {
            return BTreeMap::new();
        };
        map.iter()
            .filter(|(_, h)| h.len() > 0)
            .map(|(name, h)| {
                let ms = |q: f64| h.value_at_quantile(q) as f64 / 1_000.0;
                (
                    *name,
                    ProviderLatency {
                        samples: h.len(),
                        p50_ms: ms(0.5),
                        p95_ms: ms(0.95),
                        p99_ms: ms(0.99),
                    },
                )
            })
            .collect()
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}
