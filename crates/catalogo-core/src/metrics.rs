//! ---
//! cat_section: "01-core-functionality"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Project ordering service and re-sequencing rules."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

/// Ordering metrics exported via Prometheus.
#[derive(Clone)]
pub struct OrderingMetrics {
    mutations_total: IntCounterVec,
    batch_writes: Histogram,
}

impl OrderingMetrics {
    /// Register metrics with the provided registry.
    pub fn new(registry: &Registry) -> anyhow::Result<Self> {
        let mutations_total = IntCounterVec::new(
            Opts::new(
                "catalogo_ordering_mutations_total",
                "Committed project mutations by operation",
            ),
            &["operation"],
        )?;
        let batch_writes = Histogram::with_opts(
            HistogramOpts::new(
                "catalogo_ordering_batch_writes",
                "Number of writes per committed batch",
            )
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        )?;

        registry.register(Box::new(mutations_total.clone()))?;
        registry.register(Box::new(batch_writes.clone()))?;

        Ok(Self {
            mutations_total,
            batch_writes,
        })
    }

    /// Record a committed mutation and the size of its batch.
    pub fn observe_commit(&self, operation: &str, writes: usize) {
        self.mutations_total.with_label_values(&[operation]).inc();
        self.batch_writes.observe(writes as f64);
    }
}
