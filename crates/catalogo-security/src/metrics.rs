//! ---
//! cat_section: "06-security-access-control"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Admin password verification and cookie sessions."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use prometheus::{IntCounter, Registry};

/// Security metrics exported via Prometheus.
#[derive(Clone)]
pub struct SecurityMetrics {
    auth_attempts_total: IntCounter,
    auth_failures_total: IntCounter,
    auth_denials_total: IntCounter,
}

impl SecurityMetrics {
    /// Register metrics with the provided registry.
    pub fn new(registry: &Registry) -> anyhow::Result<Self> {
        let auth_attempts_total =
            IntCounter::new("catalogo_auth_attempts_total", "Total admin login attempts")?;
        let auth_failures_total =
            IntCounter::new("catalogo_auth_failures_total", "Failed admin login attempts")?;
        let auth_denials_total = IntCounter::new(
            "catalogo_auth_denials_total",
            "Admin-only requests rejected for lack of a session",
        )?;

        registry.register(Box::new(auth_attempts_total.clone()))?;
        registry.register(Box::new(auth_failures_total.clone()))?;
        registry.register(Box::new(auth_denials_total.clone()))?;

        Ok(Self {
            auth_attempts_total,
            auth_failures_total,
            auth_denials_total,
        })
    }

    /// Increment login attempts.
    pub fn inc_auth_attempt(&self) {
        self.auth_attempts_total.inc();
    }

    /// Increment login failures.
    pub fn inc_auth_failure(&self) {
        self.auth_failures_total.inc();
    }

    /// Increment requests denied by the admin gate.
    pub fn inc_auth_denial(&self) {
        self.auth_denials_total.inc();
    }
}
