//! Metrics collection for observability

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Comparison metrics
    pub comparisons_total: IntCounterVec,
    pub comparison_duration: Histogram,
    pub policy_fallbacks: IntCounter,

    // Proposal intake metrics
    pub proposals_received: IntCounter,
    pub proposals_parsed: IntCounter,
    pub parse_failures: IntCounter,

    // Mail metrics
    pub emails_sent: IntCounterVec,
    pub inbound_unmatched: IntCounter,
    pub inbound_failures: IntCounter,
}

impl Metrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let comparisons_total = register_int_counter_vec_with_registry!(
            Opts::new("rfp_comparisons_total", "Total comparison runs by outcome"),
            &["outcome", "policy"],
            registry
        )?;

        let comparison_duration = register_histogram_with_registry!(
            "rfp_comparison_duration_seconds",
            "Comparison run duration in seconds",
            registry
        )?;

        let policy_fallbacks = register_int_counter_with_registry!(
            Opts::new(
                "rfp_policy_fallbacks_total",
                "Recommendations that fell back to the rules policy"
            ),
            registry
        )?;

        let proposals_received = register_int_counter_with_registry!(
            Opts::new("rfp_proposals_received_total", "Vendor replies stored as proposals"),
            registry
        )?;

        let proposals_parsed = register_int_counter_with_registry!(
            Opts::new("rfp_proposals_parsed_total", "Proposals parsed and scored"),
            registry
        )?;

        let parse_failures = register_int_counter_with_registry!(
            Opts::new("rfp_proposal_parse_failures_total", "Proposals the extractor could not parse"),
            registry
        )?;

        let emails_sent = register_int_counter_vec_with_registry!(
            Opts::new("rfp_emails_total", "Outbound RFP emails by delivery status"),
            &["status"],
            registry
        )?;

        let inbound_unmatched = register_int_counter_with_registry!(
            Opts::new(
                "rfp_inbound_unmatched_total",
                "Inbound messages that matched no vendor or RFP"
            ),
            registry
        )?;

        let inbound_failures = register_int_counter_with_registry!(
            Opts::new(
                "rfp_inbound_failures_total",
                "Inbound messages that could not be stored"
            ),
            registry
        )?;

        Ok(Self {
            registry,
            comparisons_total,
            comparison_duration,
            policy_fallbacks,
            proposals_received,
            proposals_parsed,
            parse_failures,
            emails_sent,
            inbound_unmatched,
            inbound_failures,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_counters_increment() {
        let metrics = Metrics::new().unwrap();
        metrics.comparisons_total.with_label_values(&["recommended", "rules"]).inc();
        metrics.emails_sent.with_label_values(&["simulated"]).inc_by(3);

        assert_eq!(
            metrics.comparisons_total.with_label_values(&["recommended", "rules"]).get(),
            1
        );
        assert_eq!(metrics.emails_sent.with_label_values(&["simulated"]).get(), 3);
    }

    #[test]
    fn test_gather_text() {
        let metrics = Metrics::new().unwrap();
        metrics.proposals_parsed.inc();

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("rfp_proposals_parsed_total 1"));
    }
}
