//! Plan-level combination of TCP and NTCP.

use serde::Serialize;

/// Probability that none of the independent complications occurs.
pub fn complication_free_probability(ntcps: &[f64]) -> f64 {
    ntcps.iter().map(|p| 1.0 - p.clamp(0.0, 1.0)).product()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeSummary {
    pub tcp: f64,
    /// `1 - CFP`: probability of at least one complication.
    pub ntcp_total: f64,
    pub cfp: f64,
    /// Uncomplicated control, `TCP · CFP`.
    pub ucp: f64,
    pub tr_tcp_ntcp: Option<f64>,
    pub tr_ucp_ntcp: Option<f64>,
}

/// Ratios are `None` when no complication is predicted.
pub fn summarize_outcome(tcp: f64, ntcps: &[f64]) -> OutcomeSummary {
    let tcp = tcp.clamp(0.0, 1.0);
    let cfp = complication_free_probability(ntcps);
    let ntcp_total = 1.0 - cfp;
    let ucp = tcp * cfp;
    let ratio = |num: f64| (ntcp_total > 0.0).then(|| num / ntcp_total);
    OutcomeSummary {
        tcp,
        ntcp_total,
        cfp,
        ucp,
        tr_tcp_ntcp: ratio(tcp),
        tr_ucp_ntcp: ratio(ucp),
    }
}
