//! Shannon capacity with a graceful SNR guard.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Why a budget reports zero capacity.
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkDiagnostic {
    #[error("post-modulation SNR is negative ({snr_db:.2} dB); capacity forced to 0")]
    NegativeSnr { snr_db: f64 },
}

/// `bandwidth · log2(1 + snr)` in Gbps, or `None` when `snr_linear <= 0`
/// (or is NaN) and the logarithm is meaningless.
pub fn shannon_capacity_gbps(bandwidth_hz: f64, snr_linear: f64) -> Option<f64> {
    if snr_linear.is_nan() || snr_linear <= 0.0 {
        return None;
    }
    Some(bandwidth_hz * (1.0 + snr_linear).log2() / 1e9)
}

/// Capacity for an SNR expressed in dB.
///
/// A link whose SNR is below 0 dB (or NaN) is treated as unusable: the result
/// is zero capacity plus a [`LinkDiagnostic`], and a warning is logged.
/// Exactly 0 dB is linear SNR 1 and yields `bandwidth · log2 2`.
pub(crate) fn capacity_for_snr_db(link: &str, bandwidth_hz: f64, snr_db: f64) -> (f64, Option<LinkDiagnostic>) {
    let usable = snr_db >= 0.0;
    let capacity = usable
        .then(|| shannon_capacity_gbps(bandwidth_hz, 10f64.powf(snr_db / 10.0)))
        .flatten();
    match capacity {
        Some(gbps) => (gbps, None),
        None => {
            let diagnostic = LinkDiagnostic::NegativeSnr { snr_db };
            warn!(link, snr_db, "{diagnostic}");
            (0.0, Some(diagnostic))
        }
    }
}
