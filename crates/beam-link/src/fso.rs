//! Free-space-optical (FSO) link budget.
//!
//! The transmitter's beam spreads with the full divergence angle θ, so at
//! distance `d` its footprint radius is `θ·d/2`.  The geometric loss is the
//! ratio between the receive lens aperture and that footprint:
//!
//! ```text
//! L_geo = −10·log10( π r_lens² / π r_beam² )   [dB]
//! ```
//!
//! A lens wider than the footprint gives a negative loss (net gain in this
//! model).  Noise is the detector NEP plus the receiver noise figure.
//!
//! # Example
//!
//! ```rust
//! use beam_link::fso::FsoParameters;
//!
//! let budget = FsoParameters::default().compute();
//! assert!(budget.geometric_loss_db.is_finite());
//! assert!(budget.capacity_gbps > 0.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::SPEED_OF_LIGHT;
use crate::capacity::{LinkDiagnostic, capacity_for_snr_db};

/// Smallest beam footprint radius used in the loss ratio (m).
const MIN_BEAM_RADIUS_M: f64 = 1e-9;

/// Inputs of an FSO link.  Missing fields in a TOML file take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsoParameters {
    pub distance_m: f64,
    pub bandwidth_ghz: f64,
    pub carrier_frequency_thz: f64,
    pub transmit_power_dbm: f64,
    pub receive_lens_radius_mm: f64,
    pub beam_divergence_mrad: f64,
    pub atmospheric_loss_db: f64,
    pub pointing_loss_db: f64,
    pub nep_db: f64,
    pub noise_figure_db: f64,
    pub modulation_loss_db: f64,
}

impl Default for FsoParameters {
    fn default() -> Self {
        Self {
            distance_m: 2.0,
            bandwidth_ghz: 30.0,
            carrier_frequency_thz: 193.55,
            transmit_power_dbm: 23.01,
            receive_lens_radius_mm: 12.0,
            beam_divergence_mrad: 0.28,
            atmospheric_loss_db: 0.0,
            pointing_loss_db: 5.0,
            nep_db: -21.45,
            noise_figure_db: 15.0,
            modulation_loss_db: 3.0,
        }
    }
}

/// Outputs of an FSO link budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FsoBudget {
    pub wavelength_nm: f64,
    pub geometric_loss_db: f64,
    pub received_power_dbm: f64,
    pub total_noise_dbm: f64,
    pub snr_db: f64,
    pub snr_post_modulation_db: f64,
    pub capacity_gbps: f64,
    pub diagnostic: Option<LinkDiagnostic>,
}

impl FsoParameters {
    /// Evaluate the link budget.
    #[instrument(level = "debug", name = "fso_budget", skip_all, fields(distance_m = self.distance_m))]
    pub fn compute(&self) -> FsoBudget {
        let lens_radius_m = self.receive_lens_radius_mm * 1e-3;
        let divergence_rad = self.beam_divergence_mrad * 1e-3;
        let bandwidth_hz = self.bandwidth_ghz * 1e9;

        let mut beam_radius_m = divergence_rad * self.distance_m / 2.0;
        if beam_radius_m <= 0.0 {
            beam_radius_m = MIN_BEAM_RADIUS_M;
        }

        let area_ratio = lens_radius_m.powi(2) / beam_radius_m.powi(2);
        let geometric_loss_db = -10.0 * area_ratio.log10();

        let received_power_dbm = self.transmit_power_dbm
            - geometric_loss_db
            - self.atmospheric_loss_db
            - self.pointing_loss_db;
        let total_noise_dbm = self.nep_db + self.noise_figure_db;
        let snr_db = received_power_dbm - total_noise_dbm;
        let snr_post_modulation_db = snr_db - self.modulation_loss_db;

        let (capacity_gbps, diagnostic) = capacity_for_snr_db("fso", bandwidth_hz, snr_post_modulation_db);

        FsoBudget {
            wavelength_nm: SPEED_OF_LIGHT / (self.carrier_frequency_thz * 1e12) * 1e9,
            geometric_loss_db,
            received_power_dbm,
            total_noise_dbm,
            snr_db,
            snr_post_modulation_db,
            capacity_gbps,
            diagnostic,
        }
    }
}

impl FsoBudget {
    pub fn log(&self) {
        info!(
            geometric_loss_db = self.geometric_loss_db,
            received_power_dbm = self.received_power_dbm,
            snr_db = self.snr_post_modulation_db,
            capacity_gbps = self.capacity_gbps,
            "fso link budget"
        );
    }
}

impl std::fmt::Display for FsoBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- FSO Link Budget ---")?;
        writeln!(f, "Wavelength:       {:.2} nm", self.wavelength_nm)?;
        writeln!(f, "Received Power:   {:.2} dBm", self.received_power_dbm)?;
        writeln!(f, "Geometric Loss:   {:.2} dB", self.geometric_loss_db)?;
        writeln!(f, "Total Noise:      {:.2} dBm", self.total_noise_dbm)?;
        writeln!(f, "Raw SNR:          {:.2} dB", self.snr_db)?;
        writeln!(f, "Mod Loss SNR:     {:.2} dB", self.snr_post_modulation_db)?;
        write!(f, "Capacity:         {:.2} Gbps", self.capacity_gbps)
    }
}
