//! Terahertz (THz) link budget.
//!
//! Path loss follows Friis, `20·log10(4π f d / c)`; receiver noise is the
//! thermal floor `k·T·B` plus the noise figure.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::capacity::{LinkDiagnostic, capacity_for_snr_db};
use crate::{BOLTZMANN, SPEED_OF_LIGHT};

/// Inputs of a THz link.  Missing fields in a TOML file take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThzParameters {
    pub distance_m: f64,
    pub bandwidth_ghz: f64,
    pub ambient_temperature_k: f64,
    pub carrier_frequency_thz: f64,
    pub transmit_power_dbm: f64,
    pub transmit_gain_dbi: f64,
    pub receive_gain_dbi: f64,
    pub atmospheric_loss_db: f64,
    pub noise_figure_db: f64,
    pub modulation_loss_db: f64,
}

impl Default for ThzParameters {
    fn default() -> Self {
        Self {
            distance_m: 2.0,
            bandwidth_ghz: 30.0,
            ambient_temperature_k: 293.0,
            carrier_frequency_thz: 0.30,
            transmit_power_dbm: 13.0,
            transmit_gain_dbi: 32.1,
            receive_gain_dbi: 32.1,
            atmospheric_loss_db: 0.008,
            noise_figure_db: 12.0,
            modulation_loss_db: 3.6,
        }
    }
}

/// Outputs of a THz link budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThzBudget {
    pub path_loss_db: f64,
    pub received_power_dbm: f64,
    pub thermal_noise_dbm: f64,
    pub total_noise_dbm: f64,
    pub snr_db: f64,
    pub snr_post_modulation_db: f64,
    pub capacity_gbps: f64,
    pub diagnostic: Option<LinkDiagnostic>,
}

impl ThzParameters {
    /// Evaluate the link budget.
    #[instrument(level = "debug", name = "thz_budget", skip_all, fields(distance_m = self.distance_m))]
    pub fn compute(&self) -> ThzBudget {
        let frequency_hz = self.carrier_frequency_thz * 1e12;
        let bandwidth_hz = self.bandwidth_ghz * 1e9;

        let path_loss_db =
            20.0 * (4.0 * std::f64::consts::PI * frequency_hz * self.distance_m / SPEED_OF_LIGHT).log10();

        let received_power_dbm = self.transmit_power_dbm + self.transmit_gain_dbi + self.receive_gain_dbi
            - path_loss_db
            - self.atmospheric_loss_db;

        let thermal_noise_w = BOLTZMANN * self.ambient_temperature_k * bandwidth_hz;
        let thermal_noise_dbm = 10.0 * (thermal_noise_w / 1e-3).log10();
        let total_noise_dbm = thermal_noise_dbm + self.noise_figure_db;

        let snr_db = received_power_dbm - total_noise_dbm;
        let snr_post_modulation_db = snr_db - self.modulation_loss_db;

        let (capacity_gbps, diagnostic) = capacity_for_snr_db("thz", bandwidth_hz, snr_post_modulation_db);

        ThzBudget {
            path_loss_db,
            received_power_dbm,
            thermal_noise_dbm,
            total_noise_dbm,
            snr_db,
            snr_post_modulation_db,
            capacity_gbps,
            diagnostic,
        }
    }
}

impl ThzBudget {
    pub fn log(&self) {
        info!(
            path_loss_db = self.path_loss_db,
            received_power_dbm = self.received_power_dbm,
            snr_db = self.snr_post_modulation_db,
            capacity_gbps = self.capacity_gbps,
            "thz link budget"
        );
    }
}

impl std::fmt::Display for ThzBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- THz Link Budget ---")?;
        writeln!(f, "Path Loss:      {:.2} dB", self.path_loss_db)?;
        writeln!(f, "Received Power: {:.2} dBm", self.received_power_dbm)?;
        writeln!(f, "Thermal Noise:  {:.2} dBm", self.thermal_noise_dbm)?;
        writeln!(f, "Total Noise:    {:.2} dBm", self.total_noise_dbm)?;
        writeln!(f, "Raw SNR:        {:.2} dB", self.snr_db)?;
        writeln!(f, "Mod Loss SNR:   {:.2} dB", self.snr_post_modulation_db)?;
        write!(f, "Capacity:       {:.2} Gbps", self.capacity_gbps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_link_matches_reference_values() {
        let b = ThzParameters::default().compute();
        assert!((b.path_loss_db - 88.0108).abs() < 1e-3);
        assert!((b.received_power_dbm - -10.8188).abs() < 1e-3);
        assert!((b.thermal_noise_dbm - -69.1593).abs() < 1e-3);
        assert!((b.total_noise_dbm - -57.1593).abs() < 1e-3);
        assert!((b.snr_post_modulation_db - 42.7405).abs() < 1e-3);
        assert!((b.capacity_gbps - 425.945).abs() < 1e-2);
        assert!(b.diagnostic.is_none());
    }

    #[test]
    fn path_loss_grows_6db_per_doubling() {
        let near = ThzParameters::default().compute();
        let far = ThzParameters {
            distance_m: 4.0,
            ..ThzParameters::default()
        }
        .compute();
        assert!((far.path_loss_db - near.path_loss_db - 20.0 * 2f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn hotter_receiver_is_noisier() {
        let cold = ThzParameters::default().compute();
        let hot = ThzParameters {
            ambient_temperature_k: 586.0,
            ..ThzParameters::default()
        }
        .compute();
        assert!((hot.thermal_noise_dbm - cold.thermal_noise_dbm - 10.0 * 2f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn long_link_fails_gracefully() {
        let b = ThzParameters {
            distance_m: 1e9,
            ..ThzParameters::default()
        }
        .compute();
        assert!(b.snr_post_modulation_db < 0.0);
        assert_eq!(b.capacity_gbps, 0.0);
        assert!(b.diagnostic.is_some());
    }
}
