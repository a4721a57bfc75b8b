//! `beam-link` – point-to-point RF / optical link budgets.
//!
//! # Modules
//!
//! - [`capacity`] – Shannon capacity and the shared SNR guard.
//! - [`fso`] – [`FsoParameters`][fso::FsoParameters]: free-space-optical
//!   link with a geometric (beam footprint vs. lens aperture) loss model.
//! - [`thz`] – [`ThzParameters`][thz::ThzParameters]: terahertz link with
//!   Friis path loss and thermal noise.
//!
//! Every calculator is a pure function of its parameters.  A negative
//! SNR never fails: the budget reports zero capacity together with a
//! [`LinkDiagnostic`][capacity::LinkDiagnostic].

pub mod capacity;
pub mod fso;
pub mod thz;

pub use capacity::{LinkDiagnostic, shannon_capacity_gbps};
pub use fso::{FsoBudget, FsoParameters};
pub use thz::{ThzBudget, ThzParameters};

/// Speed of light in vacuum (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Boltzmann constant (J/K).
pub const BOLTZMANN: f64 = 1.380_649e-23;
