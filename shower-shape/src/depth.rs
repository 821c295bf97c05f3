use serde::{Deserialize, Serialize};

use crate::profile::LongDeps;

/// Mean shower depth after the first layer and its spread, in radiation lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedLength {
	pub length: f64,
	pub sigma: f64,
}

pub trait ShowerProfileModel {
	/// `energy` in GeV
	fn expected_length(&self, energy: f64) -> Option<ExpectedLength>;
}

/// Gamma-distribution longitudinal profile
/// `dE/dt ∝ (βt)^(α-1) e^(-βt)` with the maximum `T = (α-1)/β` and the mean depth `α/β`.
///
/// T, α and the spread of their logarithms are linear in `ln(E / E_c)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GammaProfile {
	/// GeV
	pub critical_energy: f64,
	pub mean_t0: f64,
	pub mean_t1: f64,
	pub mean_alpha0: f64,
	pub mean_alpha1: f64,
	pub sigma_ln_t0: f64,
	pub sigma_ln_t1: f64,
	pub sigma_ln_alpha0: f64,
	pub sigma_ln_alpha1: f64,
	pub correlation0: f64,
	pub correlation1: f64,
}

impl Default for GammaProfile {
	fn default() -> Self {
		Self {
			critical_energy: 0.00536,
			mean_t0: -1.396,
			mean_t1: 1.007,
			mean_alpha0: -0.0433,
			mean_alpha1: 0.540,
			sigma_ln_t0: -2.506,
			sigma_ln_t1: 1.245,
			sigma_ln_alpha0: -0.08442,
			sigma_ln_alpha1: 0.7904,
			correlation0: 0.7858,
			correlation1: -0.0232,
		}
	}
}

impl ShowerProfileModel for GammaProfile {
	fn expected_length(&self, energy: f64) -> Option<ExpectedLength> {
		if !(energy > 0.0) {
			return None;
		}
		let y = energy / self.critical_energy;
		let lny = if y > 1.0 { y.ln() } else { 0.0 };

		let t_max = self.mean_t0 + self.mean_t1 * lny;
		let mut alpha = self.mean_alpha0 + self.mean_alpha1 * lny;
		if alpha <= 1.0 {
			// keep the profile away from the pole at alpha = 1
			alpha = 1.1;
		}
		let sigma_ln_t = positive_or_one(1.0 / (self.sigma_ln_t0 + self.sigma_ln_t1 * lny));
		let sigma_ln_alpha = positive_or_one(1.0 / (self.sigma_ln_alpha0 + self.sigma_ln_alpha1 * lny));
		let correlation = (self.correlation0 + self.correlation1 * lny).clamp(-1.0, 1.0);

		let inv_beta = t_max / (alpha - 1.0);
		let length = alpha * inv_beta;
		// ln(length) = ln(alpha) - ln(alpha - 1) + ln(T)
		let d_alpha = sigma_ln_alpha / (alpha - 1.0);
		let variance = sigma_ln_t * sigma_ln_t + d_alpha * d_alpha - 2.0 * correlation * sigma_ln_t * d_alpha;
		let sigma = length.abs() * variance.max(0.0).sqrt();

		(length > 0.0 && sigma > 0.0 && sigma.is_finite()).then_some(ExpectedLength { length, sigma })
	}
}

fn positive_or_one(value: f64) -> f64 {
	if value > 0.0 && value.is_finite() {
		value
	} else {
		1.0
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthCompatibility {
	/// Energy-weighted mean depth of the profile
	pub measured_depth: f64,
	pub expected_depth: f64,
	pub expected_sigma: f64,
	/// `(measured - expected) / sigma`
	pub compatibility: f64,
}

/// Depth of the first layer with energy, the start of the expected profile.
pub fn find_first_layer_depth(profile: &LongDeps) -> Option<f64> {
	profile
		.first_layer()
		.and_then(|layer| profile.layer_depth(layer))
}

/// `None` for a profile without energy or a model without a prediction.
pub fn cluster_depth_compatibility(profile: &LongDeps, model: &impl ShowerProfileModel) -> Option<DepthCompatibility> {
	let (energy, weighted) = profile
		.layers()
		.iter()
		.filter_map(|&layer| {
			let energy = profile.energy_per_layer()[layer as usize];
			profile.layer_depth(layer).map(|depth| (energy, energy * depth))
		})
		.fold((0.0, 0.0), |(energy, weighted), (e, w)| (energy + e, weighted + w));
	if !(energy > 0.0) {
		return None;
	}
	let measured_depth = weighted / energy;

	let first = find_first_layer_depth(profile)?;
	let expected = model.expected_length(profile.total_energy())?;
	let expected_depth = first + expected.length;

	Some(DepthCompatibility {
		measured_depth,
		expected_depth,
		expected_sigma: expected.sigma,
		compatibility: (measured_depth - expected_depth) / expected.sigma,
	})
}
