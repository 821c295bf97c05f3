use std::f64::consts::PI;

use nalgebra as na;
use serde::Serialize;

use crate::{spot::ClusterContext, Error};

/// Energy-weighted RMS of the spots around the shower axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ShowerWidths {
	pub sigma_uu: f64,
	pub sigma_vv: f64,
	/// Transverse spread, independent of the choice of u and v
	pub sigma_ee: f64,
	/// Spread along the axis
	pub sigma_pp: f64,
	pub sigma_eta_eta: f64,
	pub sigma_phi_phi: f64,
}

fn eta(point: &na::Point3<f64>) -> Option<f64> {
	let perp = point.x.hypot(point.y);
	(perp > 0.0).then(|| (point.z / perp).asinh())
}

fn delta_phi(a: f64, b: f64) -> f64 {
	(a - b + PI).rem_euclid(2.0 * PI) - PI
}

impl ClusterContext {
	pub fn compute_shower_width(&mut self, radius: f64, with_halo: bool) -> Result<ShowerWidths, Error> {
		let current = self.current().ok_or(Error::NotComputed)?;
		let selection = current.selection(radius, with_halo);
		let barycenter = current.barycenter();
		let barycenter_eta = eta(&barycenter);
		let barycenter_phi = barycenter.y.atan2(barycenter.x);

		let mut energy = 0.0;
		let mut uu = 0.0;
		let mut vv = 0.0;
		let mut pp = 0.0;
		let mut angular_energy = 0.0;
		let mut eta_eta = 0.0;
		let mut phi_phi = 0.0;
		for spot in self.spots.iter().filter(|spot| selection.contains(spot)) {
			let position = spot.position();
			let local = selection.frame().to_local(&position);
			uu += local.x * local.x * spot.energy();
			vv += local.y * local.y * spot.energy();
			pp += local.z * local.z * spot.energy();
			energy += spot.energy();

			if let (Some(spot_eta), Some(barycenter_eta)) = (eta(&position), barycenter_eta) {
				let d_phi = delta_phi(position.y.atan2(position.x), barycenter_phi);
				eta_eta += (spot_eta - barycenter_eta).powi(2) * spot.energy();
				phi_phi += d_phi * d_phi * spot.energy();
				angular_energy += spot.energy();
			}
		}

		if !(energy > 0.0) {
			self.widths = None;
			return Err(Error::EmptySelection { radius });
		}

		let sigma_uu = (uu / energy).sqrt();
		let sigma_vv = (vv / energy).sqrt();
		let (sigma_eta_eta, sigma_phi_phi) = if angular_energy > 0.0 {
			((eta_eta / angular_energy).sqrt(), (phi_phi / angular_energy).sqrt())
		} else {
			(0.0, 0.0)
		};
		let widths = ShowerWidths {
			sigma_uu,
			sigma_vv,
			sigma_ee: sigma_uu.hypot(sigma_vv),
			sigma_pp: (pp / energy).sqrt(),
			sigma_eta_eta,
			sigma_phi_phi,
		};
		self.widths = Some(widths);
		Ok(widths)
	}

	/// Widths of the last [`ClusterContext::compute_shower_width`] call, zero before that.
	/// `None` while no PCA is available or after a pass that selected no energy.
	pub fn shower_widths(&self) -> Option<ShowerWidths> {
		self.widths.filter(|_| self.check_iteration())
	}

	pub fn sigma_uu(&self) -> Option<f64> {
		self.shower_widths().map(|widths| widths.sigma_uu)
	}

	pub fn sigma_vv(&self) -> Option<f64> {
		self.shower_widths().map(|widths| widths.sigma_vv)
	}

	pub fn sigma_ee(&self) -> Option<f64> {
		self.shower_widths().map(|widths| widths.sigma_ee)
	}

	pub fn sigma_pp(&self) -> Option<f64> {
		self.shower_widths().map(|widths| widths.sigma_pp)
	}
}
