use std::{collections::BTreeMap, ops::RangeInclusive};

use nalgebra as na;

use crate::{frame::LocalFrame, spot::ClusterContext, spot::Spot, Error};

/// Result of one principal component pass over a set of spots.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaSnapshot {
	barycenter: na::Point3<f64>,
	axis: na::Unit<na::Vector3<f64>>,
	eigenvalues: na::Vector3<f64>,
	eigenvectors: na::Matrix3<f64>,
	core_layers: RangeInclusive<u32>,
	spots: usize,
	energy: f64,
}

impl PcaSnapshot {
	/// `None` if the spots carry no energy.
	fn from_spots<'a>(spots: impl Iterator<Item = &'a Spot>) -> Option<Self> {
		let spots = spots.collect::<Vec<_>>();
		let energy = spots.iter().map(|spot| spot.energy()).sum::<f64>();
		if !(energy > 0.0) {
			return None;
		}

		let barycenter = {
			let mut sum = na::Vector3::zeros();
			for spot in spots.iter() {
				sum += spot.position().coords * spot.energy();
			}
			na::Point3::from(sum / energy)
		};
		let covariance = {
			let mut covariance = na::Matrix3::zeros();
			for spot in spots.iter() {
				let difference = spot.position() - barycenter;
				covariance += difference * difference.transpose() * spot.energy();
			}
			covariance / energy
		};

		let eigen = na::SymmetricEigen::new(covariance);
		let mut order = [0, 1, 2];
		order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
		let eigenvalues = na::Vector3::from_fn(|i, _| eigen.eigenvalues[order[i]].max(0.0));
		let mut eigenvectors = na::Matrix3::from_columns(&[
			eigen.eigenvectors.column(order[0]).into_owned(),
			eigen.eigenvectors.column(order[1]).into_owned(),
			eigen.eigenvectors.column(order[2]).into_owned(),
		]);

		// without spread the main eigenvector is arbitrary, point from the origin instead
		let spread = eigenvalues.x > f64::EPSILON * barycenter.coords.norm_squared().max(1.0);
		let mut axis = if spread {
			na::Unit::new_normalize(eigenvectors.column(0).into_owned())
		} else {
			na::Unit::try_new(barycenter.coords, f64::EPSILON).unwrap_or_else(na::Vector3::z_axis)
		};
		if axis.dot(&barycenter.coords) < 0.0 {
			axis = na::Unit::new_unchecked(-axis.into_inner());
		}
		if spread {
			eigenvectors.set_column(0, &axis.into_inner());
		}

		Some(Self {
			barycenter,
			axis,
			eigenvalues,
			eigenvectors,
			core_layers: core_layers(&spots),
			spots: spots.len(),
			energy,
		})
	}

	pub fn barycenter(&self) -> na::Point3<f64> {
		self.barycenter
	}

	/// Main axis, oriented away from the interaction region
	pub fn axis(&self) -> na::Unit<na::Vector3<f64>> {
		self.axis
	}

	/// Sorted descending
	pub fn eigenvalues(&self) -> na::Vector3<f64> {
		self.eigenvalues
	}

	/// Columns in the order of [`PcaSnapshot::eigenvalues`]
	pub fn eigenvectors(&self) -> na::Matrix3<f64> {
		self.eigenvectors
	}

	pub fn sigmas(&self) -> na::Vector3<f64> {
		self.eigenvalues.map(f64::sqrt)
	}

	/// Contiguous layers around the layer with the most energy.
	pub fn core_layers(&self) -> RangeInclusive<u32> {
		self.core_layers.clone()
	}

	pub fn spot_count(&self) -> usize {
		self.spots
	}

	pub fn energy(&self) -> f64 {
		self.energy
	}

	pub fn frame(&self) -> LocalFrame {
		LocalFrame::new(self.barycenter, self.axis)
	}

	/// Cylinder of `radius` around the axis, no cut for a negative radius.
	pub(crate) fn selection(&self, radius: f64, with_halo: bool) -> Selection {
		Selection {
			frame: self.frame(),
			core_layers: self.core_layers(),
			radius2: (radius >= 0.0).then_some(radius * radius),
			with_halo,
		}
	}
}

pub(crate) struct Selection {
	frame: LocalFrame,
	core_layers: RangeInclusive<u32>,
	radius2: Option<f64>,
	with_halo: bool,
}

impl Selection {
	pub fn frame(&self) -> &LocalFrame {
		&self.frame
	}

	/// Without halo only core spots inside the core layers pass. Halo spots carry no
	/// energy, so for the weighted sums the cut acts through the layer range and the
	/// core check only changes the spot count.
	pub fn contains(&self, spot: &Spot) -> bool {
		if !self.with_halo && !(spot.is_core() && self.core_layers.contains(&spot.layer())) {
			return false;
		}
		match self.radius2 {
			Some(radius2) => self.frame.transverse_distance_squared(&spot.position()) <= radius2,
			None => true,
		}
	}
}

fn core_layers(spots: &[&Spot]) -> RangeInclusive<u32> {
	let mut layers = BTreeMap::<u32, f64>::new();
	for spot in spots.iter().filter(|spot| spot.energy() > 0.0) {
		*layers.entry(spot.layer()).or_default() += spot.energy();
	}
	let Some(peak) = layers
		.iter()
		.max_by(|a, b| a.1.total_cmp(b.1))
		.map(|(&layer, _)| layer)
	else {
		return 1..=0;
	};

	let mut first = peak;
	while first > 0 && layers.contains_key(&(first - 1)) {
		first -= 1;
	}
	let mut last = peak;
	while layers.contains_key(&(last + 1)) {
		last += 1;
	}
	first..=last
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PcaState {
	#[default]
	NotComputed,
	Ready {
		iteration: u32,
		initial: PcaSnapshot,
		current: PcaSnapshot,
	},
	/// A pass selected no energy, results are unavailable until the context is cleared.
	/// The first pass survives if it had energy.
	Degenerate {
		iteration: u32,
		initial: Option<PcaSnapshot>,
	},
}

impl PcaState {
	pub fn iteration(&self) -> u32 {
		match self {
			Self::NotComputed => 0,
			Self::Ready { iteration, .. } | Self::Degenerate { iteration, .. } => *iteration,
		}
	}
}

impl ClusterContext {
	/// First pass over all spots without any selection.
	pub fn initial_computation(&mut self) -> Result<&PcaSnapshot, Error> {
		self.compute_pca(-1.0, false)
	}

	/// Seeds the PCA from all spots on the first call. A non-negative `radius` adds a
	/// pass over the spots inside the cylinder around the previous axis, `with_halo`
	/// disabled also drops spots outside the previous core layers.
	pub fn compute_pca(&mut self, radius: f64, with_halo: bool) -> Result<&PcaSnapshot, Error> {
		if self.spots.is_empty() {
			log::warn!("PCA requested without spots");
			return Err(Error::NoSpots);
		}

		if matches!(self.pca, PcaState::NotComputed) {
			self.pca = match PcaSnapshot::from_spots(self.spots.iter()) {
				Some(snapshot) => PcaState::Ready {
					iteration: 1,
					initial: snapshot.clone(),
					current: snapshot,
				},
				None => PcaState::Degenerate { iteration: 0, initial: None },
			};
		}
		let selection = match &self.pca {
			PcaState::Ready { current, .. } => current.selection(radius, with_halo),
			PcaState::Degenerate { .. } => return Err(Error::Degenerate),
			PcaState::NotComputed => return Err(Error::NotComputed),
		};

		if radius >= 0.0 {
			let selected = self.spots.iter().filter(|spot| selection.contains(spot));
			let snapshot = PcaSnapshot::from_spots(selected);

			self.pca = match (std::mem::take(&mut self.pca), snapshot) {
				(PcaState::Ready { iteration, initial, .. }, Some(snapshot)) => PcaState::Ready {
					iteration: iteration + 1,
					initial,
					current: snapshot,
				},
				(PcaState::Ready { iteration, initial, .. }, None) => {
					log::debug!("No energy inside radius {}", radius);
					PcaState::Degenerate {
						iteration: iteration + 1,
						initial: Some(initial),
					}
				},
				(state, _) => state,
			};
		}

		self.current().ok_or(Error::EmptySelection { radius })
	}

	pub fn pca_state(&self) -> &PcaState {
		&self.pca
	}

	pub fn pca_iteration(&self) -> u32 {
		self.pca.iteration()
	}

	/// `true` once a PCA pass produced an axis for the current spots.
	pub fn check_iteration(&self) -> bool {
		matches!(self.pca, PcaState::Ready { .. })
	}

	/// Snapshot of the first pass over all spots, kept after a later pass selected nothing
	pub fn initial(&self) -> Option<&PcaSnapshot> {
		match &self.pca {
			PcaState::Ready { initial, .. } => Some(initial),
			PcaState::Degenerate { initial, .. } => initial.as_ref(),
			PcaState::NotComputed => None,
		}
	}

	/// Snapshot of the latest pass
	pub fn current(&self) -> Option<&PcaSnapshot> {
		match &self.pca {
			PcaState::Ready { current, .. } => Some(current),
			_ => None,
		}
	}
}
