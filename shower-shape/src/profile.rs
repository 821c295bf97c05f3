use std::collections::BTreeSet;

use nalgebra as na;

use crate::{
	geometry::{Section, SectionBoundaries},
	pca::PcaSnapshot,
	spot::{ClusterContext, Spot},
	Error,
};

/// Longitudinal energy profile of a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct LongDeps {
	radius: f64,
	energy_per_layer: Vec<f64>,
	depth_per_layer: Vec<f64>,
	energy_front: f64,
	energy_middle: f64,
	energy_back: f64,
	layers: BTreeSet<u32>,
}

impl LongDeps {
	/// Layer depths are measured along `axis` if given. Layers are planes of constant z,
	/// a shower crossing them at an angle traverses `1 / |axis · z|` times the material.
	pub(crate) fn new<'a>(
		radius: f64,
		spots: impl Iterator<Item = &'a Spot>,
		axis: Option<na::Unit<na::Vector3<f64>>>,
		sections: &SectionBoundaries,
	) -> Self {
		let path_scale = axis
			.map(|axis| axis.z.abs())
			.filter(|&cos| cos > f64::EPSILON)
			.map_or(1.0, |cos| 1.0 / cos);
		let mut energy_per_layer = Vec::new();
		let mut depth_sum = Vec::new();
		let mut profile = Self {
			radius,
			energy_per_layer: Vec::new(),
			depth_per_layer: Vec::new(),
			energy_front: 0.0,
			energy_middle: 0.0,
			energy_back: 0.0,
			layers: BTreeSet::new(),
		};

		for spot in spots {
			let Some(section) = sections.section(spot.layer()) else {
				continue;
			};
			let index = spot.layer() as usize;
			if energy_per_layer.len() <= index {
				energy_per_layer.resize(index + 1, 0.0);
				depth_sum.resize(index + 1, 0.0);
			}
			energy_per_layer[index] += spot.energy();
			depth_sum[index] += spot.energy() * spot.depth();
			profile.layers.insert(spot.layer());
			match section {
				Section::Front => profile.energy_front += spot.energy(),
				Section::Middle => profile.energy_middle += spot.energy(),
				Section::Back => profile.energy_back += spot.energy(),
			}
		}

		profile.depth_per_layer = energy_per_layer
			.iter()
			.zip(depth_sum)
			.map(|(&energy, sum)| if energy > 0.0 { sum / energy * path_scale } else { 0.0 })
			.collect();
		profile.energy_per_layer = energy_per_layer;
		profile
	}

	pub fn radius(&self) -> f64 {
		self.radius
	}

	/// Energy indexed by layer, index 0 is always empty
	pub fn energy_per_layer(&self) -> &[f64] {
		&self.energy_per_layer
	}

	/// Energy-weighted depth along the shower axis in radiation lengths, `None` for layers
	/// without energy
	pub fn layer_depth(&self, layer: u32) -> Option<f64> {
		let index = layer as usize;
		(self.energy_per_layer.get(index).copied().unwrap_or(0.0) > 0.0).then(|| self.depth_per_layer[index])
	}

	/// Layers holding at least one selected spot
	pub fn layers(&self) -> &BTreeSet<u32> {
		&self.layers
	}

	/// Number of layers with energy
	pub fn n_layers(&self) -> usize {
		self.energy_per_layer.iter().filter(|&&energy| energy > 0.0).count()
	}

	pub fn first_layer(&self) -> Option<u32> {
		self.energy_per_layer
			.iter()
			.position(|&energy| energy > 0.0)
			.map(|index| index as u32)
	}

	pub fn last_layer(&self) -> Option<u32> {
		self.energy_per_layer
			.iter()
			.rposition(|&energy| energy > 0.0)
			.map(|index| index as u32)
	}

	pub fn energy_front(&self) -> f64 {
		self.energy_front
	}

	pub fn energy_middle(&self) -> f64 {
		self.energy_middle
	}

	pub fn energy_back(&self) -> f64 {
		self.energy_back
	}

	pub fn total_energy(&self) -> f64 {
		self.energy_front + self.energy_middle + self.energy_back
	}
}

impl ClusterContext {
	/// Profile of the spots selected like [`ClusterContext::compute_pca`] does. A cylinder
	/// or halo cut needs the current PCA axis. Without one the uncut profile uses the axis
	/// of the first pass if there is one.
	pub fn energy_per_layer(&self, radius: f64, with_halo: bool, sections: &SectionBoundaries) -> Result<LongDeps, Error> {
		match self.current() {
			Some(current) => {
				let selection = current.selection(radius, with_halo);
				Ok(LongDeps::new(
					radius,
					self.spots.iter().filter(|spot| selection.contains(spot)),
					Some(current.axis()),
					sections,
				))
			},
			None if radius < 0.0 && with_halo => Ok(LongDeps::new(
				radius,
				self.spots.iter(),
				self.initial().map(PcaSnapshot::axis),
				sections,
			)),
			None => Err(Error::NotComputed),
		}
	}
}
