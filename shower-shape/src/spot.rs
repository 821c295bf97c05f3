use std::collections::BTreeSet;

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::{
	geometry::{CellId, GeometryProvider},
	hits::HitStore,
	pca::PcaState,
	settings::Settings,
	width::ShowerWidths,
};

/// Cells of a cluster together with the energy fraction assigned to the cluster.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Cluster {
	pub hits_and_fractions: Vec<(CellId, f64)>,
}

/// Cluster built from several sub-clusters.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MultiCluster {
	pub clusters: Vec<Cluster>,
}

impl MultiCluster {
	pub fn hits_and_fractions(&self) -> impl Iterator<Item = (CellId, f64)> + '_ {
		self.clusters
			.iter()
			.flat_map(|cluster| cluster.hits_and_fractions.iter().copied())
	}
}

/// Weighted point created from one hit of a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spot {
	id: CellId,
	position: na::Point3<f64>,
	raw_energy: f64,
	fraction: f64,
	energy: f64,
	layer: u32,
	depth: f64,
}

impl Spot {
	pub fn id(&self) -> CellId {
		self.id
	}

	pub fn position(&self) -> na::Point3<f64> {
		self.position
	}

	pub fn raw_energy(&self) -> f64 {
		self.raw_energy
	}

	pub fn fraction(&self) -> f64 {
		self.fraction
	}

	/// Energy after fraction, dE/dx and thickness weighting
	pub fn energy(&self) -> f64 {
		self.energy
	}

	pub fn layer(&self) -> u32 {
		self.layer
	}

	/// Depth in radiation lengths
	pub fn depth(&self) -> f64 {
		self.depth
	}

	/// Halo hits are attached to a cluster with a zero fraction.
	pub fn is_core(&self) -> bool {
		self.fraction > 0.0
	}
}

/// Per-cluster state: the spots of one cluster and everything computed from them.
///
/// A context is reused across clusters by calling [`ClusterContext::clear`] or
/// one of the `store_*` methods, which clear before extracting.
#[derive(Debug, Clone)]
pub struct ClusterContext {
	pub(crate) spots: Vec<Spot>,
	pub(crate) layers: BTreeSet<u32>,
	pub(crate) pca: PcaState,
	/// `None` after a width pass that selected nothing
	pub(crate) widths: Option<ShowerWidths>,
}

impl Default for ClusterContext {
	fn default() -> Self {
		Self {
			spots: Vec::new(),
			layers: BTreeSet::new(),
			pca: PcaState::NotComputed,
			widths: Some(ShowerWidths::default()),
		}
	}
}

impl ClusterContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_cluster(cluster: &Cluster, hits: &HitStore, geometry: &impl GeometryProvider, settings: &Settings) -> Self {
		let mut context = Self::new();
		context.store_cluster(cluster, hits, geometry, settings);
		context
	}

	pub fn from_multi_cluster(
		cluster: &MultiCluster,
		hits: &HitStore,
		geometry: &impl GeometryProvider,
		settings: &Settings,
	) -> Self {
		let mut context = Self::new();
		context.store_multi_cluster(cluster, hits, geometry, settings);
		context
	}

	pub fn clear(&mut self) {
		self.spots.clear();
		self.layers.clear();
		self.pca = PcaState::NotComputed;
		self.widths = Some(ShowerWidths::default());
	}

	pub fn store_cluster(&mut self, cluster: &Cluster, hits: &HitStore, geometry: &impl GeometryProvider, settings: &Settings) {
		self.store_hits(
			cluster.hits_and_fractions.iter().copied(),
			hits,
			geometry,
			settings,
		);
	}

	pub fn store_multi_cluster(
		&mut self,
		cluster: &MultiCluster,
		hits: &HitStore,
		geometry: &impl GeometryProvider,
		settings: &Settings,
	) {
		self.store_hits(cluster.hits_and_fractions(), hits, geometry, settings);
	}

	fn store_hits(
		&mut self,
		hits_and_fractions: impl Iterator<Item = (CellId, f64)>,
		hits: &HitStore,
		geometry: &impl GeometryProvider,
		settings: &Settings,
	) {
		self.clear();
		for (id, fraction) in hits_and_fractions {
			// hits below threshold are not stored
			let Some(raw_energy) = hits.energy(id) else {
				log::debug!("No hit stored for cell {}", id);
				continue;
			};
			let Some(cell) = geometry.cell(id) else {
				log::warn!("Unknown geometry for cell {}", id);
				continue;
			};
			if !settings.sections.contains(cell.layer) {
				log::warn!("Cell {} is in layer {} outside of the calorimeter", id, cell.layer);
				continue;
			}
			let Some(weight) = settings.dedx_weight(cell.layer) else {
				log::warn!("No dE/dx weight for layer {}", cell.layer);
				continue;
			};

			let energy = raw_energy * fraction * weight * settings.thickness_factor(cell.thickness_class);
			self.layers.insert(cell.layer);
			self.spots.push(Spot {
				id,
				position: cell.position,
				raw_energy,
				fraction,
				energy,
				layer: cell.layer,
				depth: cell.depth,
			});
		}
	}

	pub fn spots(&self) -> &[Spot] {
		&self.spots
	}

	pub fn layers_crossed(&self) -> &BTreeSet<u32> {
		&self.layers
	}

	pub fn total_energy(&self) -> f64 {
		self.spots.iter().map(Spot::energy).sum()
	}
}

#[cfg(test)]
impl Spot {
	pub(crate) fn at(position: na::Point3<f64>, energy: f64, layer: u32, depth: f64) -> Self {
		Self {
			id: CellId(0),
			position,
			raw_energy: energy,
			fraction: 1.0,
			energy,
			layer,
			depth,
		}
	}

	pub(crate) fn with_fraction(self, fraction: f64) -> Self {
		Self {
			fraction,
			energy: self.raw_energy * fraction,
			..self
		}
	}
}

#[cfg(test)]
impl ClusterContext {
	pub(crate) fn with_spots(spots: Vec<Spot>) -> Self {
		let layers = spots.iter().map(Spot::layer).collect();
		Self { spots, layers, ..Self::default() }
	}
}
