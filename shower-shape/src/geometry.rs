use std::collections::HashMap;

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Opaque detector cell identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CellId(pub u32);

impl std::fmt::Display for CellId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:#010x}", self.0)
	}
}

/// Everything the shower shape needs to know about a cell.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct CellGeometry {
	pub position: na::Point3<f64>,
	/// Layer index, the first physical layer is 1
	pub layer: u32,
	/// Sensor thickness class, `None` for cells without thickness correction
	#[serde(default)]
	pub thickness_class: Option<usize>,
	/// Material in front of the cell in radiation lengths
	pub depth: f64,
}

pub trait GeometryProvider {
	fn cell(&self, id: CellId) -> Option<CellGeometry>;
}

impl<G: GeometryProvider + ?Sized> GeometryProvider for &G {
	fn cell(&self, id: CellId) -> Option<CellGeometry> {
		(**self).cell(id)
	}
}

/// One row of a serialized [`GeometryTable`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CellEntry {
	pub id: CellId,
	#[serde(flatten)]
	pub geometry: CellGeometry,
}

/// Lookup table for cell geometries, serialized as a flat list of cells.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(from = "Vec<CellEntry>", into = "Vec<CellEntry>")]
pub struct GeometryTable {
	cells: HashMap<CellId, CellGeometry>,
}

impl GeometryTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, id: CellId, geometry: CellGeometry) {
		self.cells.insert(id, geometry);
	}

	pub fn len(&self) -> usize {
		self.cells.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}
}

impl GeometryProvider for GeometryTable {
	fn cell(&self, id: CellId) -> Option<CellGeometry> {
		self.cells.get(&id).copied()
	}
}

impl From<Vec<CellEntry>> for GeometryTable {
	fn from(entries: Vec<CellEntry>) -> Self {
		Self {
			cells: entries
				.into_iter()
				.map(|entry| (entry.id, entry.geometry))
				.collect(),
		}
	}
}

impl From<GeometryTable> for Vec<CellEntry> {
	fn from(table: GeometryTable) -> Self {
		let mut entries = table
			.cells
			.into_iter()
			.map(|(id, geometry)| CellEntry { id, geometry })
			.collect::<Vec<_>>();
		entries.sort_by_key(|entry| entry.id);
		entries
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
	Front,
	Middle,
	Back,
}

/// Fixed layer boundaries of the calorimeter sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SectionBoundaries {
	pub last_front_layer: u32,
	pub last_middle_layer: u32,
	pub last_layer: u32,
}

impl Default for SectionBoundaries {
	fn default() -> Self {
		Self {
			last_front_layer: 28,
			last_middle_layer: 40,
			last_layer: 52,
		}
	}
}

impl SectionBoundaries {
	pub fn section(&self, layer: u32) -> Option<Section> {
		match layer {
			0 => None,
			l if l <= self.last_front_layer => Some(Section::Front),
			l if l <= self.last_middle_layer => Some(Section::Middle),
			l if l <= self.last_layer => Some(Section::Back),
			_ => None,
		}
	}

	pub fn contains(&self, layer: u32) -> bool {
		self.section(layer).is_some()
	}
}
