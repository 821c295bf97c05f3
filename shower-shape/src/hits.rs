use std::collections::{hash_map::Entry, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::CellId;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RawHit {
	pub id: CellId,
	pub energy: f64,
}

/// Energy per cell for one event.
#[derive(Debug, Clone, Default)]
pub struct HitStore {
	energies: HashMap<CellId, f64>,
}

impl HitStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build the store from the hit collections of the front, middle and back sections.
	pub fn from_sections(front: &[RawHit], middle: &[RawHit], back: &[RawHit]) -> Self {
		let mut store = Self::new();
		store.fill(front, middle, back);
		store
	}

	pub fn fill(&mut self, front: &[RawHit], middle: &[RawHit], back: &[RawHit]) {
		self.clear();
		for hit in front.iter().chain(middle).chain(back).copied() {
			self.insert(hit);
		}
	}

	/// Returns `false` and keeps the stored energy if the cell already has a hit.
	pub fn insert(&mut self, hit: RawHit) -> bool {
		match self.energies.entry(hit.id) {
			Entry::Vacant(entry) => {
				entry.insert(hit.energy);
				true
			},
			Entry::Occupied(_) => {
				log::warn!("Duplicate hit for cell {}", hit.id);
				false
			},
		}
	}

	pub fn energy(&self, id: CellId) -> Option<f64> {
		self.energies.get(&id).copied()
	}

	pub fn clear(&mut self) {
		self.energies.clear();
	}

	pub fn len(&self) -> usize {
		self.energies.len()
	}

	pub fn is_empty(&self) -> bool {
		self.energies.is_empty()
	}
}

impl FromIterator<RawHit> for HitStore {
	fn from_iter<T: IntoIterator<Item = RawHit>>(iter: T) -> Self {
		let mut store = Self::new();
		for hit in iter {
			store.insert(hit);
		}
		store
	}
}
