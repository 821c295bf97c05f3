use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{depth::GammaProfile, geometry::SectionBoundaries, Error};

/// Parameters shared by all clusters and events.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
	/// Energy per MIP in GeV, indexed by layer (index 0 unused)
	pub dedx_weights: Vec<f64>,
	/// Inverse thickness correction, indexed by the cell thickness class
	pub inv_thickness_correction: Vec<f64>,
	pub sections: SectionBoundaries,
	/// Cylinder radius around the shower axis in cm
	pub radius: f64,
	pub depth_model: GammaProfile,
}

impl Default for Settings {
	fn default() -> Self {
		let sections = SectionBoundaries::default();
		let dedx_weights = (0..=sections.last_layer)
			.map(|layer| match layer {
				0 => 0.0,
				1 => 0.008894541,
				l if l <= sections.last_front_layer => 0.010937907,
				l if l == sections.last_front_layer + 1 => 0.065404,
				l if l <= sections.last_middle_layer => 0.088767,
				_ => 0.092196,
			})
			.collect();

		Self {
			dedx_weights,
			inv_thickness_correction: vec![1.0 / 1.132, 1.0 / 1.092, 1.0 / 1.084],
			sections,
			radius: 3.0,
			depth_model: GammaProfile::default(),
		}
	}
}

impl Settings {
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
		let file = File::open(path)?;
		Ok(serde_json::from_reader(BufReader::new(file))?)
	}

	pub fn dedx_weight(&self, layer: u32) -> Option<f64> {
		self.dedx_weights.get(layer as usize).copied()
	}

	/// Unknown thickness classes are not corrected.
	pub fn thickness_factor(&self, class: Option<usize>) -> f64 {
		class
			.and_then(|class| self.inv_thickness_correction.get(class))
			.copied()
			.unwrap_or(1.0)
	}
}
