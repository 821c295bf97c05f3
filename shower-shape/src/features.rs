use std::collections::BTreeMap;

use crate::{engine::ShowerFeatures, Error};

/// Written for widths while no PCA is available
pub const MISSING_WIDTH: f64 = -1.0;
/// Written for all depth values if the depth compatibility is unavailable
pub const MISSING_DEPTH: f64 = -999.0;

pub const FEATURE_NAMES: [&str; 16] = [
	"sigmaUU",
	"sigmaVV",
	"sigmaEE",
	"sigmaPP",
	"sigmaEtaEta",
	"sigmaPhiPhi",
	"nLayers",
	"firstLayer",
	"lastLayer",
	"energyEE",
	"energyFH",
	"energyBH",
	"measuredDepth",
	"expectedDepth",
	"expectedSigma",
	"depthCompatibility",
];

/// Columns of per-object values. Every declared column must receive exactly one value
/// per object.
#[derive(Debug, Clone)]
pub struct FeatureTable {
	columns: BTreeMap<String, Vec<f64>>,
	objects: usize,
}

impl FeatureTable {
	pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
		Self {
			columns: names
				.into_iter()
				.map(|name| (name.into(), Vec::new()))
				.collect(),
			objects: 0,
		}
	}

	pub fn shower_features() -> Self {
		Self::new(FEATURE_NAMES)
	}

	pub fn fill(&mut self, name: &str, value: f64) -> Result<(), Error> {
		self.columns
			.get_mut(name)
			.ok_or_else(|| Error::UndeclaredFeature(name.into()))?
			.push(value);
		Ok(())
	}

	/// Marks the values filled since the last call as one object.
	pub fn end_object(&mut self) {
		self.objects += 1;
	}

	pub fn push(&mut self, features: &ShowerFeatures) -> Result<(), Error> {
		for (name, value) in features.values() {
			self.fill(name, value)?;
		}
		self.end_object();
		Ok(())
	}

	/// Object without a cluster in the calorimeter
	pub fn push_dummy(&mut self) {
		for column in self.columns.values_mut() {
			column.push(0.0);
		}
		self.end_object();
	}

	pub fn objects(&self) -> usize {
		self.objects
	}

	pub fn finish(self) -> Result<BTreeMap<String, Vec<f64>>, Error> {
		for (name, column) in self.columns.iter() {
			if column.len() != self.objects {
				return Err(Error::FeatureNotFilled {
					name: name.clone(),
					filled: column.len(),
					objects: self.objects,
				});
			}
		}
		Ok(self.columns)
	}
}
