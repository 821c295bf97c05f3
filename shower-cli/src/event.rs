use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shower_shape::{Cluster, FeatureTable, GeometryTable, HitStore, MultiCluster, RawHit, Settings, ShowerShapeEngine};

/// Input file: the detector geometry shared by all events.
#[derive(Debug, Deserialize)]
pub struct Input {
	pub geometry: GeometryTable,
	pub events: Vec<Event>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Hits {
	pub front: Vec<RawHit>,
	pub middle: Vec<RawHit>,
	pub back: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Object {
	Cluster(Cluster),
	Multi(MultiCluster),
}

#[derive(Debug, Deserialize)]
pub struct Event {
	#[serde(default)]
	pub hits: Hits,
	/// `null` for objects without a calorimeter cluster
	pub objects: Vec<Option<Object>>,
}

#[derive(Debug, Serialize)]
pub struct EventFeatures {
	pub event: usize,
	pub objects: usize,
	pub features: BTreeMap<String, Vec<f64>>,
}

impl Event {
	pub fn process(&self, index: usize, geometry: &GeometryTable, settings: &Settings) -> Result<EventFeatures, shower_shape::Error> {
		let hits = HitStore::from_sections(&self.hits.front, &self.hits.middle, &self.hits.back);
		let engine = ShowerShapeEngine::new(&hits, geometry, settings);
		log::debug!("Event {}: {} hits, {} objects", index, hits.len(), self.objects.len());

		let mut table = FeatureTable::shower_features();
		for object in &self.objects {
			match object {
				Some(Object::Cluster(cluster)) => table.push(&engine.compute(cluster, settings.radius))?,
				Some(Object::Multi(cluster)) => table.push(&engine.compute_multi(cluster, settings.radius))?,
				None => table.push_dummy(),
			}
		}

		Ok(EventFeatures {
			event: index,
			objects: table.objects(),
			features: table.finish()?,
		})
	}
}
