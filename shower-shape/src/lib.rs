mod depth;
mod engine;
mod features;
mod frame;
mod geometry;
mod hits;
mod pca;
mod profile;
mod settings;
mod spot;
mod width;

pub use depth::{cluster_depth_compatibility, find_first_layer_depth, DepthCompatibility, ExpectedLength, GammaProfile, ShowerProfileModel};
pub use engine::{ShowerFeatures, ShowerShapeEngine};
pub use features::{FeatureTable, FEATURE_NAMES, MISSING_DEPTH, MISSING_WIDTH};
pub use frame::LocalFrame;
pub use geometry::{CellGeometry, CellId, GeometryProvider, GeometryTable, Section, SectionBoundaries};
pub use hits::{HitStore, RawHit};
pub use pca::{PcaSnapshot, PcaState};
pub use profile::LongDeps;
pub use settings::Settings;
pub use spot::{Cluster, ClusterContext, MultiCluster, Spot};
pub use width::ShowerWidths;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("No spots stored for the cluster")]
	NoSpots,

	#[error("No spots with energy left inside radius {radius}")]
	EmptySelection { radius: f64 },

	#[error("Spots of the cluster carry no energy")]
	Degenerate,

	#[error("PCA has not been computed for the cluster")]
	NotComputed,

	#[error("Feature '{0}' was not declared")]
	UndeclaredFeature(String),

	#[error("Feature '{name}' has {filled} values for {objects} objects")]
	FeatureNotFilled { name: String, filled: usize, objects: usize },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
