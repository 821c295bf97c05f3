use crate::{
	depth::{cluster_depth_compatibility, DepthCompatibility},
	features::{MISSING_DEPTH, MISSING_WIDTH},
	geometry::GeometryProvider,
	hits::HitStore,
	pca::PcaSnapshot,
	profile::LongDeps,
	settings::Settings,
	spot::{Cluster, ClusterContext, MultiCluster},
	width::ShowerWidths,
	Error,
};

/// Shower shape of one cluster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowerFeatures {
	/// Refined PCA with the eigenvalues and sigmas of the cluster
	pub pca: Option<PcaSnapshot>,
	pub widths: Option<ShowerWidths>,
	pub profile: Option<LongDeps>,
	pub depth: Option<DepthCompatibility>,
}

impl ShowerFeatures {
	/// Values in the order of [`crate::FEATURE_NAMES`], unavailable values replaced by sentinels.
	pub fn values(&self) -> [(&'static str, f64); 16] {
		let widths = self.widths.unwrap_or(ShowerWidths {
			sigma_uu: MISSING_WIDTH,
			sigma_vv: MISSING_WIDTH,
			sigma_ee: MISSING_WIDTH,
			sigma_pp: MISSING_WIDTH,
			sigma_eta_eta: MISSING_WIDTH,
			sigma_phi_phi: MISSING_WIDTH,
		});
		let depth = self.depth.unwrap_or(DepthCompatibility {
			measured_depth: MISSING_DEPTH,
			expected_depth: MISSING_DEPTH,
			expected_sigma: MISSING_DEPTH,
			compatibility: MISSING_DEPTH,
		});
		let profile = self.profile.as_ref();
		let layer = |layer: Option<u32>| layer.map_or(0.0, |layer| layer as f64);

		[
			("sigmaUU", widths.sigma_uu),
			("sigmaVV", widths.sigma_vv),
			("sigmaEE", widths.sigma_ee),
			("sigmaPP", widths.sigma_pp),
			("sigmaEtaEta", widths.sigma_eta_eta),
			("sigmaPhiPhi", widths.sigma_phi_phi),
			("nLayers", profile.map_or(0.0, |p| p.n_layers() as f64)),
			("firstLayer", layer(profile.and_then(LongDeps::first_layer))),
			("lastLayer", layer(profile.and_then(LongDeps::last_layer))),
			("energyEE", profile.map_or(0.0, LongDeps::energy_front)),
			("energyFH", profile.map_or(0.0, LongDeps::energy_middle)),
			("energyBH", profile.map_or(0.0, LongDeps::energy_back)),
			("measuredDepth", depth.measured_depth),
			("expectedDepth", depth.expected_depth),
			("expectedSigma", depth.expected_sigma),
			("depthCompatibility", depth.compatibility),
		]
	}
}

/// Computes shower shapes for the clusters of one event.
///
/// The hit store and the geometry are borrowed for the event, the engine holds no other state.
pub struct ShowerShapeEngine<'event, G: GeometryProvider> {
	hits: &'event HitStore,
	geometry: &'event G,
	settings: &'event Settings,
}

impl<'event, G: GeometryProvider> ShowerShapeEngine<'event, G> {
	pub fn new(hits: &'event HitStore, geometry: &'event G, settings: &'event Settings) -> Self {
		Self { hits, geometry, settings }
	}

	pub fn settings(&self) -> &Settings {
		self.settings
	}

	pub fn context(&self, cluster: &Cluster) -> ClusterContext {
		ClusterContext::from_cluster(cluster, self.hits, self.geometry, self.settings)
	}

	pub fn multi_context(&self, cluster: &MultiCluster) -> ClusterContext {
		ClusterContext::from_multi_cluster(cluster, self.hits, self.geometry, self.settings)
	}

	/// Clears the context and fills it with the spots of `cluster`.
	pub fn store(&self, context: &mut ClusterContext, cluster: &Cluster) {
		context.store_cluster(cluster, self.hits, self.geometry, self.settings);
	}

	pub fn energy_per_layer(&self, context: &ClusterContext, radius: f64, with_halo: bool) -> Result<LongDeps, Error> {
		context.energy_per_layer(radius, with_halo, &self.settings.sections)
	}

	pub fn depth_compatibility(&self, profile: &LongDeps) -> Option<DepthCompatibility> {
		cluster_depth_compatibility(profile, &self.settings.depth_model)
	}

	pub fn compute(&self, cluster: &Cluster, radius: f64) -> ShowerFeatures {
		let mut context = self.context(cluster);
		self.compute_context(&mut context, radius)
	}

	pub fn compute_multi(&self, cluster: &MultiCluster, radius: f64) -> ShowerFeatures {
		let mut context = self.multi_context(cluster);
		self.compute_context(&mut context, radius)
	}

	/// Initial and cylinder PCA and the widths without halo, the profile with halo.
	pub fn compute_context(&self, context: &mut ClusterContext, radius: f64) -> ShowerFeatures {
		match refine_pca(context, radius) {
			Ok(()) => {
				if let Err(err) = context.compute_shower_width(radius, false) {
					log::debug!("Shower width unavailable: {}", err);
				}
			},
			Err(err) => log::debug!("PCA unavailable: {}", err),
		}

		let profile = match self.energy_per_layer(context, radius, true) {
			Ok(profile) => Some(profile),
			Err(err) if context.initial().is_some() => {
				log::debug!("Profile without cylinder cut: {}", err);
				self.energy_per_layer(context, -1.0, true).ok()
			},
			Err(_) => None,
		};
		let depth = profile
			.as_ref()
			.and_then(|profile| self.depth_compatibility(profile));

		ShowerFeatures {
			pca: context.current().cloned(),
			widths: context.shower_widths(),
			profile,
			depth,
		}
	}
}

fn refine_pca(context: &mut ClusterContext, radius: f64) -> Result<(), Error> {
	context.initial_computation()?;
	context.compute_pca(radius, false)?;
	Ok(())
}
