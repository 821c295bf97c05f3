use nalgebra as na;
use rand::{rngs::StdRng, Rng, SeedableRng};
use shower_shape::{
	CellGeometry, CellId, Cluster, ClusterContext, Error, FeatureTable, GeometryTable, HitStore, RawHit, Settings,
	ShowerShapeEngine, MISSING_WIDTH,
};

fn close(a: f64, b: f64, tolerance: f64) -> bool {
	(a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
}

fn unit_settings() -> Settings {
	Settings {
		dedx_weights: vec![1.0; 53],
		..Settings::default()
	}
}

struct Event {
	hits: HitStore,
	geometry: GeometryTable,
	cluster: Cluster,
}

/// Shower along a tilted axis with hits jittered uniformly around it in each layer.
fn random_shower(seed: u64) -> Event {
	let mut rng = StdRng::seed_from_u64(seed);
	let direction = na::vector![0.15, 0.3, 1.0].normalize();
	let start = na::point![48.0, 96.0, 320.0];

	let mut geometry = GeometryTable::new();
	let mut front = Vec::new();
	let mut middle = Vec::new();
	let mut cluster = Cluster::default();
	let mut id = 0;
	for layer in 1..=36u32 {
		let along = layer as f64 * 1.2;
		let center = start + direction * along / direction.z;
		let hits = 3 + (10.0 * (-(layer as f64 - 12.0).powi(2) / 60.0).exp()) as usize;
		for _ in 0..hits {
			id += 1;
			let offset = na::vector![rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5), 0.0];
			geometry.insert(
				CellId(id),
				CellGeometry {
					position: center + offset,
					layer,
					thickness_class: Some(rng.gen_range(0..3)),
					depth: layer as f64 * 0.95,
				},
			);
			let hit = RawHit {
				id: CellId(id),
				energy: rng.gen_range(1.0..20.0),
			};
			if layer <= 28 {
				front.push(hit);
			} else {
				middle.push(hit);
			}
			cluster.hits_and_fractions.push((CellId(id), rng.gen_range(0.5..=1.0)));
		}
	}

	Event {
		hits: HitStore::from_sections(&front, &middle, &[]),
		geometry,
		cluster,
	}
}

#[test]
fn first_pass_barycenter_is_energy_weighted_mean() {
	let event = random_shower(1);
	let settings = Settings::default();
	let mut context = ClusterContext::from_cluster(&event.cluster, &event.hits, &event.geometry, &settings);

	let energy = context.total_energy();
	let mean = context
		.spots()
		.iter()
		.fold(na::Vector3::zeros(), |sum, spot| sum + spot.position().coords * spot.energy())
		/ energy;

	let snapshot = context.initial_computation().unwrap();
	assert_eq!(snapshot.spot_count(), event.cluster.hits_and_fractions.len());
	for i in 0..3 {
		assert!(close(snapshot.barycenter()[i], mean[i], 1e-6));
	}
}

#[test]
fn eigen_decomposition_follows_the_shower() {
	for seed in 0..5 {
		let event = random_shower(seed);
		let settings = Settings::default();
		let mut context = ClusterContext::from_cluster(&event.cluster, &event.hits, &event.geometry, &settings);
		context.initial_computation().unwrap();
		let snapshot = context.compute_pca(settings.radius, false).unwrap();

		let values = snapshot.eigenvalues();
		assert!(values[0] >= values[1] && values[1] >= values[2] && values[2] >= 0.0);
		assert!(close(snapshot.axis().norm(), 1.0, 1e-12));

		let direction = na::vector![0.15, 0.3, 1.0].normalize();
		assert!(snapshot.axis().dot(&direction) > 0.99);
		assert_eq!(context.pca_iteration(), 2);
	}
}

#[test]
fn widths_are_missing_only_before_pca() {
	let event = random_shower(7);
	let settings = Settings::default();
	let engine = ShowerShapeEngine::new(&event.hits, &event.geometry, &settings);
	let mut context = engine.context(&event.cluster);

	assert!(!context.check_iteration());
	assert_eq!(context.sigma_uu(), None);
	assert_eq!(context.sigma_vv(), None);
	assert_eq!(context.sigma_ee(), None);
	assert_eq!(context.sigma_pp(), None);

	context.initial_computation().unwrap();
	context.compute_pca(settings.radius, false).unwrap();
	let widths = context.compute_shower_width(settings.radius, false).unwrap();
	assert!(widths.sigma_uu > 0.0 && widths.sigma_vv > 0.0);
	assert!(widths.sigma_uu < settings.radius && widths.sigma_vv < settings.radius);
	assert_eq!(context.sigma_ee(), Some(widths.sigma_uu.hypot(widths.sigma_vv)));

	context.clear();
	assert_eq!(context.sigma_pp(), None);
	assert!(context.spots().is_empty());
}

#[test]
fn wide_profile_keeps_all_energy() {
	let event = random_shower(3);
	let settings = Settings::default();
	let engine = ShowerShapeEngine::new(&event.hits, &event.geometry, &settings);
	let mut context = engine.context(&event.cluster);
	context.initial_computation().unwrap();

	let profile = engine.energy_per_layer(&context, 1.0e4, true).unwrap();
	let total = context.total_energy();
	assert!(close(profile.energy_per_layer().iter().sum::<f64>(), total, 1e-12));
	assert!(close(profile.total_energy(), total, 1e-12));
	assert!(profile.energy_middle() > 0.0);
	assert_eq!(profile.energy_back(), 0.0);
	assert_eq!(profile.n_layers(), 36);
	assert_eq!(profile.energy_per_layer().len(), 37);
}

#[test]
fn clearing_reproduces_results() {
	let first = random_shower(11);
	let second = random_shower(12);
	let settings = Settings::default();

	let engine = ShowerShapeEngine::new(&first.hits, &first.geometry, &settings);
	let mut context = engine.context(&first.cluster);
	let reference = engine.compute_context(&mut context, settings.radius);

	{
		let other = ShowerShapeEngine::new(&second.hits, &second.geometry, &settings);
		other.store(&mut context, &second.cluster);
		assert_ne!(other.compute_context(&mut context, settings.radius), reference);
	}

	context.clear();
	engine.store(&mut context, &first.cluster);
	assert_eq!(engine.compute_context(&mut context, settings.radius), reference);
}

#[test]
fn two_collinear_hits() {
	let mut geometry = GeometryTable::new();
	for (id, layer, depth) in [(1, 1, 5.0), (2, 2, 10.0)] {
		geometry.insert(
			CellId(id),
			CellGeometry {
				position: na::point![30.0, 40.0, 320.0 + 2.0 * depth],
				layer,
				thickness_class: None,
				depth,
			},
		);
	}
	let hits = [RawHit { id: CellId(1), energy: 1.0 }, RawHit { id: CellId(2), energy: 1.0 }]
		.into_iter()
		.collect::<HitStore>();
	let settings = unit_settings();
	let engine = ShowerShapeEngine::new(&hits, &geometry, &settings);
	let cluster = Cluster {
		hits_and_fractions: vec![(CellId(1), 1.0), (CellId(2), 1.0)],
	};

	let mut context = engine.context(&cluster);
	context.initial_computation().unwrap();
	let widths = context.compute_shower_width(-1.0, true).unwrap();
	assert!(widths.sigma_uu.abs() < 1e-9);
	assert!(widths.sigma_vv.abs() < 1e-9);

	let profile = engine.energy_per_layer(&context, -1.0, true).unwrap();
	let depth = engine.depth_compatibility(&profile).unwrap();
	assert!(close(depth.measured_depth, 7.5, 1e-12));
	assert!(depth.expected_sigma > 0.0);
	assert!(close(
		depth.compatibility,
		(depth.measured_depth - depth.expected_depth) / depth.expected_sigma,
		1e-12
	));
}

#[test]
fn single_hit_is_finite() {
	let mut geometry = GeometryTable::new();
	geometry.insert(
		CellId(5),
		CellGeometry {
			position: na::point![10.0, -20.0, 330.0],
			layer: 4,
			thickness_class: Some(1),
			depth: 3.5,
		},
	);
	let hits = HitStore::from_sections(&[RawHit { id: CellId(5), energy: 12.0 }], &[], &[]);
	let settings = Settings::default();
	let engine = ShowerShapeEngine::new(&hits, &geometry, &settings);
	let features = engine.compute(
		&Cluster {
			hits_and_fractions: vec![(CellId(5), 1.0)],
		},
		settings.radius,
	);

	let widths = features.widths.unwrap();
	for value in [widths.sigma_uu, widths.sigma_vv, widths.sigma_ee, widths.sigma_pp] {
		assert!(value.abs() < 1e-9);
	}
	assert!(features.values().iter().all(|(_, value)| value.is_finite()));
}

#[test]
fn radius_without_spots_is_reported() {
	let event = random_shower(5);
	let settings = Settings::default();
	let engine = ShowerShapeEngine::new(&event.hits, &event.geometry, &settings);
	let mut context = engine.context(&event.cluster);
	context.initial_computation().unwrap();

	// every hit is offset from the axis by the transverse jitter
	let result = context.compute_pca(1.0e-6, false);
	assert!(matches!(result, Err(Error::EmptySelection { .. })));
	assert!(!context.check_iteration());
	assert_eq!(context.sigma_uu(), None);

	let features = engine.compute_context(&mut context, 1.0e-6);
	let mut table = FeatureTable::shower_features();
	table.push(&features).unwrap();
	let columns = table.finish().unwrap();
	assert_eq!(columns["sigmaUU"], vec![MISSING_WIDTH]);
}
