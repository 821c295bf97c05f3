use nalgebra as na;

/// Frame centered on the barycenter with the shower axis as local z.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
	origin: na::Point3<f64>,
	axis: na::Unit<na::Vector3<f64>>,
	rotation: na::Rotation3<f64>,
}

impl LocalFrame {
	pub fn new(origin: na::Point3<f64>, axis: na::Unit<na::Vector3<f64>>) -> Self {
		let w = axis.into_inner();
		let u = na::vector![-w.y, w.x, 0.0]
			.try_normalize(f64::EPSILON)
			.unwrap_or_else(na::Vector3::x);
		let v = w.cross(&u);

		// rows map global directions onto (u, v, w)
		let rotation = na::Rotation3::from_matrix_unchecked(na::Matrix3::from_rows(&[
			u.transpose(),
			v.transpose(),
			w.transpose(),
		]));

		Self { origin, axis, rotation }
	}

	pub fn origin(&self) -> na::Point3<f64> {
		self.origin
	}

	pub fn axis(&self) -> na::Unit<na::Vector3<f64>> {
		self.axis
	}

	/// (u, v, w) coordinates of a global point
	pub fn to_local(&self, point: &na::Point3<f64>) -> na::Point3<f64> {
		na::Point3::from(self.rotation * (point - self.origin))
	}

	pub fn transverse_distance_squared(&self, point: &na::Point3<f64>) -> f64 {
		let local = self.to_local(point);
		local.x * local.x + local.y * local.y
	}
}
