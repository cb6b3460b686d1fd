use super::{merge_mean_m2, StatisticsError, StreamingMetric};
use num_traits::ToPrimitive;

/// Ordinary least squares fit of `y = slope * x + intercept`, accumulated one `(x, y)` pair at a time. Pairs where either value is not finite are skipped.
#[derive(Clone, Debug, Default)]
pub struct LinearRegression {
	n: u64,
	mean_x: f64,
	mean_y: f64,
	m2_x: f64,
	m2_y: f64,
	/// The co-moment, the sum of `(x - mean_x) * (y - mean_y)`.
	c_xy: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinearRegressionOutput {
	pub n: u64,
	pub slope: f64,
	pub intercept: f64,
	/// The coefficient of determination. It is `NaN` when `y` is constant.
	pub r2: f64,
}

impl StreamingMetric<'_> for LinearRegression {
	type Input = (f64, f64);
	type Output = Result<LinearRegressionOutput, StatisticsError>;

	fn update(&mut self, (x, y): (f64, f64)) {
		if !x.is_finite() || !y.is_finite() {
			return;
		}
		self.n += 1;
		let n = self.n.to_f64().unwrap();
		let dx = x - self.mean_x;
		let dy = y - self.mean_y;
		self.mean_x += dx / n;
		self.mean_y += dy / n;
		self.m2_x += dx * (x - self.mean_x);
		self.m2_y += dy * (y - self.mean_y);
		self.c_xy += dx * (y - self.mean_y);
	}

	fn merge(&mut self, other: Self) {
		if other.n == 0 {
			return;
		}
		let n_a = self.n.to_f64().unwrap();
		let n_b = other.n.to_f64().unwrap();
		let c_xy = self.c_xy
			+ other.c_xy
			+ (other.mean_x - self.mean_x) * (other.mean_y - self.mean_y) * (n_a * n_b / (n_a + n_b));
		let (mean_x, m2_x) =
			merge_mean_m2(self.n, self.mean_x, self.m2_x, other.n, other.mean_x, other.m2_x);
		let (mean_y, m2_y) =
			merge_mean_m2(self.n, self.mean_y, self.m2_y, other.n, other.mean_y, other.m2_y);
		self.n += other.n;
		self.mean_x = mean_x;
		self.mean_y = mean_y;
		self.m2_x = m2_x;
		self.m2_y = m2_y;
		self.c_xy = c_xy;
	}

	fn finalize(self) -> Self::Output {
		if self.n < 2 {
			return Err(StatisticsError::TooFewObservations {
				needed: 2,
				found: self.n.to_usize().unwrap(),
			});
		}
		if self.m2_x == 0.0 {
			return Err(StatisticsError::ZeroVariance("explanatory variable"));
		}
		let slope = self.c_xy / self.m2_x;
		let intercept = self.mean_y - slope * self.mean_x;
		let r2 = if self.m2_y == 0.0 {
			f64::NAN
		} else {
			(self.c_xy * self.c_xy) / (self.m2_x * self.m2_y)
		};
		if !slope.is_finite() || !intercept.is_finite() {
			return Err(StatisticsError::NotFinite);
		}
		Ok(LinearRegressionOutput {
			n: self.n,
			slope,
			intercept,
			r2,
		})
	}
}

impl LinearRegression {
	pub fn compute(x: &[f64], y: &[f64]) -> Result<LinearRegressionOutput, StatisticsError> {
		let mut regression = Self::default();
		for (x, y) in x.iter().zip(y.iter()) {
			regression.update((*x, *y));
		}
		regression.finalize()
	}
}

#[test]
fn test_perfect_fit() {
	let x = [1.0, 2.0, 3.0, 4.0, 5.0];
	let y = [3.0, 5.0, 7.0, 9.0, 11.0];
	let output = LinearRegression::compute(&x, &y).unwrap();
	assert_eq!(output.n, 5);
	assert!((output.slope - 2.0).abs() < 1e-9);
	assert!((output.intercept - 1.0).abs() < 1e-9);
	assert!((output.r2 - 1.0).abs() < 1e-9);
}

#[test]
fn test_noisy_fit() {
	let x = [1.0, 2.0, 3.0, 4.0];
	let y = [1.0, 3.0, 2.0, 4.0];
	let output = LinearRegression::compute(&x, &y).unwrap();
	// sxx = 5, syy = 5, sxy = 4
	assert!((output.slope - 0.8).abs() < 1e-9);
	assert!((output.intercept - 0.5).abs() < 1e-9);
	assert!((output.r2 - 0.64).abs() < 1e-9);
}

#[test]
fn test_merge_matches_single_pass() {
	let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
	let y = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
	let mut a = LinearRegression::default();
	let mut b = LinearRegression::default();
	for (x, y) in x[..2].iter().zip(y[..2].iter()) {
		a.update((*x, *y));
	}
	for (x, y) in x[2..].iter().zip(y[2..].iter()) {
		b.update((*x, *y));
	}
	a.merge(b);
	let merged = a.finalize().unwrap();
	let single = LinearRegression::compute(&x, &y).unwrap();
	assert!((merged.slope - single.slope).abs() < 1e-9);
	assert!((merged.intercept - single.intercept).abs() < 1e-9);
	assert!((merged.r2 - single.r2).abs() < 1e-9);
}

#[test]
fn test_degenerate_inputs() {
	assert_eq!(
		LinearRegression::compute(&[1.0], &[2.0]),
		Err(StatisticsError::TooFewObservations {
			needed: 2,
			found: 1
		})
	);
	assert_eq!(
		LinearRegression::compute(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]),
		Err(StatisticsError::ZeroVariance("explanatory variable"))
	);
	let output = LinearRegression::compute(&[1.0, f64::NAN, 2.0, 3.0], &[2.0, 5.0, 4.0, 6.0]).unwrap();
	assert_eq!(output.n, 3);
}
