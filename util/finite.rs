use num_traits::Float;
use std::{
	cmp::Ordering,
	fmt,
	hash::{Hash, Hasher},
};
use thiserror::Error;

/// A float that is known to be neither `NaN` nor infinite, so it can be totally ordered and used as a key in a `BTreeMap`.
#[derive(Clone, Copy, Debug)]
pub struct Finite<T>(T)
where
	T: Float;

#[derive(Debug, Error)]
#[error("not finite")]
pub struct NotFiniteError;

impl<T> Finite<T>
where
	T: Float,
{
	pub fn new(value: T) -> Result<Self, NotFiniteError> {
		if value.is_finite() {
			Ok(Self(value))
		} else {
			Err(NotFiniteError)
		}
	}

	pub fn get(self) -> T {
		self.0
	}
}

impl<T> fmt::Display for Finite<T>
where
	T: Float + fmt::Display,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl<T> PartialEq for Finite<T>
where
	T: Float,
{
	fn eq(&self, other: &Self) -> bool {
		self.0.eq(&other.0)
	}
}

impl<T> Eq for Finite<T> where T: Float {}

impl<T> PartialOrd for Finite<T>
where
	T: Float,
{
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl<T> Ord for Finite<T>
where
	T: Float,
{
	fn cmp(&self, other: &Self) -> Ordering {
		// Both values are finite, so the comparison is always defined.
		self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
	}
}

impl Hash for Finite<f32> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		// -0.0 and 0.0 compare equal, so they must hash equal.
		let value = if self.0 == 0.0 { 0.0f32 } else { self.0 };
		value.to_bits().hash(state);
	}
}

impl Hash for Finite<f64> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		let value = if self.0 == 0.0 { 0.0f64 } else { self.0 };
		value.to_bits().hash(state);
	}
}

#[test]
fn test_rejects_non_finite() {
	assert!(Finite::new(f64::NAN).is_err());
	assert!(Finite::new(f64::INFINITY).is_err());
	assert!(Finite::new(f32::NEG_INFINITY).is_err());
	assert_eq!(Finite::new(1.5f64).unwrap().get(), 1.5);
}

#[test]
fn test_ordering() {
	let mut values: Vec<Finite<f64>> = [3.0, -1.0, 2.5, 0.0]
		.iter()
		.map(|value| Finite::new(*value).unwrap())
		.collect();
	values.sort();
	let values: Vec<f64> = values.into_iter().map(|value| value.get()).collect();
	assert_eq!(values, vec![-1.0, 0.0, 2.5, 3.0]);
}
