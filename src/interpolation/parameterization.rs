use itertools::Itertools;
use nalgebra::DVector;

use crate::misc::{real, FloatingPoint};

/// How interpolation parameters are spread over the input points
/// https://en.wikipedia.org/wiki/Centripetal_Catmull%E2%80%93Rom_spline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parameterization {
    Uniform,
    #[default]
    Chordal,
    Centripetal,
}

impl Parameterization {
    /// Increasing parameters in `[0, 1]`, one per point
    /// Returns `None` when the points do not spread (all coincident).
    pub fn parameterize<T: FloatingPoint>(&self, points: &[DVector<T>]) -> Option<Vec<T>> {
        let steps = points
            .iter()
            .tuple_windows()
            .map(|(a, b)| match self {
                Parameterization::Uniform => T::one(),
                _ => (b - a).norm().powf(self.alpha()),
            })
            .collect_vec();

        let total = steps.iter().fold(T::zero(), |acc, s| acc + *s);
        if total <= T::zero() {
            return None;
        }

        let mut params = vec![T::zero()];
        let mut acc = T::zero();
        for s in steps.iter().take(steps.len().saturating_sub(1)) {
            acc += *s;
            params.push(acc / total);
        }
        if points.len() > 1 {
            params.push(T::one());
        }
        Some(params)
    }

    fn alpha<T: FloatingPoint>(&self) -> T {
        match self {
            Parameterization::Uniform => T::zero(),
            Parameterization::Chordal => T::one(),
            Parameterization::Centripetal => real(0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use super::Parameterization;

    #[test]
    fn chordal_and_centripetal_parameters() {
        let points = vec![dvector![0., 0.], dvector![1., 0.], dvector![1., 4.]];
        let chordal = Parameterization::Chordal.parameterize(&points).unwrap();
        assert_relative_eq!(chordal.as_slice(), [0., 0.2, 1.].as_slice());
        let centripetal = Parameterization::Centripetal.parameterize(&points).unwrap();
        assert_relative_eq!(centripetal.as_slice(), [0., 1. / 3., 1.].as_slice());
        let uniform = Parameterization::Uniform.parameterize(&points).unwrap();
        assert_relative_eq!(uniform.as_slice(), [0., 0.5, 1.].as_slice());
    }

    #[test]
    fn coincident_points_have_no_parameters() {
        let points = vec![dvector![1., 1.], dvector![1., 1.]];
        assert!(Parameterization::Chordal.parameterize(&points).is_none());
    }
}
