use std::ops::Index;

use nalgebra::convert;
use simba::scalar::SupersetOf;

use crate::misc::{real, FloatingPoint, Invertible};

use super::{CurveEnd, KnotMultiplicity};

/// Knot vector representation
///
/// The vector is stored in its compact form: the two superfluous end knots are
/// omitted, so a curve with `n` control points and order `k` has `n + k - 2` knots.
/// The evaluation algorithms (span search, basis functions) work on the
/// [padded](KnotVector::padded) form that restores the superfluous knots.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

impl<T: FloatingPoint> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Create a clamped uniform knot vector
    /// the end knots are repeated `order - 1` times and interior knots are spaced by `delta`
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::KnotVector;
    /// let knots: KnotVector<f64> = KnotVector::clamped_uniform(4, 6, 1.);
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// ```
    pub fn clamped_uniform(order: usize, cv_count: usize, delta: T) -> Self {
        let last = cv_count - order + 1;
        (0..(cv_count + order - 2))
            .map(|i| {
                let k = i.saturating_sub(order - 2).min(last);
                delta * real::<T>(k as f64)
            })
            .collect()
    }

    /// Create a periodic uniform knot vector
    /// every knot is spaced by `delta` and the domain starts at zero
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::KnotVector;
    /// let knots: KnotVector<f64> = KnotVector::periodic_uniform(3, 5, 1.);
    /// assert_eq!(knots.to_vec(), vec![-1., 0., 1., 2., 3., 4.]);
    /// ```
    pub fn periodic_uniform(order: usize, cv_count: usize, delta: T) -> Self {
        let offset = real::<T>((order - 2) as f64);
        (0..(cv_count + order - 2))
            .map(|i| delta * (real::<T>(i as f64) - offset))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    pub fn first(&self) -> T {
        self.0[0]
    }

    pub fn last(&self) -> T {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.0
    }

    /// Get the domain of the knot vector by order
    pub fn domain(&self, order: usize) -> (T, T) {
        (self.0[order - 2], self.0[self.0.len() + 1 - order])
    }

    pub fn clamp(&self, order: usize, u: T) -> T {
        let (min, max) = self.domain(order);
        u.clamp(min, max)
    }

    /// Check that no knot is smaller than its predecessor
    pub fn is_non_decreasing(&self) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1])
    }

    /// Returns the index of the last knot less than or equal to knot
    pub fn floor(&self, knot: T) -> Option<usize> {
        self.iter().rposition(|t| *t <= knot)
    }

    /// Get the multiplicity of each knot
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 1., 2., 3., 3.]);
    /// let knot_multiplicity = knots.multiplicity();
    /// assert_eq!(knot_multiplicity[0].multiplicity(), 2);
    /// assert_eq!(knot_multiplicity[1].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[2].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[3].multiplicity(), 2);
    /// ```
    pub fn multiplicity(&self) -> Vec<KnotMultiplicity<T>> {
        let mut mult = vec![];
        if self.0.is_empty() {
            return mult;
        }

        let mut current = KnotMultiplicity::new(self.0[0], 0);
        self.0.iter().for_each(|knot| {
            if (*knot - *current.knot()).abs() > T::default_epsilon() {
                mult.push(current.clone());
                current = KnotMultiplicity::new(*knot, 0);
            }
            current.increment_multiplicity();
        });
        mult.push(current);

        mult
    }

    /// Size of the run of equal knots containing the knot at `index`
    pub fn multiplicity_at(&self, index: usize) -> usize {
        let value = self.0[index];
        let below = self.0[..index]
            .iter()
            .rev()
            .take_while(|k| **k == value)
            .count();
        let above = self.0[index..].iter().take_while(|k| **k == value).count();
        below + above
    }

    /// Number of knots exactly equal to `value`
    pub fn count(&self, value: T) -> usize {
        self.0.iter().filter(|k| **k == value).count()
    }

    /// Check if the knot vector is clamped at the given end
    /// `clamped` means the end knot has full multiplicity,
    /// i.e. `order - 1` equal knots in the compact form
    pub fn is_clamped(&self, order: usize, end: CurveEnd) -> bool {
        let len = self.0.len();
        match end {
            CurveEnd::Start => self.0[0] == self.0[order - 2],
            CurveEnd::End => self.0[len - 1] == self.0[len + 1 - order],
        }
    }

    /// The knot value omitted from the compact form at the given end
    /// equals the end knot when that end is clamped,
    /// otherwise it continues the spacing of the two outermost knots
    pub fn superfluous(&self, order: usize, end: CurveEnd) -> T {
        let len = self.0.len();
        if self.is_clamped(order, end) || len < 2 {
            return match end {
                CurveEnd::Start => self.0[0],
                CurveEnd::End => self.0[len - 1],
            };
        }
        match end {
            CurveEnd::Start => self.0[0] + self.0[0] - self.0[1],
            CurveEnd::End => self.0[len - 1] + self.0[len - 1] - self.0[len - 2],
        }
    }

    /// Restore the superfluous end knots
    /// The result has `cv_count + order` knots and is the input of the span search,
    /// basis function and knot insertion algorithms
    pub fn padded(&self, order: usize) -> Self {
        let mut knots = Vec::with_capacity(self.0.len() + 2);
        knots.push(self.superfluous(order, CurveEnd::Start));
        knots.extend_from_slice(&self.0);
        knots.push(self.superfluous(order, CurveEnd::End));
        Self(knots)
    }

    /// Drop the superfluous end knots of a padded knot vector
    pub fn from_padded(padded: &[T]) -> Self {
        Self(padded[1..padded.len() - 1].to_vec())
    }

    /// Average of the `order - 1` knots associated with the control point at `index`
    pub fn greville_abscissa(&self, order: usize, index: usize) -> T {
        let degree = order - 1;
        let sum = self.0[index..(index + degree)]
            .iter()
            .fold(T::zero(), |acc, k| acc + *k);
        sum / real::<T>(degree as f64)
    }

    /// Distinct knot values inside the domain, i.e. the span boundaries
    pub fn span_vector(&self, order: usize) -> Vec<T> {
        let (start, end) = self.domain(order);
        let mut spans: Vec<T> = vec![];
        for k in self.0[(order - 2)..=(self.0.len() + 1 - order)].iter() {
            if *k >= start && *k <= end && spans.last().is_none_or(|last| *last < *k) {
                spans.push(*k);
            }
        }
        spans
    }

    /// Map every knot linearly from the interval `from` to the interval `to`
    /// knots equal to the interval ends land exactly on the new ends
    pub(crate) fn remap(&mut self, from: (T, T), to: (T, T)) {
        let scale = (to.1 - to.0) / (from.1 - from.0);
        self.0.iter_mut().for_each(|k| {
            *k = if *k == from.0 {
                to.0
            } else if *k == from.1 {
                to.1
            } else {
                to.0 + (*k - from.0) * scale
            };
        });
    }

    /// Find the knot span index by binary search
    /// Expects a padded knot vector and `n = cv_count - 1`
    ///
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let idx = knots.find_knot_span_index(4, 2, 2.5);
    /// assert_eq!(idx, 4);
    /// ```
    pub fn find_knot_span_index(&self, n: usize, degree: usize, u: T) -> usize {
        if u > self[n + 1] - T::default_epsilon() {
            return n;
        }

        if u < self[degree] + T::default_epsilon() {
            return degree;
        }

        // binary search
        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self[mid] || self[mid + 1] <= u {
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
            let next = (low + high) / 2;
            if mid == next {
                break;
            }
            mid = next;
        }

        mid
    }

    /// Compute the non-vanishing basis functions
    /// Expects a padded knot vector
    pub fn basis_functions(&self, knot_span_index: usize, u: T, degree: usize) -> Vec<T> {
        let mut basis_functions = vec![T::zero(); degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        basis_functions[0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_span_index + 1 - j];
            right[j] = self[knot_span_index + j] - u;
            let mut saved = T::zero();

            for r in 0..j {
                let temp = basis_functions[r] / (right[r + 1] + left[j - r]);
                basis_functions[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }

            basis_functions[j] = saved;
        }

        basis_functions
    }

    /// Compute the non-vanishing basis functions and their derivatives
    /// Expects a padded knot vector.
    /// Returns a 2d array of size `(derivs + 1, degree + 1)`:
    /// the k-th row holds the k-th derivative, the first row the basis function values.
    pub fn derivative_basis_functions(
        &self,
        knot_index: usize,
        u: T,
        degree: usize,
        derivs: usize,
    ) -> Vec<Vec<T>> {
        let mut ndu = vec![vec![T::zero(); degree + 1]; degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        ndu[0][0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_index + 1 - j];
            right[j] = self[knot_index + j] - u;

            let mut saved = T::zero();
            for r in 0..j {
                // lower triangle
                ndu[j][r] = right[r + 1] + left[j - r];
                let temp = ndu[r][j - 1] / ndu[j][r];

                // upper triangle
                ndu[r][j] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            ndu[j][j] = saved;
        }

        let mut ders = vec![vec![T::zero(); degree + 1]; derivs + 1];
        let mut a = vec![vec![T::zero(); degree + 1]; 2];

        // load the basis functions
        for j in 0..=degree {
            ders[0][j] = ndu[j][degree];
        }

        let idegree = degree as isize;
        let n = derivs as isize;

        // compute the derivatives
        for r in 0..=idegree {
            // alternate rows in array a
            let mut s1 = 0;
            let mut s2 = 1;
            a[0][0] = T::one();

            // loop to compute the kth derivative
            for k in 1..=n {
                let mut d = T::zero();
                let rk = r - k;
                let pk = idegree - k;

                if r >= k {
                    a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                    d = a[s2][0] * ndu[rk as usize][pk as usize];
                }

                let j1 = if rk >= -1 { 1 } else { -rk };
                let j2 = if r - 1 <= pk { k - 1 } else { idegree - r };

                for j in j1..=j2 {
                    a[s2][j as usize] = (a[s1][j as usize] - a[s1][j as usize - 1])
                        / ndu[(pk + 1) as usize][(rk + j) as usize];
                    d += a[s2][j as usize] * ndu[(rk + j) as usize][pk as usize];
                }

                let uk = k as usize;
                let ur = r as usize;
                if r <= pk {
                    a[s2][uk] = -a[s1][(k - 1) as usize] / ndu[(pk + 1) as usize][ur];
                    d += a[s2][uk] * ndu[ur][pk as usize];
                }

                ders[uk][ur] = d;

                // switch rows
                std::mem::swap(&mut s1, &mut s2);
            }
        }

        let mut acc = idegree;
        for k in 1..=n {
            for j in 0..=idegree {
                ders[k as usize][j as usize] *= real::<T>(acc as f64);
            }
            acc *= idegree - k;
        }
        ders
    }

    /// Cast the knot vector to another floating point type
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// let knots: KnotVector<f64> = KnotVector::new(vec![1., 2., 3., 4., 5., 6.]);
    /// let knots2 = knots.cast::<f32>();
    /// assert_eq!(knots2.first(), 1.0);
    /// ```
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> KnotVector<F> {
        KnotVector::new(self.0.iter().map(|v| convert(*v)).collect())
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: FloatingPoint> Invertible for KnotVector<T> {
    /// Negate and reverse the knots
    /// # Example
    /// ```
    /// use nurbs_kernel::prelude::*;
    /// let original = KnotVector::new(vec![0., 0., 1., 2.5, 4.0, 4.0]);
    /// let mut knot = original.clone();
    /// knot.invert();
    /// assert_eq!(knot.to_vec(), vec![-4., -4., -2.5, -1., 0., 0.]);
    /// assert_eq!(knot.inverse(), original);
    /// ```
    fn invert(&mut self) {
        self.0.reverse();
        self.0.iter_mut().for_each(|k| *k = -*k);
    }
}

#[cfg(test)]
mod tests {
    use super::KnotVector;
    use crate::knot::CurveEnd;

    #[test]
    fn domain_of_compact_vector() {
        let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
        assert_eq!(knots.domain(4), (0., 3.));
        assert!(knots.is_clamped(4, CurveEnd::Start));
        assert!(knots.is_clamped(4, CurveEnd::End));
    }

    #[test]
    fn superfluous_knots() {
        let clamped = KnotVector::new(vec![0., 0., 1., 2., 2.]);
        assert_eq!(clamped.superfluous(3, CurveEnd::Start), 0.);
        assert_eq!(clamped.superfluous(3, CurveEnd::End), 2.);

        let periodic: KnotVector<f64> = KnotVector::periodic_uniform(3, 5, 0.5);
        assert_eq!(periodic.superfluous(3, CurveEnd::Start), -1.);
        assert_eq!(periodic.superfluous(3, CurveEnd::End), 2.5);
        assert_eq!(periodic.padded(3).len(), 8);
    }

    #[test]
    fn multiplicity_at_index() {
        let knots = KnotVector::new(vec![0., 0., 0., 1., 1., 2., 3., 3., 3.]);
        assert_eq!(knots.multiplicity_at(0), 3);
        assert_eq!(knots.multiplicity_at(2), 3);
        assert_eq!(knots.multiplicity_at(4), 2);
        assert_eq!(knots.multiplicity_at(5), 1);
    }

    #[test]
    fn greville_and_spans() {
        let knots: KnotVector<f64> = KnotVector::clamped_uniform(4, 6, 1.);
        assert_eq!(knots.greville_abscissa(4, 0), 0.);
        assert_eq!(knots.greville_abscissa(4, 2), 1.);
        assert_eq!(knots.greville_abscissa(4, 5), 3.);
        assert_eq!(knots.span_vector(4), vec![0., 1., 2., 3.]);
    }

    #[test]
    fn basis_functions_partition_unity() {
        let knots: KnotVector<f64> = KnotVector::clamped_uniform(4, 7, 1.).padded(4);
        for i in 0..=40 {
            let u = i as f64 * 0.1;
            let span = knots.find_knot_span_index(6, 3, u);
            let sum: f64 = knots.basis_functions(span, u, 3).iter().sum();
            assert!((sum - 1.).abs() < 1e-12);
        }
    }
}
