use std::collections::HashMap;

use nalgebra::RealField;

/// Binomial coefficients memoized per `(n, k)`
#[derive(Debug, Default)]
pub struct Binomial<T> {
    memo: HashMap<(usize, usize), T>,
}

impl<T: RealField + Copy> Binomial<T> {
    pub fn new() -> Self {
        Self {
            memo: HashMap::new(),
        }
    }

    /// Returns the binomial coefficient of `n` and `k` with memoization.
    pub fn get(&mut self, n: usize, k: usize) -> T {
        if k > n {
            return T::zero();
        } else if k == 0 || k == n {
            return T::one();
        }

        let k = k.min(n - k);
        if let Some(memoized) = self.memo.get(&(n, k)) {
            return *memoized;
        }

        let r = self.get(n - 1, k) + self.get(n - 1, k - 1);
        self.memo.insert((n, k), r);
        r
    }
}

#[cfg(test)]
mod tests {
    use super::Binomial;

    #[test]
    fn pascal_row() {
        let mut binomial = Binomial::<f64>::new();
        let row: Vec<f64> = (0..=5).map(|k| binomial.get(5, k)).collect();
        assert_eq!(row, vec![1., 5., 10., 10., 5., 1.]);
        assert_eq!(binomial.get(5, 6), 0.);
    }

    #[test]
    fn symmetric() {
        let mut binomial = Binomial::<f64>::new();
        for n in 1..12 {
            for k in 0..=n {
                assert_eq!(binomial.get(n, k), binomial.get(n, n - k));
            }
        }
    }
}
