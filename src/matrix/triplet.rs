//! Sparse matrices in triplet (row, col, value) form.

use std::ops::Range;

use num_complex::Complex;

use crate::{Error, Float};

use super::Scalar;

/// Sparse matrix stored as a list of `(i, j, x)` entries.
///
/// Repeated entries are summed when the matrix is assembled.
#[derive(Clone, Debug)]
pub struct Triplet<T = Float> {
    m: usize,
    n: usize,
    i: Vec<usize>,
    j: Vec<usize>,
    x: Vec<T>,
}

/// Triplet with complex values.
pub type TripletC = Triplet<Complex<Float>>;

impl<T: Scalar> Triplet<T> {
    /// Empty `m × n` matrix.
    pub fn new(m: usize, n: usize) -> Self {
        Self::with_capacity(m, n, 0)
    }

    /// Empty `m × n` matrix with room for `max` entries.
    pub fn with_capacity(m: usize, n: usize, max: usize) -> Self {
        Self {
            m,
            n,
            i: Vec::with_capacity(max),
            j: Vec::with_capacity(max),
            x: Vec::with_capacity(max),
        }
    }

    /// `n × n` identity.
    pub fn identity(n: usize) -> Self {
        let mut t = Self::with_capacity(n, n, n);
        for k in 0..n {
            t.put(k, k, T::one());
        }
        t
    }

    /// Removes all entries and keeps the dimensions.
    pub fn start(&mut self) {
        self.i.clear();
        self.j.clear();
        self.x.clear();
    }

    /// Appends an entry.
    pub fn put(&mut self, i: usize, j: usize, x: T) {
        self.i.push(i);
        self.j.push(j);
        self.x.push(x);
    }

    pub fn nrows(&self) -> usize {
        self.m
    }

    pub fn ncols(&self) -> usize {
        self.n
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterates over the stored entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.i
            .iter()
            .zip(self.j.iter())
            .zip(self.x.iter())
            .map(|((&i, &j), &x)| (i, j, x))
    }

    /// Fails if any entry lies outside the matrix.
    pub fn check(&self) -> Result<(), Error> {
        match self.iter().find(|&(i, j, _)| i >= self.m || j >= self.n) {
            Some((i, j, _)) => Err(Error::TripletIndex { i, j, m: self.m, n: self.n }),
            None => Ok(()),
        }
    }

    /// Keeps only the entries whose row lies in `rows`.
    pub fn retain_rows(&mut self, rows: &Range<usize>) {
        let mut k = 0;
        for p in 0..self.x.len() {
            if rows.contains(&self.i[p]) {
                self.i[k] = self.i[p];
                self.j[k] = self.j[p];
                self.x[k] = self.x[p];
                k += 1;
            }
        }
        self.i.truncate(k);
        self.j.truncate(k);
        self.x.truncate(k);
    }

    /// Sets `self := alpha·a + beta·b`.
    ///
    /// Builds the real `γM − J` and complex `(α+βi)M − J` systems from real
    /// triplets without touching `a` or `b`.
    pub fn combine(&mut self, alpha: T, a: &Triplet<Float>, beta: T, b: &Triplet<Float>) {
        self.m = a.m;
        self.n = a.n;
        self.start();
        for (i, j, x) in a.iter() {
            self.put(i, j, alpha * T::from(x));
        }
        for (i, j, x) in b.iter() {
            self.put(i, j, beta * T::from(x));
        }
    }

    /// `out := A·v`.
    pub fn mat_vec_mul(&self, out: &mut [T], v: &[T]) {
        out.iter_mut().for_each(|o| *o = T::zero());
        for (i, j, x) in self.iter() {
            out[i] += x * v[j];
        }
    }

    /// Row-major dense copy, duplicates summed.
    pub fn to_dense(&self) -> Result<Vec<T>, Error> {
        self.check()?;
        let mut a = vec![T::zero(); self.m * self.n];
        for (i, j, x) in self.iter() {
            a[i * self.n + j] += x;
        }
        Ok(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_builds_shifted_systems() {
        let mass = Triplet::<Float>::identity(2);
        let mut jac = Triplet::<Float>::new(2, 2);
        jac.put(0, 0, -1.0);
        jac.put(0, 1, 2.0);
        jac.put(1, 1, -3.0);

        let mut kr = Triplet::<Float>::new(2, 2);
        kr.combine(5.0, &mass, -1.0, &jac);
        assert_eq!(kr.to_dense().unwrap(), vec![6.0, -2.0, 0.0, 8.0]);

        let mut kc = TripletC::new(2, 2);
        kc.combine(Complex::new(1.0, 2.0), &mass, Complex::new(-1.0, 0.0), &jac);
        let dense = kc.to_dense().unwrap();
        assert_eq!(dense[0], Complex::new(2.0, 2.0));
        assert_eq!(dense[1], Complex::new(-2.0, 0.0));
        assert_eq!(dense[3], Complex::new(4.0, 2.0));
    }

    #[test]
    fn retain_rows_and_bounds() {
        let mut t = Triplet::<Float>::new(3, 3);
        t.put(0, 0, 1.0);
        t.put(1, 2, 2.0);
        t.put(2, 1, 3.0);
        t.retain_rows(&(1..2));
        assert_eq!(t.iter().collect::<Vec<_>>(), vec![(1, 2, 2.0)]);

        t.put(3, 0, 1.0);
        assert!(matches!(t.check(), Err(Error::TripletIndex { i: 3, .. })));
    }
}
