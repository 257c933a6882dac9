//! Dense LU with partial pivoting, generic over real and complex scalars.

use std::sync::Arc;

use crate::{Error, comm::Communicator};

use super::{LinSol, Scalar, Triplet};

/// Dense LU factorization of a triplet matrix.
///
/// The factors are stored row-major in one buffer; `perm[k]` is the row
/// swapped with row `k` at elimination step `k`.
pub struct DenseLu<T: Scalar> {
    n: usize,
    lu: Vec<T>,
    perm: Vec<usize>,
    comm: Option<Arc<dyn Communicator>>,
    factorized: bool,
}

impl<T: Scalar> DenseLu<T> {
    pub fn new() -> Self {
        Self {
            n: 0,
            lu: Vec::new(),
            perm: Vec::new(),
            comm: None,
            factorized: false,
        }
    }
}

impl<T: Scalar> Default for DenseLu<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> LinSol<T> for DenseLu<T> {
    fn init(&mut self, n: usize, comm: Option<Arc<dyn Communicator>>) -> Result<(), Error> {
        self.n = n;
        self.lu = vec![T::zero(); n * n];
        self.perm = vec![0; n];
        self.comm = comm;
        self.factorized = false;
        Ok(())
    }

    fn fact(&mut self, mat: &Triplet<T>) -> Result<(), Error> {
        let n = self.n;
        if mat.nrows() != n || mat.ncols() != n {
            return Err(Error::DimensionMismatch { expected: n, got: mat.nrows() });
        }
        mat.check()?;
        self.factorized = false;

        // Densify A into row-major storage
        let a = &mut self.lu;
        a.iter_mut().for_each(|v| *v = T::zero());
        for (i, j, x) in mat.iter() {
            a[i * n + j] += x;
        }
        if let Some(comm) = &self.comm {
            T::all_reduce_sum(comm.as_ref(), a)?;
        }

        for k in 0..n {
            // pivot
            let mut pivot_row = k;
            let mut pivot_val = a[k * n + k].modulus();
            for i in (k + 1)..n {
                let val = a[i * n + k].modulus();
                if val > pivot_val {
                    pivot_val = val;
                    pivot_row = i;
                }
            }
            if pivot_val == 0.0 {
                return Err(Error::SingularMatrix(k));
            }
            self.perm[k] = pivot_row;
            if pivot_row != k {
                for j in 0..n {
                    a.swap(k * n + j, pivot_row * n + j);
                }
            }
            // Eliminate below the pivot
            let akk = a[k * n + k];
            for i in (k + 1)..n {
                let factor = a[i * n + k] / akk;
                a[i * n + k] = factor;
                for j in (k + 1)..n {
                    let akj = a[k * n + j];
                    a[i * n + j] -= factor * akj;
                }
            }
        }
        self.factorized = true;
        Ok(())
    }

    fn solve(&self, x: &mut [T], b: &[T]) -> Result<(), Error> {
        if !self.factorized {
            return Err(Error::NotFactorized);
        }
        let n = self.n;
        if x.len() != n || b.len() != n {
            return Err(Error::DimensionMismatch { expected: n, got: b.len().min(x.len()) });
        }
        let a = &self.lu;
        x.copy_from_slice(b);
        for k in 0..n {
            x.swap(k, self.perm[k]);
        }

        // Forward solve Ly = Pb
        for i in 0..n {
            let mut sum = x[i];
            for k in 0..i {
                sum -= a[i * n + k] * x[k];
            }
            x[i] = sum;
        }
        // Backward solve Ux = y
        for i in (0..n).rev() {
            let mut sum = x[i];
            for k in (i + 1)..n {
                sum -= a[i * n + k] * x[k];
            }
            x[i] = sum / a[i * n + i];
        }
        Ok(())
    }
}
