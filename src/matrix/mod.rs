//! Sparse triplets and the linear solvers used by the implicit methods.

mod lu;
mod triplet;

use std::{fmt::Debug, str::FromStr, sync::Arc};

use num_complex::Complex;
use num_traits::NumAssign;

use crate::{Error, Float, comm::Communicator};

pub use lu::DenseLu;
pub use triplet::{Triplet, TripletC};

/// Scalars the linear solvers work with: [`Float`] and `Complex<Float>`.
pub trait Scalar: NumAssign + Copy + Debug + Send + Sync + From<Float> + 'static {
    /// Magnitude used for pivoting.
    fn modulus(self) -> Float;

    /// Sums `buf` element-wise over all ranks of `comm`.
    fn all_reduce_sum(comm: &dyn Communicator, buf: &mut [Self]) -> Result<(), Error>;
}

impl Scalar for Float {
    fn modulus(self) -> Float {
        self.abs()
    }

    fn all_reduce_sum(comm: &dyn Communicator, buf: &mut [Self]) -> Result<(), Error> {
        comm.all_reduce_sum(buf)
    }
}

impl Scalar for Complex<Float> {
    fn modulus(self) -> Float {
        self.norm()
    }

    fn all_reduce_sum(comm: &dyn Communicator, buf: &mut [Self]) -> Result<(), Error> {
        let n = buf.len();
        let mut packed = vec![0.0; 2 * n];
        for (k, z) in buf.iter().enumerate() {
            packed[k] = z.re;
            packed[n + k] = z.im;
        }
        comm.all_reduce_sum(&mut packed)?;
        for (k, z) in buf.iter_mut().enumerate() {
            *z = Complex::new(packed[k], packed[n + k]);
        }
        Ok(())
    }
}

/// Linear solver collaborator: `init` once, `fact` whenever the matrix
/// changes, `solve` any number of times in between.
pub trait LinSol<T: Scalar>: Send + Sync {
    /// Prepares the solver for `n × n` systems. With a communicator, every
    /// rank assembles only its own rows and the factorization is replicated.
    fn init(&mut self, n: usize, comm: Option<Arc<dyn Communicator>>) -> Result<(), Error>;

    /// Factorizes the matrix given as triplets (duplicates are summed).
    fn fact(&mut self, mat: &Triplet<T>) -> Result<(), Error>;

    /// Solves `A·x = b` with the last factorization.
    fn solve(&self, x: &mut [T], b: &[T]) -> Result<(), Error>;
}

/// Kinds of linear solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinSolKind {
    /// Dense LU with partial pivoting.
    #[default]
    Dense,
}

impl LinSolKind {
    /// Allocates a solver of this kind.
    pub fn build<T: Scalar>(self) -> Box<dyn LinSol<T>> {
        match self {
            LinSolKind::Dense => Box::new(DenseLu::<T>::new()),
        }
    }
}

impl FromStr for LinSolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "dense" => Ok(LinSolKind::Dense),
            other => Err(Error::UnknownLinSolKind(other.to_string())),
        }
    }
}
