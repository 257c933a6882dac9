//! Result of the high-level [`solve`](super::solve) entry point.

use crate::{Float, Stat, Status};

/// Final state, recorded steps and statistics of one integration.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Abscissa reached.
    pub x: Float,
    /// State at `x`.
    pub y: Vec<Float>,
    pub step_x: Vec<Float>,
    pub step_y: Vec<Vec<Float>>,
    pub dense_x: Vec<Float>,
    pub dense_y: Vec<Vec<Float>>,
    pub stat: Stat,
    pub status: Status,
}

impl Solution {
    /// Iterates over the recorded `(x, y)` step pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Float, &[Float])> + '_ {
        self.step_x.iter().copied().zip(self.step_y.iter().map(Vec::as_slice))
    }

    /// Iterates over the dense `(x, y)` pairs.
    pub fn iter_dense(&self) -> impl Iterator<Item = (Float, &[Float])> + '_ {
        self.dense_x.iter().copied().zip(self.dense_y.iter().map(Vec::as_slice))
    }
}
