//! Adaptive integrators for initial value problems of ordinary differential equations.
//!
//! The crate offers explicit embedded Runge-Kutta methods driven by Butcher tableaux, the
//! 3-stage order-5 Radau IIA implicit method with simplified Newton iterations and a backward
//! Euler baseline. Step sizes are controlled automatically, Jacobians and factorizations are
//! reused while the Newton iterations contract fast enough, and the right-hand side can be
//! evaluated over row partitions joined by an all-reduce-sum.

mod config;
mod core;
mod error;

pub mod comm;
pub mod matrix;
pub mod methods;
pub mod prelude;
pub mod problems;
pub mod solve;
pub mod solver;

pub use config::{Config, DenseOutFn, StepOutFn};
pub use crate::core::{
    ode::ODE,
    solout::ControlFlag,
    status::Status,
};
pub use error::{Error, ErrorKind};
pub use methods::{ErrorEstimate, MethodKind};
pub use solver::{Output, Solver, Stat};

// Prevent selecting two incompatible float precision features at once.
#[cfg(all(feature = "f32", feature = "f64"))]
compile_error!(
    "features 'f32' and 'f64' cannot both be enabled; pick exactly one Float precision feature"
);

/// Change this to f128, f64, f32 as desired.
#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(feature = "f64")]
pub type Float = f64;
