//! Convenient prelude: import the most commonly used traits, types, and functions.
//!
//! ```rust
//! use odesolve::prelude::*;
//! ```

pub use crate::{
    Config, ControlFlag, Error, ErrorEstimate, Float, MethodKind, ODE, Solver, Stat, Status,
    matrix::Triplet,
    solve::{Solution, SolveOptions, solve},
};
