//! Integration methods and the interface the driver steps them through.

mod bweuler;
mod erk;
mod fweuler;
mod radau;

use std::{fmt, str::FromStr};

use crate::{
    Config, Error, Float,
    solver::{Stat, system::System, workspace::Workspace},
};

pub use erk::Tableau;

/// Available methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Forward Euler (fixed steps only).
    FwEuler,
    /// Backward Euler (fixed steps only).
    BwEuler,
    /// Modified Euler 2(1).
    MoEuler,
    /// Runge mid-point, order 2 (fixed steps only).
    Rk2,
    /// Runge, order 3 (fixed steps only).
    Rk3,
    /// Heun, order 3 (fixed steps only).
    Heun3,
    /// Classical Runge-Kutta, order 4 (fixed steps only).
    Rk4,
    /// Runge-Kutta 3/8 rule, order 4 (fixed steps only).
    Rk4ThreeEighths,
    /// Merson 4(3).
    Merson4,
    /// Zonneveld 4(3).
    Zonneveld4,
    /// Fehlberg 4(5).
    Fehlberg4,
    /// Dormand-Prince 5(4) with dense output.
    Dopri5,
    /// Verner 6(5).
    Verner6,
    /// Fehlberg 7(8).
    Fehlberg7,
    /// Dormand-Prince 8(5,3).
    Dopri8,
    /// Radau IIA, 3 stages, order 5.
    Radau5,
}

impl MethodKind {
    pub const ALL: [MethodKind; 16] = [
        MethodKind::FwEuler,
        MethodKind::BwEuler,
        MethodKind::MoEuler,
        MethodKind::Rk2,
        MethodKind::Rk3,
        MethodKind::Heun3,
        MethodKind::Rk4,
        MethodKind::Rk4ThreeEighths,
        MethodKind::Merson4,
        MethodKind::Zonneveld4,
        MethodKind::Fehlberg4,
        MethodKind::Dopri5,
        MethodKind::Verner6,
        MethodKind::Fehlberg7,
        MethodKind::Dopri8,
        MethodKind::Radau5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MethodKind::FwEuler => "fweuler",
            MethodKind::BwEuler => "bweuler",
            MethodKind::MoEuler => "moeuler",
            MethodKind::Rk2 => "rk2",
            MethodKind::Rk3 => "rk3",
            MethodKind::Heun3 => "heun3",
            MethodKind::Rk4 => "rk4",
            MethodKind::Rk4ThreeEighths => "rk4-3/8",
            MethodKind::Merson4 => "merson4",
            MethodKind::Zonneveld4 => "zonneveld4",
            MethodKind::Fehlberg4 => "fehlberg4",
            MethodKind::Dopri5 => "dopri5",
            MethodKind::Verner6 => "verner6",
            MethodKind::Fehlberg7 => "fehlberg7",
            MethodKind::Dopri8 => "dopri8",
            MethodKind::Radau5 => "radau5",
        }
    }

    /// Butcher tableau of the explicit Runge-Kutta kinds.
    pub fn tableau(self) -> Option<&'static Tableau> {
        erk::tableau(self)
    }

    pub fn is_implicit(self) -> bool {
        matches!(self, MethodKind::BwEuler | MethodKind::Radau5)
    }

    /// The method has no error estimator and cannot vary its step size.
    pub fn fixed_only(self) -> bool {
        match self {
            MethodKind::FwEuler | MethodKind::BwEuler => true,
            MethodKind::Radau5 => false,
            kind => kind.tableau().map_or(true, |t| t.e.is_none()),
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MethodKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| Error::UnknownMethod(s.to_string()))
    }
}

/// Local error estimator of Radau IIA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorEstimate {
    /// Explicit estimate from the stage increments.
    Explicit,
    /// Filtered through the real system matrix.
    Implicit,
    /// Like `Implicit`, re-evaluated on the first step and after rejections.
    #[default]
    Corrected,
}

/// Static properties of a method.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MethodInfo {
    pub fixed_only: bool,
    pub implicit: bool,
    pub nstg: usize,
    /// Provides dense output.
    pub dense: bool,
    /// Accepts a non-identity mass matrix.
    pub mass: bool,
    /// Needs `f(x, y)` at the start of every step.
    pub needs_f0: bool,
    /// Computes a stiffness ratio worth testing.
    pub stiff_ratio: bool,
}

/// A stepping method driven by [`crate::Solver`].
///
/// `step` computes a trial step from `(x0, y0)` into the workspace and sets
/// `work.rerr` (and `work.diverg` for iterative methods); the driver then calls
/// either `accept` or `reject`, both returning the next step size.
pub(crate) trait RkMethod {
    fn info(&self) -> MethodInfo;

    /// Allocates buffers for `sys.ndim()` equations. Called once per solve.
    fn init(&mut self, conf: &Config, sys: &System) -> Result<(), Error>;

    fn step(
        &mut self,
        conf: &Config,
        sys: &System,
        work: &mut Workspace,
        stat: &mut Stat,
        x0: Float,
        y0: &[Float],
    ) -> Result<(), Error>;

    /// Moves `y0` to the end of the step and returns the next step size.
    fn accept(
        &mut self,
        conf: &Config,
        work: &mut Workspace,
        stat: &Stat,
        y0: &mut [Float],
        x0: Float,
    ) -> Float;

    fn reject(&mut self, conf: &Config, work: &mut Workspace) -> Float;

    /// Interpolates the last accepted step `[x - h, x]` at `xout`.
    fn dense_out(&self, yout: &mut [Float], h: Float, x: Float, y: &[Float], xout: Float);
}

/// Allocates the method of the given kind.
pub(crate) fn new_method(kind: MethodKind) -> Result<Box<dyn RkMethod>, Error> {
    let method: Box<dyn RkMethod> = match kind {
        MethodKind::FwEuler => Box::new(fweuler::FwEuler::new()),
        MethodKind::BwEuler => Box::new(bweuler::BwEuler::new()),
        MethodKind::Radau5 => Box::new(radau::Radau5::new()),
        kind => {
            let tableau = kind
                .tableau()
                .ok_or_else(|| Error::UnknownMethod(kind.to_string()))?;
            Box::new(erk::ExplicitRk::new(kind, tableau))
        }
    };
    Ok(method)
}
