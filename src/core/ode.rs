//! User-supplied ODE system.

use crate::{Float, matrix::Triplet};

/// User-supplied ODE system `M·y' = f(x, y)`.
///
/// Implement this trait for your problem to provide the right-hand side
/// function. The integrator repeatedly calls `ode` with the current step size
/// `h`, abscissa `x` and state `y` and expects you to fill `dydx` with the
/// derivative values. The step size is passed for formulas that scale with it;
/// most systems ignore it.
///
/// `jac` and `mass` are optional. Returning `false` from `jac` makes the
/// implicit methods differentiate `ode` numerically; returning `false` from
/// `mass` means `M` is the identity.
///
/// # Example
///
/// ```
/// use odesolve::{ODE, Float, matrix::Triplet};
///
/// struct VanDerPol { eps: Float }
///
/// impl ODE for VanDerPol {
///     fn ode(&self, _h: Float, _x: Float, y: &[Float], dydx: &mut [Float]) {
///         dydx[0] = y[1];
///         dydx[1] = ((1.0 - y[0] * y[0]) * y[1] - y[0]) / self.eps;
///     }
///
///     fn jac(&self, _h: Float, _x: Float, y: &[Float], dfdy: &mut Triplet) -> bool {
///         dfdy.put(0, 1, 1.0);
///         dfdy.put(1, 0, (-2.0 * y[0] * y[1] - 1.0) / self.eps);
///         dfdy.put(1, 1, (1.0 - y[0] * y[0]) / self.eps);
///         true
///     }
/// }
/// ```
pub trait ODE {
    fn ode(&self, h: Float, x: Float, y: &[Float], dydx: &mut [Float]);

    /// Fills `dfdy` (already cleared, `ndim × ndim`) with ∂f/∂y.
    fn jac(&self, _h: Float, _x: Float, _y: &[Float], _dfdy: &mut Triplet) -> bool {
        false
    }

    /// Fills `m` (already cleared, `ndim × ndim`) with the constant mass matrix.
    fn mass(&self, _m: &mut Triplet) -> bool {
        false
    }
}
