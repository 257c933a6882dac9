//! Reference problems with known behavior, used by the tests and demos.
//!
//! Most come from Hairer & Wanner, *Solving Ordinary Differential Equations*.
//! Each problem carries its usual initial state and final abscissa; those
//! with a closed-form solution expose it through `solution`.

use crate::{Float, ODE, matrix::Triplet};

/// Hairer-Wanner VII Eq. (1.1): `y' = λ·(y - cos x)` with `λ = -50`.
#[derive(Debug, Clone, Copy)]
pub struct HwEq11 {
    pub lambda: Float,
}

impl Default for HwEq11 {
    fn default() -> Self {
        Self { lambda: -50.0 }
    }
}

impl HwEq11 {
    pub const XF: Float = 1.5;
    /// Step size of the classic fixed-step runs.
    pub const DX: Float = 1.875 / 50.0;

    pub fn y0(&self) -> Vec<Float> {
        vec![0.0]
    }

    pub fn solution(&self, x: Float) -> Float {
        let l = self.lambda;
        -l * (x.sin() - l * x.cos() + l * (l * x).exp()) / (l * l + 1.0)
    }
}

impl ODE for HwEq11 {
    fn ode(&self, _h: Float, x: Float, y: &[Float], dydx: &mut [Float]) {
        dydx[0] = self.lambda * y[0] - self.lambda * x.cos();
    }

    fn jac(&self, _h: Float, _x: Float, _y: &[Float], dfdy: &mut Triplet) -> bool {
        dfdy.put(0, 0, self.lambda);
        true
    }
}

/// Van der Pol oscillator in the singular-perturbation form of
/// Hairer-Wanner VII Eq. (1.5).
#[derive(Debug, Clone, Copy)]
pub struct VanDerPol {
    pub eps: Float,
}

impl VanDerPol {
    pub const XF: Float = 2.0;

    pub fn new(eps: Float) -> Self {
        Self { eps }
    }

    pub fn y0(&self) -> Vec<Float> {
        vec![2.0, -0.6]
    }
}

impl ODE for VanDerPol {
    fn ode(&self, _h: Float, _x: Float, y: &[Float], dydx: &mut [Float]) {
        dydx[0] = y[1];
        dydx[1] = ((1.0 - y[0] * y[0]) * y[1] - y[0]) / self.eps;
    }

    fn jac(&self, _h: Float, _x: Float, y: &[Float], dfdy: &mut Triplet) -> bool {
        dfdy.put(0, 0, 0.0);
        dfdy.put(0, 1, 1.0);
        dfdy.put(1, 0, (-2.0 * y[0] * y[1] - 1.0) / self.eps);
        dfdy.put(1, 1, (1.0 - y[0] * y[0]) / self.eps);
        true
    }
}

/// Robertson's chemical kinetics, Hairer-Wanner VII Eq. (1.4).
#[derive(Debug, Clone, Copy, Default)]
pub struct Robertson;

impl Robertson {
    pub const XF: Float = 0.3;

    pub fn y0(&self) -> Vec<Float> {
        vec![1.0, 0.0, 0.0]
    }
}

impl ODE for Robertson {
    fn ode(&self, _h: Float, _x: Float, y: &[Float], dydx: &mut [Float]) {
        dydx[0] = -0.04 * y[0] + 1.0e4 * y[1] * y[2];
        dydx[1] = 0.04 * y[0] - 1.0e4 * y[1] * y[2] - 3.0e7 * y[1] * y[1];
        dydx[2] = 3.0e7 * y[1] * y[1];
    }

    fn jac(&self, _h: Float, _x: Float, y: &[Float], dfdy: &mut Triplet) -> bool {
        dfdy.put(0, 0, -0.04);
        dfdy.put(0, 1, 1.0e4 * y[2]);
        dfdy.put(0, 2, 1.0e4 * y[1]);
        dfdy.put(1, 0, 0.04);
        dfdy.put(1, 1, -1.0e4 * y[2] - 6.0e7 * y[1]);
        dfdy.put(1, 2, -1.0e4 * y[1]);
        dfdy.put(2, 1, 6.0e7 * y[1]);
        true
    }
}

/// Arenstorf orbit of the restricted three-body problem. The orbit is
/// periodic: the state at [`Arenstorf::XF`] equals the initial one.
#[derive(Debug, Clone, Copy)]
pub struct Arenstorf {
    pub mu: Float,
}

impl Default for Arenstorf {
    fn default() -> Self {
        Self { mu: 0.012277471 }
    }
}

impl Arenstorf {
    pub const XF: Float = 17.0652165601579625588917206249;

    pub fn y0(&self) -> Vec<Float> {
        vec![0.994, 0.0, 0.0, -2.00158510637908252240537862224]
    }
}

impl ODE for Arenstorf {
    fn ode(&self, _h: Float, _x: Float, y: &[Float], dydx: &mut [Float]) {
        let mu = self.mu;
        let mup = 1.0 - mu;
        let r1 = (y[0] + mu).powi(2) + y[1] * y[1];
        let r1 = r1 * r1.sqrt();
        let r2 = (y[0] - mup).powi(2) + y[1] * y[1];
        let r2 = r2 * r2.sqrt();
        dydx[0] = y[2];
        dydx[1] = y[3];
        dydx[2] = y[0] + 2.0 * y[3] - mup * (y[0] + mu) / r1 - mu * (y[0] - mup) / r2;
        dydx[3] = y[1] - 2.0 * y[2] - mup * y[1] / r1 - mu * y[1] / r2;
    }
}

/// Linear two-dimensional system with a polynomial-exponential solution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleNdim2;

impl SimpleNdim2 {
    pub const XF: Float = 1.0;
    pub const DX: Float = 0.1;

    pub fn y0(&self) -> Vec<Float> {
        vec![-1.0, 0.0]
    }

    pub fn solution(&self, x: Float) -> [Float; 2] {
        let e2x = (2.0 * x).exp();
        [-0.5 * e2x + x * x + 2.0 * x - 0.5, 0.5 * e2x + x * x - 0.5]
    }
}

impl ODE for SimpleNdim2 {
    fn ode(&self, _h: Float, x: Float, y: &[Float], dydx: &mut [Float]) {
        dydx[0] = y[0] - y[1] + 2.0;
        dydx[1] = -y[0] + y[1] + 4.0 * x;
    }

    fn jac(&self, _h: Float, _x: Float, _y: &[Float], dfdy: &mut Triplet) -> bool {
        dfdy.put(0, 0, 1.0);
        dfdy.put(0, 1, -1.0);
        dfdy.put(1, 0, -1.0);
        dfdy.put(1, 1, 1.0);
        true
    }
}

/// Decoupled decay `m·y' = -k·y` written with a diagonal mass matrix, so that
/// `y_i(x) = y_i(0)·exp(-k_i·x/m_i)`.
#[derive(Debug, Clone)]
pub struct MassDecay {
    pub m: Vec<Float>,
    pub k: Vec<Float>,
}

impl MassDecay {
    pub const XF: Float = 1.0;

    pub fn new(m: Vec<Float>, k: Vec<Float>) -> Self {
        Self { m, k }
    }

    pub fn ndim(&self) -> usize {
        self.m.len()
    }

    pub fn y0(&self) -> Vec<Float> {
        vec![1.0; self.ndim()]
    }

    pub fn solution(&self, x: Float) -> Vec<Float> {
        self.m.iter().zip(&self.k).map(|(m, k)| (-k * x / m).exp()).collect()
    }
}

impl ODE for MassDecay {
    fn ode(&self, _h: Float, _x: Float, y: &[Float], dydx: &mut [Float]) {
        for ((d, k), y) in dydx.iter_mut().zip(&self.k).zip(y) {
            *d = -k * y;
        }
    }

    fn jac(&self, _h: Float, _x: Float, _y: &[Float], dfdy: &mut Triplet) -> bool {
        for (i, k) in self.k.iter().enumerate() {
            dfdy.put(i, i, -k);
        }
        true
    }

    fn mass(&self, m: &mut Triplet) -> bool {
        for (i, mi) in self.m.iter().enumerate() {
            m.put(i, i, *mi);
        }
        true
    }
}
