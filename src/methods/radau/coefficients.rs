use crate::Float;

/// Transformation that block-diagonalizes the Radau IIA coefficient matrix.
pub(super) const T: [[Float; 3]; 3] = [
    [9.1232394870892942792e-02, -0.14125529502095420843, -3.0029194105147424492e-02],
    [0.24171793270710701896, 0.20412935229379993199, 0.38294211275726193779],
    [0.96604818261509293619, 1.0, 0.0],
];

/// Inverse of [`T`].
pub(super) const TI: [[Float; 3]; 3] = [
    [4.3255798900631553510, 0.33919925181580986954, 0.54177053993587487119],
    [-4.1787185915519047273, -0.32768282076106238708, 0.47662355450055045196],
    [-0.50287263494578687595, 2.5719269498556054292, -0.59603920482822492497],
];

/// Collocation nodes, eigenvalues of the inverse coefficient matrix and the
/// error estimator weights.
pub(super) struct Coefficients {
    pub c: [Float; 3],
    /// Real eigenvalue.
    pub gam: Float,
    /// Complex pair `alp ± i·bet`.
    pub alp: Float,
    pub bet: Float,
    pub gam0: Float,
    pub e0: Float,
    pub e1: Float,
    pub e2: Float,
    pub mu1: Float,
    pub mu2: Float,
    pub mu3: Float,
    pub mu4: Float,
    pub mu5: Float,
}

impl Coefficients {
    pub fn new() -> Self {
        let sq6 = Float::sqrt(6.0);
        let c1 = Float::powf(9.0, 1.0 / 3.0);
        let c2 = Float::powf(3.0, 3.0 / 2.0);
        let c3 = Float::powf(9.0, 2.0 / 3.0);
        let gam0 = c1 / (c3 + 3.0 * c1 - 3.0);
        let mu1 = (4.0 - sq6) / 10.0;
        let mu2 = (4.0 + sq6) / 10.0;
        Self {
            c: [mu1, mu2, 1.0],
            gam: c1 - 3.0 / c1 + 3.0,
            alp: -c1 / 2.0 + 3.0 / (2.0 * c1) + 3.0,
            bet: (Float::sqrt(3.0) * c1) / 2.0 + c2 / (2.0 * c1),
            gam0,
            e0: gam0 * (-13.0 - 7.0 * sq6) / 3.0,
            e1: gam0 * (-13.0 + 7.0 * sq6) / 3.0,
            e2: gam0 * (-1.0) / 3.0,
            mu1,
            mu2,
            mu3: mu1 - 1.0,
            mu4: mu2 - 1.0,
            mu5: mu1 - mu2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transformation_inverts() {
        for i in 0..3 {
            for j in 0..3 {
                let tij: Float = (0..3).map(|k| T[i][k] * TI[k][j]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((tij - expected).abs() < 1e-14, "T·Ti[{i}][{j}] = {tij}");
            }
        }
        let cf = Coefficients::new();
        assert!((cf.gam * cf.gam0 - 1.0).abs() < 1e-14);
        assert!((cf.gam - 3.6378342527444957).abs() < 1e-14);
    }
}
