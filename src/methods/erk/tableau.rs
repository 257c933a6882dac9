//! Butcher tableaux of the explicit Runge-Kutta methods.
//!
//! Coefficients from E. Hairer, S. P. Nørsett, G. Wanner, Solving Ordinary
//! Differential Equations I, Nonstiff Problems (2nd revised edition).

use crate::Float;

/// Coefficients of an explicit Runge-Kutta method.
///
/// `e = b - be` is the embedded error estimator and `d` the dense output
/// coefficients, when the method has them. `e_low` is a second, lower-order
/// estimator blended with `e` as in DOP853.
#[derive(Debug)]
pub struct Tableau {
    pub a: &'static [&'static [Float]],
    pub b: &'static [Float],
    pub be: Option<&'static [Float]>,
    pub c: &'static [Float],
    pub e: Option<&'static [Float]>,
    pub e_low: Option<&'static [Float]>,
    pub d: Option<&'static [Float]>,
    /// Order of the solution.
    pub p: usize,
    /// Order of the error estimator, `min(order(y), order(ŷ))`.
    pub q: usize,
    /// First stage of a step equals the last stage of the previous one.
    pub fsal: bool,
}

impl Tableau {
    pub fn nstg(&self) -> usize {
        self.b.len()
    }
}

pub const MOEULER: Tableau = Tableau {
    a: &[&[0.0, 0.0], &[1.0, 0.0]],
    b: &[1.0 / 2.0, 1.0 / 2.0],
    be: Some(&[1.0, 0.0]),
    c: &[0.0, 1.0],
    e: Some(&[-1.0 / 2.0, 1.0 / 2.0]),
    e_low: None,
    d: None,
    p: 2,
    q: 1,
    fsal: false,
};

pub const RK2: Tableau = Tableau {
    a: &[&[0.0, 0.0], &[1.0 / 2.0, 0.0]],
    b: &[0.0, 1.0],
    be: None,
    c: &[0.0, 1.0 / 2.0],
    e: None,
    e_low: None,
    d: None,
    p: 2,
    q: 0,
    fsal: false,
};

pub const RK3: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0],
        &[1.0 / 2.0, 0.0, 0.0, 0.0],
        &[0.0, 1.0, 0.0, 0.0],
        &[0.0, 0.0, 1.0, 0.0],
    ],
    b: &[1.0 / 6.0, 2.0 / 3.0, 0.0, 1.0 / 6.0],
    be: None,
    c: &[0.0, 1.0 / 2.0, 1.0, 1.0],
    e: None,
    e_low: None,
    d: None,
    p: 3,
    q: 0,
    fsal: false,
};

pub const HEUN3: Tableau = Tableau {
    a: &[&[0.0, 0.0, 0.0], &[1.0 / 3.0, 0.0, 0.0], &[0.0, 2.0 / 3.0, 0.0]],
    b: &[1.0 / 4.0, 0.0, 3.0 / 4.0],
    be: None,
    c: &[0.0, 1.0 / 3.0, 2.0 / 3.0],
    e: None,
    e_low: None,
    d: None,
    p: 3,
    q: 0,
    fsal: false,
};

pub const RK4: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0],
        &[1.0 / 2.0, 0.0, 0.0, 0.0],
        &[0.0, 1.0 / 2.0, 0.0, 0.0],
        &[0.0, 0.0, 1.0, 0.0],
    ],
    b: &[1.0 / 6.0, 2.0 / 6.0, 2.0 / 6.0, 1.0 / 6.0],
    be: None,
    c: &[0.0, 1.0 / 2.0, 1.0 / 2.0, 1.0],
    e: None,
    e_low: None,
    d: None,
    p: 4,
    q: 0,
    fsal: false,
};

pub const RK4_THREE_EIGHTHS: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0],
        &[1.0 / 3.0, 0.0, 0.0, 0.0],
        &[-1.0 / 3.0, 1.0, 0.0, 0.0],
        &[1.0, -1.0, 1.0, 0.0],
    ],
    b: &[1.0 / 8.0, 3.0 / 8.0, 3.0 / 8.0, 1.0 / 8.0],
    be: None,
    c: &[0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0],
    e: None,
    e_low: None,
    d: None,
    p: 4,
    q: 0,
    fsal: false,
};

/// Order 4 only for linear problems with constant coefficients, 3 otherwise.
pub const MERSON4: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0, 0.0],
        &[1.0 / 3.0, 0.0, 0.0, 0.0, 0.0],
        &[1.0 / 6.0, 1.0 / 6.0, 0.0, 0.0, 0.0],
        &[1.0 / 8.0, 0.0, 3.0 / 8.0, 0.0, 0.0],
        &[1.0 / 2.0, 0.0, -3.0 / 2.0, 2.0, 0.0],
    ],
    b: &[1.0 / 6.0, 0.0, 0.0, 2.0 / 3.0, 1.0 / 6.0],
    be: Some(&[1.0 / 10.0, 0.0, 3.0 / 10.0, 2.0 / 5.0, 1.0 / 5.0]),
    c: &[0.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 2.0, 1.0],
    e: Some(&[1.0 / 15.0, 0.0, -3.0 / 10.0, 4.0 / 15.0, -1.0 / 30.0]),
    e_low: None,
    d: None,
    p: 4,
    q: 3,
    fsal: false,
};

pub const ZONNEVELD4: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0, 0.0],
        &[1.0 / 2.0, 0.0, 0.0, 0.0, 0.0],
        &[0.0, 1.0 / 2.0, 0.0, 0.0, 0.0],
        &[0.0, 0.0, 1.0, 0.0, 0.0],
        &[5.0 / 32.0, 7.0 / 32.0, 13.0 / 32.0, -1.0 / 32.0, 0.0],
    ],
    b: &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0, 0.0],
    be: Some(&[-1.0 / 2.0, 7.0 / 3.0, 7.0 / 3.0, 13.0 / 6.0, -16.0 / 3.0]),
    c: &[0.0, 1.0 / 2.0, 1.0 / 2.0, 1.0, 3.0 / 4.0],
    e: Some(&[2.0 / 3.0, -2.0, -2.0, -2.0, 16.0 / 3.0]),
    e_low: None,
    d: None,
    p: 4,
    q: 3,
    fsal: false,
};

/// Error estimates vanish identically for quadrature problems `y' = f(x)`.
pub const FEHLBERG4: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[1.0 / 4.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0, 0.0],
        &[1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0, 0.0],
        &[439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0, 0.0],
        &[-8.0 / 27.0, 2.0, -3544.0 / 2565.0, 1859.0 / 4104.0, -11.0 / 40.0, 0.0],
    ],
    b: &[25.0 / 216.0, 0.0, 1408.0 / 2565.0, 2197.0 / 4104.0, -1.0 / 5.0, 0.0],
    be: Some(&[16.0 / 135.0, 0.0, 6656.0 / 12825.0, 28561.0 / 56430.0, -9.0 / 50.0, 2.0 / 55.0]),
    c: &[0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0],
    e: Some(&[-1.0 / 360.0, 0.0, 128.0 / 4275.0, 2197.0 / 75240.0, -1.0 / 50.0, -2.0 / 55.0]),
    e_low: None,
    d: None,
    p: 4,
    q: 4,
    fsal: false,
};

pub const DOPRI5: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0, 0.0],
        &[19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0, 0.0],
        &[9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0, 0.0],
        &[35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0, 0.0],
    ],
    b: &[35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0, 0.0],
    be: Some(&[
        5179.0 / 57600.0,
        0.0,
        7571.0 / 16695.0,
        393.0 / 640.0,
        -92097.0 / 339200.0,
        187.0 / 2100.0,
        1.0 / 40.0,
    ]),
    c: &[0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0],
    e: Some(&[
        71.0 / 57600.0,
        0.0,
        -71.0 / 16695.0,
        71.0 / 1920.0,
        -17253.0 / 339200.0,
        22.0 / 525.0,
        -1.0 / 40.0,
    ]),
    e_low: None,
    d: Some(&[
        -12715105075.0 / 11282082432.0,
        0.0,
        87487479700.0 / 32700410799.0,
        -10690763975.0 / 1880347072.0,
        701980252875.0 / 199316789632.0,
        -1453857185.0 / 822651844.0,
        69997945.0 / 29380423.0,
    ]),
    p: 5,
    q: 4,
    fsal: true,
};

pub const VERNER6: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[1.0 / 6.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[4.0 / 75.0, 16.0 / 75.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[5.0 / 6.0, -8.0 / 3.0, 5.0 / 2.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[-165.0 / 64.0, 55.0 / 6.0, -425.0 / 64.0, 85.0 / 96.0, 0.0, 0.0, 0.0, 0.0],
        &[12.0 / 5.0, -8.0, 4015.0 / 612.0, -11.0 / 36.0, 88.0 / 255.0, 0.0, 0.0, 0.0],
        &[-8263.0 / 15000.0, 124.0 / 75.0, -643.0 / 680.0, -81.0 / 250.0, 2484.0 / 10625.0, 0.0, 0.0, 0.0],
        &[
            3501.0 / 1720.0,
            -300.0 / 43.0,
            297275.0 / 52632.0,
            -319.0 / 2322.0,
            24068.0 / 84065.0,
            0.0,
            3850.0 / 26703.0,
            0.0,
        ],
    ],
    b: &[3.0 / 40.0, 0.0, 875.0 / 2244.0, 23.0 / 72.0, 264.0 / 1955.0, 0.0, 125.0 / 11592.0, 43.0 / 616.0],
    be: Some(&[13.0 / 160.0, 0.0, 2375.0 / 5984.0, 5.0 / 16.0, 12.0 / 85.0, 3.0 / 44.0, 0.0, 0.0]),
    c: &[0.0, 1.0 / 6.0, 4.0 / 15.0, 2.0 / 3.0, 5.0 / 6.0, 1.0, 1.0 / 15.0, 1.0],
    e: Some(&[
        -1.0 / 160.0,
        0.0,
        -125.0 / 17952.0,
        1.0 / 144.0,
        -12.0 / 1955.0,
        -3.0 / 44.0,
        125.0 / 11592.0,
        43.0 / 616.0,
    ]),
    e_low: None,
    d: None,
    p: 6,
    q: 5,
    fsal: false,
};

/// Fehlberg 7(8). Like [`FEHLBERG4`], blind to quadrature problems.
pub const FEHLBERG7: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[2.0 / 27.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[1.0 / 36.0, 1.0 / 12.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[1.0 / 24.0, 0.0, 1.0 / 8.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[5.0 / 12.0, 0.0, -25.0 / 16.0, 25.0 / 16.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[1.0 / 20.0, 0.0, 0.0, 1.0 / 4.0, 1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[
            -25.0 / 108.0, 0.0, 0.0, 125.0 / 108.0, -65.0 / 27.0, 125.0 / 54.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ],
        &[
            31.0 / 300.0, 0.0, 0.0, 0.0, 61.0 / 225.0, -2.0 / 9.0, 13.0 / 900.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0,
        ],
        &[
            2.0, 0.0, 0.0, -53.0 / 6.0, 704.0 / 45.0, -107.0 / 9.0, 67.0 / 90.0, 3.0, 0.0, 0.0,
            0.0, 0.0, 0.0,
        ],
        &[
            -91.0 / 108.0, 0.0, 0.0, 23.0 / 108.0, -976.0 / 135.0, 311.0 / 54.0, -19.0 / 60.0,
            17.0 / 6.0, -1.0 / 12.0, 0.0, 0.0, 0.0, 0.0,
        ],
        &[
            2383.0 / 4100.0, 0.0, 0.0, -341.0 / 164.0, 4496.0 / 1025.0, -301.0 / 82.0,
            2133.0 / 4100.0, 45.0 / 82.0, 45.0 / 164.0, 18.0 / 41.0, 0.0, 0.0, 0.0,
        ],
        &[
            3.0 / 205.0, 0.0, 0.0, 0.0, 0.0, -6.0 / 41.0, -3.0 / 205.0, -3.0 / 41.0, 3.0 / 41.0,
            6.0 / 41.0, 0.0, 0.0, 0.0,
        ],
        &[
            -1777.0 / 4100.0, 0.0, 0.0, -341.0 / 164.0, 4496.0 / 1025.0, -289.0 / 82.0,
            2193.0 / 4100.0, 51.0 / 82.0, 33.0 / 164.0, 12.0 / 41.0, 0.0, 1.0, 0.0,
        ],
    ],
    b: &[
        41.0 / 840.0, 0.0, 0.0, 0.0, 0.0, 34.0 / 105.0, 9.0 / 35.0, 9.0 / 35.0, 9.0 / 280.0,
        9.0 / 280.0, 41.0 / 840.0, 0.0, 0.0,
    ],
    be: Some(&[
        0.0, 0.0, 0.0, 0.0, 0.0, 34.0 / 105.0, 9.0 / 35.0, 9.0 / 35.0, 9.0 / 280.0, 9.0 / 280.0,
        0.0, 41.0 / 840.0, 41.0 / 840.0,
    ]),
    c: &[
        0.0, 2.0 / 27.0, 1.0 / 9.0, 1.0 / 6.0, 5.0 / 12.0, 1.0 / 2.0, 5.0 / 6.0, 1.0 / 6.0,
        2.0 / 3.0, 1.0 / 3.0, 1.0, 0.0, 1.0,
    ],
    e: Some(&[
        41.0 / 840.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 41.0 / 840.0, -41.0 / 840.0,
        -41.0 / 840.0,
    ]),
    e_low: None,
    d: None,
    p: 7,
    q: 7,
    fsal: false,
};

/// Dormand-Prince 8(5,3). The error combines a fifth- and a third-order
/// estimate.
pub const DOPRI8: Tableau = Tableau {
    a: &[
        &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[0.05260015195876773, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[
            0.0197250569845379, 0.0591751709536137, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0,
        ],
        &[
            0.02958758547680685, 0.0, 0.08876275643042054, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0,
        ],
        &[
            0.2413651341592667, 0.0, -0.8845494793282861, 0.924834003261792, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0,
        ],
        &[
            0.037037037037037035, 0.0, 0.0, 0.17082860872947386, 0.12546768756682242, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ],
        &[
            0.037109375, 0.0, 0.0, 0.17025221101954405, 0.06021653898045596, -0.017578125, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ],
        &[
            0.03709200011850479, 0.0, 0.0, 0.17038392571223998, 0.10726203044637328,
            -0.015319437748624402, 0.008273789163814023, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ],
        &[
            0.6241109587160757, 0.0, 0.0, -3.3608926294469414, -0.868219346841726,
            27.59209969944671, 20.154067550477894, -43.48988418106996, 0.0, 0.0, 0.0, 0.0, 0.0,
        ],
        &[
            0.47766253643826434, 0.0, 0.0, -2.4881146199716677, -0.590290826836843,
            21.230051448181193, 15.279233632882423, -33.28821096898486, -0.020331201708508627,
            0.0, 0.0, 0.0, 0.0,
        ],
        &[
            -0.9371424300859873, 0.0, 0.0, 5.186372428844064, 1.0914373489967295,
            -8.149787010746927, -18.52006565999696, 22.739487099350505, 2.4936055526796523,
            -3.0467644718982196, 0.0, 0.0, 0.0,
        ],
        &[
            2.273310147516538, 0.0, 0.0, -10.53449546673725, -2.0008720582248625,
            -17.9589318631188, 27.94888452941996, -2.8589982771350235, -8.87285693353063,
            12.360567175794303, 0.6433927460157636, 0.0, 0.0,
        ],
        &[
            0.054293734116568765, 0.0, 0.0, 0.0, 0.0, 4.450312892752409, 1.8915178993145003,
            -5.801203960010585, 0.3111643669578199, -0.1521609496625161, 0.20136540080403034,
            0.04471061572777259, 0.0,
        ],
    ],
    b: &[
        0.054293734116568765, 0.0, 0.0, 0.0, 0.0, 4.450312892752409, 1.8915178993145003,
        -5.801203960010585, 0.3111643669578199, -0.1521609496625161, 0.20136540080403034,
        0.04471061572777259, 0.0,
    ],
    be: None,
    c: &[
        0.0, 0.05260015195876773, 0.0789002279381516, 0.1183503419072274, 0.2816496580927726,
        0.3333333333333333, 0.25, 0.3076923076923077, 0.6512820512820513, 0.6, 0.8571428571428571,
        1.0, 1.0,
    ],
    e: Some(&[
        0.01312004499419488, 0.0, 0.0, 0.0, 0.0, -1.2251564463762044, -0.4957589496572502,
        1.6643771824549864, -0.35032884874997366, 0.3341791187130175, 0.08192320648511571,
        -0.022355307863886294, 0.0,
    ]),
    e_low: Some(&[
        -0.18980075407240762, 0.0, 0.0, 0.0, 0.0, 4.450312892752409, 1.8915178993145003,
        -5.801203960010585, -0.4226823213237919, -0.1521609496625161, 0.20136540080403034,
        0.02265179219836082, 0.0,
    ]),
    d: None,
    p: 8,
    q: 7,
    fsal: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tableaux_are_consistent() {
        for t in [
            &MOEULER,
            &RK2,
            &RK3,
            &HEUN3,
            &RK4,
            &RK4_THREE_EIGHTHS,
            &MERSON4,
            &ZONNEVELD4,
            &FEHLBERG4,
            &DOPRI5,
            &VERNER6,
            &FEHLBERG7,
            &DOPRI8,
        ] {
            let s = t.nstg();
            assert_eq!(t.a.len(), s);
            assert_eq!(t.c.len(), s);
            let bsum: Float = t.b.iter().sum();
            assert!((bsum - 1.0).abs() < 1e-14);
            for e in [t.e, t.e_low].into_iter().flatten() {
                let esum: Float = e.iter().sum();
                assert!(esum.abs() < 1e-14);
            }
            for (i, row) in t.a.iter().enumerate() {
                assert_eq!(row.len(), s);
                assert!(row[i..].iter().all(|&aij| aij == 0.0));
                let rsum: Float = row.iter().sum();
                assert!((rsum - t.c[i]).abs() < 1e-13);
            }
            if let (Some(be), Some(e)) = (t.be, t.e) {
                for i in 0..s {
                    assert!((t.b[i] - be[i] - e[i]).abs() < 1e-14);
                }
            }
        }
    }
}
