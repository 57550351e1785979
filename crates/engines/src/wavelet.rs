//! Daubechies-4 discrete wavelet transform with symmetric boundary extension.
//!
//! Analysis keeps the boundary coefficients (`(n + 7) / 2` per band), so synthesis
//! reproduces the input exactly over `0..n`.

const DB4_DEC_LO: [f64; 8] = [
    -0.010597401784997278,
    0.032883011666982945,
    0.030841381835986965,
    -0.18703481171888114,
    -0.02798376941698385,
    0.6308807679295904,
    0.7148465705525415,
    0.23037781330885523,
];

const FILTER_LEN: usize = DB4_DEC_LO.len();

/// Inputs shorter than this are returned unchanged by [`denoise`].
pub const MIN_DENOISE_LEN: usize = 8;

fn dec_hi() -> [f64; FILTER_LEN] {
    let mut hi = [0.0; FILTER_LEN];
    for (k, h) in hi.iter_mut().enumerate() {
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        *h = sign * DB4_DEC_LO[FILTER_LEN - 1 - k];
    }
    hi
}

/// Index into `x` for position `i` of its half-sample symmetric extension.
fn symmetric_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 1 - m
    }
}

fn analyze(x: &[f64], filter: &[f64; FILTER_LEN]) -> Vec<f64> {
    let n = x.len();
    let out_len = (n + FILTER_LEN - 1) / 2;
    (0..out_len)
        .map(|k| {
            let i = (2 * k + 1) as isize;
            filter
                .iter()
                .enumerate()
                .map(|(j, f)| f * x[symmetric_index(i - j as isize, n)])
                .sum()
        })
        .collect()
}

/// Inverse of one analysis step, producing `out_len` samples.
fn synthesize(approx: &[f64], detail: Option<&[f64]>, out_len: usize) -> Vec<f64> {
    let hi = dec_hi();
    let mut out = vec![0.0; out_len];
    for (t, value) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, a) in approx.iter().enumerate() {
            let j = 2 * k as isize + 1 - t as isize;
            if j < 0 || j >= FILTER_LEN as isize {
                continue;
            }
            let j = j as usize;
            acc += a * DB4_DEC_LO[j];
            if let Some(d) = detail {
                acc += d[k] * hi[j];
            }
        }
        *value = acc;
    }
    out
}

/// Multi-level decomposition. `details[0]` is the coarsest band.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub approx: Vec<f64>,
    pub details: Vec<Vec<f64>>,
    lengths: Vec<usize>,
}

pub fn decompose(x: &[f64], level: usize) -> Decomposition {
    let hi = dec_hi();
    let mut approx = x.to_vec();
    let mut details = Vec::with_capacity(level);
    let mut lengths = Vec::with_capacity(level);

    for _ in 0..level {
        if approx.is_empty() {
            break;
        }
        lengths.push(approx.len());
        let detail = analyze(&approx, &hi);
        approx = analyze(&approx, &DB4_DEC_LO);
        details.push(detail);
    }

    details.reverse();
    lengths.reverse();
    Decomposition { approx, details, lengths }
}

impl Decomposition {
    pub fn reconstruct(&self) -> Vec<f64> {
        self.rebuild(true)
    }

    /// Reconstruction from the approximation band alone.
    pub fn reconstruct_approx(&self) -> Vec<f64> {
        self.rebuild(false)
    }

    fn rebuild(&self, with_details: bool) -> Vec<f64> {
        let mut current = self.approx.clone();
        for (detail, &len) in self.details.iter().zip(self.lengths.iter()) {
            let detail = if with_details { Some(detail.as_slice()) } else { None };
            current = synthesize(&current, detail, len);
        }
        current
    }
}

/// Low-pass the series by dropping every detail band.
pub fn denoise(prices: &[f64], level: usize) -> Vec<f64> {
    if prices.len() < MIN_DENOISE_LEN {
        return prices.to_vec();
    }
    let mut denoised = decompose(prices, level).reconstruct_approx();
    denoised.truncate(prices.len());
    denoised
}
