//! Pearson correlation with two-sided significance.
//!
//! The p-value comes from the exact t-distribution with n−2 degrees of
//! freedom: p = I_x(df/2, 1/2) with x = df/(df + t²), evaluated through
//! the regularised incomplete beta function (Lentz continued fraction,
//! Lanczos ln-gamma).

/// Population variance across a sample vector.
pub fn variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64
}

/// Pearson correlation coefficient and two-sided p-value.
///
/// Returns `None` when fewer than three paired samples exist, the slices
/// disagree in length, or either vector has zero variance (the
/// coefficient is undefined there).
pub fn pearson(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len();
    if n != y.len() || n < 3 {
        return None;
    }
    let nf = n as f64;

    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let mut ss_x = 0.0;
    let mut ss_y = 0.0;
    let mut ss_xy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        ss_x += dx * dx;
        ss_y += dy * dy;
        ss_xy += dx * dy;
    }

    if ss_x <= 0.0 || ss_y <= 0.0 {
        return None;
    }

    let r = (ss_xy / (ss_x * ss_y).sqrt()).clamp(-1.0, 1.0);
    let df = nf - 2.0;

    // |r| = 1 drives t to infinity; the beta argument goes to 0 and the
    // p-value to 0, so short-circuit instead of dividing by zero.
    let denom = 1.0 - r * r;
    let p = if denom <= f64::EPSILON {
        0.0
    } else {
        let t = r * (df / denom).sqrt();
        incomplete_beta(0.5 * df, 0.5, df / (df + t * t)).clamp(0.0, 1.0)
    };

    Some((r, p))
}

/// Natural log of the gamma function, Lanczos approximation (g = 7).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_59,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_571_6e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        // Reflection formula keeps the approximation in its stable range.
        let pi = std::f64::consts::PI;
        (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let t = x + 7.5;
        let mut sum = COEFFS[0];
        for (i, &c) in COEFFS.iter().enumerate().skip(1) {
            sum += c / (x + i as f64);
        }
        0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
    }
}

/// Continued-fraction evaluation for the incomplete beta function
/// (modified Lentz's method).
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-14;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let mf = m as f64;
        let m2 = 2.0 * mf;

        let aa = mf * (b - mf) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + mf) * (qab + mf) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularised incomplete beta function I_x(a, b).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b)
        + a * x.ln()
        + b * (1.0 - x).ln();
    let front = ln_front.exp();
    // The continued fraction converges fast only below the symmetry point.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_anticorrelation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [5.0, 4.0, 3.0, 2.0, 1.0];
        let (r, p) = pearson(&x, &y).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
        assert!(p < 1e-10);
    }

    #[test]
    fn test_uncorrelated_vectors() {
        // Covariance is exactly zero by construction.
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, -1.0, -1.0, 1.0];
        let (r, p) = pearson(&x, &y).unwrap();
        assert!(r.abs() < 1e-12);
        assert!((p - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_variance_is_undefined() {
        let x = [2.0, 2.0, 2.0, 2.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        assert!(pearson(&x, &y).is_none());
        assert_eq!(variance(&x), 0.0);
    }

    #[test]
    fn test_too_few_samples() {
        assert!(pearson(&[1.0, 2.0], &[2.0, 1.0]).is_none());
    }

    #[test]
    fn test_p_value_shrinks_with_sample_size() {
        // The same moderate correlation becomes more significant as n grows.
        let noisy = |n: usize| -> (Vec<f64>, Vec<f64>) {
            let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let y: Vec<f64> = (0..n)
                .map(|i| -(i as f64) + if i % 2 == 0 { 1.5 } else { -1.5 })
                .collect();
            (x, y)
        };
        let (x5, y5) = noisy(6);
        let (x20, y20) = noisy(20);
        let (_, p_small) = pearson(&x5, &y5).unwrap();
        let (_, p_large) = pearson(&x20, &y20).unwrap();
        assert!(p_large < p_small);
        assert!(p_small > 0.0 && p_small < 1.0);
    }

    #[test]
    fn test_ln_gamma_known_values() {
        // Γ(1) = 1, Γ(0.5) = √π, Γ(5) = 24
        assert!(ln_gamma(1.0).abs() < 1e-10);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
        assert!((ln_gamma(5.0) - 24.0f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn test_incomplete_beta_bounds_and_symmetry() {
        assert_eq!(incomplete_beta(2.0, 3.0, 0.0), 0.0);
        assert_eq!(incomplete_beta(2.0, 3.0, 1.0), 1.0);
        // I_x(a, b) = 1 - I_{1-x}(b, a)
        let x = 0.37;
        let lhs = incomplete_beta(2.0, 3.0, x);
        let rhs = 1.0 - incomplete_beta(3.0, 2.0, 1.0 - x);
        assert!((lhs - rhs).abs() < 1e-12);
        // I_x(1, 1) is the uniform CDF.
        assert!((incomplete_beta(1.0, 1.0, 0.25) - 0.25).abs() < 1e-12);
    }
}
