//! Shared Decimal numerics: moments, square roots and small dense-matrix
//! helpers used across the analytic groups.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::RiskAnalyticsError;
use crate::RiskAnalyticsResult;

/// Absolute tolerance used when checking covariance symmetry.
pub(crate) const SYMMETRY_TOLERANCE: Decimal = dec!(0.0000000001);

pub(crate) fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = values.iter().sum();
    sum / Decimal::from(values.len() as i64)
}

/// Sample variance (n - 1 denominator). Caller guarantees `values.len() >= 2`.
pub(crate) fn sample_variance(values: &[Decimal], mean: Decimal) -> Decimal {
    let n = values.len();
    if n < 2 {
        return Decimal::ZERO;
    }
    let sum_sq: Decimal = values.iter().map(|r| (*r - mean) * (*r - mean)).sum();
    sum_sq / Decimal::from((n - 1) as i64)
}

/// Sample standard deviation; fails below two observations.
pub(crate) fn sample_std(values: &[Decimal], what: &str) -> RiskAnalyticsResult<Decimal> {
    if values.len() < 2 {
        return Err(RiskAnalyticsError::InsufficientData(format!(
            "{} requires at least 2 observations, got {}",
            what,
            values.len()
        )));
    }
    let m = mean(values);
    Ok(sqrt_decimal(sample_variance(values, m)))
}

/// Square root clamped at zero for non-positive input.
pub(crate) fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    val.sqrt().unwrap_or(Decimal::ZERO)
}

/// Dot product.
pub(crate) fn vec_dot(a: &[Decimal], b: &[Decimal]) -> Decimal {
    a.iter().zip(b.iter()).map(|(x, y)| *x * *y).sum()
}

/// Matrix-vector multiplication.
pub(crate) fn mat_vec_multiply(mat: &[Vec<Decimal>], v: &[Decimal]) -> Vec<Decimal> {
    mat.iter().map(|row| vec_dot(row, v)).collect()
}

/// Portfolio variance: w' * Sigma * w.
pub(crate) fn portfolio_variance(w: &[Decimal], sigma: &[Vec<Decimal>]) -> Decimal {
    let sigma_w = mat_vec_multiply(sigma, w);
    vec_dot(w, &sigma_w)
}

/// Largest absolute row sum; an upper bound on the spectral radius.
pub(crate) fn max_abs_row_sum(mat: &[Vec<Decimal>]) -> Decimal {
    mat.iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<Decimal>())
        .fold(Decimal::ZERO, Decimal::max)
}

/// Largest absolute entry of a matrix.
pub(crate) fn max_abs_entry(mat: &[Vec<Decimal>]) -> Decimal {
    mat.iter()
        .flatten()
        .map(|v| v.abs())
        .fold(Decimal::ZERO, Decimal::max)
}

/// Basis of the null space of `mat` by Gauss-Jordan elimination with partial
/// pivoting. Pivots at or below `tolerance` count as zero. Each basis vector
/// has a 1 in its free column and 0 in every other free column.
pub(crate) fn null_space_basis(mat: &[Vec<Decimal>], tolerance: Decimal) -> Vec<Vec<Decimal>> {
    let rows = mat.len();
    let cols = mat.first().map_or(0, Vec::len);
    let mut m = mat.to_vec();
    let mut pivot_cols = Vec::new();

    let mut r = 0;
    for c in 0..cols {
        if r == rows {
            break;
        }
        let (best, best_abs) = (r..rows)
            .map(|i| (i, m[i][c].abs()))
            .fold((r, Decimal::ZERO), |acc, x| if x.1 > acc.1 { x } else { acc });
        if best_abs <= tolerance {
            continue;
        }
        m.swap(r, best);
        let pivot = m[r][c];
        for v in m[r].iter_mut() {
            *v /= pivot;
        }
        let pivot_row = m[r].clone();
        for (i, row) in m.iter_mut().enumerate() {
            let factor = row[c];
            if i == r || factor.is_zero() {
                continue;
            }
            for (v, p) in row.iter_mut().zip(pivot_row.iter()) {
                *v -= factor * *p;
            }
        }
        pivot_cols.push(c);
        r += 1;
    }

    (0..cols)
        .filter(|c| !pivot_cols.contains(c))
        .map(|free| {
            let mut b = vec![Decimal::ZERO; cols];
            b[free] = Decimal::ONE;
            for (row, pc) in pivot_cols.iter().enumerate() {
                b[*pc] = -m[row][free];
            }
            b
        })
        .collect()
}

/// Check that `cov` is an `n x n` symmetric matrix with a non-negative
/// diagonal. Shape problems are structural, not numeric.
#[allow(clippy::needless_range_loop)]
pub(crate) fn validate_covariance(cov: &[Vec<Decimal>], n: usize) -> RiskAnalyticsResult<()> {
    if cov.len() != n {
        return Err(RiskAnalyticsError::structural(
            "covariance_matrix",
            format!("expected {}x{} matrix but got {} rows", n, n, cov.len()),
        ));
    }
    for (i, row) in cov.iter().enumerate() {
        if row.len() != n {
            return Err(RiskAnalyticsError::structural(
                "covariance_matrix",
                format!("row {} has {} columns, expected {}", i, row.len(), n),
            ));
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if (cov[i][j] - cov[j][i]).abs() > SYMMETRY_TOLERANCE {
                return Err(RiskAnalyticsError::structural(
                    "covariance_matrix",
                    format!(
                        "not symmetric: [{},{}]={} != [{},{}]={}",
                        i, j, cov[i][j], j, i, cov[j][i]
                    ),
                ));
            }
        }
    }
    for i in 0..n {
        if cov[i][i] < Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                format!("covariance_matrix[{}][{}]", i, i),
                "variance must be non-negative",
            ));
        }
    }
    Ok(())
}

/// Sample covariance matrix of aligned return series (one series per asset).
#[allow(clippy::needless_range_loop)]
pub fn covariance_from_returns(series: &[Vec<Decimal>]) -> RiskAnalyticsResult<Vec<Vec<Decimal>>> {
    let n = series.len();
    if n == 0 {
        return Err(RiskAnalyticsError::InsufficientData(
            "at least one return series is required".into(),
        ));
    }
    let t = series[0].len();
    for (i, s) in series.iter().enumerate() {
        if s.len() != t {
            return Err(RiskAnalyticsError::structural(
                format!("series[{}]", i),
                format!("length {} differs from series[0] length {}", s.len(), t),
            ));
        }
    }
    if t < 2 {
        return Err(RiskAnalyticsError::InsufficientData(format!(
            "covariance requires at least 2 observations, got {}",
            t
        )));
    }
    let means: Vec<Decimal> = series.iter().map(|s| mean(s)).collect();
    let denom = Decimal::from((t - 1) as i64);
    let mut cov = vec![vec![Decimal::ZERO; n]; n];
    for i in 0..n {
        for j in i..n {
            let c: Decimal = (0..t)
                .map(|k| (series[i][k] - means[i]) * (series[j][k] - means[j]))
                .sum::<Decimal>()
                / denom;
            cov[i][j] = c;
            cov[j][i] = c;
        }
    }
    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sample_variance() {
        let v = vec![dec!(1), dec!(2), dec!(3), dec!(4)];
        let m = mean(&v);
        assert_eq!(m, dec!(2.5));
        // squared deviations: 2.25 + 0.25 + 0.25 + 2.25 = 5, / 3
        assert_eq!(sample_variance(&v, m), dec!(5) / dec!(3));
    }

    #[test]
    fn test_sample_std_requires_two() {
        assert!(matches!(
            sample_std(&[dec!(0.1)], "test"),
            Err(RiskAnalyticsError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_sqrt_exact_square() {
        assert!((sqrt_decimal(dec!(0.25)) - dec!(0.5)).abs() < dec!(0.000000000001));
        assert_eq!(sqrt_decimal(dec!(-1)), Decimal::ZERO);
    }

    #[test]
    fn test_validate_covariance_rejects_ragged() {
        let cov = vec![vec![dec!(1), dec!(0)], vec![dec!(0)]];
        assert!(matches!(
            validate_covariance(&cov, 2),
            Err(RiskAnalyticsError::Structural { .. })
        ));
    }

    #[test]
    fn test_validate_covariance_rejects_asymmetric() {
        let cov = vec![vec![dec!(1), dec!(0.2)], vec![dec!(0.3), dec!(1)]];
        assert!(matches!(
            validate_covariance(&cov, 2),
            Err(RiskAnalyticsError::Structural { .. })
        ));
    }

    #[test]
    fn test_null_space_of_singular_matrix() {
        // perfectly hedged pair: S [1, 1]' = 0
        let m = vec![vec![dec!(0.04), dec!(-0.04)], vec![dec!(-0.04), dec!(0.04)]];
        let basis = null_space_basis(&m, dec!(0.000000000001));
        assert_eq!(basis, vec![vec![dec!(1), dec!(1)]]);
        assert!(mat_vec_multiply(&m, &basis[0]).iter().all(|v| v.is_zero()));
    }

    #[test]
    fn test_null_space_full_rank_and_zero() {
        let full = vec![vec![dec!(2), dec!(1)], vec![dec!(1), dec!(3)]];
        assert!(null_space_basis(&full, dec!(0.000000000001)).is_empty());

        let zero = vec![vec![Decimal::ZERO; 3]; 3];
        assert_eq!(null_space_basis(&zero, Decimal::ZERO).len(), 3);
    }

    #[test]
    fn test_covariance_from_returns() {
        let a = vec![dec!(0.01), dec!(0.03), dec!(0.02)];
        let b = vec![dec!(0.02), dec!(0.06), dec!(0.04)];
        let cov = covariance_from_returns(&[a, b]).unwrap();
        assert_eq!(cov[0][0], dec!(0.0001));
        assert_eq!(cov[1][1], dec!(0.0004));
        assert_eq!(cov[0][1], dec!(0.0002));
        assert_eq!(cov[0][1], cov[1][0]);
    }

    #[test]
    fn test_covariance_ragged_series() {
        let a = vec![dec!(0.01), dec!(0.03)];
        let b = vec![dec!(0.02)];
        assert!(matches!(
            covariance_from_returns(&[a, b]),
            Err(RiskAnalyticsError::Structural { .. })
        ));
    }
}
