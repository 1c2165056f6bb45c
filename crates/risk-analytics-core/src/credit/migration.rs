use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::RiskAnalyticsError;
use crate::types::{Money, Rate};
use crate::RiskAnalyticsResult;

/// Largest accepted deviation of a row sum from 1.
const ROW_SUM_TOLERANCE: Decimal = dec!(0.001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Row-stochastic rating transition matrix. Row i = from `ratings[i]`,
/// column j = to `ratings[j]`.
///
/// Construction (including deserialisation) validates the shape and the
/// stochastic rows; consumers rely on the invariant and do not re-check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransitionMatrixData")]
pub struct TransitionMatrix {
    ratings: Vec<String>,
    probabilities: Vec<Vec<Decimal>>,
}

#[derive(Deserialize)]
struct TransitionMatrixData {
    ratings: Vec<String>,
    probabilities: Vec<Vec<Decimal>>,
}

impl TryFrom<TransitionMatrixData> for TransitionMatrix {
    type Error = RiskAnalyticsError;

    fn try_from(data: TransitionMatrixData) -> Result<Self, Self::Error> {
        TransitionMatrix::new(data.ratings, data.probabilities)
    }
}

/// Spread per rating, as a decimal (0.015 = 150 bps).
pub type SpreadCurve = BTreeMap<String, Rate>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationPnlInput {
    pub current_rating: String,
    /// Market value of the long position.
    pub position_value: Money,
    pub spread_curve: SpreadCurve,
    /// Spread duration scaling the spread change (default 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_duration: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationScenario {
    pub target_rating: String,
    pub probability: Rate,
    pub spread: Rate,
    pub pnl: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPnl {
    pub current_rating: String,
    pub current_spread: Rate,
    /// Reachable targets in matrix order.
    pub scenarios: Vec<MigrationScenario>,
    /// Probability-weighted P&L across scenarios.
    pub expected_pnl: Money,
}

// ---------------------------------------------------------------------------
// Transition matrix
// ---------------------------------------------------------------------------

impl TransitionMatrix {
    pub fn new(
        ratings: Vec<String>,
        probabilities: Vec<Vec<Decimal>>,
    ) -> RiskAnalyticsResult<Self> {
        let n = ratings.len();
        if n == 0 {
            return Err(RiskAnalyticsError::structural(
                "transition_matrix.ratings",
                "at least one rating is required",
            ));
        }
        if let Some(dup) = ratings
            .iter()
            .enumerate()
            .find(|(i, r)| ratings[..*i].contains(*r))
            .map(|(_, r)| r)
        {
            return Err(RiskAnalyticsError::validation(
                "transition_matrix.ratings",
                format!("duplicate rating '{}'", dup),
            ));
        }
        if probabilities.len() != n {
            return Err(RiskAnalyticsError::structural(
                "transition_matrix.probabilities",
                format!("matrix has {} rows but {} ratings", probabilities.len(), n),
            ));
        }
        for (i, row) in probabilities.iter().enumerate() {
            if row.len() != n {
                return Err(RiskAnalyticsError::structural(
                    format!("transition_matrix.probabilities[{}]", i),
                    format!("row has {} columns but {} ratings", row.len(), n),
                ));
            }
            if let Some((j, p)) = row
                .iter()
                .enumerate()
                .find(|(_, p)| **p < Decimal::ZERO || **p > Decimal::ONE)
            {
                return Err(RiskAnalyticsError::validation(
                    format!("transition_matrix.probabilities[{}][{}]", i, j),
                    format!("probability {} must be in [0, 1]", p),
                ));
            }
            let row_sum: Decimal = row.iter().sum();
            if (row_sum - Decimal::ONE).abs() > ROW_SUM_TOLERANCE {
                return Err(RiskAnalyticsError::validation(
                    format!("transition_matrix.probabilities[{}]", i),
                    format!("row '{}' sums to {}", ratings[i], row_sum),
                ));
            }
        }
        Ok(TransitionMatrix {
            ratings,
            probabilities,
        })
    }

    pub fn ratings(&self) -> &[String] {
        &self.ratings
    }

    pub fn probabilities(&self) -> &[Vec<Decimal>] {
        &self.probabilities
    }

    pub fn index_of(&self, rating: &str) -> Option<usize> {
        self.ratings.iter().position(|r| r == rating)
    }

    pub fn row(&self, rating: &str) -> Option<&[Decimal]> {
        self.index_of(rating).map(|i| self.probabilities[i].as_slice())
    }

    /// Multi-period matrix by repeated squaring; `power(0)` is the identity.
    pub fn power(&self, years: u32) -> TransitionMatrix {
        let n = self.ratings.len();
        let mut result = identity(n);
        let mut base = self.probabilities.clone();
        let mut e = years;
        while e > 0 {
            if e & 1 == 1 {
                result = matrix_multiply(&result, &base);
            }
            e >>= 1;
            if e > 0 {
                base = matrix_multiply(&base, &base);
            }
        }
        TransitionMatrix {
            ratings: self.ratings.clone(),
            probabilities: result,
        }
    }

    /// Probability of reaching `default_state` from `rating` within `years`.
    pub fn cumulative_default_probability(
        &self,
        rating: &str,
        years: u32,
        default_state: &str,
    ) -> RiskAnalyticsResult<Rate> {
        let from = self
            .index_of(rating)
            .ok_or_else(|| RiskAnalyticsError::not_found("rating", rating))?;
        let to = self
            .index_of(default_state)
            .ok_or_else(|| RiskAnalyticsError::not_found("rating", default_state))?;
        Ok(self.power(years).probabilities[from][to])
    }
}

fn identity(n: usize) -> Vec<Vec<Decimal>> {
    let mut id = vec![vec![Decimal::ZERO; n]; n];
    for (i, row) in id.iter_mut().enumerate() {
        row[i] = Decimal::ONE;
    }
    id
}

#[allow(clippy::needless_range_loop)]
fn matrix_multiply(a: &[Vec<Decimal>], b: &[Vec<Decimal>]) -> Vec<Vec<Decimal>> {
    let n = a.len();
    let mut result = vec![vec![Decimal::ZERO; n]; n];
    for i in 0..n {
        for j in 0..n {
            let mut s = Decimal::ZERO;
            for k in 0..n {
                s += a[i][k] * b[k][j];
            }
            result[i][j] = s;
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Migration P&L
// ---------------------------------------------------------------------------

/// Mark-to-market P&L of a long position for each rating it can migrate to
/// over one period.
///
/// `pnl = -position_value * spread_duration * (spread[target] - spread[current])`,
/// so spread widening loses money. Targets with zero transition probability
/// are not reachable and are skipped.
pub fn migration_pnl(
    input: &MigrationPnlInput,
    matrix: &TransitionMatrix,
) -> RiskAnalyticsResult<MigrationPnl> {
    let current_spread = *input
        .spread_curve
        .get(&input.current_rating)
        .ok_or_else(|| {
            RiskAnalyticsError::not_found("spread_curve rating", &input.current_rating)
        })?;
    let row = matrix
        .row(&input.current_rating)
        .ok_or_else(|| {
            RiskAnalyticsError::not_found("transition_matrix rating", &input.current_rating)
        })?;
    let duration = input.spread_duration.unwrap_or(Decimal::ONE);

    let mut scenarios = Vec::new();
    let mut expected_pnl = Decimal::ZERO;
    for (target, probability) in matrix.ratings.iter().zip(row.iter()) {
        if probability.is_zero() {
            continue;
        }
        let spread = *input
            .spread_curve
            .get(target)
            .ok_or_else(|| RiskAnalyticsError::not_found("spread_curve rating", target))?;
        let pnl = -input.position_value * duration * (spread - current_spread);
        expected_pnl += *probability * pnl;
        scenarios.push(MigrationScenario {
            target_rating: target.clone(),
            probability: *probability,
            spread,
            pnl,
        });
    }

    Ok(MigrationPnl {
        current_rating: input.current_rating.clone(),
        current_spread,
        scenarios,
        expected_pnl,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn small_matrix() -> TransitionMatrix {
        TransitionMatrix::new(
            vec!["A".into(), "BBB".into(), "BB".into(), "D".into()],
            vec![
                vec![dec!(0.90), dec!(0.08), dec!(0.02), dec!(0)],
                vec![dec!(0.05), dec!(0.85), dec!(0.08), dec!(0.02)],
                vec![dec!(0), dec!(0.10), dec!(0.80), dec!(0.10)],
                vec![dec!(0), dec!(0), dec!(0), dec!(1)],
            ],
        )
        .unwrap()
    }

    fn curve() -> SpreadCurve {
        [
            ("A", dec!(0.0100)),
            ("BBB", dec!(0.0150)),
            ("BB", dec!(0.0300)),
            ("D", dec!(0.6000)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_power_identity_and_one() {
        let m = small_matrix();
        assert_eq!(m.power(0).probabilities()[1], vec![dec!(0), dec!(1), dec!(0), dec!(0)]);
        assert_eq!(m.power(1), m);
    }

    #[test]
    fn test_power_two_rows_stochastic() {
        let m2 = small_matrix().power(2);
        for row in m2.probabilities() {
            let s: Decimal = row.iter().sum();
            assert_eq!(s, Decimal::ONE);
        }
    }

    #[test]
    fn test_cumulative_default_two_years() {
        // BBB -> D in two steps: 0.05*0 + 0.85*0.02 + 0.08*0.10 + 0.02*1
        let pd = small_matrix()
            .cumulative_default_probability("BBB", 2, "D")
            .unwrap();
        assert_eq!(pd, dec!(0.045));
    }

    #[test]
    fn test_cumulative_default_unknown_rating() {
        assert!(matches!(
            small_matrix().cumulative_default_probability("AAA", 1, "D"),
            Err(RiskAnalyticsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_new_rejects_bad_rows() {
        let r = TransitionMatrix::new(
            vec!["A".into(), "D".into()],
            vec![vec![dec!(0.5), dec!(0.4)], vec![dec!(0), dec!(1)]],
        );
        assert!(matches!(r, Err(RiskAnalyticsError::Validation { .. })));

        let r = TransitionMatrix::new(vec!["A".into(), "D".into()], vec![vec![dec!(1), dec!(0)]]);
        assert!(matches!(r, Err(RiskAnalyticsError::Structural { .. })));
    }

    #[test]
    fn test_deserialise_validates() {
        let bad = serde_json::json!({
            "ratings": ["A", "D"],
            "probabilities": [[0.7, 0.7], [0, 1]]
        });
        assert!(serde_json::from_value::<TransitionMatrix>(bad).is_err());
    }

    #[test]
    fn test_migration_pnl_signs() {
        let input = MigrationPnlInput {
            current_rating: "BBB".into(),
            position_value: dec!(1000000),
            spread_curve: curve(),
            spread_duration: None,
        };
        let out = migration_pnl(&input, &small_matrix()).unwrap();
        let targets: Vec<&str> = out.scenarios.iter().map(|s| s.target_rating.as_str()).collect();
        assert_eq!(targets, vec!["A", "BBB", "BB", "D"]);

        // upgrade tightens the spread: gain
        assert_eq!(out.scenarios[0].pnl, dec!(5000));
        assert_eq!(out.scenarios[1].pnl, Decimal::ZERO);
        // downgrade widens: loss
        assert_eq!(out.scenarios[2].pnl, dec!(-15000));
        assert_eq!(out.scenarios[3].pnl, dec!(-585000));
        // 0.05*5000 + 0.08*(-15000) + 0.02*(-585000)
        assert_eq!(out.expected_pnl, dec!(-12650));
    }

    #[test]
    fn test_migration_pnl_skips_unreachable() {
        let input = MigrationPnlInput {
            current_rating: "A".into(),
            position_value: dec!(100),
            spread_curve: curve(),
            spread_duration: Some(dec!(4)),
        };
        let out = migration_pnl(&input, &small_matrix()).unwrap();
        assert_eq!(out.scenarios.len(), 3);
        // -100 * 4 * 0.005
        assert_eq!(out.scenarios[1].pnl, dec!(-2));
    }

    #[test]
    fn test_migration_pnl_unknown_current_rating() {
        let mut spreads = curve();
        spreads.remove("BBB");
        let input = MigrationPnlInput {
            current_rating: "BBB".into(),
            position_value: dec!(100),
            spread_curve: spreads,
            spread_duration: None,
        };
        match migration_pnl(&input, &small_matrix()).unwrap_err() {
            RiskAnalyticsError::NotFound { key, .. } => assert_eq!(key, "BBB"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
