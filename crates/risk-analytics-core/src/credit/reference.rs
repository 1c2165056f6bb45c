//! Reference-data seam for transition matrices and LGD tables.
//!
//! Providers hand out immutable, already-validated structures; analytics
//! functions take them as explicit parameters rather than reading any
//! global state.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::lgd::LgdTable;
use super::migration::TransitionMatrix;
use crate::error::RiskAnalyticsError;
use crate::RiskAnalyticsResult;

/// Transition-matrix source used when the caller names none.
pub const DEFAULT_SOURCE: &str = "SP";

pub trait ReferenceData {
    /// Transition matrix published by `source` (e.g. "SP", "MOODYS").
    fn transition_matrix(&self, source: &str) -> Option<&TransitionMatrix>;

    fn lgd_table(&self) -> &LgdTable;
}

/// Provider holding everything in memory, typically loaded once from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InMemoryReferenceData {
    #[serde(default)]
    transition_matrices: BTreeMap<String, TransitionMatrix>,
    #[serde(default)]
    lgd_table: LgdTable,
}

impl InMemoryReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transition_matrix(
        mut self,
        source: impl Into<String>,
        matrix: TransitionMatrix,
    ) -> Self {
        self.transition_matrices.insert(source.into(), matrix);
        self
    }

    pub fn with_lgd_table(mut self, table: LgdTable) -> Self {
        self.lgd_table = table;
        self
    }

    /// Parse `{"transition_matrices": {source: matrix}, "lgd_table": [...]}`.
    /// Every matrix and the table are validated while parsing.
    pub fn from_json(document: &str) -> RiskAnalyticsResult<Self> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.transition_matrices.keys().map(String::as_str)
    }
}

impl ReferenceData for InMemoryReferenceData {
    fn transition_matrix(&self, source: &str) -> Option<&TransitionMatrix> {
        self.transition_matrices.get(source)
    }

    fn lgd_table(&self) -> &LgdTable {
        &self.lgd_table
    }
}

/// Fetch a transition matrix, defaulting to the S&P source.
pub fn get_transition_matrix<'a, R: ReferenceData + ?Sized>(
    provider: &'a R,
    source: Option<&str>,
) -> RiskAnalyticsResult<&'a TransitionMatrix> {
    let source = source.unwrap_or(DEFAULT_SOURCE);
    provider
        .transition_matrix(source)
        .ok_or_else(|| RiskAnalyticsError::not_found("transition_matrix", source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::lgd::{market_lgd, Seniority};
    use rust_decimal_macros::dec;

    const DOC: &str = r#"{
        "transition_matrices": {
            "SP": {
                "ratings": ["IG", "HY", "D"],
                "probabilities": [
                    ["0.95", "0.04", "0.01"],
                    ["0.10", "0.80", "0.10"],
                    ["0", "0", "1"]
                ]
            }
        },
        "lgd_table": [
            {"rating": "IG", "seniority": "SENIOR_SECURED", "lgd": "0.30"},
            {"rating": "IG", "seniority": "SENIOR_UNSECURED", "lgd": "0.45"}
        ]
    }"#;

    #[test]
    fn test_load_and_lookup() {
        let data = InMemoryReferenceData::from_json(DOC).unwrap();
        let sp = get_transition_matrix(&data, None).unwrap();
        assert_eq!(sp.ratings().len(), 3);
        assert_eq!(sp.row("HY").unwrap()[2], dec!(0.10));
        assert_eq!(
            market_lgd(data.lgd_table(), "IG", Some(Seniority::SeniorUnsecured)).unwrap(),
            dec!(0.45)
        );
    }

    #[test]
    fn test_unknown_source() {
        let data = InMemoryReferenceData::from_json(DOC).unwrap();
        match get_transition_matrix(&data, Some("MOODYS")).unwrap_err() {
            RiskAnalyticsError::NotFound { kind, key } => {
                assert_eq!(kind, "transition_matrix");
                assert_eq!(key, "MOODYS");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_matrix_rejected_on_load() {
        let doc = r#"{"transition_matrices": {"SP": {"ratings": ["A"],
            "probabilities": [["0.5"]]}}}"#;
        assert!(matches!(
            InMemoryReferenceData::from_json(doc),
            Err(RiskAnalyticsError::Serialization(_))
        ));
    }

    #[test]
    fn test_trait_object_provider() {
        let matrix = TransitionMatrix::new(vec!["D".into()], vec![vec![dec!(1)]]).unwrap();
        let data = InMemoryReferenceData::new().with_transition_matrix("SP", matrix);
        let provider: &dyn ReferenceData = &data;
        assert!(get_transition_matrix(provider, Some("SP")).is_ok());
        assert!(provider.lgd_table().entries().is_empty());
    }
}
