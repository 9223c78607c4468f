//! Recognised case types and the fields each one provides

// standard library
use std::str::FromStr;

// crate modules
use crate::error::Error;

// datafoam modules
use datafoam_tensor::{SymmetricNames, BASIS_SIZE};

// external crates
use serde::{Deserialize, Serialize};

/// Number of `I1_i`/`I2_i` invariant pairs written for RANS cases
pub const N_INVARIANTS: usize = 47;

/// Number of non-dimensional `q` groups written for RANS cases
pub const N_Q: usize = 4;

/// Number of `lambda` scalar invariants written for RANS cases
pub const N_LAMBDA: usize = 5;

/// Closed set of supported case types
///
/// The type decides which fields are extracted from a finished case. RANS
/// types also carry the closure features (invariants, basis tensors, `q` and
/// `lambda`) written by the field-writing utility, while reference data only
/// carries velocity and stress related fields.
///
/// ```rust
/// # use datafoam_case::CaseType;
/// let case_type: CaseType = "komegasst".parse().unwrap();
/// let fields = case_type.field_list();
/// assert!(fields.contains(&"omega".to_string()));
/// assert!(fields.contains(&"I2_47".to_string()));
/// assert!(fields.contains(&"T10".to_string()));
///
/// assert!(!CaseType::Les.field_list().contains(&"T1".to_string()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseType {
    #[serde(rename = "kepsilonphitf")]
    KEpsilonPhitF,
    #[serde(rename = "komegasst")]
    KOmegaSst,
    #[serde(rename = "les", alias = "LES")]
    Les,
    #[serde(rename = "dns", alias = "DNS")]
    Dns,
}

impl CaseType {
    /// Fields read directly from the case, always ending with `C`
    pub fn primary_fields(&self) -> &'static [&'static str] {
        match self {
            CaseType::KEpsilonPhitF => &[
                "k", "epsilon", "T_t_ke", "T_t_nut", "T_k", "U", "gradp", "gradk", "gradv2",
                "p", "DUDt", "wallDistance", "nut", "phit", "f", "S", "Shat", "R", "Rhat", "Av2",
                "Ak", "Av2hat", "Akhat", "gradU", "skewness", "C",
            ],
            CaseType::KOmegaSst => &[
                "k", "omega", "epsilon", "T_t_ke", "T_t_nut", "T_k", "U", "gradp", "gradk",
                "gradomega", "p", "DUDt", "wallDistance", "nut", "S", "Shat", "R", "Rhat", "Ap",
                "Ak", "Aphat", "Akhat", "gradU", "skewness", "C",
            ],
            CaseType::Les => &[
                "UMean", "gradUMean", "tauMean", "SMean", "RMean", "kMean", "kMean_tauMean",
                "aMean", "bMean", "C",
            ],
            CaseType::Dns => &["U", "tau", "a", "b", "k", "gradU", "S", "R", "C"],
        }
    }

    /// True for RANS types, which carry the closure features
    pub fn is_rans(&self) -> bool {
        matches!(self, CaseType::KEpsilonPhitF | CaseType::KOmegaSst)
    }

    /// Every field name extracted for this type
    ///
    /// RANS types append `I1_i`/`I2_i` interleaved for i in 1..=47, then
    /// `T1..T10`, `q1..q4` and `lambda1..lambda5`.
    pub fn field_list(&self) -> Vec<String> {
        let mut fields = self
            .primary_fields()
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<String>>();

        if self.is_rans() {
            fields.extend(invariant_names());
            fields.extend(basis_names());
            fields.extend(numbered("q", N_Q));
            fields.extend(numbered("lambda", N_LAMBDA));
        }
        fields
    }

    /// Names that hold symmetric tensors for this type
    pub fn symmetric_names(&self) -> SymmetricNames {
        match self {
            CaseType::KEpsilonPhitF | CaseType::KOmegaSst => SymmetricNames::default(),
            CaseType::Les => SymmetricNames::default()
                .with("SMean")
                .with("tauMean")
                .with("aMean")
                .with("bMean"),
            CaseType::Dns => ["tau", "S", "a", "b"].into_iter().collect(),
        }
    }

    /// Lowercase name, as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            CaseType::KEpsilonPhitF => "kepsilonphitf",
            CaseType::KOmegaSst => "komegasst",
            CaseType::Les => "les",
            CaseType::Dns => "dns",
        }
    }
}

impl std::fmt::Display for CaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CaseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kepsilonphitf" => Ok(CaseType::KEpsilonPhitF),
            "komegasst" => Ok(CaseType::KOmegaSst),
            "les" => Ok(CaseType::Les),
            "dns" => Ok(CaseType::Dns),
            _ => Err(Error::UnknownCaseType(s.to_string())),
        }
    }
}

/// `I1_1, I2_1, I1_2, I2_2, ...`
pub fn invariant_names() -> Vec<String> {
    (1..=N_INVARIANTS)
        .flat_map(|i| [format!("I1_{i}"), format!("I2_{i}")])
        .collect()
}

/// `T1..T10`
pub fn basis_names() -> Vec<String> {
    numbered("T", BASIS_SIZE)
}

/// `{stem}1..{stem}n`
pub(crate) fn numbered(stem: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{stem}{i}")).collect()
}
