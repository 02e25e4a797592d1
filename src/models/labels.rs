use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// Diagnostic classes, in the classifier's output order.
///
/// This is the single canonical index-to-label mapping: probability
/// vectors are interpreted with `from_index` and every report surface
/// renders labels through `as_str`. Keep the variant order in sync with
/// the class order the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassLabel {
    Normal,
    #[serde(rename = "DME")]
    Dme,
}

impl ClassLabel {
    /// All labels, in canonical probability-vector order.
    pub const ALL: [ClassLabel; 2] = [ClassLabel::Normal, ClassLabel::Dme];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Dme => "DME",
        }
    }

    /// Label for a position in the probability vector.
    pub fn from_index(index: usize) -> Option<ClassLabel> {
        Self::ALL.get(index).copied()
    }
}

impl std::str::FromStr for ClassLabel {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(Self::Normal),
            "DME" => Ok(Self::Dme),
            _ => Err(DatabaseError::InvalidEnum {
                field: "ClassLabel".into(),
                value: s.into(),
            }),
        }
    }
}
