use std::{fmt::Display, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("Invalid house '{0}'. Accepted values: 'commons', 'lords', 'c', 'l'")]
pub struct HouseParseError(String);

#[derive(Debug, thiserror::Error)]
#[error("Invalid transcript type '{0}'")]
pub struct TranscriptParseError(String);

/// Raised when a transcript type has no entry in a house's component table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{transcript} is not a component of the {house} record")]
pub struct UnrecognizedTranscriptType {
    pub house: House,
    pub transcript: TranscriptType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum House {
    Commons,
    Lords,
}

impl House {
    pub fn slug(&self) -> &'static str {
        match self {
            House::Commons => "c",
            House::Lords => "l",
        }
    }

    /// The component table of this house, in sequence order.
    pub fn components(&self) -> &'static [ComponentSpec] {
        match self {
            House::Commons => COMMONS_COMPONENTS,
            House::Lords => LORDS_COMPONENTS,
        }
    }

    pub fn component(
        &self,
        transcript: TranscriptType,
    ) -> Result<&'static ComponentSpec, UnrecognizedTranscriptType> {
        self.components()
            .iter()
            .find(|c| c.transcript == transcript)
            .ok_or(UnrecognizedTranscriptType {
                house: *self,
                transcript,
            })
    }
}

impl FromStr for House {
    type Err = HouseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "commons" | "c" => Ok(House::Commons),
            "lords" | "l" => Ok(House::Lords),
            _ => Err(HouseParseError(s.to_string())),
        }
    }
}

impl Display for House {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            House::Commons => write!(f, "House of Commons"),
            House::Lords => write!(f, "House of Lords"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptType {
    Debates,
    WestminsterHall,
    GrandCommittee,
    WrittenStatements,
    Petitions,
    WrittenAnswers,
    MinisterialCorrections,
}

impl FromStr for TranscriptType {
    type Err = TranscriptParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "debates" | "d" => Ok(TranscriptType::Debates),
            "westminster_hall" | "wh" => Ok(TranscriptType::WestminsterHall),
            "grand_committee" | "gc" => Ok(TranscriptType::GrandCommittee),
            "written_statements" | "wms" => Ok(TranscriptType::WrittenStatements),
            "petitions" | "pet" => Ok(TranscriptType::Petitions),
            "written_answers" | "wa" => Ok(TranscriptType::WrittenAnswers),
            "ministerial_corrections" | "mc" => Ok(TranscriptType::MinisterialCorrections),
            _ => Err(TranscriptParseError(s.to_string())),
        }
    }
}

impl Display for TranscriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TranscriptType::Debates => "Debates",
            TranscriptType::WestminsterHall => "Westminster Hall",
            TranscriptType::GrandCommittee => "Grand Committee",
            TranscriptType::WrittenStatements => "Written Statements",
            TranscriptType::Petitions => "Petitions",
            TranscriptType::WrittenAnswers => "Written Answers",
            TranscriptType::MinisterialCorrections => "Ministerial Corrections",
        };
        write!(f, "{}", name)
    }
}

/// One row of a house's component table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSpec {
    pub transcript: TranscriptType,
    pub sequence: u32,
    pub prefix: &'static str,
    pub name: &'static str,
}

// The two houses order their components differently; the tables are kept
// separate rather than derived from one another.
const COMMONS_COMPONENTS: &[ComponentSpec] = &[
    ComponentSpec {
        transcript: TranscriptType::Debates,
        sequence: 1,
        prefix: "d",
        name: "Debates and Oral Answers",
    },
    ComponentSpec {
        transcript: TranscriptType::WestminsterHall,
        sequence: 2,
        prefix: "wh",
        name: "Westminster Hall",
    },
    ComponentSpec {
        transcript: TranscriptType::WrittenStatements,
        sequence: 3,
        prefix: "wms",
        name: "Written Ministerial Statements",
    },
    ComponentSpec {
        transcript: TranscriptType::Petitions,
        sequence: 4,
        prefix: "pet",
        name: "Petitions",
    },
    ComponentSpec {
        transcript: TranscriptType::WrittenAnswers,
        sequence: 5,
        prefix: "wa",
        name: "Written Answers",
    },
    ComponentSpec {
        transcript: TranscriptType::MinisterialCorrections,
        sequence: 6,
        prefix: "mc",
        name: "Ministerial Corrections",
    },
];

const LORDS_COMPONENTS: &[ComponentSpec] = &[
    ComponentSpec {
        transcript: TranscriptType::Debates,
        sequence: 1,
        prefix: "d",
        name: "Lords Chamber",
    },
    ComponentSpec {
        transcript: TranscriptType::GrandCommittee,
        sequence: 2,
        prefix: "gc",
        name: "Grand Committee",
    },
    ComponentSpec {
        transcript: TranscriptType::WrittenStatements,
        sequence: 3,
        prefix: "wms",
        name: "Written Statements",
    },
    ComponentSpec {
        transcript: TranscriptType::WrittenAnswers,
        sequence: 4,
        prefix: "wa",
        name: "Written Answers",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_house_from_str() {
        assert_eq!(House::from_str("commons").unwrap(), House::Commons);
        assert_eq!(House::from_str("L").unwrap(), House::Lords);
        assert!(House::from_str("senate").is_err());
    }

    #[test]
    fn test_commons_table_order() {
        let sequences: Vec<(TranscriptType, u32)> = House::Commons
            .components()
            .iter()
            .map(|c| (c.transcript, c.sequence))
            .collect();
        assert_eq!(
            sequences,
            vec![
                (TranscriptType::Debates, 1),
                (TranscriptType::WestminsterHall, 2),
                (TranscriptType::WrittenStatements, 3),
                (TranscriptType::Petitions, 4),
                (TranscriptType::WrittenAnswers, 5),
                (TranscriptType::MinisterialCorrections, 6),
            ]
        );
    }

    #[test]
    fn test_lords_has_no_petitions() {
        let err = House::Lords
            .component(TranscriptType::Petitions)
            .expect_err("Lords should not have petitions");
        assert_eq!(err.house, House::Lords);
        assert_eq!(err.transcript, TranscriptType::Petitions);

        let wa = House::Lords
            .component(TranscriptType::WrittenAnswers)
            .expect("Lords should have written answers");
        assert_eq!(wa.sequence, 4);
    }

    #[test]
    fn test_transcript_from_str() {
        assert_eq!(
            TranscriptType::from_str("westminster-hall").unwrap(),
            TranscriptType::WestminsterHall
        );
        assert_eq!(
            TranscriptType::from_str("wa").unwrap(),
            TranscriptType::WrittenAnswers
        );
        assert!(TranscriptType::from_str("hansard").is_err());
    }
}
