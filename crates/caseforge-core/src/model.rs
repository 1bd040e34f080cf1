//! Case shapes shared across the pipeline and the store.
//!
//! A [`Case`] is the bare scenario; a [`TaggedCase`] is the same scenario
//! after value tagging (four axis tags per choice). Generation steps only
//! ever produce new values; nothing here is mutated in place.

use serde::{Deserialize, Serialize};

/// A decision scenario: one vignette, two competing choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub vignette: String,
    pub choice_1: String,
    pub choice_2: String,
}

/// Tag assigned to one (choice, axis) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueTag {
    Positive,
    Negative,
    Neutral,
}

impl ValueTag {
    pub fn is_neutral(self) -> bool {
        matches!(self, ValueTag::Neutral)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueTag::Positive => "positive",
            ValueTag::Negative => "negative",
            ValueTag::Neutral => "neutral",
        }
    }
}

/// The four principlist value axes every choice is tagged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueAxis {
    Autonomy,
    Beneficence,
    Nonmaleficence,
    Justice,
}

impl ValueAxis {
    pub const ALL: [ValueAxis; 4] = [
        ValueAxis::Autonomy,
        ValueAxis::Beneficence,
        ValueAxis::Nonmaleficence,
        ValueAxis::Justice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValueAxis::Autonomy => "autonomy",
            ValueAxis::Beneficence => "beneficence",
            ValueAxis::Nonmaleficence => "nonmaleficence",
            ValueAxis::Justice => "justice",
        }
    }
}

/// One tag per axis for a single choice. Lookup goes through [`AxisTags::get`]
/// with an enumerated key; there is deliberately no by-name access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTags {
    pub autonomy: ValueTag,
    pub beneficence: ValueTag,
    pub nonmaleficence: ValueTag,
    pub justice: ValueTag,
}

impl AxisTags {
    pub fn get(&self, axis: ValueAxis) -> ValueTag {
        match axis {
            ValueAxis::Autonomy => self.autonomy,
            ValueAxis::Beneficence => self.beneficence,
            ValueAxis::Nonmaleficence => self.nonmaleficence,
            ValueAxis::Justice => self.justice,
        }
    }

    pub fn all_neutral() -> Self {
        Self {
            autonomy: ValueTag::Neutral,
            beneficence: ValueTag::Neutral,
            nonmaleficence: ValueTag::Neutral,
            justice: ValueTag::Neutral,
        }
    }
}

/// A choice with its value tags flattened alongside the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedChoice {
    pub text: String,
    #[serde(flatten)]
    pub tags: AxisTags,
}

/// A case after value tagging: the vignette plus both tagged choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedCase {
    pub vignette: String,
    pub choice_1: TaggedChoice,
    pub choice_2: TaggedChoice,
}

impl TaggedCase {
    /// The underlying untagged case.
    pub fn as_case(&self) -> Case {
        Case {
            vignette: self.vignette.clone(),
            choice_1: self.choice_1.text.clone(),
            choice_2: self.choice_2.text.clone(),
        }
    }
}

/// What a history entry actually stores: early pipeline stages snapshot a
/// bare [`Case`], later stages and evaluations snapshot a [`TaggedCase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseSnapshot {
    Tagged(TaggedCase),
    Plain(Case),
}

impl CaseSnapshot {
    pub fn as_tagged(&self) -> Option<&TaggedCase> {
        match self {
            CaseSnapshot::Tagged(c) => Some(c),
            CaseSnapshot::Plain(_) => None,
        }
    }

    pub fn vignette(&self) -> &str {
        match self {
            CaseSnapshot::Tagged(c) => &c.vignette,
            CaseSnapshot::Plain(c) => &c.vignette,
        }
    }
}

impl From<Case> for CaseSnapshot {
    fn from(c: Case) -> Self {
        CaseSnapshot::Plain(c)
    }
}

impl From<TaggedCase> for CaseSnapshot {
    fn from(c: TaggedCase) -> Self {
        CaseSnapshot::Tagged(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged_choice(text: &str, autonomy: ValueTag) -> TaggedChoice {
        TaggedChoice {
            text: text.to_string(),
            tags: AxisTags {
                autonomy,
                ..AxisTags::all_neutral()
            },
        }
    }

    #[test]
    fn axis_lookup_is_field_for_field() {
        let tags = AxisTags {
            autonomy: ValueTag::Positive,
            beneficence: ValueTag::Negative,
            nonmaleficence: ValueTag::Neutral,
            justice: ValueTag::Positive,
        };
        assert_eq!(tags.get(ValueAxis::Autonomy), ValueTag::Positive);
        assert_eq!(tags.get(ValueAxis::Beneficence), ValueTag::Negative);
        assert_eq!(tags.get(ValueAxis::Nonmaleficence), ValueTag::Neutral);
        assert_eq!(tags.get(ValueAxis::Justice), ValueTag::Positive);
    }

    #[test]
    fn snapshot_roundtrips_both_shapes() {
        let plain = CaseSnapshot::Plain(Case {
            vignette: "v".into(),
            choice_1: "a".into(),
            choice_2: "b".into(),
        });
        let json = serde_json::to_string(&plain).unwrap();
        let back: CaseSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plain);
        assert!(back.as_tagged().is_none());

        let tagged = CaseSnapshot::Tagged(TaggedCase {
            vignette: "v".into(),
            choice_1: tagged_choice("a", ValueTag::Positive),
            choice_2: tagged_choice("b", ValueTag::Neutral),
        });
        let json = serde_json::to_string(&tagged).unwrap();
        let back: CaseSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tagged);
        assert!(back.as_tagged().is_some());
    }
}
