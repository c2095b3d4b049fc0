use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Urgency tier assigned to a community post.
///
/// The numeric value is the training label. Ordering of the variants follows
/// the label value, not the priority the heuristic labeler checks them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// UI/UX suggestions and feature requests.
    FeatureRequest,
    /// Server, playback, payment and other service failures.
    TechnicalFailure,
    /// Moderation, sanctions and policy criticism.
    PolicyIssue,
    /// Posts written by the operator (notices, announcements).
    OperatorNotice,
    /// Complaints and chatter with no actionable signal.
    General,
}

#[derive(Debug, Error)]
#[error("label {0} is outside the tier range 0..=4")]
pub struct TierError(pub i64);

impl Tier {
    pub const COUNT: usize = 5;

    pub const ALL: [Tier; Tier::COUNT] = [
        Tier::FeatureRequest,
        Tier::TechnicalFailure,
        Tier::PolicyIssue,
        Tier::OperatorNotice,
        Tier::General,
    ];

    #[must_use]
    pub fn label(self) -> u8 {
        match self {
            Tier::FeatureRequest => 0,
            Tier::TechnicalFailure => 1,
            Tier::PolicyIssue => 2,
            Tier::OperatorNotice => 3,
            Tier::General => 4,
        }
    }

    /// Converts a numeric label back into a tier.
    ///
    /// # Errors
    ///
    /// Returns [`TierError`] for any value outside `0..=4`.
    pub fn from_label(label: i64) -> Result<Self, TierError> {
        match label {
            0 => Ok(Tier::FeatureRequest),
            1 => Ok(Tier::TechnicalFailure),
            2 => Ok(Tier::PolicyIssue),
            3 => Ok(Tier::OperatorNotice),
            4 => Ok(Tier::General),
            other => Err(TierError(other)),
        }
    }

    /// Display name used in evaluation reports.
    #[must_use]
    pub fn class_name(self) -> &'static str {
        match self {
            Tier::FeatureRequest => "기능건의(0)",
            Tier::TechnicalFailure => "기술오류(1)",
            Tier::PolicyIssue => "정책비판(2)",
            Tier::OperatorNotice => "공지(3)",
            Tier::General => "기타(4)",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.label())
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Spreadsheet round trips turn integer columns into "3.0".
        let raw = f64::deserialize(deserializer)?;
        if raw.fract() != 0.0 {
            return Err(serde::de::Error::custom(format!(
                "label {raw} is not an integer"
            )));
        }
        #[allow(clippy::cast_possible_truncation)]
        Tier::from_label(raw as i64).map_err(serde::de::Error::custom)
    }
}
