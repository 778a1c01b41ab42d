use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of top-level categories a source belongs to (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    NationalPolicy,
    BeijingPolicy,
    Technology,
    Talent,
    Industry,
    Universities,
    Events,
    Personnel,
    Sentiment,
    Twitter,
    UniversityFaculty,
}

impl Dimension {
    pub const ALL: [Dimension; 11] = [
        Dimension::NationalPolicy,
        Dimension::BeijingPolicy,
        Dimension::Technology,
        Dimension::Talent,
        Dimension::Industry,
        Dimension::Universities,
        Dimension::Events,
        Dimension::Personnel,
        Dimension::Sentiment,
        Dimension::Twitter,
        Dimension::UniversityFaculty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::NationalPolicy => "national_policy",
            Dimension::BeijingPolicy => "beijing_policy",
            Dimension::Technology => "technology",
            Dimension::Talent => "talent",
            Dimension::Industry => "industry",
            Dimension::Universities => "universities",
            Dimension::Events => "events",
            Dimension::Personnel => "personnel",
            Dimension::Sentiment => "sentiment",
            Dimension::Twitter => "twitter",
            Dimension::UniversityFaculty => "university_faculty",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "national_policy" => Ok(Dimension::NationalPolicy),
            "beijing_policy" => Ok(Dimension::BeijingPolicy),
            "technology" => Ok(Dimension::Technology),
            "talent" => Ok(Dimension::Talent),
            "industry" => Ok(Dimension::Industry),
            "universities" => Ok(Dimension::Universities),
            "events" => Ok(Dimension::Events),
            "personnel" => Ok(Dimension::Personnel),
            "sentiment" => Ok(Dimension::Sentiment),
            "twitter" => Ok(Dimension::Twitter),
            "university_faculty" => Ok(Dimension::UniversityFaculty),
            other => Err(format!("unknown dimension: {other}")),
        }
    }
}

/// Symbolic crawl frequency for a source (spec §3, §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    Daily,
    Weekly,
    Monthly,
}

impl Schedule {
    /// Fixed-interval schedules are driven by `tokio::time::interval`;
    /// cron-style schedules are driven by the `cron` crate.
    pub fn is_fixed_interval(&self) -> bool {
        matches!(self, Schedule::TwoHours | Schedule::FourHours)
    }

    pub fn interval(&self) -> Option<std::time::Duration> {
        match self {
            Schedule::TwoHours => Some(std::time::Duration::from_secs(2 * 3600)),
            Schedule::FourHours => Some(std::time::Duration::from_secs(4 * 3600)),
            _ => None,
        }
    }

    /// Cron expression (UTC) for the non-fixed schedules, per spec §4.9.
    pub fn cron_expression(&self) -> Option<&'static str> {
        match self {
            Schedule::Daily => Some("0 0 6 * * * *"),
            Schedule::Weekly => Some("0 0 3 * * Mon *"),
            Schedule::Monthly => Some("0 0 2 1 * * *"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_roundtrips_through_str() {
        for d in Dimension::ALL {
            assert_eq!(Dimension::from_str(d.as_str()).unwrap(), d);
        }
    }

    #[test]
    fn dimension_rejects_unknown() {
        assert!(Dimension::from_str("bogus").is_err());
    }

    #[test]
    fn schedule_classifies_fixed_vs_cron() {
        assert!(Schedule::TwoHours.is_fixed_interval());
        assert!(Schedule::FourHours.is_fixed_interval());
        assert!(!Schedule::Daily.is_fixed_interval());
        assert!(Schedule::Daily.cron_expression().is_some());
        assert!(Schedule::Weekly.cron_expression().is_some());
        assert!(Schedule::Monthly.cron_expression().is_some());
    }
}
