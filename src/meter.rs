use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a tracked meter, kept exactly as written.
///
/// Only ASCII digits are accepted, but the text is not normalized: `05` stays
/// `05` in the totals key, the snapshot file name, the line prefix and the
/// output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawMeterId", into = "String")]
pub struct MeterId(String);

#[derive(Debug, Error)]
#[error("meter id must be a non-empty string of digits, got '{0}'")]
pub struct InvalidMeterId(String);

impl MeterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of this meter's running total in the totals payload.
    pub fn total_key(&self) -> String {
        format!("Totalcounter{}", self.0)
    }

    /// Prefix a snapshot line must start with to belong to this meter.
    pub fn line_prefix(&self) -> String {
        format!("{}(", self.0)
    }

    pub fn snapshot_file_name(&self) -> String {
        format!("metern{}.txt", self.0)
    }
}

impl fmt::Display for MeterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MeterId {
    type Err = InvalidMeterId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidMeterId(s.to_string()));
        }
        Ok(MeterId(s.to_string()))
    }
}

impl From<u32> for MeterId {
    fn from(n: u32) -> Self {
        MeterId(n.to_string())
    }
}

impl From<MeterId> for String {
    fn from(id: MeterId) -> Self {
        id.0
    }
}

/// YAML ids may be written bare (`id: 5`) or quoted (`id: "05"`); a bare
/// number loses leading zeros, so quote ids that carry them.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMeterId {
    Number(u64),
    Text(String),
}

impl TryFrom<RawMeterId> for MeterId {
    type Error = InvalidMeterId;

    fn try_from(raw: RawMeterId) -> Result<Self, Self::Error> {
        match raw {
            RawMeterId::Number(n) => Ok(MeterId(n.to_string())),
            RawMeterId::Text(s) => s.parse(),
        }
    }
}

/// Which value the recovery rule settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The snapshot reading was accepted.
    Current,
    /// The snapshot reading looked like a post-blackout reset; the last
    /// recorded total was kept.
    KeptPrevious,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledReading {
    pub meter: MeterId,
    pub wh: i64,
    pub decision: Decision,
}

impl fmt::Display for ReconciledReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}*Wh)", self.meter, self.wh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        let id = MeterId::from(5);
        assert_eq!(id.total_key(), "Totalcounter5");
        assert_eq!(id.line_prefix(), "5(");
        assert_eq!(id.snapshot_file_name(), "metern5.txt");
    }

    #[test]
    fn test_parse_meter_id() {
        assert_eq!("12".parse::<MeterId>().unwrap(), MeterId::from(12));
        assert!("".parse::<MeterId>().is_err());
        assert!("abc".parse::<MeterId>().is_err());
        assert!("-1".parse::<MeterId>().is_err());
        assert!("+5".parse::<MeterId>().is_err());
        assert!(" 5".parse::<MeterId>().is_err());
        assert!("../5".parse::<MeterId>().is_err());
    }

    #[test]
    fn test_leading_zeros_are_kept() {
        let id: MeterId = "05".parse().unwrap();
        assert_eq!(id.as_str(), "05");
        assert_eq!(id.total_key(), "Totalcounter05");
        assert_eq!(id.snapshot_file_name(), "metern05.txt");
        assert_eq!(id.line_prefix(), "05(");
        assert_ne!(id, MeterId::from(5));

        let reading = ReconciledReading {
            meter: id,
            wh: 1234,
            decision: Decision::Current,
        };
        assert_eq!(reading.to_string(), "05(1234*Wh)");
    }

    #[test]
    fn test_deserialize_bare_and_quoted_ids() {
        let ids: Vec<MeterId> = serde_yaml::from_str("[5, \"05\", \"12\"]").unwrap();
        assert_eq!(ids[0].as_str(), "5");
        assert_eq!(ids[1].as_str(), "05");
        assert_eq!(ids[2].as_str(), "12");

        assert!(serde_yaml::from_str::<MeterId>("\"../5\"").is_err());
        assert!(serde_yaml::from_str::<MeterId>("-3").is_err());
    }

    #[test]
    fn test_reading_format() {
        let reading = ReconciledReading {
            meter: MeterId::from(5),
            wh: 99000,
            decision: Decision::Current,
        };
        assert_eq!(reading.to_string(), "5(99000*Wh)");
    }
}
