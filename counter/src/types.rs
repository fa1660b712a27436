use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Trailing window length, in days, over which a cumulative download total
/// is tracked. The catalog of spans in use is injected into the
/// [`Calculator`](crate::Calculator); nothing assumes a particular set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Span(u32);

impl Span {
    /// Panics if `days` is zero; a zero-length window has no meaning here.
    pub fn new(days: u32) -> Self {
        assert!(days > 0, "span must be a positive number of days");
        Self(days)
    }

    pub fn days(self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.0)
    }
}

/// OS dimension used as the store partition key. One calculator run owns
/// exactly one partition, so runs for different OS types never share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Windows,
    Linux,
    Darwin,
}

impl OsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Windows => "windows",
            OsType::Linux => "linux",
            OsType::Darwin => "darwin",
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsType {
    type Err = UnknownOsType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "windows" => Ok(OsType::Windows),
            "linux" => Ok(OsType::Linux),
            "darwin" => Ok(OsType::Darwin),
            other => Err(UnknownOsType(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown os type: {0}")]
pub struct UnknownOsType(String);

/// Signed day offset from the configured epoch. Negative indices are
/// pre-history and read as an all-zero baseline.
pub type DayIndex = i64;

/// Everything known about a single day: the day's own download count and
/// the cumulative totals of the trailing windows ending on it.
///
/// `None` / an absent map entry means "not observed and not derived yet";
/// zero is a perfectly valid known value. Known fields are write-once:
/// the propagation rules refuse to replace them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayRecord {
    pub day_count: Option<i64>,
    pub span_totals: BTreeMap<Span, i64>,
}

impl DayRecord {
    /// Record with nothing known, as returned by stores for days that were
    /// never persisted.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// The pre-history baseline: zero downloads per day and therefore zero
    /// cumulative totals for every span in the catalog.
    pub fn prehistory(spans: &[Span]) -> Self {
        Self {
            day_count: Some(0),
            span_totals: spans.iter().map(|&span| (span, 0)).collect(),
        }
    }

    pub fn span_total(&self, span: Span) -> Option<i64> {
        self.span_totals.get(&span).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn os_type_round_trips_through_str() {
        for os in [OsType::Windows, OsType::Linux, OsType::Darwin] {
            assert_eq!(os.as_str().parse::<OsType>().unwrap(), os);
        }
        assert!("beos".parse::<OsType>().is_err());
    }

    #[test]
    fn prehistory_knows_every_span() {
        let spans = [Span::new(30), Span::new(90)];
        let record = DayRecord::prehistory(&spans);
        assert_eq!(record.day_count, Some(0));
        assert_eq!(record.span_total(Span::new(30)), Some(0));
        assert_eq!(record.span_total(Span::new(90)), Some(0));
        assert_eq!(record.span_total(Span::new(365)), None);
    }
}
