use chrono::{Duration, NaiveDate};

use crate::types::DayIndex;

/// Maps calendar dates onto the signed integer day line the engine reasons
/// over. Index 0 is the epoch date; days before it get negative indices.
///
/// Indices are used as store keys, so the epoch must stay fixed for the
/// lifetime of the persisted data. Re-running against existing rows with a
/// different epoch silently shifts every key and is a compatibility break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateIndexer {
    epoch: NaiveDate,
}

impl DateIndexer {
    pub fn new(epoch: NaiveDate) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    pub fn index_of(&self, date: NaiveDate) -> DayIndex {
        (date - self.epoch).num_days()
    }

    pub fn date_of(&self, index: DayIndex) -> NaiveDate {
        self.epoch + Duration::days(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn d(date: &str) -> NaiveDate {
        date.parse().unwrap()
    }

    #[rstest]
    #[case("2023-04-11", 0)]
    #[case("2023-04-12", 1)]
    #[case("2023-05-11", 30)]
    #[case("2023-04-10", -1)]
    #[case("2022-04-11", -365)]
    fn maps_dates_both_ways(#[case] date: &str, #[case] index: DayIndex) {
        let indexer = DateIndexer::new(d("2023-04-11"));
        assert_eq!(indexer.index_of(d(date)), index);
        assert_eq!(indexer.date_of(index), d(date));
    }

    #[test]
    fn inverse_over_a_range() {
        let indexer = DateIndexer::new(d("2023-04-11"));
        for index in -400..400 {
            assert_eq!(indexer.index_of(indexer.date_of(index)), index);
        }
    }
}
