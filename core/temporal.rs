use chrono::NaiveDate;
use sheetlens_dataframe::prelude::*;
use std::collections::BTreeMap;

/// Count the values of a date column per calendar date, in ascending date order. The time of day is discarded, missing cells are skipped, and dates with no values are not filled in.
pub fn aggregate_by_date(column: &DateDataFrameColumnView) -> Vec<(NaiveDate, usize)> {
	let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
	for value in column.data.iter().flatten() {
		*counts.entry(value.date()).or_insert(0) += 1;
	}
	counts.into_iter().collect()
}

#[test]
fn test_aggregate_by_date() {
	let column = DateDataFrameColumn {
		name: "when".to_owned(),
		data: vec![
			Some(NaiveDate::from_ymd(2024, 1, 3).and_hms(9, 0, 0)),
			Some(NaiveDate::from_ymd(2024, 1, 1).and_hms(0, 0, 0)),
			None,
			Some(NaiveDate::from_ymd(2024, 1, 3).and_hms(18, 30, 0)),
			Some(NaiveDate::from_ymd(2024, 1, 1).and_hms(23, 59, 59)),
			Some(NaiveDate::from_ymd(2024, 1, 6).and_hms(12, 0, 0)),
		],
	};
	assert_eq!(
		aggregate_by_date(&column.view()),
		vec![
			(NaiveDate::from_ymd(2024, 1, 1), 2),
			(NaiveDate::from_ymd(2024, 1, 3), 2),
			(NaiveDate::from_ymd(2024, 1, 6), 1),
		]
	);
}

#[test]
fn test_aggregate_all_missing() {
	let column = DateDataFrameColumn {
		name: "when".to_owned(),
		data: vec![None, None],
	};
	assert!(aggregate_by_date(&column.view()).is_empty());
}
