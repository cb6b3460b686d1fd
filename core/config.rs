/*!
This module defines the `Config` struct, which is read from a YAML file and adjusts how a dataset is loaded, summarized and exported.
*/

use crate::{categorical::BucketSettings, export::ExportOptions, summary::SummarySettings};
use anyhow::{Context, Result};
use sheetlens_dataframe::prelude::*;
use std::{collections::BTreeMap, path::Path};

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub bucketing: Option<BucketSettings>,
	pub enum_max_unique_values: Option<usize>,
	pub invalid_values: Option<Vec<String>>,
	pub export: Option<ExportOptions>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ColumnType {
	#[serde(rename = "unknown")]
	Unknown,
	#[serde(rename = "number")]
	Number,
	#[serde(rename = "bool")]
	Bool,
	#[serde(rename = "date")]
	Date,
	#[serde(rename = "enum")]
	Enum { options: Vec<String> },
	#[serde(rename = "text")]
	Text,
}

impl Config {
	pub fn from_path(path: &Path) -> Result<Self> {
		let config = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read config file {}", path.display()))?;
		Self::from_yaml(&config)
			.with_context(|| format!("failed to parse config file {}", path.display()))
	}

	pub fn from_yaml(yaml: &str) -> Result<Self> {
		Ok(serde_yaml::from_str(yaml)?)
	}

	pub fn column_types(&self) -> Option<BTreeMap<String, DataFrameColumnType>> {
		self.column_types.as_ref().map(|column_types| {
			column_types
				.iter()
				.map(|(column_name, column_type)| {
					let column_type = match column_type {
						ColumnType::Unknown => DataFrameColumnType::Unknown,
						ColumnType::Number => DataFrameColumnType::Number,
						ColumnType::Bool => DataFrameColumnType::Bool,
						ColumnType::Date => DataFrameColumnType::Date,
						ColumnType::Enum { options } => DataFrameColumnType::Enum {
							options: options.clone(),
						},
						ColumnType::Text => DataFrameColumnType::Text,
					};
					(column_name.clone(), column_type)
				})
				.collect()
		})
	}

	pub fn infer_options(&self) -> InferOptions {
		let mut infer_options = InferOptions::default();
		if let Some(enum_max_unique_values) = self.enum_max_unique_values {
			infer_options.enum_max_unique_values = enum_max_unique_values;
		}
		infer_options
	}

	/// The tokens read as missing cells, or `None` to use the loader's defaults.
	pub fn invalid_values(&self) -> Option<Vec<&str>> {
		self.invalid_values
			.as_ref()
			.map(|values| values.iter().map(|value| value.as_str()).collect())
	}

	pub fn summary_settings(&self) -> SummarySettings {
		let mut settings = SummarySettings::default();
		if let Some(bucketing) = &self.bucketing {
			settings.bucket = bucketing.clone();
		}
		settings
	}

	pub fn export_options(&self) -> ExportOptions {
		self.export.clone().unwrap_or_default()
	}
}

#[test]
fn test_parse_config() {
	let config = Config::from_yaml(
		r#"
column_types:
  city:
    type: enum
    options: [berlin, tokyo]
  when:
    type: date
bucketing:
  top_n: 5
invalid_values: ["", "-"]
export:
  byte_order_mark: false
"#,
	)
	.unwrap();
	let column_types = config.column_types().unwrap();
	assert_eq!(
		column_types.get("city"),
		Some(&DataFrameColumnType::Enum {
			options: vec!["berlin".to_owned(), "tokyo".to_owned()]
		})
	);
	assert_eq!(column_types.get("when"), Some(&DataFrameColumnType::Date));
	let settings = config.summary_settings();
	assert_eq!(settings.bucket.top_n, 5);
	assert_eq!(settings.bucket.pie_max_distinct_values, 10);
	assert_eq!(config.invalid_values(), Some(vec!["", "-"]));
	assert!(!config.export_options().byte_order_mark);
}

#[test]
fn test_empty_config() {
	let config = Config::from_yaml("{}").unwrap();
	assert!(config.column_types().is_none());
	assert_eq!(config.summary_settings(), SummarySettings::default());
	assert!(config.export_options().byte_order_mark);
	assert_eq!(config.infer_options().enum_max_unique_values, 100);
}
