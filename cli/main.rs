//! This module contains the main entrypoint to the sheetlens cli.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use ndarray::prelude::*;
use sheetlens_core::{
	hypothesis::TTestSelection,
	session::PREVIEW_ROWS,
	summary::{ColumnDetail, ColumnVerdict, Summary},
	Aggregator, Config, PivotSpec, Session,
};
use sheetlens_util::table::Table;
use std::{
	io::Read,
	path::{Path, PathBuf},
};

#[derive(Parser)]
#[clap(name = "sheetlens", about = "Explore a spreadsheet from the command line.")]
enum Options {
	#[clap(name = "preview", about = "print the first rows of a csv file")]
	Preview(PreviewOptions),
	#[clap(
		name = "summarize",
		about = "summarize every column",
		long_about = "summarize every column of a csv file and pick a chart for each"
	)]
	Summarize(SummarizeOptions),
	#[clap(
		name = "pivot",
		about = "build a pivot table",
		long_about = "aggregate a value column by one or more row keys and optional column keys"
	)]
	Pivot(PivotOptions),
	#[clap(
		name = "regress",
		about = "fit a least squares regression of one column on another"
	)]
	Regress(RegressOptions),
	#[clap(
		name = "ttest",
		about = "run Welch's t-test",
		long_about = "compare the means of two columns, or of one column split by a column with two groups"
	)]
	TTest(TTestOptions),
}

#[derive(Parser, Debug)]
struct FileOptions {
	#[clap(short, long, help = "the path to your .csv file, or - to read it from stdin")]
	file: PathBuf,
	#[clap(short, long, help = "the path to a config file")]
	config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PreviewOptions {
	#[clap(flatten)]
	file: FileOptions,
	#[clap(short = 'n', long, help = "the number of rows to print")]
	rows: Option<usize>,
}

#[derive(Parser, Debug)]
struct SummarizeOptions {
	#[clap(flatten)]
	file: FileOptions,
	#[clap(long, help = "the path to write the chart specifications to as json")]
	charts: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PivotOptions {
	#[clap(flatten)]
	file: FileOptions,
	#[clap(long = "row", help = "a column to group rows by, may be repeated")]
	rows: Vec<String>,
	#[clap(long = "column", help = "a column to spread across columns, may be repeated")]
	columns: Vec<String>,
	#[clap(long, help = "the column to aggregate")]
	value: Option<String>,
	#[clap(
		short,
		long,
		default_value = "sum",
		help = "one of sum, mean, count, median, min, max"
	)]
	aggregator: Aggregator,
	#[clap(short, long, help = "the path to write the pivot table to as csv")]
	output: Option<PathBuf>,
	#[clap(long, help = "the path to write the chart specification to as json")]
	chart: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RegressOptions {
	#[clap(flatten)]
	file: FileOptions,
	#[clap(short, help = "the explanatory column")]
	x: String,
	#[clap(short, help = "the response column")]
	y: String,
}

#[derive(Parser, Debug)]
struct TTestOptions {
	#[clap(flatten)]
	file: FileOptions,
	#[clap(long, help = "the first column to compare", requires = "b", conflicts_with_all = &["value", "group"])]
	a: Option<String>,
	#[clap(long, help = "the second column to compare", requires = "a")]
	b: Option<String>,
	#[clap(long, help = "the column whose means are compared", requires = "group")]
	value: Option<String>,
	#[clap(long, help = "the column that splits the values into two groups", requires = "value")]
	group: Option<String>,
}

fn main() {
	let env = env_logger::Env::new()
		.filter_or("SHEETLENS_LOG", "info")
		.write_style("SHEETLENS_LOG_STYLE");
	env_logger::Builder::from_env(env)
		.format_module_path(false)
		.format_timestamp(None)
		.init();
	let options = Options::parse();
	let result = match options {
		Options::Preview(options) => cli_preview(options),
		Options::Summarize(options) => cli_summarize(options),
		Options::Pivot(options) => cli_pivot(options),
		Options::Regress(options) => cli_regress(options),
		Options::TTest(options) => cli_t_test(options),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn load_session(options: &FileOptions) -> Result<Session> {
	let config = match options.config.as_deref() {
		Some(path) => Config::from_path(path)?,
		None => Config::default(),
	};
	if options.file.as_os_str() == "-" {
		let mut bytes = Vec::new();
		std::io::stdin()
			.read_to_end(&mut bytes)
			.context("failed to read stdin")?;
		return Session::from_bytes(&bytes, config);
	}
	Session::load(&options.file, config)
}

fn cli_preview(options: PreviewOptions) -> Result<()> {
	let session = load_session(&options.file)?;
	let (header, cells) = session.preview(options.rows.unwrap_or(PREVIEW_ROWS));
	print!("{}", Table::new(&header, &cells));
	Ok(())
}

fn cli_summarize(options: SummarizeOptions) -> Result<()> {
	let session = load_session(&options.file)?;
	let summary = session.summarize();
	print_columns(&summary);
	print_number_stats(&summary);
	if let Some(path) = options.charts {
		write_charts(&summary, &path)?;
		eprintln!("The chart specifications were written to {}.", path.display());
	}
	Ok(())
}

fn print_columns(summary: &Summary) {
	let header: Vec<String> = ["column", "kind", "distinct", "missing", "chart", "mode"]
		.iter()
		.map(|name| name.to_string())
		.collect();
	let rows: Vec<Vec<String>> = summary
		.columns
		.iter()
		.map(|column| {
			let chart = match column.verdict() {
				ColumnVerdict::Included(chart) => chart.kind().to_string(),
				ColumnVerdict::Excluded(reason) => format!("excluded: {}", reason),
			};
			let mode = match &column.detail {
				ColumnDetail::Categorical(chart) => chart
					.breakdown()
					.and_then(|breakdown| breakdown.mode())
					.unwrap_or_default()
					.to_owned(),
				_ => String::new(),
			};
			vec![
				column.profile.name.clone(),
				column.profile.kind.to_string(),
				column.profile.cardinality.to_string(),
				column.profile.missing_count.to_string(),
				chart,
				mode,
			]
		})
		.collect();
	print!("{}", Table::new(&header, &to_array(rows, header.len())));
}

fn print_number_stats(summary: &Summary) {
	let header: Vec<String> = [
		"column", "count", "mean", "std", "min", "p25", "median", "p75", "max",
	]
	.iter()
	.map(|name| name.to_string())
	.collect();
	let rows: Vec<Vec<String>> = summary
		.number_stats()
		.map(|stats| {
			vec![
				stats.column_name.clone(),
				stats.count.to_string(),
				format_number(stats.mean),
				format_number(stats.std),
				format_number(stats.min),
				format_number(stats.p25),
				format_number(stats.p50),
				format_number(stats.p75),
				format_number(stats.max),
			]
		})
		.collect();
	if rows.is_empty() {
		return;
	}
	println!();
	print!("{}", Table::new(&header, &to_array(rows, header.len())));
}

fn write_charts(summary: &Summary, path: &Path) -> Result<()> {
	let charts = serde_json::json!({
		"charts": summary.charts(),
		"exclusions": summary.exclusions,
	});
	let file = std::fs::File::create(path)
		.with_context(|| format!("failed to create {}", path.display()))?;
	serde_json::to_writer_pretty(file, &charts)?;
	Ok(())
}

fn cli_pivot(options: PivotOptions) -> Result<()> {
	let mut session = load_session(&options.file)?;
	let spec = PivotSpec {
		row_keys: options.rows,
		column_keys: options.columns,
		value_column: options.value,
		aggregator: options.aggregator,
	};
	let pivot = session.pivot(&spec)?;
	let (header, cells) = pivot.to_table();
	print!("{}", Table::new(&header, &cells));
	if let Some(path) = options.output {
		let file = std::fs::File::create(&path)
			.with_context(|| format!("failed to create {}", path.display()))?;
		session.export_last_pivot(file)?;
		eprintln!("The pivot table was written to {}.", path.display());
	}
	if let Some(path) = options.chart {
		let pivot = session
			.last_pivot()
			.ok_or_else(|| anyhow!("no pivot table was built"))?;
		let file = std::fs::File::create(&path)
			.with_context(|| format!("failed to create {}", path.display()))?;
		serde_json::to_writer_pretty(file, &pivot.chart())?;
		eprintln!("The chart specification was written to {}.", path.display());
	}
	Ok(())
}

fn cli_regress(options: RegressOptions) -> Result<()> {
	let session = load_session(&options.file)?;
	let output = session.regress(&options.x, &options.y)?;
	let header = vec!["statistic".to_owned(), "value".to_owned()];
	let rows = vec![
		vec!["n".to_owned(), output.n.to_string()],
		vec!["slope".to_owned(), format_number(output.slope)],
		vec!["intercept".to_owned(), format_number(output.intercept)],
		vec!["r2".to_owned(), format_number(output.r2)],
	];
	print!("{}", Table::new(&header, &to_array(rows, 2)));
	Ok(())
}

fn cli_t_test(options: TTestOptions) -> Result<()> {
	let selection = match (options.a, options.b, options.value, options.group) {
		(Some(a), Some(b), _, _) => TTestSelection::Columns { a, b },
		(_, _, Some(value_column), Some(group_column)) => TTestSelection::Groups {
			value_column,
			group_column,
		},
		_ => return Err(anyhow!("pass either --a and --b or --value and --group")),
	};
	let session = load_session(&options.file)?;
	let output = session.t_test(&selection)?;
	let header = vec!["statistic".to_owned(), "value".to_owned()];
	let rows = vec![
		vec![format!("mean of {}", output.labels.0), format_number(output.output.mean_a)],
		vec![format!("mean of {}", output.labels.1), format_number(output.output.mean_b)],
		vec!["t".to_owned(), format_number(output.output.t)],
		vec![
			"degrees of freedom".to_owned(),
			format_number(output.output.degrees_of_freedom),
		],
		vec!["p-value".to_owned(), format_number(output.output.p_value)],
	];
	print!("{}", Table::new(&header, &to_array(rows, 2)));
	Ok(())
}

fn format_number(value: f64) -> String {
	if value.is_nan() {
		"-".to_owned()
	} else {
		format!("{:.4}", value)
	}
}

fn to_array(rows: Vec<Vec<String>>, n_columns: usize) -> Array2<String> {
	let n_rows = rows.len();
	let mut cells = Array::from_elem((n_rows, n_columns), String::new());
	for (mut cells_row, row) in cells.axis_iter_mut(Axis(0)).zip(rows) {
		for (cell, value) in cells_row.iter_mut().zip(row) {
			*cell = value;
		}
	}
	cells
}
