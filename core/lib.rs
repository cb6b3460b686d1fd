/*!
This crate is the engine behind `sheetlens`. It summarizes every column of a dataset with a chart suited to the column, builds pivot tables, and runs a regression or a t-test on user-selected columns. Everything is computed on demand from a [`Session`](session/struct.Session.html), which owns the loaded dataset.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod categorical;
pub mod chart;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod hypothesis;
pub mod number;
pub mod pivot;
pub mod session;
pub mod summary;
pub mod temporal;

pub use self::{
	config::Config,
	error::{ComputationError, Error, UserInputError},
	pivot::{build_pivot, Aggregator, PivotResult, PivotSpec},
	session::Session,
	summary::{summarize, Summary},
};
