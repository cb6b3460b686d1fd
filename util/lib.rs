/*!
Small helpers shared by the sheetlens crates.
*/

pub mod finite;
pub mod table;
