//! Batch classification of CSV files
//!
//! Reads every row's `text` column, classifies it against one label set read
//! from a `.txt` file, and writes `text,label,score` rows to a new CSV. A row
//! that cannot be classified is logged and skipped.

pub mod args;
pub mod runner;

pub use args::{Cli, InputFile, LabelSet, OutputFile};
pub use runner::{BatchError, BatchRunner, BatchSummary};
