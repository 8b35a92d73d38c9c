//! Command-line arguments
//!
//! Each path is checked by its value parser, so invalid arguments stop the
//! process with a usage error before the model is loaded.

use std::path::{Path, PathBuf};

use clap::Parser;
use classifier_core::{ClassifierError, Surface, MAX_CANDIDATE_LABELS};

/// Classify every row of a CSV file with a zero-shot model
#[derive(Parser, Debug)]
#[command(name = "predict-batch")]
#[command(version)]
#[command(about = "Classify the 'text' column of a CSV file against a fixed label set")]
pub struct Cli {
    /// labels.txt file, one label per line
    #[arg(short, long, value_parser = parse_labels_file)]
    pub labels: LabelSet,

    /// Input .csv file with a 'text' column
    #[arg(short, long, value_parser = parse_input_file)]
    pub input: InputFile,

    /// Output .csv file (must not exist yet)
    #[arg(short, long, value_parser = parse_output_file)]
    pub output: OutputFile,
}

/// Candidate labels read from the labels file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet(pub Vec<String>);

/// A readable UTF-8 CSV with a `text` column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile(pub PathBuf);

/// A `.csv` path that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile(pub PathBuf);

fn has_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected))
}

pub fn parse_labels_file(param: &str) -> Result<LabelSet, String> {
    let path = Path::new(param);
    if !has_extension(path, "txt") {
        return Err("Labels file must have a .txt extension".to_string());
    }
    if !path.exists() {
        return Err("Labels file does not exist.".to_string());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        format!(
            "Could not load labels file. Please pass a utf-8 encoded txt file \
             with each label on new line: {e}"
        )
    })?;

    let labels: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err("Labels file does not contain any labels.".to_string());
    }
    if labels.len() > MAX_CANDIDATE_LABELS {
        return Err(ClassifierError::TooManyLabels {
            surface: Surface::Classifier,
            max: MAX_CANDIDATE_LABELS,
            count: labels.len(),
        }
        .to_string());
    }

    Ok(LabelSet(labels))
}

pub fn parse_input_file(param: &str) -> Result<InputFile, String> {
    let path = Path::new(param);
    if !has_extension(path, "csv") {
        return Err("Input file must have a .csv extension".to_string());
    }
    if !path.exists() {
        return Err("Input file does not exist.".to_string());
    }

    let bytes = std::fs::read(path).map_err(csv_load_error)?;
    std::str::from_utf8(&bytes).map_err(csv_load_error)?;

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = reader.headers().map_err(csv_load_error)?;
    if !headers.iter().any(|h| h == "text") {
        return Err("Input csv does not contain a 'text' column.".to_string());
    }

    Ok(InputFile(path.to_path_buf()))
}

fn csv_load_error(e: impl std::fmt::Display) -> String {
    format!("Could not load .csv - you need to pass a utf-8 encoded CSV file: {e}")
}

pub fn parse_output_file(param: &str) -> Result<OutputFile, String> {
    let path = Path::new(param);
    if !has_extension(path, "csv") {
        return Err("Output file must have a .csv extension".to_string());
    }
    if path.exists() {
        return Err("Output file already exists.".to_string());
    }
    Ok(OutputFile(path.to_path_buf()))
}
