use std::io;

use classifier_core::{
    metrics::{record_request, Outcome},
    Classifier, ClassifierError, PredictionRequest, PredictionResult, RequestValidator, Surface,
};
use csv::StringRecord;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

/// Failures that stop the whole batch
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Input csv does not contain a 'text' column.")]
    MissingTextColumn,
}

/// Failures that only skip one row
#[derive(Error, Debug)]
enum RowError {
    #[error("unreadable record: {0}")]
    Read(#[from] csv::Error),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

#[derive(Serialize)]
struct OutputRow<'a> {
    text: &'a str,
    label: &'a str,
    score: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Data rows read from the input
    pub rows: usize,
    /// Rows written to the output
    pub written: usize,
    /// Rows logged and skipped
    pub failed: usize,
}

/// Classifies CSV rows one at a time against a fixed label set.
pub struct BatchRunner<'a> {
    classifier: &'a dyn Classifier,
    validator: RequestValidator,
    labels: &'a [String],
}

impl<'a> BatchRunner<'a> {
    pub fn new(classifier: &'a dyn Classifier, labels: &'a [String]) -> Self {
        Self {
            classifier,
            validator: RequestValidator::new(Surface::Classifier),
            labels,
        }
    }

    /// Process every row of `input`, writing predictions to `output`.
    ///
    /// Row failures are logged with their 0-based index and skipped. Only a
    /// missing `text` header or a failure to write the output aborts.
    pub async fn run<R, W>(&self, input: R, output: W) -> Result<BatchSummary, BatchError>
    where
        R: io::Read,
        W: io::Write,
    {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(output);

        let text_column = reader
            .headers()?
            .iter()
            .position(|h| h == "text")
            .ok_or(BatchError::MissingTextColumn)?;

        writer.write_record(["text", "label", "score"])?;

        let mut summary = BatchSummary::default();
        for (index, record) in reader.records().enumerate() {
            summary.rows += 1;

            match self.classify_row(text_column, record).await {
                Ok((text, prediction)) => {
                    writer.serialize(OutputRow {
                        text: &text,
                        label: &prediction.label,
                        score: prediction.score,
                    })?;
                    summary.written += 1;
                    record_request(Surface::Classifier, Outcome::Success);
                }
                Err(e) => {
                    error!(row = index, error = %e, "Error in predicting line");
                    summary.failed += 1;
                    let outcome = match &e {
                        RowError::Classifier(err) if !err.is_rejection() => Outcome::Failed,
                        _ => Outcome::Rejected,
                    };
                    record_request(Surface::Classifier, outcome);
                }
            }

            if summary.rows % 100 == 0 {
                info!(rows = summary.rows, failed = summary.failed, "Batch progress");
            }
        }

        writer.flush()?;
        Ok(summary)
    }

    async fn classify_row(
        &self,
        text_column: usize,
        record: Result<StringRecord, csv::Error>,
    ) -> Result<(String, PredictionResult), RowError> {
        let record = record?;
        let text = match record.get(text_column) {
            Some(text) if !text.is_empty() => text.to_string(),
            Some(_) => return Err(ClassifierError::schema("'text' is empty").into()),
            None => return Err(ClassifierError::schema("row has no 'text' value").into()),
        };

        let request = PredictionRequest::new(text, self.labels.to_vec());
        self.validator.check(&request)?;

        let prediction = self
            .classifier
            .classify(&request.text, &request.candidate_labels)
            .await?;
        Ok((request.text, prediction))
    }
}
