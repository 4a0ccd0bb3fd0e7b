use anyhow::{Result, bail};
use std::io::Read;

use crate::application::SynthesisService;
use crate::domain::ForecastPoint;
use crate::storage::{DocumentStore, parse_forecast_date};

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
}

/// Importer for loading forecast CSV files into the forecast collections.
///
/// Expected columns: `date` (or `timestamp`), `<count collection>_forecast`
/// and `<value collection>_forecast`. Lines that fail to parse are skipped
/// and reported; the remaining rows replace both collections.
pub struct ForecastImporter<'a, S> {
    service: &'a SynthesisService<S>,
}

impl<'a, S: DocumentStore> ForecastImporter<'a, S> {
    pub fn new(service: &'a SynthesisService<S>) -> Self {
        Self { service }
    }

    /// Parse forecast rows without writing anything.
    pub fn parse_csv<R: Read>(&self, reader: R) -> Result<(Vec<ForecastPoint>, Vec<ImportError>)> {
        let count_field = self.service.config().count_field();
        let value_field = self.service.config().value_field();

        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);

        let Some(date_idx) = column("date").or_else(|| column("timestamp")) else {
            bail!("Missing 'date' column");
        };
        let Some(count_idx) = column(&count_field) else {
            bail!("Missing '{}' column", count_field);
        };
        let Some(value_idx) = column(&value_field) else {
            bail!("Missing '{}' column", value_field);
        };

        let mut points = Vec::new();
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let date_str = record.get(date_idx).unwrap_or("");
            let Some(date) = parse_forecast_date(date_str) else {
                errors.push(ImportError {
                    line,
                    field: Some("date".to_string()),
                    error: format!("Invalid date: '{}'", date_str),
                });
                continue;
            };

            let count = match parse_metric(record.get(count_idx).unwrap_or("")) {
                Ok(v) => v,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some(count_field.clone()),
                        error: e,
                    });
                    continue;
                }
            };

            let value = match parse_metric(record.get(value_idx).unwrap_or("")) {
                Ok(v) => v,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some(value_field.clone()),
                        error: e,
                    });
                    continue;
                }
            };

            points.push(ForecastPoint {
                date,
                transaction_count_forecast: count,
                value_forecast: value,
            });
        }

        Ok((points, errors))
    }

    /// Import a forecast CSV, replacing both forecast collections.
    pub async fn import_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let (points, errors) = self.parse_csv(reader)?;
        let skipped = errors.len();

        if points.is_empty() {
            bail!("No valid forecast rows to import");
        }

        if !options.dry_run {
            self.service.import_forecast(&points).await?;
        }

        Ok(ImportResult {
            imported: points.len(),
            skipped,
            errors,
        })
    }
}

fn parse_metric(input: &str) -> std::result::Result<f64, String> {
    let input = input.trim();
    match input.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("Value is not finite: '{}'", input)),
        Err(_) => Err(format!("Invalid number: '{}'", input)),
    }
}
