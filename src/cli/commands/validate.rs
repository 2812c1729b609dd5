//! `validate` command handler
//!
//! Loads each configuration file, reports warnings and errors, and fails
//! if any file is invalid (or has warnings under `--strict`).

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::ConfigLoader;
use crate::error::{ConfigError, TrafficError};

/// Validation outcome for one file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: PathBuf,
    valid: bool,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Validate configuration files.
///
/// # Errors
///
/// Returns the first configuration error encountered, after every file has
/// been reported.
pub fn run(args: &ValidateArgs) -> Result<(), TrafficError> {
    let loader = ConfigLoader::with_defaults();
    let mut first_error: Option<ConfigError> = None;
    let mut reports = Vec::with_capacity(args.files.len());

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let (report, error) = check(&loader, path, args.strict);
        if first_error.is_none() {
            first_error = error;
        }
        reports.push(report);
    }

    match args.format {
        OutputFormat::Human => {
            for report in &reports {
                for warning in &report.warnings {
                    println!("{}: {warning}", report.file.display());
                }
                match &report.error {
                    Some(error) => println!("{}: error: {error}", report.file.display()),
                    None => println!("{}: ok", report.file.display()),
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&reports)?),
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}

fn check(loader: &ConfigLoader, path: &Path, strict: bool) -> (FileReport, Option<ConfigError>) {
    match loader.load(path) {
        Ok(result) => {
            let warnings: Vec<String> = result.warnings.iter().map(ToString::to_string).collect();
            let error = (strict && !warnings.is_empty()).then(|| ConfigError::InvalidValue {
                field: "warnings".to_string(),
                value: warnings.len().to_string(),
                expected: "no warnings in strict mode".to_string(),
            });
            let report = FileReport {
                file: path.to_path_buf(),
                valid: error.is_none(),
                warnings,
                error: error.as_ref().map(ToString::to_string),
            };
            (report, error)
        }
        Err(e) => {
            let report = FileReport {
                file: path.to_path_buf(),
                valid: false,
                warnings: Vec::new(),
                error: Some(e.to_string()),
            };
            (report, Some(e))
        }
    }
}
