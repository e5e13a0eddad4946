use crate::{
    config::BatchConfig,
    error::{Result, SignatureError},
    features::{FeatureRow, FeatureRowBuilder},
};
use rayon::prelude::*;
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// The outcome of processing a collection.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One row per successfully processed image, in collection order.
    pub rows: Vec<FeatureRow>,
    /// Identifiers of the images that failed.
    pub errors_log: Vec<String>,
    /// Where the outputs were written, when saving.
    pub output_dir: Option<PathBuf>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.errors_log.len()
    }
}

/// Recursively collect every file under `path` whose extension is one of `extensions`, case-insensitively.
///
/// The paths are sorted so a collection is always processed in the same order.
pub fn collect_images(path: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_images_from_dir(path, extensions, &mut files)?;
    files.sort();

    let folder = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    log::info!("{} images found in {}", files.len(), folder);

    Ok(files)
}

fn collect_images_from_dir(dir: &Path, extensions: &[&str], files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| SignatureError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| SignatureError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| SignatureError::io(entry.path(), e))?;
        let path = entry.path();

        if file_type.is_dir() {
            collect_images_from_dir(&path, extensions, files)?;
        } else if path.is_dir() {
            // symlinked folders are not followed
            continue;
        } else if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)) {
                files.push(path);
            }
        }
    }

    Ok(())
}

/// Extract a feature row from every image of the collection.
///
/// The configuration is validated and the output folder created before any image is read; those failures abort
/// the run. After that a failing image never does: its identifier goes into the report's error log and the run
/// moves on to the next one.
///
/// When saving, every normalized image is written as `{id}.{extension}` into `save_path/label`, followed by the
/// rows as `{label}.csv` and the error log as `{label}_errors.txt`. An existing output folder is never reused.
pub fn process_collection(collection: &[PathBuf], config: &BatchConfig) -> Result<BatchReport> {
    config.validate()?;

    let output_dir = if config.save {
        Some(create_output_dir(&config.output_dir())?)
    } else {
        None
    };

    let builder = FeatureRowBuilder::new(config.label.clone(), config.extraction.clone());
    let process = |(index, path): (usize, &PathBuf)| {
        let result = process_image(&builder, index, path, output_dir.as_deref());
        (builder.identifier(index), result)
    };

    let results: Vec<(String, Result<FeatureRow>)> = if config.parallel {
        let run = || -> Vec<(String, Result<FeatureRow>)> {
            collection.par_iter().enumerate().map(process).collect()
        };

        match config.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| SignatureError::invalid_configuration("threads", e))?
                .install(run),
            None => run(),
        }
    } else {
        collection.iter().enumerate().map(process).collect()
    };

    let mut report = BatchReport {
        output_dir,
        ..Default::default()
    };

    for (id, result) in results {
        match result {
            Ok(row) => report.rows.push(row),
            Err(e) => {
                if e.is_recoverable() {
                    log::warn!("{}: {}", id, error_chain(&e));
                } else {
                    log::error!("{}: {}", id, error_chain(&e));
                }
                report.errors_log.push(id);
            }
        }
    }

    if let Some(dir) = &report.output_dir {
        write_csv(&report.rows, &dir.join(format!("{}.csv", config.label)))?;
        write_errors_log(&report.errors_log, &dir.join(format!("{}_errors.txt", config.label)))?;
    }

    log::info!(
        "{} exceptions raised during the process. Check the errors log for more info.",
        report.failures()
    );

    Ok(report)
}

fn create_output_dir(dir: &Path) -> Result<PathBuf> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(dir.to_path_buf()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(SignatureError::OutputCollision {
            path: dir.to_path_buf(),
        }),
        Err(e) => Err(SignatureError::io(dir, e)),
    }
}

fn process_image(
    builder: &FeatureRowBuilder,
    index: usize,
    path: &Path,
    output_dir: Option<&Path>,
) -> Result<FeatureRow> {
    log::debug!("processing {}", path.display());
    let (row, normalized) = builder.build_from_path(index, path)?;

    if let Some(dir) = output_dir {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("png");
        let destination = dir.join(format!("{}.{}", row.id, extension));

        normalized.save(&destination).map_err(|source| SignatureError::Save {
            path: destination,
            source,
        })?;
    }

    Ok(row)
}

fn error_chain(error: &SignatureError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

/// Write the rows as comma separated values, one line per row, without a header.
pub fn write_csv(rows: &[FeatureRow], path: &Path) -> Result<()> {
    let file = fs::File::create(path).map_err(|e| SignatureError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    for row in rows {
        let line = row.to_record().iter().map(|field| escape_field(field)).collect::<Vec<_>>().join(",");
        writeln!(writer, "{}", line).map_err(|e| SignatureError::io(path, e))?;
    }

    writer.flush().map_err(|e| SignatureError::io(path, e))
}

fn write_errors_log(errors_log: &[String], path: &Path) -> Result<()> {
    let mut content = errors_log.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    fs::write(path, content).map_err(|e| SignatureError::io(path, e))
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
