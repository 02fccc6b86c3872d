use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::model::LaunchRecord;

pub const COL_LAUNCH_SITE: &str = "Launch Site";
pub const COL_PAYLOAD: &str = "Payload Mass (kg)";
pub const COL_CLASS: &str = "class";
pub const COL_BOOSTER_CATEGORY: &str = "Booster Version Category";

pub const REQUIRED_COLUMNS: [&str; 4] = [
    COL_LAUNCH_SITE,
    COL_PAYLOAD,
    COL_CLASS,
    COL_BOOSTER_CATEGORY,
];

/// The launch records plus the bounds computed once at load time.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<LaunchRecord>,
    min_payload: f64,
    max_payload: f64,
    sites: Vec<String>,
}

impl Dataset {
    pub fn from_records(records: Vec<LaunchRecord>) -> Self {
        let min_payload = records
            .iter()
            .map(|r| r.payload_mass_kg)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
            .unwrap_or(0.0);
        let max_payload = records
            .iter()
            .map(|r| r.payload_mass_kg)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
            .unwrap_or(0.0);
        let sites = distinct(records.iter().map(|r| r.launch_site.as_str()));
        Self {
            records,
            min_payload,
            max_payload,
            sites,
        }
    }

    pub fn records(&self) -> &[LaunchRecord] {
        &self.records
    }

    pub fn min_payload(&self) -> f64 {
        self.min_payload
    }

    pub fn max_payload(&self) -> f64 {
        self.max_payload
    }

    /// Distinct launch sites in first-appearance order.
    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn has_site(&self, site: &str) -> bool {
        self.sites.iter().any(|s| s == site)
    }

    pub fn booster_categories(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.booster_category.as_str()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.iter().any(|s| s == v) {
            out.push(v.to_string());
        }
    }
    out
}

/// Column positions of the required fields within a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    site: usize,
    payload: usize,
    class: usize,
    booster: usize,
}

impl ColumnMap {
    fn from_header(header: &[String], path: &Path) -> Result<Self, LoadError> {
        let find = |name: &str| header.iter().position(|h| h == name);
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| find(*c).is_none())
            .map(String::from)
            .collect();
        match (
            find(COL_LAUNCH_SITE),
            find(COL_PAYLOAD),
            find(COL_CLASS),
            find(COL_BOOSTER_CATEGORY),
        ) {
            (Some(site), Some(payload), Some(class), Some(booster)) => Ok(Self {
                site,
                payload,
                class,
                booster,
            }),
            _ => Err(LoadError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            }),
        }
    }

    fn width(&self) -> usize {
        self.site.max(self.payload).max(self.class).max(self.booster) + 1
    }
}

/// Reads the launch CSV. Any missing column or unparseable row aborts the load.
///
/// A quoted field may span several physical lines; the row is parsed once its
/// quotes balance and errors report the line the row started on.
pub fn load(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut columns: Option<ColumnMap> = None;
    let mut records = Vec::new();
    let mut pending = String::new();
    let mut start_line = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if pending.is_empty() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            start_line = idx + 1;
            pending.push_str(trimmed);
        } else {
            pending.push('\n');
            pending.push_str(&line);
        }
        if quote_open(&pending) {
            continue;
        }

        let fields = split_csv_line(pending.trim_end());
        match columns {
            None => columns = Some(ColumnMap::from_header(&fields, path)?),
            Some(cols) => records.push(parse_record(&fields, cols, start_line)?),
        }
        pending.clear();
    }

    if !pending.is_empty() {
        return Err(LoadError::BadRow {
            line: start_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if columns.is_none() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(Dataset::from_records(records))
}

/// True while `text` has an unclosed double quote. `""` escapes keep the parity even.
fn quote_open(text: &str) -> bool {
    text.matches('"').count() % 2 == 1
}

fn parse_record(
    fields: &[String],
    cols: ColumnMap,
    line: usize,
) -> Result<LaunchRecord, LoadError> {
    if fields.len() < cols.width() {
        return Err(LoadError::BadRow {
            line,
            reason: format!("expected {}+ columns, got {}", cols.width(), fields.len()),
        });
    }
    let payload_raw = &fields[cols.payload];
    let payload_mass_kg: f64 = payload_raw.parse().map_err(|_| LoadError::BadRow {
        line,
        reason: format!("bad payload mass: {:?}", payload_raw),
    })?;
    if !payload_mass_kg.is_finite() {
        return Err(LoadError::BadRow {
            line,
            reason: format!("non-finite payload mass: {:?}", payload_raw),
        });
    }
    Ok(LaunchRecord {
        launch_site: fields[cols.site].clone(),
        payload_mass_kg,
        outcome: parse_class(&fields[cols.class], line)?,
        booster_category: fields[cols.booster].clone(),
    })
}

fn parse_class(raw: &str, line: usize) -> Result<u8, LoadError> {
    let value: f64 = raw.parse().map_err(|_| LoadError::BadRow {
        line,
        reason: format!("bad class: {:?}", raw),
    })?;
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(LoadError::BadRow {
            line,
            reason: format!("class must be 0 or 1, got {}", raw),
        })
    }
}

/// Splits one CSV line, honoring double-quoted fields and `""` escapes. Fields are trimmed.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub row_count: u64,
    pub sites: Vec<String>,
    pub booster_categories: Vec<String>,
    pub min_payload: f64,
    pub max_payload: f64,
    pub successes: u64,
    pub failures: u64,
}

impl DatasetManifest {
    pub fn build(path: &Path, dataset: &Dataset) -> Result<Self, LoadError> {
        let successes = dataset.records().iter().filter(|r| r.is_success()).count() as u64;
        Ok(Self {
            path: path.display().to_string(),
            hash_sha256: file_sha256(path)?,
            row_count: dataset.len() as u64,
            sites: dataset.sites().to_vec(),
            booster_categories: dataset.booster_categories(),
            min_payload: dataset.min_payload(),
            max_payload: dataset.max_payload(),
            successes,
            failures: dataset.len() as u64 - successes,
        })
    }
}

pub fn file_sha256(path: &Path) -> Result<String, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("launches.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}
