use crate::config::SourceColumns;
use crate::error::DataLoadError;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One row of the source table before cleaning: column name to cell text.
pub type RawRecord = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Row in the feature and similarity matrices.
    pub position: usize,
    pub key: String,
    pub descriptor: String,
    /// Display columns passed through untouched. Empty cells are omitted.
    pub metadata: BTreeMap<String, String>,
}

impl ItemRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub missing_descriptor: usize,
    pub missing_key: usize,
    pub duplicates: usize,
}

/// The cleaned, immutable item table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    records: Vec<ItemRecord>,
    positions: HashMap<String, usize>,
    report: LoadReport,
}

impl Corpus {
    /// Clean raw rows into a corpus: rows without a key or a non-empty
    /// descriptor are dropped, and duplicate keys keep their first row.
    pub fn from_records<I>(rows: I, columns: &SourceColumns) -> Result<Self, DataLoadError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut records: Vec<ItemRecord> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut report = LoadReport::default();

        for mut row in rows {
            report.rows_read += 1;
            let descriptor = match row.remove(&columns.descriptor) {
                Some(d) if !d.trim().is_empty() => d,
                _ => {
                    report.missing_descriptor += 1;
                    continue;
                }
            };
            let key = match row.remove(&columns.key) {
                Some(k) if !k.trim().is_empty() => k,
                _ => {
                    report.missing_key += 1;
                    continue;
                }
            };
            if positions.contains_key(&key) {
                report.duplicates += 1;
                continue;
            }
            row.retain(|_, v| !v.is_empty());
            let position = records.len();
            positions.insert(key.clone(), position);
            records.push(ItemRecord { position, key, descriptor, metadata: row });
        }

        if report.missing_descriptor > 0 || report.missing_key > 0 || report.duplicates > 0 {
            tracing::warn!(
                missing_descriptor = report.missing_descriptor,
                missing_key = report.missing_key,
                duplicates = report.duplicates,
                "dropped rows while loading corpus"
            );
        }
        if records.is_empty() {
            return Err(DataLoadError::EmptyCorpus);
        }
        tracing::info!(rows_read = report.rows_read, items = records.len(), "corpus loaded");
        Ok(Self { records, positions, report })
    }

    /// Convenience constructor from (key, descriptor) pairs with no display metadata.
    pub fn from_pairs<K, D>(pairs: impl IntoIterator<Item = (K, D)>) -> Result<Self, DataLoadError>
    where
        K: Into<String>,
        D: Into<String>,
    {
        let columns = SourceColumns::default();
        let rows = pairs.into_iter().map(|(k, d)| {
            let mut row = RawRecord::new();
            row.insert(columns.key.clone(), k.into());
            row.insert(columns.descriptor.clone(), d.into());
            row
        });
        Self::from_records(rows, &columns)
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn get(&self, key: &str) -> Option<&ItemRecord> {
        self.position(key).map(|p| &self.records[p])
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn by_position(&self, position: usize) -> Option<&ItemRecord> {
        self.records.get(position)
    }

    pub fn records(&self) -> &[ItemRecord] { &self.records }

    pub fn report(&self) -> &LoadReport { &self.report }

    /// Every key, sorted lexicographically. Keys are unique by construction.
    pub fn all_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.records.iter().map(|r| r.key.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    /// Hex SHA-1 over every record in position order: key, descriptor, then
    /// each display (column, value) pair in column order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha1::new();
        for r in &self.records {
            hasher.update(r.key.as_bytes());
            hasher.update([0x1fu8]);
            hasher.update(r.descriptor.as_bytes());
            for (column, value) in &r.metadata {
                hasher.update([0x1du8]);
                hasher.update(column.as_bytes());
                hasher.update([0x1fu8]);
                hasher.update(value.as_bytes());
            }
            hasher.update([0x1eu8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Load a corpus from a `.csv`, `.json` or `.jsonl` file, or from every such
/// file below a directory (in sorted path order).
pub fn load(path: &Path, columns: &SourceColumns) -> Result<Corpus, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::NotFound(path.to_path_buf()));
    }
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && source_format(p).is_some() {
                files.push(p.to_path_buf());
            }
        }
        files.sort();
    } else if source_format(path).is_some() {
        files.push(path.to_path_buf());
    } else {
        return Err(DataLoadError::Unsupported(path.to_path_buf()));
    }

    let mut rows: Vec<RawRecord> = Vec::new();
    for file in files {
        let before = rows.len();
        match source_format(&file) {
            Some(SourceFormat::Csv) => read_csv(&file, columns, &mut rows)?,
            Some(SourceFormat::Json) => read_json(&file, &mut rows)?,
            Some(SourceFormat::Jsonl) => read_jsonl(&file, &mut rows)?,
            None => {}
        }
        let added = &rows[before..];
        if !added.is_empty() && !added.iter().any(|r| r.contains_key(&columns.descriptor)) {
            return Err(DataLoadError::MissingColumn { path: file, column: columns.descriptor.clone() });
        }
        tracing::debug!(file = %file.display(), rows = rows.len() - before, "read source file");
    }
    Corpus::from_records(rows, columns)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Csv,
    Json,
    Jsonl,
}

fn source_format(path: &Path) -> Option<SourceFormat> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => Some(SourceFormat::Csv),
        Some("json") => Some(SourceFormat::Json),
        Some("jsonl") => Some(SourceFormat::Jsonl),
        _ => None,
    }
}

fn read_csv(file: &Path, columns: &SourceColumns, rows: &mut Vec<RawRecord>) -> Result<(), DataLoadError> {
    let csv_err = |source: csv::Error| DataLoadError::Csv { path: file.to_path_buf(), source };
    let mut reader = csv::Reader::from_path(file).map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    for required in [&columns.key, &columns.descriptor] {
        if !headers.iter().any(|h| h == required.as_str()) {
            return Err(DataLoadError::MissingColumn { path: file.to_path_buf(), column: required.clone() });
        }
    }
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let row: RawRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(())
}

fn read_json(file: &Path, rows: &mut Vec<RawRecord>) -> Result<(), DataLoadError> {
    let f = File::open(file).map_err(|source| DataLoadError::Io { path: file.to_path_buf(), source })?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))
        .map_err(|source| DataLoadError::Json { path: file.to_path_buf(), source })?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                push_json_row(file, v, rows);
            }
        }
        obj @ serde_json::Value::Object(_) => push_json_row(file, obj, rows),
        _ => tracing::warn!(file = %file.display(), "json source is neither an object nor an array"),
    }
    Ok(())
}

fn read_jsonl(file: &Path, rows: &mut Vec<RawRecord>) -> Result<(), DataLoadError> {
    let f = File::open(file).map_err(|source| DataLoadError::Io { path: file.to_path_buf(), source })?;
    for line in BufReader::new(f).lines() {
        let line = line.map_err(|source| DataLoadError::Io { path: file.to_path_buf(), source })?;
        if line.trim().is_empty() { continue; }
        let v: serde_json::Value = serde_json::from_str(&line)
            .map_err(|source| DataLoadError::Json { path: file.to_path_buf(), source })?;
        push_json_row(file, v, rows);
    }
    Ok(())
}

/// Flatten a JSON object into a raw row. Strings are taken verbatim, nulls
/// omitted, and any other value is kept as its compact JSON text.
fn push_json_row(file: &Path, value: serde_json::Value, rows: &mut Vec<RawRecord>) {
    let serde_json::Value::Object(map) = value else {
        tracing::warn!(file = %file.display(), "skipping non-object json record");
        return;
    };
    let row: RawRecord = map
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect();
    rows.push(row);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_empty_descriptors_and_duplicates() {
        let corpus = Corpus::from_pairs([("A", "space"), ("B", "   "), ("A", "again"), ("C", "comedy")]).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("A").unwrap().descriptor, "space");
        assert_eq!(corpus.position("C"), Some(1));
        let report = corpus.report();
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.missing_descriptor, 1);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn blank_keys_are_dropped() {
        let corpus = Corpus::from_pairs([("  ", "space"), ("", "crew"), ("B", "alien")]).unwrap();
        assert_eq!(corpus.all_keys(), vec!["B"]);
        assert_eq!(corpus.report().missing_key, 2);
        assert_eq!(corpus.position("B"), Some(0));
    }

    #[test]
    fn fingerprint_covers_display_metadata() {
        let columns = SourceColumns::default();
        let row = |poster: &str| {
            let mut r = RawRecord::new();
            r.insert("title".to_string(), "A".to_string());
            r.insert("soup".to_string(), "space crew".to_string());
            r.insert("poster_path".to_string(), poster.to_string());
            r
        };
        let old = Corpus::from_records([row("old.jpg")], &columns).unwrap();
        let new = Corpus::from_records([row("new.jpg")], &columns).unwrap();
        let same = Corpus::from_records([row("old.jpg")], &columns).unwrap();
        assert_ne!(old.fingerprint(), new.fingerprint());
        assert_eq!(old.fingerprint(), same.fingerprint());
    }

    #[test]
    fn all_keys_are_sorted() {
        let corpus = Corpus::from_pairs([("Zulu", "z"), ("Alpha", "a"), ("Mike", "m")]).unwrap();
        assert_eq!(corpus.all_keys(), vec!["Alpha", "Mike", "Zulu"]);
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let err = Corpus::from_pairs([("A", "")]).unwrap_err();
        assert!(matches!(err, DataLoadError::EmptyCorpus));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Corpus::from_pairs([("A", "space"), ("B", "crew")]).unwrap();
        let b = Corpus::from_pairs([("A", "space"), ("B", "crew")]).unwrap();
        let c = Corpus::from_pairs([("A", "space"), ("B", "alien")]).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
