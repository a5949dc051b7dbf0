use anyhow::{Context, Result};
use serde::Deserialize;
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One crawled page as written by the crawler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputDoc {
    pub url: String,
    pub text: String,
}

/// Input files under `input`, numeric stems (`2.json` before `10.json`) first.
pub fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input path {} does not exist", input.display());
    }
    files.sort_by_key(|p| (numeric_stem(p).unwrap_or(u64::MAX), p.clone()));
    Ok(files)
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn numeric_stem(p: &Path) -> Option<u64> {
    p.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse().ok())
}

/// Reads every record of `file`, handing each to `sink`. Records that fail to
/// decode are logged and skipped; unreadable files are errors.
pub fn read_records(file: &Path, mut sink: impl FnMut(InputDoc)) -> Result<usize> {
    let mut count = 0;
    if extension(file) == Some("jsonl") {
        let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("reading {}", file.display()))?;
            if line.trim().is_empty() { continue; }
            match serde_json::from_str::<InputDoc>(&line) {
                Ok(doc) => { sink(doc); count += 1; }
                Err(e) => tracing::warn!(file = %file.display(), line = lineno + 1, error = %e, "skipping malformed record"),
            }
        }
    } else {
        let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
        match serde_json::from_reader::<_, serde_json::Value>(reader) {
            Ok(serde_json::Value::Array(arr)) => {
                for v in arr {
                    match serde_json::from_value::<InputDoc>(v) {
                        Ok(doc) => { sink(doc); count += 1; }
                        Err(e) => tracing::warn!(file = %file.display(), error = %e, "skipping malformed record"),
                    }
                }
            }
            Ok(v @ serde_json::Value::Object(_)) => match serde_json::from_value::<InputDoc>(v) {
                Ok(doc) => { sink(doc); count += 1; }
                Err(e) => tracing::warn!(file = %file.display(), error = %e, "skipping malformed record"),
            },
            Ok(_) => tracing::warn!(file = %file.display(), "skipping file without records"),
            Err(e) => tracing::warn!(file = %file.display(), error = %e, "skipping unparsable file"),
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn numeric_stems_sort_naturally() {
        let dir = tempdir().unwrap();
        for name in ["10.json", "2.json", "1.json", "extra.jsonl", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        let names: Vec<String> = collect_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["1.json", "2.json", "10.json", "extra.jsonl"]);
    }

    #[test]
    fn reads_single_object_array_and_jsonl() {
        let dir = tempdir().unwrap();
        let one = dir.path().join("1.json");
        let many = dir.path().join("2.json");
        let lines = dir.path().join("3.jsonl");
        fs::write(&one, r#"{"url": "u1", "text": "uno"}"#).unwrap();
        fs::write(&many, r#"[{"url": "u2", "text": "dos"}, {"url": "u3"}]"#).unwrap();
        fs::write(&lines, "{\"url\": \"u4\", \"text\": \"cuatro\"}\n\nnot json\n").unwrap();

        let mut seen = Vec::new();
        for f in [&one, &many, &lines] {
            read_records(f, |d| seen.push(d.url)).unwrap();
        }
        assert_eq!(seen, vec!["u1", "u2", "u4"]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(collect_files(&dir.path().join("nope")).is_err());
    }
}
