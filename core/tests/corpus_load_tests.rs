use cinematch_core::corpus::load;
use cinematch_core::{DataLoadError, SourceColumns};
use std::fs;
use tempfile::tempdir;

const MOVIES_CSV: &str = "\
title,soup,poster_path,genres,director
Avatar,action adventure fantasy jamescameron,https://img/avatar.jpg,\"['Action', 'Adventure', 'Fantasy']\",James Cameron
Spectre,action adventure crime sammendes,,\"['Action', 'Adventure', 'Crime']\",Sam Mendes
Untitled,,,,
Avatar,duplicate row,,,
";

#[test]
fn loads_csv_with_display_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("movies.csv");
    fs::write(&path, MOVIES_CSV).unwrap();

    let corpus = load(&path, &SourceColumns::default()).unwrap();
    assert_eq!(corpus.len(), 2);
    let avatar = corpus.get("Avatar").unwrap();
    assert_eq!(avatar.position, 0);
    assert_eq!(avatar.descriptor, "action adventure fantasy jamescameron");
    assert_eq!(avatar.field("director"), Some("James Cameron"));
    assert_eq!(avatar.field("genres"), Some("['Action', 'Adventure', 'Fantasy']"));
    // empty cells are not carried as metadata
    assert_eq!(corpus.get("Spectre").unwrap().field("poster_path"), None);

    let report = corpus.report();
    assert_eq!(report.rows_read, 4);
    assert_eq!(report.missing_descriptor, 1);
    assert_eq!(report.duplicates, 1);
}

#[test]
fn missing_descriptor_column_is_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("movies.csv");
    fs::write(&path, "title,overview\nAvatar,blue people\n").unwrap();
    match load(&path, &SourceColumns::default()) {
        Err(DataLoadError::MissingColumn { column, .. }) => assert_eq!(column, "soup"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn missing_file_is_fatal() {
    let dir = tempdir().unwrap();
    let err = load(&dir.path().join("absent.csv"), &SourceColumns::default()).unwrap_err();
    assert!(matches!(err, DataLoadError::NotFound(_)));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("movies.parquet");
    fs::write(&path, "binary").unwrap();
    assert!(matches!(load(&path, &SourceColumns::default()), Err(DataLoadError::Unsupported(_))));
}

#[test]
fn custom_column_names() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("items.csv");
    fs::write(&path, "name,tags\nA,space crew\nB,space alien\n").unwrap();
    let columns = SourceColumns { key: "name".into(), descriptor: "tags".into() };
    let corpus = load(&path, &columns).unwrap();
    assert_eq!(corpus.all_keys(), vec!["A", "B"]);
}

#[test]
fn loads_json_and_jsonl_directory_in_path_order() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("b.jsonl"),
        "{\"title\": \"Heat\", \"soup\": \"crime heist\", \"year\": 1995}\n\n{\"title\": \"Ronin\", \"soup\": \"crime car chase\", \"poster_path\": null}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("a.json"),
        r#"[{"title": "Alien", "soup": "space horror", "genres": ["Horror", "Science Fiction"]}]"#,
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let corpus = load(dir.path(), &SourceColumns::default()).unwrap();
    let order: Vec<&str> = corpus.records().iter().map(|r| r.key.as_str()).collect();
    assert_eq!(order, vec!["Alien", "Heat", "Ronin"]);
    assert_eq!(corpus.get("Heat").unwrap().field("year"), Some("1995"));
    assert_eq!(corpus.get("Alien").unwrap().field("genres"), Some(r#"["Horror","Science Fiction"]"#));
    assert_eq!(corpus.get("Ronin").unwrap().field("poster_path"), None);
}

#[test]
fn malformed_jsonl_is_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("movies.jsonl");
    fs::write(&path, "{\"title\": \"Heat\", \"soup\": \"crime\"}\n{not json\n").unwrap();
    assert!(matches!(load(&path, &SourceColumns::default()), Err(DataLoadError::Json { .. })));
}

#[test]
fn ragged_csv_row_is_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("movies.csv");
    fs::write(&path, "title,soup\nAvatar,space marines\nHeat,crime heist,extra\n").unwrap();
    match load(&path, &SourceColumns::default()) {
        Err(DataLoadError::Csv { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Csv error, got {other:?}"),
    }
}

#[test]
fn blank_title_rows_are_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("movies.csv");
    fs::write(&path, "title,soup\n   ,space marines\nHeat,crime heist\n").unwrap();
    let corpus = load(&path, &SourceColumns::default()).unwrap();
    assert_eq!(corpus.all_keys(), vec!["Heat"]);
    assert_eq!(corpus.report().missing_key, 1);
}
