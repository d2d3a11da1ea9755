//! Tagging content and querying by tag

use crate::common::TestDb;
use anyhow::Result;

fn insert(db: &TestDb, contents: &[u8]) -> Result<String> {
    let result = db
        .cmd(&["insert", "data", "-"])
        .stdin(contents.to_vec())
        .assert_success()?;
    result
        .parse_data_id()
        .map(|id| id.to_string())
        .ok_or_else(|| anyhow::anyhow!("no data id in {}", result.stdout))
}

#[test]
fn test_tag_with_flags_and_values() -> Result<()> {
    let db = TestDb::new()?;
    let id = insert(&db, b"song")?;

    db.cmd(&["tag", &id, "media.audio", "rating=5", "rating=4", "artist=Someone"])
        .assert_success()?;

    let shown = db.cmd(&["show", &id]).assert_success()?;
    assert!(shown.contains_stdout("media.audio\n"));
    assert!(shown.contains_stdout("rating=5"));
    assert!(shown.contains_stdout("rating=4"));
    assert!(shown.contains_stdout("artist=Someone"));
    Ok(())
}

#[test]
fn test_duplicate_association_rolls_back_invocation() -> Result<()> {
    let db = TestDb::new()?;
    let id = insert(&db, b"photo")?;
    db.cmd(&["tag", &id, "seen"]).assert_success()?;

    let result = db
        .cmd(&["tag", &id, "fresh.tag", "seen"])
        .assert_failure()?;
    assert_eq!(result.exit_code, 1);
    assert!(result.contains_stderr("already exists"));

    // fresh.tag was created before the failure and must be gone
    let listed = db.cmd(&["tags"]).assert_success()?;
    assert!(!listed.contains_stdout("fresh"));
    Ok(())
}

#[test]
fn test_same_value_twice_fails() -> Result<()> {
    let db = TestDb::new()?;
    let id = insert(&db, b"doc")?;

    db.cmd(&["tag", &id, "lang=en", "lang=pt"]).assert_success()?;
    db.cmd(&["tag", &id, "lang=en"]).assert_failure()?;
    Ok(())
}

#[test]
fn test_values_keep_their_spelling() -> Result<()> {
    let db = TestDb::new()?;
    let id = insert(&db, b"release")?;

    db.cmd(&["tag", &id, "version=1.1"]).assert_success()?;
    db.cmd(&["tag", &id, "version=1.10", "build=007"]).assert_success()?;

    let shown = db.cmd(&["show", &id]).assert_success()?;
    assert!(shown.contains_stdout("version=1.1\n"));
    assert!(shown.contains_stdout("version=1.10\n"));
    assert!(shown.contains_stdout("build=007"));
    Ok(())
}

#[test]
fn test_tag_unknown_content() -> Result<()> {
    let db = TestDb::new()?;
    let result = db.cmd(&["tag", "999", "orphan"]).assert_failure()?;
    assert!(result.contains_stderr("999"));

    let listed = db.cmd(&["tags"]).assert_success()?;
    assert!(listed.lines().is_empty());
    Ok(())
}

#[test]
fn test_find_direct_and_recursive() -> Result<()> {
    let db = TestDb::new()?;
    let top = insert(&db, b"top")?;
    let deep = insert(&db, b"deep")?;
    db.cmd(&["tag", &top, "media"]).assert_success()?;
    db.cmd(&["tag", &deep, "media.video.mkv"]).assert_success()?;

    let direct = db.cmd(&["find", "media"]).assert_success()?;
    assert_eq!(direct.lines(), vec![top.as_str()]);

    let recursive = db.cmd(&["find", "media", "--recursive"]).assert_success()?;
    let mut expected = vec![top.as_str(), deep.as_str()];
    expected.sort_by_key(|id| id.parse::<i64>().unwrap_or(0));
    assert_eq!(recursive.lines(), expected);
    Ok(())
}
