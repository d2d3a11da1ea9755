//! Tag insertion and hierarchy listing

use crate::common::TestDb;
use anyhow::Result;

#[test]
fn test_insert_tags_builds_hierarchy() -> Result<()> {
    let db = TestDb::new()?;
    db.cmd(&["insert", "tags", "a.b.c", "a.b.d", "x"])
        .assert_success()?;

    let listed = db.cmd(&["tags"]).assert_success()?;
    assert_eq!(listed.lines(), vec!["a", "a.b", "a.b.c", "a.b.d", "x"]);

    let roots = db.cmd(&["tags", "--roots"]).assert_success()?;
    assert_eq!(roots.lines(), vec!["a", "x"]);
    Ok(())
}

#[test]
fn test_insert_tag_alias_and_idempotence() -> Result<()> {
    let db = TestDb::new()?;
    db.cmd(&["insert", "tag", "a.b.c"]).assert_success()?;
    db.cmd(&["insert", "tags", "a.b.c"]).assert_success()?;

    assert_eq!(db.stat("tags")?, 3);
    Ok(())
}

#[test]
fn test_malformed_tag_persists_nothing() -> Result<()> {
    let db = TestDb::new()?;
    let result = db
        .cmd(&["insert", "tags", "good.one", "bad..path", "good.two"])
        .assert_failure()?;

    assert_eq!(result.exit_code, 2);
    assert!(result.contains_stderr("bad..path"));
    assert_eq!(db.stat("tags")?, 0);
    Ok(())
}

#[test]
fn test_descendants() -> Result<()> {
    let db = TestDb::new()?;
    db.cmd(&["insert", "tags", "a.b.c", "a.d", "e.b"])
        .assert_success()?;

    let under_a = db.cmd(&["descendants", "a"]).assert_success()?;
    assert_eq!(under_a.lines(), vec!["a", "a.b", "a.b.c", "a.d"]);

    let under_ab = db.cmd(&["descendants", "a.b"]).assert_success()?;
    assert_eq!(under_ab.lines(), vec!["a.b", "a.b.c"]);

    let unknown = db.cmd(&["descendants", "nope"]).assert_failure()?;
    assert_eq!(unknown.exit_code, 1);
    assert!(unknown.contains_stderr("nope"));
    Ok(())
}

#[test]
fn test_custom_separator() -> Result<()> {
    let db = TestDb::new()?;
    db.cmd(&["--separator", "/", "insert", "tags", "media/audio/flac"])
        .assert_success()?;

    let listed = db
        .cmd(&["--separator", "/", "tags"])
        .assert_success()?;
    assert_eq!(listed.lines(), vec!["media", "media/audio", "media/audio/flac"]);

    // Same rows, other separator
    let dotted = db.cmd(&["tags"]).assert_success()?;
    assert!(dotted.contains_stdout("media.audio.flac"));
    Ok(())
}
