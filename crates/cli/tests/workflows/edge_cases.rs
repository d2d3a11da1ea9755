//! Configuration, logging and argument edge cases

use crate::common::TestDb;
use crate::taggr;
use anyhow::Result;

#[test]
fn test_config_example_parses_back() -> Result<()> {
    let db = TestDb::new()?;
    let example = taggr!(db.root(), "--config-example").assert_success()?;
    assert!(example.contains_stdout("separator = \".\""));

    std::fs::write(db.root().join("taggr.toml"), &example.stdout)?;
    db.cmd(&["--config", "taggr.toml", "insert", "tags", "from.config"])
        .assert_success()?;
    Ok(())
}

#[test]
fn test_config_file_separator() -> Result<()> {
    let db = TestDb::new()?;
    db.write_file("taggr.toml", b"separator = \"::\"\n")?;

    db.cmd(&["--config", "taggr.toml", "insert", "tags", "lang::rust"])
        .assert_success()?;
    let listed = db
        .cmd(&["--config", "taggr.toml", "tags"])
        .assert_success()?;
    assert_eq!(listed.lines(), vec!["lang", "lang::rust"]);
    Ok(())
}

#[test]
fn test_invalid_config_is_malformed_input() -> Result<()> {
    let db = TestDb::new()?;
    db.write_file("bad.toml", b"chunk_size = 0\n")?;

    let result = db
        .cmd(&["--config", "bad.toml", "tags"])
        .assert_failure()?;
    assert_eq!(result.exit_code, 2);
    assert!(result.contains_stderr("chunk_size"));
    Ok(())
}

#[test]
fn test_empty_default_digests_rejected() -> Result<()> {
    let db = TestDb::new()?;
    db.write_file("nodigests.toml", b"digests = []\n")?;

    let result = db
        .cmd(&["--config", "nodigests.toml", "insert", "data", "-"])
        .stdin(b"payload".to_vec())
        .assert_failure()?;
    assert_eq!(result.exit_code, 2);
    assert!(result.contains_stderr("digests"));
    assert_eq!(db.stat("data")?, 0);
    Ok(())
}

#[test]
fn test_verbose_logs_go_to_stderr() -> Result<()> {
    let db = TestDb::new()?;
    let result = db
        .cmd(&["-vv", "insert", "tags", "a.b"])
        .assert_success()?;

    assert!(result.contains_stderr("Created tag"));
    assert!(!result.contains_stdout("Created tag"));
    Ok(())
}

#[test]
fn test_missing_command_fails() -> Result<()> {
    let db = TestDb::new()?;
    taggr!(db.root(), "meta.db").assert_failure()?;
    taggr!(db.root(), "meta.db", "insert", "tags").assert_failure()?;
    Ok(())
}

#[test]
fn test_zero_buffer_size_rejected() -> Result<()> {
    let db = TestDb::new()?;
    let result = db
        .cmd(&["insert", "data", "-", "--buffer-size", "0"])
        .stdin(b"x".to_vec())
        .assert_failure()?;
    assert_eq!(result.exit_code, 2);
    Ok(())
}
