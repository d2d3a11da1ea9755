//! Content insertion through files and standard input

use crate::common::TestDb;
use anyhow::Result;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
const ABC_SHA1: &str = "a9993e364706816aba3e25717850c26c9cd0d89d";
const ABC_MD5: &str = "900150983cd24fb0d6963f7d28e17f72";

#[test]
fn test_insert_file_default_digest() -> Result<()> {
    let db = TestDb::new()?;
    db.write_file("abc.txt", b"abc")?;

    let result = db.cmd(&["insert", "data", "abc.txt"]).assert_success()?;
    assert!(result.parse_data_id().is_some());

    let digests = result.parse_digests();
    assert_eq!(digests.len(), 1);
    assert_eq!(digests["sha256"], ABC_SHA256);
    Ok(())
}

#[test]
fn test_insert_stdin_with_selected_digests() -> Result<()> {
    let db = TestDb::new()?;
    let result = db
        .cmd(&["insert", "data", "-", "-H", "md5", "-H", "sha1"])
        .stdin(b"abc".to_vec())
        .assert_success()?;

    let id = result.parse_data_id().unwrap_or(-1);
    assert_eq!(
        result.stdout,
        format!("data {}\nmd5 {}\nsha1 {}\n", id, ABC_MD5, ABC_SHA1)
    );
    Ok(())
}

#[test]
fn test_file_and_stdin_share_identity() -> Result<()> {
    let db = TestDb::new()?;
    let mut payload = vec![0u8; 200_000];
    ChaCha8Rng::seed_from_u64(9).fill_bytes(&mut payload);
    db.write_file("blob.bin", &payload)?;

    let from_file = db
        .cmd(&["insert", "data", "blob.bin", "--buffer-size", "4096"])
        .assert_success()?;
    let from_stdin = db
        .cmd(&["insert", "data", "-", "--buffer-size", "777"])
        .stdin(payload)
        .assert_success()?;

    assert_eq!(from_file.parse_data_id(), from_stdin.parse_data_id());
    assert_eq!(from_file.parse_digests(), from_stdin.parse_digests());

    assert_eq!(db.stat("data")?, 1);
    Ok(())
}

#[test]
fn test_digests_recorded_on_content() -> Result<()> {
    let db = TestDb::new()?;
    db.write_file("abc.txt", b"abc")?;
    let inserted = db
        .cmd(&["insert", "data", "abc.txt", "-H", "sha256", "-H", "blake3"])
        .assert_success()?;
    let id = inserted.parse_data_id().unwrap_or(-1).to_string();

    let shown = db.cmd(&["show", &id]).assert_success()?;
    assert!(shown.contains_stdout("(3 bytes)"));
    assert!(shown.contains_stdout(&format!("SHA.2.256={}", ABC_SHA256)));
    assert!(shown.contains_stdout("BLAKE.3="));
    Ok(())
}

#[test]
fn test_empty_input() -> Result<()> {
    let db = TestDb::new()?;
    db.write_file("empty", b"")?;

    let result = db
        .cmd(&["insert", "data", "empty", "-H", "md5"])
        .assert_success()?;
    assert_eq!(
        result.parse_digests()["md5"],
        "d41d8cd98f00b204e9800998ecf8427e"
    );
    Ok(())
}

#[test]
fn test_unsupported_digest_rejected() -> Result<()> {
    let db = TestDb::new()?;
    let result = db
        .cmd(&["insert", "data", "-", "-H", "crc32"])
        .stdin(b"abc".to_vec())
        .assert_failure()?;

    assert_eq!(result.exit_code, 2);
    assert!(result.contains_stderr("crc32"));
    assert!(!db.root().join(db.db()).exists());
    Ok(())
}

#[test]
fn test_missing_file_fails() -> Result<()> {
    let db = TestDb::new()?;
    let result = db
        .cmd(&["insert", "data", "does-not-exist.bin"])
        .assert_failure()?;

    assert_eq!(result.exit_code, 1);
    assert!(result.contains_stderr("does-not-exist.bin"));
    Ok(())
}
