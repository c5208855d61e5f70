use hookguard::core::token::{self, TokenState};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fake_repo(root: &Path) -> PathBuf {
    let repo = root.join("repo");
    fs::create_dir_all(repo.join(".git")).expect("create fake repo");
    repo
}

#[test]
fn issue_then_consume_is_single_use() {
    let tmp = tempdir().expect("tempdir");
    let repo = fake_repo(tmp.path());

    let value = token::generate().expect("generate");
    token::store(&repo, &value).expect("store");
    assert!(token::token_path(&repo).exists());

    assert_eq!(token::consume(&repo).expect("consume"), TokenState::Present);
    assert!(!token::token_path(&repo).exists(), "token is deleted on use");

    // A second verifier invocation must see bypass, not "already passed".
    assert_eq!(token::consume(&repo).expect("reconsume"), TokenState::Absent);
}

#[test]
fn stored_token_survives_overwrite_of_stale_value() {
    let tmp = tempdir().expect("tempdir");
    let repo = fake_repo(tmp.path());

    token::store(&repo, "stale-from-aborted-attempt").expect("store stale");
    let fresh = token::generate().expect("generate");
    token::store(&repo, &fresh).expect("store fresh");

    let on_disk = fs::read_to_string(token::token_path(&repo)).expect("read");
    assert_eq!(on_disk, fresh);
}

#[test]
fn empty_or_whitespace_token_is_treated_as_absent() {
    let tmp = tempdir().expect("tempdir");
    let repo = fake_repo(tmp.path());

    fs::write(token::token_path(&repo), "   \n\t  ").expect("write junk token");
    assert_eq!(token::consume(&repo).expect("consume"), TokenState::Absent);
    assert!(
        !token::token_path(&repo).exists(),
        "corrupt token is removed so it cannot be replayed"
    );
}

#[cfg(unix)]
#[test]
fn insecurely_permissioned_token_is_treated_as_absent() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().expect("tempdir");
    let repo = fake_repo(tmp.path());

    let path = token::token_path(&repo);
    let value = token::generate().expect("generate");
    fs::write(&path, &value).expect("write");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");

    assert_eq!(token::consume(&repo).expect("consume"), TokenState::Absent);
    assert!(!path.exists());

    // The corrupt-token event lands in the forensic log, without the value.
    let log = fs::read_to_string(repo.join(".git").join("hookguard.events.jsonl"))
        .expect("forensic log");
    assert!(log.contains("token_corrupt"));
    assert!(!log.contains(&value), "log must never carry token material");
}

#[test]
fn non_utf8_token_is_treated_as_absent() {
    let tmp = tempdir().expect("tempdir");
    let repo = fake_repo(tmp.path());

    // The verifier must fail safe toward "bypass", not crash, on a
    // token file holding arbitrary bytes.
    fs::write(token::token_path(&repo), [0xff, 0xfe, 0x00, 0x9f]).expect("write raw bytes");
    assert_eq!(token::consume(&repo).expect("consume"), TokenState::Absent);
    assert!(!token::token_path(&repo).exists(), "corrupt token is removed");

    let log = fs::read_to_string(repo.join(".git").join("hookguard.events.jsonl"))
        .expect("forensic log");
    assert!(log.contains("token_corrupt"));
}

#[test]
fn unreadable_token_is_treated_as_absent() {
    let tmp = tempdir().expect("tempdir");
    let repo = fake_repo(tmp.path());

    // A directory at the token path makes every read fail regardless of
    // the invoking user's privileges.
    fs::create_dir(token::token_path(&repo)).expect("occupy token path");
    assert_eq!(token::consume(&repo).expect("consume"), TokenState::Absent);

    let log = fs::read_to_string(repo.join(".git").join("hookguard.events.jsonl"))
        .expect("forensic log");
    assert!(log.contains("token_corrupt"));
}

#[test]
fn token_operations_require_a_repository() {
    let tmp = tempdir().expect("tempdir");
    assert!(token::store(tmp.path(), "abc").is_err());
    assert!(token::consume(tmp.path()).is_err());
}
