use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn aq_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("aq");
    path
}

const SOURCE_TEXT: &str = "Call me Ishmael. Some years ago I went to sea. It is a way I have \
of driving off the spleen. Whenever I find myself growing grim about the mouth, I account it \
high time to get to sea. There is nothing surprising in this. If they but knew it, almost all \
men cherish very nearly the same feelings.";

fn setup_vault() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let vault_dir = root.join("vault");
    fs::create_dir_all(vault_dir.join("reading")).unwrap();
    fs::create_dir_all(vault_dir.join("books")).unwrap();

    fs::write(
        vault_dir.join("reading/moby-dick.md"),
        "---\ntitle: Moby Dick notes\nsource_text: [[Moby Dick]]\n---\n\nSome reading notes.\n",
    )
    .unwrap();
    fs::write(vault_dir.join("books/Moby Dick.md"), SOURCE_TEXT).unwrap();
    fs::write(
        vault_dir.join("reading/unlinked.md"),
        "# No source here\n\nJust text.\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[vault]
root = "{}/vault"

[import]
location = "Imports"
"#,
        root.display()
    );

    let config_path = config_dir.join("aq.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_aq(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = aq_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run aq binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_search_finds_match() {
    let (_tmp, config_path) = setup_vault();

    let (stdout, stderr, success) = run_aq(
        &config_path,
        &["search", "reading/moby-dick", "driving off the spleen"],
    );
    assert!(
        success,
        "search failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("1 match(es)"));
    assert!(stdout.contains("offset"));
    assert!(stdout.contains("driving off the spleen."));
}

#[test]
fn test_search_is_case_insensitive() {
    let (_tmp, config_path) = setup_vault();

    let (stdout, _, success) = run_aq(
        &config_path,
        &["search", "reading/moby-dick.md", "DRIVING OFF THE spleen"],
    );
    assert!(success);
    assert!(stdout.contains("1 match(es)"));
}

#[test]
fn test_search_short_query_matches_nothing() {
    let (_tmp, config_path) = setup_vault();

    // Five characters: at the threshold, still no matches.
    let (stdout, _, success) = run_aq(&config_path, &["search", "reading/moby-dick", "whale"]);
    assert!(success);
    assert!(stdout.contains("No matches."));
}

#[test]
fn test_search_json_output() {
    let (_tmp, config_path) = setup_vault();

    let (stdout, _, success) = run_aq(
        &config_path,
        &["search", "reading/moby-dick", "Call me Ishmael", "--json"],
    );
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let matches = parsed.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["offset"], 0);
    assert!(matches[0]["preview"]
        .as_str()
        .unwrap()
        .starts_with("Call me Ishmael."));
}

#[test]
fn test_search_without_source_link_notices() {
    let (_tmp, config_path) = setup_vault();

    let (stdout, stderr, success) =
        run_aq(&config_path, &["search", "reading/unlinked", "anything at all"]);
    assert!(success, "precondition failures are notices, not errors");
    assert!(stdout.contains("No matches."));
    assert!(stderr.contains("No source link"));
}

#[test]
fn test_search_unresolvable_link_notices() {
    let (tmp, config_path) = setup_vault();
    fs::write(
        tmp.path().join("vault/reading/broken.md"),
        "source_text: [[Missing Book]]\n",
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_aq(&config_path, &["search", "reading/broken", "anything at all"]);
    assert!(success);
    assert!(stdout.contains("No matches."));
    assert!(stderr.contains("Unable to resolve source link: Missing Book"));
}

#[test]
fn test_quote_scripted_inserts_callout() {
    let (tmp, config_path) = setup_vault();

    let (stdout, stderr, success) = run_aq(
        &config_path,
        &[
            "quote",
            "reading/moby-dick",
            "--query",
            "driving off the spleen",
            "--sentences",
            "2",
        ],
    );
    assert!(success, "quote failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stderr.contains("Inserted"));

    let note = fs::read_to_string(tmp.path().join("vault/reading/moby-dick.md")).unwrap();
    assert!(note.contains("> [!quote]"));
    assert!(note.contains(
        "> driving off the spleen. Whenever I find myself growing grim about the mouth, \
         I account it high time to get to sea."
    ));
    // The original body is still there, above the quote.
    assert!(note.starts_with("---\ntitle: Moby Dick notes"));
}

#[test]
fn test_quote_default_count_clamps_to_sample() {
    let (tmp, config_path) = setup_vault();

    // No --sentences: the default of five clamps to what the sample holds.
    let (_, _, success) = run_aq(
        &config_path,
        &[
            "quote",
            "reading/moby-dick",
            "--query",
            "nothing surprising in this",
            "--style",
            "blockquote",
        ],
    );
    assert!(success);

    let note = fs::read_to_string(tmp.path().join("vault/reading/moby-dick.md")).unwrap();
    // The sample has two sentences from the match onward.
    assert!(note.contains(
        "> nothing surprising in this. If they but knew it, almost all men cherish very \
         nearly the same feelings."
    ));
    assert!(!note.contains("> [!quote]"));
}

#[test]
fn test_quote_dry_run_prints_without_writing() {
    let (tmp, config_path) = setup_vault();
    let before = fs::read_to_string(tmp.path().join("vault/reading/moby-dick.md")).unwrap();

    let (stdout, _, success) = run_aq(
        &config_path,
        &[
            "quote",
            "reading/moby-dick",
            "--query",
            "Call me Ishmael",
            "--sentences",
            "1",
            "--style",
            "plain",
            "--dry-run",
        ],
    );
    assert!(success);
    assert_eq!(stdout, "Call me Ishmael.\n");

    let after = fs::read_to_string(tmp.path().join("vault/reading/moby-dick.md")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_quote_at_line_inserts_at_top() {
    let (tmp, config_path) = setup_vault();

    let (_, _, success) = run_aq(
        &config_path,
        &[
            "quote",
            "reading/moby-dick",
            "--query",
            "Call me Ishmael",
            "--sentences",
            "1",
            "--at",
            "1",
        ],
    );
    assert!(success);

    let note = fs::read_to_string(tmp.path().join("vault/reading/moby-dick.md")).unwrap();
    assert!(note.starts_with("> [!quote]\n> Call me Ishmael.\n"));
}

#[test]
fn test_quote_no_match_reports_and_writes_nothing() {
    let (tmp, config_path) = setup_vault();
    let before = fs::read_to_string(tmp.path().join("vault/reading/moby-dick.md")).unwrap();

    let (stdout, _, success) = run_aq(
        &config_path,
        &[
            "quote",
            "reading/moby-dick",
            "--query",
            "text that is nowhere in the book",
        ],
    );
    assert!(success);
    assert!(stdout.contains("No matches."));

    let after = fs::read_to_string(tmp.path().join("vault/reading/moby-dick.md")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_quote_pick_out_of_range_fails() {
    let (_tmp, config_path) = setup_vault();

    let (_, stderr, success) = run_aq(
        &config_path,
        &[
            "quote",
            "reading/moby-dick",
            "--query",
            "Call me Ishmael",
            "--pick",
            "4",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("out of range"));
}

#[test]
fn test_quote_interactive_requires_terminal() {
    let (_tmp, config_path) = setup_vault();

    // stdin is not a TTY under the test harness.
    let (_, stderr, success) = run_aq(&config_path, &["quote", "reading/moby-dick"]);
    assert!(!success);
    assert!(stderr.contains("terminal"));
}

#[test]
fn test_unknown_note_fails() {
    let (_tmp, config_path) = setup_vault();

    let (_, stderr, success) = run_aq(&config_path, &["search", "reading/nope", "long enough"]);
    assert!(!success);
    assert!(stderr.contains("Note not found"));
}

#[test]
fn test_init_scaffolds_config() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config/aq.toml");

    let (stdout, stderr, success) = run_aq(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(config_path.is_file());

    // Refuses to clobber without --force.
    let (_, stderr, success) = run_aq(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));

    let (_, _, success) = run_aq(&config_path, &["init", "--force"]);
    assert!(success);
}
