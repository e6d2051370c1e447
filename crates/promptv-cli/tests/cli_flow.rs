use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_promptv"))
}

/// Isolated home, XDG dirs and store for one test.
struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir should be created");
        for sub in ["home", "config", "data"] {
            std::fs::create_dir_all(dir.path().join(sub)).expect("create dir");
        }
        Self { dir }
    }

    fn store(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    fn config_file(&self) -> PathBuf {
        self.dir.path().join("config").join("promptv").join("config.toml")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        apply_env(&mut cmd, self.dir.path());
        cmd
    }

    /// Command with an explicit store, bypassing config.
    fn with_store(&self, args: &[&str]) -> Output {
        self.command()
            .arg("--store")
            .arg(self.store())
            .args(args)
            .output()
            .expect("run promptv")
    }
}

fn apply_env(cmd: &mut Command, base: &Path) {
    cmd.env("HOME", base.join("home"))
        .env("XDG_CONFIG_HOME", base.join("config"))
        .env("XDG_DATA_HOME", base.join("data"))
        .env_remove("PROMPTV_STORE")
        .env_remove("PROMPTV_PROJECT")
        .env_remove("PROMPTV_CONFIG")
        .env_remove("PROMPTV_LOG")
        .env("NO_COLOR", "1");
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed: stdout={} stderr={}",
        stdout(output),
        stderr(output)
    );
}

#[test]
fn test_end_to_end_scenario() {
    let env = Env::new();

    let first = env.with_store(&["commit", "p", "--content", "Hello {{name}}", "-m", "init"]);
    assert_success(&first);
    assert!(stdout(&first).contains("version 1"));

    let second = env.with_store(&["commit", "p", "--content", "Hi {{name}}!", "-m", "tweak"]);
    assert_success(&second);
    assert!(stdout(&second).contains("version 2"));

    assert_success(&env.with_store(&["tag", "create", "p", "prod", "1"]));

    let get = env.with_store(&["get", "p", "prod"]);
    assert_success(&get);
    assert_eq!(stdout(&get), "Hello {{name}}");

    let diff = env.with_store(&["diff", "p", "1", "2", "--format", "unified"]);
    assert_success(&diff);
    let text = stdout(&diff);
    assert!(text.starts_with("--- p@v1\n+++ p@v2\n"), "diff: {}", text);
    assert_eq!(text.lines().filter(|l| l.starts_with("@@")).count(), 1);
    assert!(text.contains("\n-Hello {{name}}\n"));
    assert!(text.contains("\n+Hi {{name}}!\n"));
}

#[test]
fn test_init_then_use_config_store() {
    let env = Env::new();
    let store = env.store();

    let init = env
        .command()
        .arg("init")
        .arg(&store)
        .output()
        .expect("run init");
    assert_success(&init);
    assert!(env.config_file().exists());
    assert!(store.is_dir());

    let again = env.command().arg("init").output().expect("run init");
    assert!(!again.status.success());
    assert!(stderr(&again).contains("--force"));

    // No --store: the path comes from the config file.
    let commit = env
        .command()
        .args(["commit", "greeting", "--content", "hi"])
        .output()
        .expect("run commit");
    assert_success(&commit);
    assert!(store.join("prompts/default/greeting/versions/0000000001.json").exists());
}

#[test]
fn test_commit_from_stdin_and_file() {
    let env = Env::new();

    let mut child = env
        .command()
        .arg("--store")
        .arg(env.store())
        .args(["commit", "p"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn commit");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"from stdin\n")
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for commit");
    assert_success(&output);

    let file = env.dir.path().join("prompt.txt");
    std::fs::write(&file, "from file\n").expect("write prompt file");
    let output = env.with_store(&["commit", "p", "--file", file.to_str().expect("utf-8 path")]);
    assert_success(&output);

    assert_eq!(stdout(&env.with_store(&["get", "p", "1"])), "from stdin\n");
    assert_eq!(stdout(&env.with_store(&["get", "p"])), "from file\n");
}

#[test]
fn test_json_listing_and_projects() {
    let env = Env::new();
    assert_success(&env.with_store(&["commit", "a", "--content", "one"]));
    assert_success(&env.with_store(&["commit", "a", "--content", "two", "-m", "second"]));
    assert_success(&env.with_store(&["--project", "other", "commit", "b", "--content", "x"]));

    let versions = env.with_store(&["--json", "list", "a"]);
    assert_success(&versions);
    let value: serde_json::Value =
        serde_json::from_str(stdout(&versions).trim()).expect("valid json");
    let rows = value.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["version"], 2);
    assert_eq!(rows[1]["message"], "second");

    let prompts = env.with_store(&["--json", "list"]);
    let value: serde_json::Value =
        serde_json::from_str(stdout(&prompts).trim()).expect("valid json");
    assert_eq!(value["project"], "default");
    assert_eq!(value["prompts"][0]["name"], "a");
    assert_eq!(value["prompts"][0]["latest_version"], 2);
    assert_eq!(value["prompts"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_exit_codes_per_error_kind() {
    let env = Env::new();
    assert_success(&env.with_store(&["commit", "p", "--content", "one"]));
    assert_success(&env.with_store(&["tag", "create", "p", "prod"]));

    let missing = env.with_store(&["get", "p", "7"]);
    assert_eq!(missing.status.code(), Some(3));
    assert!(stderr(&missing).contains("Hint:"));

    let unknown_prompt = env.with_store(&["get", "nope"]);
    assert_eq!(unknown_prompt.status.code(), Some(3));

    let invalid = env.with_store(&["get", "p", "not a ref!"]);
    assert_eq!(invalid.status.code(), Some(4));

    let duplicate = env.with_store(&["tag", "create", "p", "prod"]);
    assert_eq!(duplicate.status.code(), Some(5));

    let numeric_tag = env.with_store(&["tag", "create", "p", "42"]);
    assert_eq!(numeric_tag.status.code(), Some(4));
}

#[test]
fn test_tag_lifecycle_and_remove() {
    let env = Env::new();
    assert_success(&env.with_store(&["commit", "p", "--content", "one"]));
    assert_success(&env.with_store(&["commit", "p", "--content", "two"]));
    assert_success(&env.with_store(&["tag", "create", "p", "stable", "1", "-d", "first cut"]));

    let tag = env.with_store(&["--json", "tag", "get", "p", "stable"]);
    let value: serde_json::Value = serde_json::from_str(stdout(&tag).trim()).expect("valid json");
    assert_eq!(value["version"], 1);
    assert_eq!(value["description"], "first cut");

    let listed = env.with_store(&["tag", "list", "p"]);
    assert_success(&listed);
    assert!(stdout(&listed).contains("stable"));

    assert_success(&env.with_store(&["tag", "delete", "p", "stable"]));
    assert_eq!(env.with_store(&["get", "p", "stable"]).status.code(), Some(3));
    assert_eq!(stdout(&env.with_store(&["get", "p", "1"])), "one");

    assert_success(&env.with_store(&["remove", "p"]));
    assert_eq!(env.with_store(&["list", "p"]).status.code(), Some(3));
    assert_eq!(env.with_store(&["remove", "p"]).status.code(), Some(3));
}

#[test]
fn test_diff_formats() {
    let env = Env::new();
    assert_success(&env.with_store(&["commit", "p", "--content", "same\nold\n"]));
    assert_success(&env.with_store(&["commit", "p", "--content", "same\nnew\nadded\n"]));

    let side = env.with_store(&["diff", "p", "1", "latest", "--width", "30"]);
    assert_success(&side);
    let text = stdout(&side);
    assert!(text.contains("~~ old"));
    assert!(text.contains("~~ new"));
    assert!(text.contains("++ added"));

    let json = env.with_store(&["--json", "diff", "p", "1", "2"]);
    let value: serde_json::Value = serde_json::from_str(stdout(&json).trim()).expect("valid json");
    assert_eq!(value["stats"]["changes"], 1);
    assert_eq!(value["stats"]["additions"], 1);
    assert_eq!(value["changes"][1]["operation"], "replace");

    let same = env.with_store(&["diff", "p", "2", "latest", "--format", "unified"]);
    assert_success(&same);
    assert_eq!(stdout(&same), "");

    let bad = env.with_store(&["diff", "p", "1", "2", "--format", "html"]);
    assert_eq!(bad.status.code(), Some(4));
}
