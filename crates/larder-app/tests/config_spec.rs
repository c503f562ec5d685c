//! Configuration precedence: defaults, then config file, then environment.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, OnceLock};

use tempfile::TempDir;

use larder_app::config;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("config env mutex poisoned")
}

fn snapshot_env(vars: &[&'static str]) -> Vec<(&'static str, Option<OsString>)> {
    vars.iter().map(|&name| (name, env::var_os(name))).collect()
}

fn restore_env(vars: Vec<(&'static str, Option<OsString>)>) {
    for (name, value) in vars {
        match value {
            Some(val) => set_var(name, val),
            None => remove_var(name),
        }
    }
}

fn set_var(name: &str, value: impl AsRef<OsStr>) {
    unsafe { env::set_var(name, value) }
}

fn remove_var(name: &str) {
    unsafe { env::remove_var(name) }
}

const TRACKED: [&str; 2] = ["LARDER__STORAGE__PATH", "LARDER__HTTP__TIMEOUT_SECS"];

#[test]
fn defaults_include_builtin_profile() {
    let _guard = env_guard();
    let snapshot = snapshot_env(&TRACKED);
    for name in TRACKED {
        remove_var(name);
    }

    let cfg = config::load().expect("load config");

    assert!(cfg.sites.contains_key("jamieoliver"));
    let profile = &cfg.sites["jamieoliver"];
    assert_eq!(profile.name.tag, "h1");
    assert_eq!(profile.name.class, "hidden-xs");

    assert_eq!(cfg.http.timeout_secs, 30);
    assert_eq!(cfg.http.requests_per_second, 1);
    assert_eq!(cfg.http.retry_max_attempts, 6);
    assert_eq!(cfg.http.user_agent, None);

    restore_env(snapshot);
}

#[test]
fn environment_overrides_defaults() {
    let _guard = env_guard();
    let snapshot = snapshot_env(&TRACKED);

    let temp = TempDir::new().expect("temp dir");
    set_var("LARDER__STORAGE__PATH", temp.path());
    set_var("LARDER__HTTP__TIMEOUT_SECS", "7");

    let cfg = config::load().expect("load config");
    assert_eq!(cfg.storage.path, temp.path());
    assert_eq!(cfg.http.timeout_secs, 7);

    restore_env(snapshot);
}

#[test]
fn config_file_overrides_defaults_and_adds_sites() {
    let _guard = env_guard();
    let snapshot = snapshot_env(&TRACKED);
    for name in TRACKED {
        remove_var(name);
    }
    let original_dir = env::current_dir().expect("capture current dir");

    let workspace = TempDir::new().expect("temp workspace");
    fs::create_dir_all(workspace.path().join("config")).expect("create config dir");
    fs::write(
        workspace.path().join("config/settings.toml"),
        r#"
[http]
requests_per_second = 3

[sites.mysite]
name = { tag = "h1", class = "title" }
ingredients = { tag = "ul", class = "ing" }
directions = { tag = "div", class = "steps" }
"#,
    )
    .expect("write settings");

    env::set_current_dir(workspace.path()).expect("enter workspace");
    let cfg = config::load();
    env::set_current_dir(&original_dir).expect("restore cwd");

    let cfg = cfg.expect("load config");
    assert_eq!(cfg.http.requests_per_second, 3);
    assert_eq!(cfg.http.timeout_secs, 30);

    let site = &cfg.sites["mysite"];
    assert_eq!(site.name.class, "title");
    assert_eq!(site.photo, None);
    assert!(cfg.sites.contains_key("jamieoliver"));

    restore_env(snapshot);
}
