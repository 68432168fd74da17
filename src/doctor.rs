use crate::config::ToolPaths;
use std::path::{Path, PathBuf};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// `spyglass doctor` — verify every configured tool path resolves before an
/// agent starts issuing calls against a half-installed container.
pub fn run(paths: &ToolPaths) {
    println!();
    println!("{DIM}── spyglass doctor ─────────────────────────────{RESET}");
    println!();

    let mut pass = 0;
    let mut fail = 0;

    check_bin("sherlock", &paths.sherlock_bin, &mut pass, &mut fail);
    check_bin("maigret", &paths.maigret_bin, &mut pass, &mut fail);
    check_bin("holehe", &paths.holehe_bin, &mut pass, &mut fail);
    check_bin("python", &paths.python_bin, &mut pass, &mut fail);
    check_file("spiderfoot", &paths.spiderfoot_script, &mut pass, &mut fail);
    check_file(
        "theharvester",
        &paths.theharvester_script(),
        &mut pass,
        &mut fail,
    );
    check_ghunt(&paths.ghunt_home, &mut pass, &mut fail);
    check_file("blackbird", &paths.blackbird_script(), &mut pass, &mut fail);
    check_data_dir(&paths.blackbird_data_dir, &mut pass, &mut fail);
    check_config_file();

    println!();
    println!(
        "  {BOLD}{pass}{RESET} passed  {}{fail}{} failed",
        if fail > 0 { RED } else { DIM },
        RESET
    );
    println!();
}

fn check_bin(label: &str, bin: &str, pass: &mut u32, fail: &mut u32) {
    match resolve_bin(bin) {
        Some(path) => ok(&format!("{label}: {}", path.display()), pass),
        None => err(&format!("{label}: '{bin}' not found on PATH"), fail),
    }
}

fn resolve_bin(bin: &str) -> Option<PathBuf> {
    if bin.contains('/') {
        let path = PathBuf::from(bin);
        return path.is_file().then_some(path);
    }
    let path_var = std::env::var("PATH").unwrap_or_default();
    path_var
        .split(':')
        .map(|dir| Path::new(dir).join(bin))
        .find(|candidate| candidate.is_file())
}

fn check_file(label: &str, path: &Path, pass: &mut u32, fail: &mut u32) {
    if path.is_file() {
        ok(&format!("{label}: {}", path.display()), pass);
    } else {
        err(&format!("{label}: {} missing", path.display()), fail);
    }
}

fn check_ghunt(home: &Path, pass: &mut u32, fail: &mut u32) {
    for script in ["main.py", "ghunt.py"] {
        if home.join(script).is_file() {
            ok(&format!("ghunt: {}", home.join(script).display()), pass);
            return;
        }
    }
    if home.is_dir() {
        ok(
            &format!("ghunt: {} (module fallback)", home.display()),
            pass,
        );
    } else {
        err(&format!("ghunt: {} missing", home.display()), fail);
    }
}

fn check_data_dir(dir: &Path, pass: &mut u32, fail: &mut u32) {
    if dir.is_dir() || std::fs::create_dir_all(dir).is_ok() {
        ok(&format!("blackbird data dir: {}", dir.display()), pass);
    } else {
        err(
            &format!("blackbird data dir: {} not writable", dir.display()),
            fail,
        );
    }
}

fn check_config_file() {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    let path = format!("{home}/.spyglass/config");
    if Path::new(&path).exists() {
        println!("  {DIM}-{RESET}  config file: {path}");
    } else {
        println!("  {DIM}-{RESET}  no config file (~/.spyglass/config) — using defaults");
    }
}

fn ok(msg: &str, pass: &mut u32) {
    println!("  {GREEN}✓{RESET}  {msg}");
    *pass += 1;
}

fn err(msg: &str, fail: &mut u32) {
    println!("  {RED}✗{RESET}  {msg}");
    *fail += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_bin_with_slash_requires_existing_file() {
        assert!(resolve_bin("/no/such/binary").is_none());
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("tool");
        std::fs::write(&bin, "").unwrap();
        assert_eq!(resolve_bin(bin.to_str().unwrap()), Some(bin));
    }

    #[test]
    fn resolve_bin_finds_sh_on_path() {
        assert!(resolve_bin("sh").is_some());
    }
}
