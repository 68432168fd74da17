use crate::config::ToolPaths;
use crate::models::{CommandSpec, ExecutionResult};
use crate::runner::CommandRunner;
use std::collections::HashMap;
use std::path::Path;

/// Every tool this server wraps. Must stay in sync with the descriptors in
/// schema.rs — a test enforces it.
pub(super) const TOOL_NAMES: &[&str] = &[
    "sherlock_username_search",
    "holehe_email_search",
    "spiderfoot_scan",
    "ghunt_google_search",
    "maigret_username_search",
    "theharvester_domain_search",
    "blackbird_username_search",
];

const DEFAULT_TIMEOUT: u64 = 10_000;
const DEFAULT_HARVESTER_LIMIT: u64 = 500;

/// Route one tool call to its handler. Handlers never propagate errors: every
/// failure mode lands in the `ExecutionResult` envelope.
pub(super) async fn execute<R: CommandRunner>(
    tool: &str,
    args: &serde_json::Value,
    paths: &ToolPaths,
    runner: &R,
) -> ExecutionResult {
    match tool {
        "sherlock_username_search" => wrap("Sherlock", sherlock(args, paths, runner).await),
        "holehe_email_search" => wrap("Holehe", holehe(args, paths, runner).await),
        "spiderfoot_scan" => wrap("SpiderFoot", spiderfoot(args, paths, runner).await),
        "ghunt_google_search" => wrap("GHunt", ghunt(args, paths, runner).await),
        "maigret_username_search" => wrap("Maigret", maigret(args, paths, runner).await),
        "theharvester_domain_search" => wrap("theHarvester", theharvester(args, paths, runner).await),
        "blackbird_username_search" => wrap("Blackbird", blackbird(args, paths, runner).await),
        _ => ExecutionResult::fail(format!("Unknown tool: {tool}")),
    }
}

fn wrap(tool: &str, outcome: Result<serde_json::Value, String>) -> ExecutionResult {
    match outcome {
        Ok(content) => ExecutionResult::ok(content),
        Err(e) => ExecutionResult::fail(format!("{tool} failed: {e}")),
    }
}

pub(super) fn arg_str<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing '{key}'"))
}

fn arg_u64(args: &serde_json::Value, key: &str, default: u64) -> u64 {
    args.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
}

fn arg_bool(args: &serde_json::Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

/// Username search across social platforms. Sherlock writes one result file
/// per format into a scratch directory; all `<username>.*` artifacts are
/// returned alongside raw stdout, each tagged with its filename.
async fn sherlock<R: CommandRunner>(
    args: &serde_json::Value,
    paths: &ToolPaths,
    runner: &R,
) -> Result<serde_json::Value, String> {
    let username = arg_str(args, "username")?;
    let timeout = arg_u64(args, "timeout", DEFAULT_TIMEOUT);
    let output_format = args
        .get("output_format")
        .and_then(|v| v.as_str())
        .unwrap_or("csv");

    // Scratch directory is call-scoped; the TempDir guard removes it on every
    // exit path, even when reading artifacts fails.
    let scratch = tempfile::tempdir().map_err(|e| format!("creating scratch dir: {e}"))?;

    let mut argv = vec![
        paths.sherlock_bin.clone(),
        username.to_string(),
        "--timeout".to_string(),
        timeout.to_string(),
    ];
    if let Some(sites) = args.get("sites").and_then(|v| v.as_array()) {
        for site in sites.iter().filter_map(|s| s.as_str()) {
            argv.push("--site".to_string());
            argv.push(site.to_string());
        }
    }
    match output_format {
        "csv" => argv.push("--csv".to_string()),
        "xlsx" => argv.push("--xlsx".to_string()),
        _ => {}
    }
    argv.push("--folderoutput".to_string());
    argv.push(scratch.path().display().to_string());

    let out = runner
        .run(CommandSpec {
            argv,
            ..Default::default()
        })
        .await;
    if !out.success() {
        return Err(out.stderr);
    }

    let files = collect_result_files(scratch.path(), &format!("{username}.")).await;
    Ok(serde_json::json!({ "stdout": out.stdout, "files": files }))
}

/// Read every artifact whose name starts with `prefix`, tagged with its
/// filename. Unreadable files are logged and skipped, never fatal.
async fn collect_result_files(dir: &Path, prefix: &str) -> Vec<serde_json::Value> {
    let mut found: Vec<(String, String)> = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return Vec::new();
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(prefix) {
            continue;
        }
        match tokio::fs::read_to_string(entry.path()).await {
            Ok(content) => found.push((name, content)),
            Err(e) => eprintln!("[spyglass] could not read file {name}: {e}"),
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found
        .into_iter()
        .map(|(filename, content)| serde_json::json!({ "filename": filename, "content": content }))
        .collect()
}

/// Email reverse lookup; prints straight to stdout, no artifacts.
async fn holehe<R: CommandRunner>(
    args: &serde_json::Value,
    paths: &ToolPaths,
    runner: &R,
) -> Result<serde_json::Value, String> {
    let email = arg_str(args, "email")?;
    let timeout = arg_u64(args, "timeout", DEFAULT_TIMEOUT);
    let only_used = arg_bool(args, "only_used", true);

    let mut argv = vec![
        paths.holehe_bin.clone(),
        email.to_string(),
        "--timeout".to_string(),
        timeout.to_string(),
    ];
    if only_used {
        argv.push("--only-used".to_string());
    }

    let out = runner
        .run(CommandSpec {
            argv,
            ..Default::default()
        })
        .await;
    if out.success() {
        Ok(serde_json::json!(out.stdout))
    } else {
        Err(out.stderr)
    }
}

/// Broad OSINT scan; SpiderFoot auto-detects the target type and picks up
/// API keys from the ambient environment on its own.
async fn spiderfoot<R: CommandRunner>(
    args: &serde_json::Value,
    paths: &ToolPaths,
    runner: &R,
) -> Result<serde_json::Value, String> {
    let target = arg_str(args, "target")?;

    let argv = vec![
        paths.python_bin.clone(),
        paths.spiderfoot_script.display().to_string(),
        "-s".to_string(),
        target.to_string(),
        "-u".to_string(),
        "all".to_string(),
        "-o".to_string(),
        "json".to_string(),
        "-q".to_string(),
    ];

    let out = runner
        .run(CommandSpec {
            argv,
            ..Default::default()
        })
        .await;
    if out.success() {
        Ok(serde_json::json!(out.stdout))
    } else {
        Err(out.stderr)
    }
}

/// Google account lookup. GHunt is run from its source tree and needs that
/// tree on PYTHONPATH; the entry point is chosen from an ordered strategy
/// list rather than trial-and-error.
async fn ghunt<R: CommandRunner>(
    args: &serde_json::Value,
    paths: &ToolPaths,
    runner: &R,
) -> Result<serde_json::Value, String> {
    let identifier = arg_str(args, "identifier")?;

    let home = &paths.ghunt_home;
    let spec = CommandSpec {
        argv: ghunt_argv(home, &paths.python_bin, identifier),
        cwd: home.is_dir().then(|| home.clone()),
        env: HashMap::from([("PYTHONPATH".to_string(), home.display().to_string())]),
        stdin: None,
    };

    let out = runner.run(spec).await;
    if out.success() {
        Ok(serde_json::json!(out.stdout))
    } else {
        Err(out.stderr)
    }
}

/// Ordered entry points for GHunt: `main.py`, then `ghunt.py`, then invoking
/// the module directly. The first script that exists wins; the module form is
/// the unconditional fallback.
fn ghunt_argv(home: &Path, python: &str, identifier: &str) -> Vec<String> {
    for script in ["main.py", "ghunt.py"] {
        let path = home.join(script);
        if path.is_file() {
            return vec![
                python.to_string(),
                path.display().to_string(),
                "email".to_string(),
                identifier.to_string(),
            ];
        }
    }
    vec![
        python.to_string(),
        "-c".to_string(),
        format!(
            "import sys; sys.path.insert(0, '{}'); from ghunt import ghunt; ghunt.main()",
            home.display()
        ),
        "email".to_string(),
        identifier.to_string(),
    ]
}

/// Username search with false-positive detection. Maigret writes an ndjson
/// report into the scratch directory; the first JSON artifact is the result,
/// with raw stdout as the fallback when no file appears or it is unreadable.
async fn maigret<R: CommandRunner>(
    args: &serde_json::Value,
    paths: &ToolPaths,
    runner: &R,
) -> Result<serde_json::Value, String> {
    let username = arg_str(args, "username")?;
    let timeout = arg_u64(args, "timeout", DEFAULT_TIMEOUT);

    let scratch = tempfile::tempdir().map_err(|e| format!("creating scratch dir: {e}"))?;

    // -J requires an output type; "json" is not one of them.
    let argv = vec![
        paths.maigret_bin.clone(),
        username.to_string(),
        "--timeout".to_string(),
        timeout.to_string(),
        "-J".to_string(),
        "ndjson".to_string(),
        "--folderoutput".to_string(),
        scratch.path().display().to_string(),
    ];

    let out = runner
        .run(CommandSpec {
            argv,
            ..Default::default()
        })
        .await;
    if !out.success() {
        return Err(out.stderr);
    }

    match first_json_file(scratch.path()).await {
        Some(report) => Ok(serde_json::json!(report)),
        None => Ok(serde_json::json!(out.stdout)),
    }
}

async fn first_json_file(dir: &Path) -> Option<String> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut json_files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            json_files.push(path);
        }
    }
    json_files.sort();
    let first = json_files.into_iter().next()?;
    tokio::fs::read_to_string(first).await.ok()
}

/// Domain/email enumeration from public sources. Optional API keys arrive as
/// call arguments and are forwarded as a request-scoped environment overlay —
/// the server's own environment is never touched.
async fn theharvester<R: CommandRunner>(
    args: &serde_json::Value,
    paths: &ToolPaths,
    runner: &R,
) -> Result<serde_json::Value, String> {
    let domain = arg_str(args, "domain")?;
    let sources = args
        .get("sources")
        .and_then(|v| v.as_str())
        .unwrap_or("all");
    let limit = arg_u64(args, "limit", DEFAULT_HARVESTER_LIMIT);

    let mut env = HashMap::new();
    for (param, var) in [
        ("hunter_api_key", "HUNTER_API_KEY"),
        ("bing_api_key", "BING_API_KEY"),
        ("shodan_api_key", "SHODAN_API_KEY"),
        ("securitytrails_api_key", "SECURITYTRAILS_API_KEY"),
    ] {
        if let Some(value) = args.get(param).and_then(|v| v.as_str()) {
            env.insert(var.to_string(), value.to_string());
        }
    }

    let script = paths.theharvester_script();
    if !script.is_file() {
        return Err(format!("script not found at {}", script.display()));
    }

    let spec = CommandSpec {
        argv: vec![
            paths.python_bin.clone(),
            script.display().to_string(),
            "-d".to_string(),
            domain.to_string(),
            "-b".to_string(),
            sources.to_string(),
            "-l".to_string(),
            limit.to_string(),
        ],
        cwd: Some(paths.theharvester_home.clone()),
        env,
        stdin: None,
    };

    let out = runner.run(spec).await;
    if out.success() {
        Ok(serde_json::json!(out.stdout))
    } else {
        Err(out.stderr)
    }
}

/// Fast username search. Blackbird locates its site list through environment
/// variables; the handler makes sure the data directory and a placeholder
/// list file exist before spawning.
async fn blackbird<R: CommandRunner>(
    args: &serde_json::Value,
    paths: &ToolPaths,
    runner: &R,
) -> Result<serde_json::Value, String> {
    let username = arg_str(args, "username")?;
    let timeout = arg_u64(args, "timeout", DEFAULT_TIMEOUT);

    let data_dir = &paths.blackbird_data_dir;
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| format!("creating data dir {}: {e}", data_dir.display()))?;
    let list_path = paths.username_list_path();
    if !list_path.exists() {
        tokio::fs::write(&list_path, "{}")
            .await
            .map_err(|e| format!("initializing {}: {e}", list_path.display()))?;
    }

    let spec = CommandSpec {
        argv: vec![
            paths.python_bin.clone(),
            paths.blackbird_script().display().to_string(),
            "-u".to_string(),
            username.to_string(),
            "--timeout".to_string(),
            timeout.to_string(),
        ],
        cwd: Some(paths.blackbird_home.clone()),
        env: HashMap::from([
            (
                "BLACKBIRD_DATA_DIR".to_string(),
                data_dir.display().to_string(),
            ),
            (
                "USERNAME_LIST_PATH".to_string(),
                list_path.display().to_string(),
            ),
        ]),
        stdin: None,
    };

    let out = runner.run(spec).await;
    if out.success() {
        Ok(serde_json::json!(out.stdout))
    } else {
        Err(out.stderr)
    }
}
