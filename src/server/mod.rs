use crate::config::{self, ToolPaths};
use crate::models::{self, ExecutionResult};
use crate::runner::{CommandRunner, ProcessRunner};
use anyhow::Result;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

mod schema;
mod tools;

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "spyglass";

const JSONRPC_PARSE_ERROR: i32 = -32700;
const JSONRPC_METHOD_NOT_FOUND: i32 = -32601;
const JSONRPC_INTERNAL_ERROR: i32 = -32603;

pub struct ServerContext {
    pub session_id: Uuid,
    pub paths: ToolPaths,
    /// Optional whole-call wall-clock budget. The wrapped tools get their own
    /// timeout flags; this is a last-resort guard and is off by default.
    pub watchdog_secs: Option<u64>,
}

struct SessionCounters {
    requests: u64,
    tool_calls: u64,
    tool_failures: u64,
    protocol_errors: u64,
}

pub async fn run(session_id: Uuid) -> Result<()> {
    let ctx = ServerContext {
        session_id,
        paths: ToolPaths::load(),
        watchdog_secs: config::watchdog_secs(),
    };
    if let Some(secs) = ctx.watchdog_secs {
        eprintln!("[spyglass] watchdog={secs}s");
    }

    let mut counters = SessionCounters {
        requests: 0,
        tool_calls: 0,
        tool_failures: 0,
        protocol_errors: 0,
    };
    let started = Instant::now();

    process_messages(&ctx, &mut counters).await?;

    print_session_summary(session_id, &counters, started.elapsed().as_secs());
    Ok(())
}

/// The read loop: one JSON-RPC request per stdin line, exactly one response
/// line written and flushed per request. Strictly sequential — a running tool
/// invocation blocks the next line. Ctrl-C breaks the loop; a child in flight
/// is killed when its dispatch future is dropped.
async fn process_messages(ctx: &ServerContext, counters: &mut SessionCounters) -> Result<()> {
    let runner = ProcessRunner;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(l) => l,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("[spyglass] interrupted");
                break;
            }
        };

        let response = match parse_request(&line) {
            Err(parse_error) => {
                counters.requests += 1;
                counters.protocol_errors += 1;
                parse_error
            }
            Ok(msg) => {
                let response = tokio::select! {
                    resp = dispatch(&msg, ctx, &runner) => resp,
                    _ = tokio::signal::ctrl_c() => {
                        eprintln!("[spyglass] interrupted — terminating child");
                        break;
                    }
                };
                update_counters(&msg, &response, counters);
                response
            }
        };

        let json = serde_json::to_string(&response)?;
        stdout.write_all(json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Malformed lines are a protocol-level error, not fatal: respond with
/// `-32700` and a null id, then keep reading.
fn parse_request(line: &str) -> Result<serde_json::Value, serde_json::Value> {
    serde_json::from_str(line.trim()).map_err(|e| {
        error_response(
            serde_json::Value::Null,
            JSONRPC_PARSE_ERROR,
            &format!("Parse error: {e}"),
        )
    })
}

async fn dispatch<R: CommandRunner>(
    msg: &serde_json::Value,
    ctx: &ServerContext,
    runner: &R,
) -> serde_json::Value {
    let method = msg.get("method").and_then(|m| m.as_str()).unwrap_or("");
    match method {
        "initialize" => on_initialize(msg),
        "tools/list" => schema::on_tools_list(msg),
        "tools/call" => on_tool_call(msg, ctx, runner).await,
        _ => error_response(
            msg["id"].clone(),
            JSONRPC_METHOD_NOT_FOUND,
            &format!("Method not found: {method}"),
        ),
    }
}

fn on_initialize(msg: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": msg["id"],
        "result": {
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
        },
    })
}

/// Tool-level failures (missing argument, non-zero exit, unknown tool) are a
/// *successful* JSON-RPC response carrying `success:false` — the request
/// itself was valid, only the invoked operation failed.
async fn on_tool_call<R: CommandRunner>(
    msg: &serde_json::Value,
    ctx: &ServerContext,
    runner: &R,
) -> serde_json::Value {
    let (tool, arguments) = parse_tool_call(msg);
    let started = Instant::now();

    let result = match ctx.watchdog_secs {
        Some(budget) => {
            let dur = std::time::Duration::from_secs(budget);
            match tokio::time::timeout(dur, tools::execute(&tool, &arguments, &ctx.paths, runner))
                .await
            {
                Ok(result) => result,
                Err(_) => ExecutionResult::fail(format!("{tool} timed out after {budget}s")),
            }
        }
        None => tools::execute(&tool, &arguments, &ctx.paths, runner).await,
    };

    log_event(&tool, started.elapsed().as_micros() as u64, result.success);

    let text = match serde_json::to_string_pretty(&result) {
        Ok(text) => text,
        Err(e) => {
            return error_response(
                msg["id"].clone(),
                JSONRPC_INTERNAL_ERROR,
                &format!("Internal error: {e}"),
            )
        }
    };
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": msg["id"],
        "result": { "content": [{ "type": "text", "text": text }] },
    })
}

fn parse_tool_call(msg: &serde_json::Value) -> (String, serde_json::Value) {
    let params = msg.get("params").cloned().unwrap_or(serde_json::json!({}));
    let tool = params
        .get("name")
        .and_then(|n| n.as_str())
        .unwrap_or("")
        .to_string();
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(serde_json::json!({}));
    (tool, arguments)
}

fn error_response(id: serde_json::Value, code: i32, message: &str) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

fn update_counters(
    msg: &serde_json::Value,
    response: &serde_json::Value,
    counters: &mut SessionCounters,
) {
    counters.requests += 1;
    if response.get("error").is_some() {
        counters.protocol_errors += 1;
    }
    if msg.get("method").and_then(|m| m.as_str()) != Some("tools/call") {
        return;
    }
    counters.tool_calls += 1;
    let failed = response["result"]["content"][0]["text"]
        .as_str()
        .and_then(|t| serde_json::from_str::<ExecutionResult>(t).ok())
        .map(|r| !r.success)
        .unwrap_or(true);
    if failed {
        counters.tool_failures += 1;
    }
}

fn log_event(tool: &str, duration_us: u64, success: bool) {
    let status = if success { "OK " } else { "ERR" };
    eprintln!("[{status}] {tool}  ({})", models::fmt_duration(duration_us));
}

fn print_session_summary(session_id: Uuid, c: &SessionCounters, elapsed: u64) {
    let sid = &session_id.to_string()[..8];
    eprintln!(
        "[spyglass] session {sid} ended — {} requests  tools:{} failures:{} protocol-errors:{}  {elapsed}s",
        c.requests, c.tool_calls, c.tool_failures, c.protocol_errors
    );
}

/// `spyglass tools` — one entry per registered tool, in registry order.
pub fn list_tools() {
    let descriptors = schema::descriptors();
    for name in tools::TOOL_NAMES {
        if let Some(tool) = descriptors.iter().find(|t| t["name"] == *name) {
            let description = tool["description"].as_str().unwrap_or("");
            println!("{name}\n    {description}");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::FakeRunner;
    use super::*;
    use crate::models::{CommandOutput, CommandSpec};
    use serde_json::json;
    use std::collections::HashSet;

    fn test_ctx(root: &std::path::Path) -> ServerContext {
        ServerContext {
            session_id: Uuid::new_v4(),
            paths: ToolPaths {
                spiderfoot_script: root.join("spiderfoot/sf.py"),
                theharvester_home: root.join("theharvester"),
                ghunt_home: root.join("ghunt"),
                blackbird_home: root.join("blackbird"),
                blackbird_data_dir: root.join("data"),
                ..ToolPaths::default()
            },
            watchdog_secs: None,
        }
    }

    #[tokio::test]
    async fn initialize_reports_server_identity() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let runner = FakeRunner::succeeding("");
        let resp = dispatch(
            &json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" }),
            &ctx,
            &runner,
        )
        .await;

        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(resp["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(resp["result"]["capabilities"]["tools"].is_object());
        assert!(resp.get("error").is_none());
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found_with_id_echoed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let runner = FakeRunner::succeeding("");

        let resp = dispatch(
            &json!({ "jsonrpc": "2.0", "id": 7, "method": "resources/list" }),
            &ctx,
            &runner,
        )
        .await;
        assert_eq!(resp["error"]["code"], JSONRPC_METHOD_NOT_FOUND);
        assert_eq!(resp["id"], 7);

        let resp = dispatch(
            &json!({ "jsonrpc": "2.0", "id": "req-9", "method": "nope" }),
            &ctx,
            &runner,
        )
        .await;
        assert_eq!(resp["error"]["code"], JSONRPC_METHOD_NOT_FOUND);
        assert_eq!(resp["id"], "req-9");
        assert!(resp.get("result").is_none());
    }

    #[tokio::test]
    async fn request_without_id_gets_null_id_response() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let runner = FakeRunner::succeeding("");
        let resp = dispatch(&json!({ "method": "initialize" }), &ctx, &runner).await;
        assert!(resp["id"].is_null());
    }

    #[test]
    fn malformed_line_yields_parse_error_with_null_id() {
        let resp = parse_request("this is not json").unwrap_err();
        assert_eq!(resp["error"]["code"], JSONRPC_PARSE_ERROR);
        assert!(resp["id"].is_null());
        assert!(resp["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Parse error"));
    }

    #[test]
    fn empty_line_is_a_parse_error_too() {
        let resp = parse_request("   ").unwrap_err();
        assert_eq!(resp["error"]["code"], JSONRPC_PARSE_ERROR);
    }

    #[tokio::test]
    async fn tools_list_matches_registry_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let runner = FakeRunner::succeeding("");
        let resp = dispatch(
            &json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/list" }),
            &ctx,
            &runner,
        )
        .await;

        let listed: Vec<&str> = resp["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        let unique: HashSet<&str> = listed.iter().copied().collect();
        assert_eq!(unique.len(), listed.len(), "duplicate tool names advertised");

        let registered: HashSet<&str> = tools::TOOL_NAMES.iter().copied().collect();
        assert_eq!(unique, registered);
    }

    #[tokio::test]
    async fn tools_list_is_byte_identical_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let runner = FakeRunner::succeeding("");
        let req = json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/list" });

        let first = serde_json::to_string(&dispatch(&req, &ctx, &runner).await).unwrap();
        let second = serde_json::to_string(&dispatch(&req, &ctx, &runner).await).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn bogus_tool_call_is_wrapped_not_a_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let runner = FakeRunner::succeeding("");
        let resp = dispatch(
            &json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": { "name": "bogus_tool", "arguments": {} },
            }),
            &ctx,
            &runner,
        )
        .await;

        assert!(resp.get("error").is_none());
        assert_eq!(resp["id"], 2);
        let text = resp["result"]["content"][0]["text"].as_str().unwrap();
        let result: ExecutionResult = serde_json::from_str(text).unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Unknown tool: bogus_tool"));
    }

    #[tokio::test]
    async fn tool_call_without_params_still_answers() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let runner = FakeRunner::succeeding("");
        let resp = dispatch(
            &json!({ "jsonrpc": "2.0", "id": 5, "method": "tools/call" }),
            &ctx,
            &runner,
        )
        .await;
        let text = resp["result"]["content"][0]["text"].as_str().unwrap();
        let result: ExecutionResult = serde_json::from_str(text).unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn successful_tool_call_embeds_execution_result() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let runner = FakeRunner::succeeding("twitter: used");
        let resp = dispatch(
            &json!({
                "jsonrpc": "2.0",
                "id": 6,
                "method": "tools/call",
                "params": { "name": "holehe_email_search", "arguments": { "email": "a@b.c" } },
            }),
            &ctx,
            &runner,
        )
        .await;

        assert_eq!(resp["result"]["content"][0]["type"], "text");
        let text = resp["result"]["content"][0]["text"].as_str().unwrap();
        let result: ExecutionResult = serde_json::from_str(text).unwrap();
        assert!(result.success);
        assert_eq!(result.content, Some(json!("twitter: used")));
        assert_eq!(runner.call_count(), 1);
    }

    struct StalledRunner;

    impl crate::runner::CommandRunner for StalledRunner {
        async fn run(&self, _spec: CommandSpec) -> CommandOutput {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: 0,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_abandons_stalled_call() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = test_ctx(dir.path());
        ctx.watchdog_secs = Some(5);

        let resp = dispatch(
            &json!({
                "jsonrpc": "2.0",
                "id": 8,
                "method": "tools/call",
                "params": { "name": "holehe_email_search", "arguments": { "email": "a@b.c" } },
            }),
            &ctx,
            &StalledRunner,
        )
        .await;

        let text = resp["result"]["content"][0]["text"].as_str().unwrap();
        let result: ExecutionResult = serde_json::from_str(text).unwrap();
        assert!(!result.success);
        assert!(result
            .error
            .unwrap()
            .contains("timed out after 5s"));
    }

    #[tokio::test]
    async fn counters_track_tool_calls_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let runner = FakeRunner::succeeding("");
        let mut counters = SessionCounters {
            requests: 0,
            tool_calls: 0,
            tool_failures: 0,
            protocol_errors: 0,
        };

        let ok_call = json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": { "name": "holehe_email_search", "arguments": { "email": "a@b.c" } },
        });
        let resp = dispatch(&ok_call, &ctx, &runner).await;
        update_counters(&ok_call, &resp, &mut counters);

        let bad_call = json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": { "name": "bogus_tool", "arguments": {} },
        });
        let resp = dispatch(&bad_call, &ctx, &runner).await;
        update_counters(&bad_call, &resp, &mut counters);

        let unknown = json!({ "jsonrpc": "2.0", "id": 3, "method": "nope" });
        let resp = dispatch(&unknown, &ctx, &runner).await;
        update_counters(&unknown, &resp, &mut counters);

        assert_eq!(counters.requests, 3);
        assert_eq!(counters.tool_calls, 2);
        assert_eq!(counters.tool_failures, 1);
        assert_eq!(counters.protocol_errors, 1);
    }
}
