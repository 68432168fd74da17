mod config;
mod doctor;
mod models;
mod runner;
mod server;

use anyhow::Result;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h")
        || args.first().map(|s| s.as_str()) == Some("help")
    {
        print_help();
        return Ok(());
    }

    match args.first().map(|s| s.as_str()) {
        Some("doctor") => {
            doctor::run(&config::ToolPaths::load());
            return Ok(());
        }
        Some("tools") => {
            server::list_tools();
            return Ok(());
        }
        Some(other) => {
            eprintln!("[spyglass] unknown command: {other} (try 'spyglass help')");
            std::process::exit(2);
        }
        None => {}
    }

    let session_id = Uuid::new_v4();
    eprintln!("[spyglass] session={session_id}");

    server::run(session_id).await
}

fn print_help() {
    println!("spyglass {}", env!("CARGO_PKG_VERSION"));
    println!("OSINT tools behind one stdio MCP server — one JSON-RPC line in, one line out.\n");
    println!("USAGE:");
    println!("  spyglass            MCP server mode (reads stdio)");
    println!("  spyglass tools      List the wrapped tools and what they do");
    println!("  spyglass doctor     Check that the configured tool paths resolve");
    println!("  spyglass help       Show this message\n");
    println!("ENVIRONMENT (also settable in ~/.spyglass/config without the prefix):");
    println!("  SPYGLASS_SHERLOCK_BIN        sherlock executable (default: sherlock)");
    println!("  SPYGLASS_MAIGRET_BIN         maigret executable (default: maigret)");
    println!("  SPYGLASS_HOLEHE_BIN          holehe executable (default: holehe)");
    println!("  SPYGLASS_PYTHON_BIN          python interpreter (default: python3)");
    println!("  SPYGLASS_SPIDERFOOT_SCRIPT   sf.py path (default: /opt/spiderfoot/sf.py)");
    println!("  SPYGLASS_THEHARVESTER_HOME   theHarvester checkout (default: /opt/theharvester)");
    println!("  SPYGLASS_GHUNT_HOME          GHunt checkout (default: /opt/ghunt)");
    println!("  SPYGLASS_BLACKBIRD_HOME      Blackbird checkout (default: /opt/blackbird)");
    println!("  SPYGLASS_BLACKBIRD_DATA_DIR  Blackbird data dir (default: /app/data)");
    println!("  SPYGLASS_WATCHDOG_SECS       optional per-call wall-clock cap (default: off)");
    println!("\nAPI-key variables (HUNTER_API_KEY, SHODAN_API_KEY, ...) pass through to the");
    println!("wrapped tools; theharvester_domain_search also accepts them as call arguments.");
}
