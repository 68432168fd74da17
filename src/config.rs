use std::collections::HashMap;
use std::path::PathBuf;

/// Where the wrapped OSINT tools live. Resolved once at startup; defaults
/// match the container layout the tools are installed into. Each key can be
/// overridden by `SPYGLASS_<KEY>` in the environment or `<KEY>=` in
/// `~/.spyglass/config`.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub sherlock_bin: String,
    pub maigret_bin: String,
    pub holehe_bin: String,
    pub python_bin: String,
    pub spiderfoot_script: PathBuf,
    pub theharvester_home: PathBuf,
    pub ghunt_home: PathBuf,
    pub blackbird_home: PathBuf,
    pub blackbird_data_dir: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            sherlock_bin: "sherlock".to_string(),
            maigret_bin: "maigret".to_string(),
            holehe_bin: "holehe".to_string(),
            python_bin: "python3".to_string(),
            spiderfoot_script: PathBuf::from("/opt/spiderfoot/sf.py"),
            theharvester_home: PathBuf::from("/opt/theharvester"),
            ghunt_home: PathBuf::from("/opt/ghunt"),
            blackbird_home: PathBuf::from("/opt/blackbird"),
            blackbird_data_dir: PathBuf::from("/app/data"),
        }
    }
}

impl ToolPaths {
    pub fn load() -> Self {
        let config = load_config();
        let defaults = ToolPaths::default();
        let get = |key: &str, default: String| -> String {
            std::env::var(format!("SPYGLASS_{key}"))
                .ok()
                .or_else(|| config.get(key).cloned())
                .unwrap_or(default)
        };
        ToolPaths {
            sherlock_bin: get("SHERLOCK_BIN", defaults.sherlock_bin),
            maigret_bin: get("MAIGRET_BIN", defaults.maigret_bin),
            holehe_bin: get("HOLEHE_BIN", defaults.holehe_bin),
            python_bin: get("PYTHON_BIN", defaults.python_bin),
            spiderfoot_script: get(
                "SPIDERFOOT_SCRIPT",
                defaults.spiderfoot_script.display().to_string(),
            )
            .into(),
            theharvester_home: get(
                "THEHARVESTER_HOME",
                defaults.theharvester_home.display().to_string(),
            )
            .into(),
            ghunt_home: get("GHUNT_HOME", defaults.ghunt_home.display().to_string()).into(),
            blackbird_home: get(
                "BLACKBIRD_HOME",
                defaults.blackbird_home.display().to_string(),
            )
            .into(),
            blackbird_data_dir: get(
                "BLACKBIRD_DATA_DIR",
                defaults.blackbird_data_dir.display().to_string(),
            )
            .into(),
        }
    }

    pub fn theharvester_script(&self) -> PathBuf {
        self.theharvester_home.join("theHarvester.py")
    }

    pub fn blackbird_script(&self) -> PathBuf {
        self.blackbird_home.join("blackbird.py")
    }

    /// Blackbird reads its site list from this file; the handler creates a
    /// placeholder when it is absent.
    pub fn username_list_path(&self) -> PathBuf {
        self.blackbird_data_dir.join("wmn-data.json")
    }
}

/// Advisory wall-clock budget for a whole tool call. Off unless configured —
/// the wrapped tools receive their own timeout flags and normally honor them.
pub fn watchdog_secs() -> Option<u64> {
    std::env::var("SPYGLASS_WATCHDOG_SECS")
        .ok()
        .or_else(|| load_config().get("WATCHDOG_SECS").cloned())
        .and_then(|s| s.parse().ok())
}

pub fn load_config() -> HashMap<String, String> {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    let path = format!("{home}/.spyglass/config");
    let Ok(content) = std::fs::read_to_string(&path) else {
        return HashMap::new();
    };
    parse_config(&content)
}

fn parse_config(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter(|l| !l.trim_start().starts_with('#') && !l.trim().is_empty())
        .filter_map(|l| {
            let (k, v) = l.split_once('=')?;
            Some((k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}
