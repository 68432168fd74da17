pub(super) fn on_tools_list(msg: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": msg["id"],
        "result": { "tools": descriptors() },
    })
}

/// The server's advertised capability surface. Built fresh per request but
/// fully static, so repeated listings are byte-identical.
pub(super) fn descriptors() -> Vec<serde_json::Value> {
    let mut tools = username_tools();
    tools.extend(email_tools());
    tools.extend(domain_tools());
    tools
}

fn username_tools() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "name": "sherlock_username_search",
            "description": "Search for username across 399+ social media platforms and websites",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "username": { "type": "string", "description": "Username to search for" },
                    "timeout": { "type": "integer", "description": "Timeout in seconds (default: 10000)" },
                    "sites": { "type": "array", "items": { "type": "string" }, "description": "Specific sites to search" },
                    "output_format": { "type": "string", "enum": ["txt", "csv", "xlsx"], "description": "Output format" },
                },
                "required": ["username"],
            },
        }),
        serde_json::json!({
            "name": "maigret_username_search",
            "description": "Search for username across 3000+ sites with detailed analysis and false positive detection",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "username": { "type": "string", "description": "Username to search for" },
                    "timeout": { "type": "integer", "description": "Timeout in seconds (default: 10000)" },
                },
                "required": ["username"],
            },
        }),
        serde_json::json!({
            "name": "blackbird_username_search",
            "description": "Fast OSINT tool to search for accounts by username across 581 sites",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "username": { "type": "string", "description": "Username to search for" },
                    "timeout": { "type": "integer", "description": "Timeout in seconds (default: 10000)" },
                },
                "required": ["username"],
            },
        }),
    ]
}

fn email_tools() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "name": "holehe_email_search",
            "description": "Check if email is registered on 120+ platforms",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "email": { "type": "string", "description": "Email address to investigate" },
                    "only_used": { "type": "boolean", "description": "Show only registered accounts (default: true)" },
                    "timeout": { "type": "integer", "description": "Request timeout in seconds (default: 10000)" },
                },
                "required": ["email"],
            },
        }),
        serde_json::json!({
            "name": "ghunt_google_search",
            "description": "Search for Google account information using email address or Google ID. API keys can be provided via environment variables (GOOGLE_API_KEY, GOOGLE_CX) for enhanced searches.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "identifier": { "type": "string", "description": "Email address or Google ID to search" },
                    "timeout": { "type": "integer", "description": "Timeout in seconds (default: 10000)" },
                },
                "required": ["identifier"],
            },
        }),
    ]
}

fn domain_tools() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "name": "theharvester_domain_search",
            "description": "Gather emails, subdomains, hosts, employee names, open ports and banners from public sources. API keys can be provided via environment variables or optional parameters for enhanced sources (hunter, bingapi, shodan, securityTrails).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "domain": { "type": "string", "description": "Domain/company name to search" },
                    "sources": { "type": "string", "description": "Data sources (default: all). Options: baidu, bing, bingapi, certspotter, crtsh, dnsdumpster, duckduckgo, github-code, google, hackertarget, hunter, linkedin, linkedin_links, otx, pentesttools, projectdiscovery, qwant, rapiddns, securityTrails, sublist3r, threatcrowd, threatminer, trello, twitter, urlscan, virustotal, yahoo" },
                    "limit": { "type": "integer", "description": "Limit results (default: 500)" },
                    "hunter_api_key": { "type": "string", "description": "Optional: Hunter.io API key for enhanced email discovery" },
                    "bing_api_key": { "type": "string", "description": "Optional: Bing API key for bingapi source" },
                    "shodan_api_key": { "type": "string", "description": "Optional: Shodan API key for shodan source" },
                    "securitytrails_api_key": { "type": "string", "description": "Optional: SecurityTrails API key for securityTrails source" },
                },
                "required": ["domain"],
            },
        }),
        serde_json::json!({
            "name": "spiderfoot_scan",
            "description": "Comprehensive OSINT scan - auto-detects target type (IP, IPv6, domain, email, phone, username, person name, Bitcoin address, network block, BGP AS). API keys can be provided via environment variables (SHODAN_API_KEY, VIRUSTOTAL_API_KEY, etc.) for enhanced modules.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "target": {
                        "type": "string",
                        "description": "Target to scan - SpiderFoot auto-detects type from: IP address, IPv6 address, domain, email, phone number, username, person name, Bitcoin address, network block, or BGP AS",
                    },
                },
                "required": ["target"],
            },
        }),
    ]
}
