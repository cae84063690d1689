//! Browser fingerprint suppression.
//!
//! The portal sits behind a bot-protection layer that rejects sessions showing
//! the usual automation markers, so Chrome is started without them and the
//! remaining `navigator` properties are patched after every navigation.

use crate::model::LaunchOptions;
use serde_json::{json, Map, Value};

/// Patches `navigator` properties that headless Chrome gives away.
pub const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', {get: () => undefined});
Object.defineProperty(navigator, 'plugins', {get: () => [1, 2, 3, 4, 5]});
Object.defineProperty(navigator, 'languages', {get: () => ['en-US', 'en', 'lv']});
"#;

const BASE_ARGS: &[&str] = &[
    "--log-level=3",
    "--disable-blink-features=AutomationControlled",
    "--disable-gpu",
    "--no-sandbox",
    "--disable-dev-shm-usage",
];

const HEADLESS_ARGS: &[&str] = &["--headless=new", "--window-size=1920,1080", "--start-maximized"];

/// Chrome command line for `options`.
pub fn chrome_args(options: &LaunchOptions) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    if options.headless {
        args.extend(HEADLESS_ARGS.iter().map(|arg| arg.to_string()));
    }
    args.extend(BASE_ARGS.iter().map(|arg| arg.to_string()));
    args.push(format!("--user-agent={}", options.user_agent));
    args
}

/// W3C capabilities requesting a stealth-configured Chrome.
pub fn chrome_capabilities(options: &LaunchOptions) -> Map<String, Value> {
    let mut capabilities = Map::new();
    capabilities.insert("browserName".to_string(), json!("chrome"));
    capabilities.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": chrome_args(options),
            "excludeSwitches": ["enable-logging", "enable-automation"],
            "useAutomationExtension": false,
            "prefs": {
                "profile.default_content_setting_values.notifications": 2
            }
        }),
    );
    capabilities
}
