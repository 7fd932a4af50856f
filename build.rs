use std::env;
use std::fs;
use std::path::Path;

/// Every variable config.rs reads through `option_env!`.
const CONFIG_KEYS: [&str; 7] = [
    "ENVIRONMENT",
    "BACKEND_URL_DEVELOPMENT",
    "BACKEND_URL_PRODUCTION",
    "ENABLE_LOGGING",
    "EXPIRY_REFRESH_SECONDS",
    "UPI_ID",
    "PAYEE_NAME",
];

/// `KEY=VALUE`, optionally quoted; blank lines and `#` comments are skipped.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim().trim_start_matches("export ").trim();
    (!key.is_empty()).then_some((key, value.trim().trim_matches('"')))
}

// Bakes a local .env into the compile-time environment for config.rs.
fn main() {
    let env_file = Path::new(".env");

    match fs::read_to_string(env_file) {
        Ok(contents) => {
            println!("cargo:rerun-if-changed=.env");
            for (key, value) in contents.lines().filter_map(parse_env_line) {
                if !CONFIG_KEYS.contains(&key) {
                    println!("cargo:warning=.env sets {} which the client never reads", key);
                    continue;
                }
                // The build environment wins over the file.
                if env::var(key).is_err() {
                    println!("cargo:rustc-env={}={}", key, value);
                }
            }
        }
        Err(_) => {
            println!("cargo:warning=No .env found, using built-in defaults (see .env.example)");
        }
    }

    println!("cargo:rerun-if-changed=build.rs");
    for key in CONFIG_KEYS {
        println!("cargo:rerun-if-env-changed={}", key);
    }
}
