//! Utility functions for the SLATE agent

/// Shortens a long address for display, e.g. `TR7NHq...gjLj6t`.
pub fn short_address(address: &str) -> String {
    if address.len() <= 14 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 6..])
}

/// True when `--flag` was passed or the environment variable is set.
pub fn mode_enabled(args: &[String], flag: &str, env_key: &str) -> bool {
    args.iter().any(|a| a == flag) || std::env::var(env_key).is_ok()
}
