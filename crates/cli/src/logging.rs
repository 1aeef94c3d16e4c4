use std::env;

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if verbose {
        tracing::debug!("verbose logging enabled");
    }
}

/// One-line user-facing status on stderr.
pub fn status(message: impl AsRef<str>) {
    eprintln!("[illustra] {}", message.as_ref());
}

pub fn env_flag() -> bool {
    env::var("ILLUSTRA_VERBOSE")
        .map(|value| parse_bool(value.trim()))
        .unwrap_or(false)
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn accepts_common_truthy_values() {
        for value in ["1", "true", "YES", " on "] {
            assert!(parse_bool(value), "{value}");
        }
        for value in ["0", "off", "", "verbose"] {
            assert!(!parse_bool(value), "{value}");
        }
    }
}
