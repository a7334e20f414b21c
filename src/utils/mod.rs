pub mod build_info;
pub mod paths;

use std::sync::Once;

use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

pub const DEFAULT_LOG_DIRECTIVE: &str = "allowance_core=info";

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_LOG_DIRECTIVE);
}

/// Initializes the global tracing subscriber, layering `directive` over `RUST_LOG`.
///
/// Only the first call in a process installs a subscriber.
pub fn init_tracing_with(directive: &str) {
    TRACING_INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        match directive.parse::<Directive>() {
            Ok(parsed) => filter = filter.add_directive(parsed),
            Err(err) => eprintln!("ignoring invalid log directive `{directive}`: {err}"),
        }
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
