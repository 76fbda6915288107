use tracing_subscriber::EnvFilter;

const QUIET_DIRECTIVE: &str = "info";
const DEBUG_DIRECTIVE: &str = "search_viz=debug,info";

/// Filter directive used when `RUST_LOG` does not apply.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        DEBUG_DIRECTIVE
    } else {
        QUIET_DIRECTIVE
    }
}

/// Builds the subscriber filter. `RUST_LOG` is honoured only with debug
/// logging enabled so a stray variable cannot flood the render loop.
pub fn filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(true)))
    } else {
        EnvFilter::new(default_directive(false))
    }
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(debug))
        .with_thread_names(true)
        .try_init();
}
