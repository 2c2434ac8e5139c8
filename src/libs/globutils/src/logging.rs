//!
//! log system
//!

use {
    std::env, std::io, tracing_subscriber::filter::LevelFilter,
    tracing_subscriber::EnvFilter,
};

/// Install the global subscriber.
///
/// `verbose` raises one module (or everything, when empty) to `debug`;
/// `RUST_LOG` directives are layered on top, otherwise only errors are shown.
pub fn init_logging(verbose: Option<&str>) {
    let mut env_filter = EnvFilter::new("attohttpc=warn");
    if let Some(module) = verbose {
        if module.is_empty() {
            env_filter = env_filter.add_directive(LevelFilter::DEBUG.into());
        } else if let Ok(directive) = format!("{module}=debug").parse() {
            env_filter = env_filter.add_directive(directive);
        } else {
            eprintln!("Ignoring invalid module name `{module}`");
        }
    }

    if let Ok(rust_log) = env::var("RUST_LOG") {
        if !rust_log.is_empty() {
            for directive in rust_log.split(',').filter_map(|s| match s.parse() {
                Ok(directive) => Some(directive),
                Err(err) => {
                    eprintln!("Ignoring directive `{s}`: {err}");
                    None
                }
            }) {
                env_filter = env_filter.add_directive(directive);
            }
        }
    } else {
        env_filter = env_filter.add_directive(LevelFilter::ERROR.into());
    }

    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt::Subscriber::builder()
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}
