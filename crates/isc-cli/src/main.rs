//! `isc` command-line entry point

use isc_cli::build_cli;
use std::io::Write;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log_format: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .init(),
    }
}

fn main() {
    let matches = build_cli().get_matches();
    init_tracing(
        matches
            .get_one::<String>("log-format")
            .map_or("text", String::as_str),
    );

    let mut stdout = std::io::stdout().lock();
    let code = match isc_cli::run(&matches, &mut stdout) {
        Ok(report) => i32::from(report.has_failures()),
        Err(e) => {
            eprintln!("error: {e:#}");
            2
        }
    };
    let _ = stdout.flush();
    std::process::exit(code);
}
