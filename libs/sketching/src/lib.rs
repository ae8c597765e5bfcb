#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing_forest::printer::TestCapturePrinter;
use tracing_forest::tag::NoTag;
use tracing_forest::util::*;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

pub use {tracing, tracing_forest, tracing_subscriber};

/// Crates whose output `--debug` turns up.
const WORKSPACE_CRATES: [&str; 5] = [
    "outreach",
    "outreach_cli",
    "outreach_client",
    "outreach_ui",
    "outreach_proto",
];

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err("Must be one of info, debug, trace"),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Build the filter for a tool run. An explicit level wins, otherwise
/// `RUST_LOG`, otherwise quiet libraries and an informative cli.
pub fn tool_filter(level: Option<LogLevel>) -> Result<EnvFilter, String> {
    match level {
        Some(level) => {
            let directives = WORKSPACE_CRATES
                .iter()
                .map(|c| format!("{}={}", c, level))
                .collect::<Vec<_>>()
                .join(",");
            EnvFilter::try_new(directives).map_err(|e| format!("Invalid log directive: {:?}", e))
        }
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse_lossy("outreach_client=warn,outreach_ui=warn,outreach_cli=info")
        })),
    }
}

/// Start logging for a binary, writing to stderr so stdout stays parseable.
pub fn start_logging(level: Option<LogLevel>) -> Result<(), String> {
    let filter_layer = tool_filter(level)?;
    let fmt_layer = tfmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| format!("Unable to start tracing: {:?}", e))
}

/// Start up the logging for test mode.
pub fn test_init() {
    let filter = EnvFilter::from_default_env()
        .add_directive(LevelFilter::TRACE.into())
        // reqwest's connection pool is very noisy at trace.
        .add_directive(
            "hyper_util=INFO"
                .parse()
                .unwrap_or_else(|_| LevelFilter::INFO.into()),
        );

    // start the logging!
    let _ = tracing_subscriber::Registry::default()
        .with(ForestLayer::new(TestCapturePrinter::new(), NoTag).with_filter(filter))
        .try_init();
}
