//! Tracing subscriber setup for wp-manager.
//!
//! Controlled by environment variables:
//! - `WP_LOG_LEVEL`  (default `warn`, `RUST_LOG` takes precedence)
//! - `WP_LOG_OUTPUT` `console` | `file` | `both` | `none` (default `console`)
//! - `WP_LOG_FORMAT` `human` | `json` (default `human`)
//! - `WP_LOG_FILE`   (default `/tmp/wp-manager.log`)
//!
//! Console logs are written to stderr; stdout carries command output only.

use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::MakeWriter, prelude::*, registry, EnvFilter};

// --- "Tee" writer for console + file output ---
struct Tee<A, B> {
    a: A,
    b: B,
}

impl<A, B> Write for Tee<A, B>
where
    A: Write,
    B: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res_a = self.a.write(buf);
        let res_b = self.b.write(buf);
        res_a.or(res_b)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.a.flush()?;
        self.b.flush()
    }
}

#[derive(Clone)]
struct MakeTee<A, B> {
    make_a: A,
    make_b: B,
}

impl<'a, A, B, W1, W2> MakeWriter<'a> for MakeTee<A, B>
where
    A: MakeWriter<'a, Writer = W1>,
    B: MakeWriter<'a, Writer = W2>,
    W1: Write + 'a,
    W2: Write + 'a,
{
    type Writer = Tee<W1, W2>;
    fn make_writer(&'a self) -> Self::Writer {
        Tee {
            a: self.make_a.make_writer(),
            b: self.make_b.make_writer(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogOutput {
    Console,
    File,
    Both,
    Disabled,
}

impl LogOutput {
    fn parse(value: &str) -> Self {
        match value {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            "none" | "off" => LogOutput::Disabled,
            _ => LogOutput::Console,
        }
    }
}

/// Logging settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    output: LogOutput,
    pub json: bool,
    pub file_path: PathBuf,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self {
            level: env::var("WP_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
            output: LogOutput::parse(
                &env::var("WP_LOG_OUTPUT").unwrap_or_else(|_| "console".to_string()),
            ),
            json: env::var("WP_LOG_FORMAT").is_ok_and(|f| f == "json"),
            file_path: env::var("WP_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/wp-manager.log")),
        }
    }

    /// Raise the level to `debug` (used by `--debug`).
    pub fn verbose(mut self) -> Self {
        self.level = "debug".to_string();
        self
    }
}

/// Initializes the global tracing subscriber.
///
/// The returned guard must be kept alive for file output to be flushed.
pub fn init_subscriber(settings: &LogSettings) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let subscriber = registry().with(env_filter);

    let log_dir = settings
        .file_path
        .parent()
        .unwrap_or_else(|| Path::new("/tmp"))
        .to_path_buf();
    let log_filename = settings
        .file_path
        .file_name()
        .map(|f| f.to_owned())
        .unwrap_or_else(|| "wp-manager.log".into());

    match settings.output {
        LogOutput::Both => {
            let file_appender = tracing_appender::rolling::never(&log_dir, &log_filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let tee_writer = MakeTee {
                make_a: io::stderr,
                make_b: non_blocking,
            };
            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(tee_writer);
            if settings.json {
                subscriber.with(fmt_layer.json()).init();
            } else {
                subscriber.with(fmt_layer.compact()).init();
            }
            Some(guard)
        }
        LogOutput::File => {
            let file_appender = tracing_appender::rolling::never(&log_dir, &log_filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            if settings.json {
                subscriber.with(fmt_layer.json()).init();
            } else {
                subscriber.with(fmt_layer).init();
            }
            Some(guard)
        }
        LogOutput::Console => {
            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
            if settings.json {
                subscriber.with(fmt_layer.json()).init();
            } else {
                subscriber.with(fmt_layer.compact()).init();
            }
            None
        }
        LogOutput::Disabled => None,
    }
}
