//! Structured logging.
//!
//! # Responsibilities
//! - Translate resolved log options into an explicit `LogSettings` value
//! - Install the process `tracing` subscriber from those settings
//! - Route output to stderr, a log file, or the local syslog socket
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Settings are a plain value built once and passed by reference
//! - `RUST_LOG` overrides the configured level when set

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::options::{ResolvedOptions, OPT_LOG_LEVEL, OPT_LOG_TARGET};
use crate::config::schema::LoggingConfig;

/// Errors raised while configuring logging.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("unknown log level code {0}")]
    UnknownLevel(i64),

    #[error("unknown log target code {0}")]
    UnknownTarget(i64),

    #[error("failed to open log file {path}: {source}")]
    File { path: PathBuf, source: io::Error },

    #[error("failed to connect to syslog: {0}")]
    Syslog(io::Error),

    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Verbosity accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
}

impl LogLevel {
    /// Internal numeric level carried in resolved options.
    pub const fn code(self) -> i64 {
        match self {
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
        }
    }

    /// Literal accepted on the command line.
    pub const fn literal(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        [LogLevel::Info, LogLevel::Debug]
            .into_iter()
            .find(|level| level.code() == code)
    }
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Syslog,
    Stderr,
    File,
}

impl LogTarget {
    pub const fn code(self) -> i64 {
        match self {
            LogTarget::Syslog => 0,
            LogTarget::Stderr => 1,
            LogTarget::File => 2,
        }
    }

    pub const fn literal(self) -> &'static str {
        match self {
            LogTarget::Syslog => "syslog",
            LogTarget::Stderr => "stderr",
            LogTarget::File => "logfile",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        [LogTarget::Syslog, LogTarget::Stderr, LogTarget::File]
            .into_iter()
            .find(|target| target.code() == code)
    }
}

/// Explicit logging configuration for the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Program name used for the log file and syslog tag.
    pub name: String,
    pub level: LogLevel,
    pub target: LogTarget,
    /// Directory holding the log file for `LogTarget::File`.
    pub directory: PathBuf,
}

impl LogSettings {
    /// Build settings from resolved options and the file configuration.
    pub fn from_options(
        name: &str,
        options: &ResolvedOptions,
        config: &LoggingConfig,
    ) -> Result<Self, LogError> {
        let level_code = options.int(OPT_LOG_LEVEL).unwrap_or(LogLevel::Info.code());
        let target_code = options.int(OPT_LOG_TARGET).unwrap_or(LogTarget::File.code());

        Ok(Self {
            name: name.to_string(),
            level: LogLevel::from_code(level_code).ok_or(LogError::UnknownLevel(level_code))?,
            target: LogTarget::from_code(target_code)
                .ok_or(LogError::UnknownTarget(target_code))?,
            directory: config.directory.clone(),
        })
    }

    /// Path of the log file used by `LogTarget::File`.
    pub fn log_file(&self) -> PathBuf {
        self.directory.join(format!("{}.log", self.name))
    }

    /// Filter directives for the configured level.
    pub fn directives(&self) -> String {
        let level = self.level.literal();
        format!("warn,netplane={level},netplaned={level},tower_http={level}")
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()))
    }
}

/// Install the global subscriber described by `settings`.
pub fn init(settings: &LogSettings) -> Result<(), LogError> {
    let registry = tracing_subscriber::registry().with(settings.filter());

    let installed = match settings.target {
        LogTarget::Stderr => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init(),
        LogTarget::File => {
            let path = settings.log_file();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| LogError::File { path, source })?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
        #[cfg(unix)]
        LogTarget::Syslog => {
            let writer = syslog::SyslogWriter::connect(&settings.name).map_err(LogError::Syslog)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .without_time()
                        .with_writer(writer),
                )
                .try_init()
        }
        #[cfg(not(unix))]
        LogTarget::Syslog => {
            return Err(LogError::Syslog(io::Error::new(
                io::ErrorKind::Unsupported,
                "syslog is only available on unix",
            )))
        }
    };

    installed.map_err(|e| LogError::Install(e.to_string()))
}

#[cfg(unix)]
mod syslog {
    use std::io;
    use std::os::unix::net::UnixDatagram;
    use std::sync::Arc;

    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;

    const SYSLOG_SOCKET: &str = "/dev/log";
    // LOG_DAEMON
    const FACILITY: u8 = 3;

    /// Sends each formatted event as one datagram to the local syslog daemon.
    pub struct SyslogWriter {
        socket: Arc<UnixDatagram>,
        tag: String,
    }

    impl SyslogWriter {
        pub fn connect(name: &str) -> io::Result<Self> {
            let socket = UnixDatagram::unbound()?;
            socket.connect(SYSLOG_SOCKET)?;
            Ok(Self {
                socket: Arc::new(socket),
                tag: format!("{}[{}]", name, std::process::id()),
            })
        }

        fn line(&self, severity: u8) -> SyslogLine<'_> {
            SyslogLine {
                writer: self,
                priority: FACILITY * 8 + severity,
            }
        }
    }

    /// `<priority>identifier[pid]: message`, one event per datagram.
    pub(super) fn frame(priority: u8, tag: &str, message: &str) -> String {
        format!("<{}>{}: {}", priority, tag, message.trim_end())
    }

    pub(super) fn severity(level: &Level) -> u8 {
        match *level {
            Level::ERROR => 3,
            Level::WARN => 4,
            Level::INFO => 6,
            Level::DEBUG | Level::TRACE => 7,
        }
    }

    pub struct SyslogLine<'a> {
        writer: &'a SyslogWriter,
        priority: u8,
    }

    impl io::Write for SyslogLine<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let message = String::from_utf8_lossy(buf);
            let datagram = frame(self.priority, &self.writer.tag, &message);
            self.writer.socket.send(datagram.as_bytes())?;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SyslogWriter {
        type Writer = SyslogLine<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            self.line(severity(&Level::INFO))
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            self.line(severity(meta.level()))
        }
    }

}
