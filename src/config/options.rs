//! Command-line option declarations and resolution.
//!
//! # Responsibilities
//! - Declare the daemon's recognized options as an `OptionSpec` table
//! - Resolve process arguments into typed `ResolvedOptions`
//! - Apply defaults and translate value-mapped literals
//!
//! # Design Decisions
//! - The clap command is generated from the table, not derived
//! - Defaults are literals run through the same conversion as user input
//! - Value-map validation happens here, so errors name the option and literal

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::fmt;

use clap::error::{ContextKind, ErrorKind};
use clap::{Arg, ArgAction, Command};
use thiserror::Error;

use crate::observability::logging::{LogLevel, LogTarget};

pub const OPT_ENVIRONMENT: &str = "environment";
pub const OPT_API_SERVER_URL: &str = "api-server-url";
pub const OPT_LOG_LEVEL: &str = "log-level";
pub const OPT_LOG_TARGET: &str = "log-target";
pub const OPT_IPAM_QUERY_INTERVAL: &str = "ipam-query-interval";
pub const OPT_VERSION: &str = "version";
pub const OPT_CONFIG: &str = "config";

pub const ENVIRONMENT_PUBLIC: &str = "public";
pub const ENVIRONMENT_HYBRID: &str = "hybrid";

/// Default location of the daemon configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/netplane/netplane.toml";

/// Declared type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Int,
    Bool,
}

/// A resolved option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    Int(i64),
    Bool(bool),
    /// The option has no default and was not supplied.
    Unset,
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, OptionValue::Unset)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(s) => write!(f, "{:?}", s),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Unset => write!(f, "<unset>"),
        }
    }
}

/// Declaration of a single recognized option.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    /// Long name, used as `--name`.
    pub name: &'static str,

    /// Optional one-letter alias, used as `-x`.
    pub shorthand: Option<char>,

    pub description: &'static str,

    pub kind: OptionKind,

    /// Default literal. `None` resolves to `OptionValue::Unset`.
    pub default: Option<&'static str>,

    /// Accepted literals and the values they translate to.
    pub value_map: Option<Vec<(&'static str, OptionValue)>>,
}

impl OptionSpec {
    fn accepted(&self) -> Vec<&'static str> {
        self.value_map
            .as_ref()
            .map(|map| map.iter().map(|(literal, _)| *literal).collect())
            .unwrap_or_default()
    }

    fn default_value(&self) -> Result<OptionValue, ParseError> {
        match self.default {
            Some(literal) => self.convert(literal),
            None => Ok(OptionValue::Unset),
        }
    }

    /// Convert an input or default literal into this option's typed value.
    fn convert(&self, literal: &str) -> Result<OptionValue, ParseError> {
        if let Some(map) = &self.value_map {
            return map
                .iter()
                .find(|(accepted, _)| *accepted == literal)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| ParseError::NotAccepted {
                    option: self.name.to_string(),
                    value: literal.to_string(),
                    accepted: self.accepted().join(", "),
                });
        }

        match self.kind {
            OptionKind::String => Ok(OptionValue::Str(literal.to_string())),
            OptionKind::Int => literal
                .trim()
                .parse::<i64>()
                .map(OptionValue::Int)
                .map_err(|_| ParseError::InvalidInteger {
                    option: self.name.to_string(),
                    value: literal.to_string(),
                }),
            OptionKind::Bool => literal
                .parse::<bool>()
                .map(OptionValue::Bool)
                .map_err(|_| ParseError::InvalidBool {
                    option: self.name.to_string(),
                    value: literal.to_string(),
                }),
        }
    }
}

/// Errors produced while resolving process input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input clap could not match against the declared options.
    #[error("invalid argument '{token}': {reason}")]
    Rejected { token: String, reason: String },

    /// A value-mapped option received a literal outside its map.
    #[error("invalid value '{value}' for --{option} (accepted: {accepted})")]
    NotAccepted {
        option: String,
        value: String,
        accepted: String,
    },

    #[error("invalid integer '{value}' for --{option}")]
    InvalidInteger { option: String, value: String },

    #[error("invalid boolean '{value}' for --{option}")]
    InvalidBool { option: String, value: String },

    #[error("option '{0}' declared more than once")]
    DuplicateOption(String),

    /// `--help` was given; carries the rendered help text.
    #[error("{0}")]
    Help(String),
}

/// Resolved options: exactly one value per declared option.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedOptions {
    values: BTreeMap<String, OptionValue>,
}

impl ResolvedOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(OptionValue::as_int)
    }

    /// Boolean flag value; absent or non-bool options read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(OptionValue::as_bool).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolves process arguments against a declared option table.
#[derive(Debug, Clone)]
pub struct ArgumentResolver {
    program: &'static str,
    specs: Vec<OptionSpec>,
}

impl ArgumentResolver {
    /// Create a resolver, rejecting duplicate option names.
    pub fn new(program: &'static str, specs: Vec<OptionSpec>) -> Result<Self, ParseError> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.name) {
                return Err(ParseError::DuplicateOption(spec.name.to_string()));
            }
        }
        Ok(Self { program, specs })
    }

    /// Resolver over the daemon's option table.
    pub fn daemon(program: &'static str) -> Result<Self, ParseError> {
        Self::new(program, daemon_options())
    }

    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }

    /// Resolve process arguments. The first item is the program name.
    pub fn resolve<I, T>(&self, args: I) -> Result<ResolvedOptions, ParseError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command()
            .try_get_matches_from(args)
            .map_err(rejected)?;

        let mut values = BTreeMap::new();
        for spec in &self.specs {
            let value = match matches.get_one::<String>(spec.name) {
                Some(literal) => spec.convert(literal)?,
                None => spec.default_value()?,
            };
            values.insert(spec.name.to_string(), value);
        }

        Ok(ResolvedOptions { values })
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.program).disable_version_flag(true);

        for spec in &self.specs {
            let mut help = spec.description.to_string();
            let accepted = spec.accepted();
            if !accepted.is_empty() {
                help.push_str(&format!(" [accepted: {}]", accepted.join(", ")));
            }
            if let Some(default) = spec.default {
                help.push_str(&format!(" [default: {}]", default));
            }

            let mut arg = Arg::new(spec.name).long(spec.name).help(help);
            if let Some(short) = spec.shorthand {
                arg = arg.short(short);
            }
            arg = arg
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(String));
            arg = match spec.kind {
                // Bare flag means `true`; a literal must be attached with `=`.
                OptionKind::Bool => arg
                    .num_args(0..=1)
                    .require_equals(true)
                    .default_missing_value("true"),
                OptionKind::String | OptionKind::Int => arg.num_args(1).allow_hyphen_values(true),
            };
            command = command.arg(arg);
        }

        command
    }
}

fn rejected(err: clap::Error) -> ParseError {
    if err.kind() == ErrorKind::DisplayHelp {
        return ParseError::Help(err.render().to_string());
    }

    let token = err
        .get(ContextKind::InvalidArg)
        .or_else(|| err.get(ContextKind::InvalidValue))
        .map(|value| value.to_string())
        .unwrap_or_else(|| "<input>".to_string());
    let reason = err.kind().as_str().unwrap_or("invalid input").to_string();

    ParseError::Rejected { token, reason }
}

/// The option table recognized by the daemon binary.
pub fn daemon_options() -> Vec<OptionSpec> {
    vec![
        OptionSpec {
            name: OPT_ENVIRONMENT,
            shorthand: Some('e'),
            description: "Set the operating environment",
            kind: OptionKind::String,
            default: Some(ENVIRONMENT_PUBLIC),
            value_map: Some(vec![
                (ENVIRONMENT_PUBLIC, OptionValue::Str(ENVIRONMENT_PUBLIC.to_string())),
                (ENVIRONMENT_HYBRID, OptionValue::Str(ENVIRONMENT_HYBRID.to_string())),
            ]),
        },
        OptionSpec {
            name: OPT_API_SERVER_URL,
            shorthand: Some('u'),
            description: "Set the API server URL",
            kind: OptionKind::String,
            default: Some(""),
            value_map: None,
        },
        OptionSpec {
            name: OPT_LOG_LEVEL,
            shorthand: Some('l'),
            description: "Set the logging level",
            kind: OptionKind::Int,
            default: Some(LogLevel::Info.literal()),
            value_map: Some(
                [LogLevel::Info, LogLevel::Debug]
                    .into_iter()
                    .map(|level| (level.literal(), OptionValue::Int(level.code())))
                    .collect(),
            ),
        },
        OptionSpec {
            name: OPT_LOG_TARGET,
            shorthand: Some('t'),
            description: "Set the logging target",
            kind: OptionKind::Int,
            default: Some(LogTarget::File.literal()),
            value_map: Some(
                [LogTarget::Syslog, LogTarget::Stderr, LogTarget::File]
                    .into_iter()
                    .map(|target| (target.literal(), OptionValue::Int(target.code())))
                    .collect(),
            ),
        },
        OptionSpec {
            name: OPT_IPAM_QUERY_INTERVAL,
            shorthand: Some('i'),
            description: "Set the IPAM plugin query interval in seconds",
            kind: OptionKind::Int,
            default: None,
            value_map: None,
        },
        OptionSpec {
            name: OPT_VERSION,
            shorthand: Some('v'),
            description: "Print version information",
            kind: OptionKind::Bool,
            default: Some("false"),
            value_map: None,
        },
        OptionSpec {
            name: OPT_CONFIG,
            shorthand: Some('c'),
            description: "Path to the daemon configuration file",
            kind: OptionKind::String,
            default: Some(DEFAULT_CONFIG_PATH),
            value_map: None,
        },
    ]
}
