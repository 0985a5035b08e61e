use thiserror::Error;

mod run_impl;

pub use run_impl::{DEFAULT_OUTPUT, run_with_args};

/// Default file-name glob for scanned sources.
pub const DEFAULT_PATTERN: &str = "*.rs";
/// Default OpenAPI version of the generated document.
pub const DEFAULT_VERSION: &str = "3.0.0";

/// How an option consumes the command line, and where its value lands.
#[derive(Clone, Copy)]
enum OptionKind {
    /// Set to true, consumes no argument.
    Flag(fn(&mut Options)),
    /// Takes one argument; the last occurrence wins.
    Value(fn(&mut Options, String)),
    /// Takes one argument per occurrence; values accumulate in order.
    Repeated(fn(&mut Options, String)),
}

struct OptionSpec {
    name: &'static str,
    kind: OptionKind,
}

const SCHEMA: &[OptionSpec] = &[
    OptionSpec { name: "legacy", kind: OptionKind::Flag(|o| o.legacy = true) },
    OptionSpec { name: "output", kind: OptionKind::Value(|o, v| o.output = Some(v)) },
    OptionSpec { name: "format", kind: OptionKind::Value(|o, v| o.format = v) },
    OptionSpec { name: "exclude", kind: OptionKind::Repeated(|o, v| o.exclude.push(v)) },
    OptionSpec { name: "pattern", kind: OptionKind::Value(|o, v| o.pattern = Some(v)) },
    OptionSpec { name: "bootstrap", kind: OptionKind::Value(|o, v| o.bootstrap = Some(v)) },
    OptionSpec { name: "help", kind: OptionKind::Flag(|o| o.help = true) },
    OptionSpec { name: "debug", kind: OptionKind::Flag(|o| o.debug = true) },
    OptionSpec { name: "processor", kind: OptionKind::Repeated(|o, v| o.processor.push(v)) },
    OptionSpec { name: "version", kind: OptionKind::Value(|o, v| o.version = v) },
];

const ALIASES: &[(&str, &str)] = &[
    ("l", "legacy"),
    ("o", "output"),
    ("e", "exclude"),
    ("n", "pattern"),
    ("b", "bootstrap"),
    ("d", "debug"),
    ("h", "help"),
];

fn lookup(name: &str) -> Option<OptionKind> {
    SCHEMA.iter().find(|s| s.name == name).map(|s| s.kind)
}

fn resolve_alias(alias: &str) -> Option<&'static str> {
    ALIASES.iter().find(|(a, _)| *a == alias).map(|(_, n)| *n)
}

/// Validated command-line configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub legacy: bool,
    pub output: Option<String>,
    pub format: String,
    pub exclude: Vec<String>,
    pub pattern: Option<String>,
    pub bootstrap: Option<String>,
    pub help: bool,
    pub debug: bool,
    pub processor: Vec<String>,
    pub version: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            legacy: false,
            output: None,
            format: "auto".to_string(),
            exclude: Vec::new(),
            pattern: Some(DEFAULT_PATTERN.to_string()),
            bootstrap: None,
            help: false,
            debug: false,
            processor: Vec::new(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

impl Options {
    /// Effective file pattern, falling back to the default glob.
    pub fn pattern(&self) -> &str {
        self.pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PATTERN)
    }
}

/// Runs the CLI against the process arguments and returns the exit code.
pub fn run() -> i32 {
    let tokens: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    run_with_args(tokens)
}

/// Result of a successful parse: options plus free-standing paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub options: Options,
    pub paths: Vec<String>,
}

/// A usage error. Parsing stops at the first one; whatever was gathered
/// before it is kept in `partial`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub partial: Args,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Long(&'a str),
    Short(&'a str),
    Free(&'a str),
}

fn classify(raw: &str) -> Token<'_> {
    if let Some(name) = raw.strip_prefix("--") {
        Token::Long(name)
    } else if let Some(alias) = raw.strip_prefix('-') {
        Token::Short(alias)
    } else {
        Token::Free(raw)
    }
}

/// Parses raw argument tokens (without the program name).
///
/// # Errors
/// Returns [`ParseError`] for an unknown option or a missing option argument.
pub fn parse_args<I, S>(tokens: I) -> Result<Args, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: Vec<S> = tokens.into_iter().collect();
    let mut args = Args::default();
    let mut i = 0;
    while i < tokens.len() {
        let raw = tokens[i].as_ref();
        let name = match classify(raw) {
            Token::Free(path) => {
                args.paths.push(path.to_string());
                i += 1;
                continue;
            }
            Token::Long(name) => name,
            Token::Short(alias) => match resolve_alias(alias) {
                Some(name) => name,
                None => return Err(fail(format!("Unknown option: {raw}"), args)),
            },
        };
        let Some(kind) = lookup(name) else {
            return Err(fail(format!("Unknown option: {raw}"), args));
        };
        let store = match kind {
            OptionKind::Flag(set) => {
                set(&mut args.options);
                i += 1;
                continue;
            }
            OptionKind::Value(store) | OptionKind::Repeated(store) => store,
        };
        let value = match tokens.get(i + 1).map(AsRef::as_ref) {
            Some(v) if !v.is_empty() && !v.starts_with('-') => v.to_string(),
            _ => return Err(fail(format!("Missing argument for {raw}"), args)),
        };
        store(&mut args.options, value);
        i += 2;
    }
    Ok(args)
}

fn fail(message: String, partial: Args) -> ParseError {
    ParseError { message, partial }
}

pub const USAGE: &str = r#"
Usage: oasgen [--option value] [/path/to/project ...]

Options:
  --legacy (-l)     Use the legacy token analyzer; the default analyzer
                    reads doc comments and #[oa::...] attributes.
  --output (-o)     Path to store the generated document.
                    ex: --output openapi.yaml
  --exclude (-e)    Exclude path(s), relative to each scanned root.
                    ex: --exclude vendor --exclude tests/fixtures
  --pattern (-n)    Pattern of files to scan, a glob or a /regex/.
                    ex: --pattern "*.rs" or --pattern "/\.(rs|rsx)$/"
  --bootstrap (-b)  TOML file defining constants and the error-reporting
                    mask.
                    ex: --bootstrap config/openapi.toml
  --processor       Register an additional processor.
                    ex: --processor SortComponents
  --format          Force yaml or json.
  --debug (-d)      Show additional error information.
  --version         The OpenAPI version; defaults to 3.0.0.
  --help (-h)       Display this help message.
"#;
