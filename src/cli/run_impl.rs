use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::analyzer::Analyzer;
use crate::bootstrap::{self, Bootstrap};
use crate::fault::{E_ALL, Failure, FaultPolicy};
use crate::formatters::Format;
use crate::generator::Generator;
use crate::logger::{Logger, Severity};
use crate::processors;
use crate::traversal::SourceFinder;

use super::{Args, Options, USAGE, parse_args};

/// File name used when `--output` names a directory.
pub const DEFAULT_OUTPUT: &str = "openapi.yaml";

/// Runs one invocation and returns the process exit code.
pub fn run_with_args<I, S>(tokens: I) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (args, mut error) = match parse_args(tokens) {
        Ok(args) => (args, None),
        Err(err) => (err.partial, Some(err.message)),
    };
    let Args { mut options, paths } = args;

    let mut boot: Result<Bootstrap, Failure> = Ok(Bootstrap::default());
    if let Some(path) = options.bootstrap.as_deref() {
        if bootstrap::is_readable(Path::new(path)) {
            boot = bootstrap::load(Path::new(path));
        } else {
            error = Some(format!("Invalid `--bootstrap` value: `{path}`"));
        }
    }
    if paths.is_empty() {
        error = Some("Specify at least one path.".to_string());
    }

    let logger = Logger::new(options.debug);
    init_tracing(options.debug);

    if !options.help {
        if let Some(message) = error {
            logger.log(Severity::Error, "", Some(""), None);
            logger.error(&message);
            options.help = true;
        }
    }
    if options.help {
        logger.info(USAGE);
        return 1;
    }

    let reporting = boot.as_ref().map_or(E_ALL, |b| b.error_reporting);
    let faults = FaultPolicy::install(&logger, reporting);
    match generate(&options, &paths, boot, &faults) {
        Ok(()) => i32::from(logger.called()),
        Err(err) => faults.uncaught(&err),
    }
}

fn generate(
    options: &Options,
    paths: &[String],
    boot: Result<Bootstrap, Failure>,
    faults: &FaultPolicy<'_>,
) -> Result<()> {
    let boot = boot?;
    let logger = faults.logger();
    let target = options.output.as_deref().map(output_path);
    let format = Format::resolve(
        &options.format,
        target.as_deref().unwrap_or(Path::new(DEFAULT_OUTPUT)),
    )?;
    let exclude = normalize_excludes(&options.exclude, logger);
    let pattern = options.pattern();

    let mut generator = Generator::new(faults)
        .with_version(&options.version)
        .with_constants(boot.constants);
    for name in &options.processor {
        let processor =
            processors::resolve(name).with_context(|| format!("Cannot register processor {name}"))?;
        generator.add_processor(processor);
    }

    let analyzer = if options.legacy {
        Analyzer::token()
    } else {
        Analyzer::reflection()
    };
    tracing::debug!(?analyzer, pattern, ?exclude, "generating");

    let finder = SourceFinder::new(paths, &exclude, pattern)?;
    let api = generator.generate(finder.files(), &analyzer)?;

    if logger.called() {
        logger.log(Severity::Notice, "", Some(""), None);
    }

    match target {
        None => {
            let doc = api.render(format)?;
            let mut out = io::stdout().lock();
            writeln!(out, "{}", doc.trim_end_matches('\n'))?;
        }
        Some(target) => api.save_as(&target, format)?,
    }
    Ok(())
}

/// Where `--output` writes; a directory gets the default file name.
fn output_path(output: &str) -> PathBuf {
    let mut target = PathBuf::from(output);
    if target.is_dir() {
        target.push(DEFAULT_OUTPUT);
    }
    target
}

/// Splits a comma-separated first exclude into separate entries.
fn normalize_excludes(excludes: &[String], logger: &Logger) -> Vec<String> {
    let mut out = excludes.to_vec();
    let Some(first) = out.first().filter(|f| f.contains(',')).cloned() else {
        return out;
    };
    let mut parts: Vec<String> = first.split(',').map(str::to_string).collect();
    logger.log(
        Severity::Notice,
        &format!(
            "Comma-separated exclude paths are deprecated, use multiple --exclude statements: --exclude {} --exclude {}",
            parts[0], parts[1]
        ),
        Some("Deprecated"),
        None,
    );
    out[0] = parts.remove(0);
    out.extend(parts);
    out
}

fn init_tracing(debug: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_env("OASGEN_LOG").unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if debug { "oasgen=debug" } else { "warn" })
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_separated_exclude_is_split() {
        let logger = Logger::new(false);
        let out = normalize_excludes(&["a,b,c".to_string(), "d".to_string()], &logger);
        assert_eq!(out, vec!["a", "d", "b", "c"]);
        assert!(logger.called());
    }

    #[test]
    fn plain_excludes_pass_through() {
        let logger = Logger::new(false);
        let out = normalize_excludes(&["a".to_string(), "b,c".to_string()], &logger);
        assert_eq!(out, vec!["a", "b,c"]);
        assert!(!logger.called());
    }

    #[test]
    fn help_and_usage_errors_exit_one() {
        assert_eq!(run_with_args(["--help"]), 1);
        assert_eq!(run_with_args(["-h", "src"]), 1);
        assert_eq!(run_with_args(Vec::<String>::new()), 1);
        assert_eq!(run_with_args(["--debug", "--format", "json"]), 1);
        assert_eq!(run_with_args(["src", "--bogus"]), 1);
        assert_eq!(run_with_args(["src", "--bootstrap", "/definitely/not/here.toml"]), 1);
    }

    #[test]
    fn writes_into_directory_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(
            src.join("api.rs"),
            "/// @OA\\Info(title=\"t\", version=\"1\")\n/// @OA\\Get(path=\"/a\", @OA\\Response(response=200, description=\"ok\"))\nfn a() {}\n",
        )
        .unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let code = run_with_args([
            "--output",
            out.to_str().unwrap(),
            src.to_str().unwrap(),
        ]);
        assert_eq!(code, 0);
        let written = std::fs::read_to_string(out.join(DEFAULT_OUTPUT)).unwrap();
        assert!(written.starts_with("openapi: 3.0.0"));
    }
}
