use std::path::PathBuf;
use std::process::ExitCode;

use vendor_tracepoints::discovery::{discover, Discovery, DiscoveryConfig};
use vendor_tracepoints::tracing::{init_tracing, shutdown_tracing, LogOptions};
use vendor_tracepoints::metrics;

const USAGE: &str = "\
Usage: vendor-tracepoints [OPTIONS]

Discover the kernel tracepoints behind vendor atrace categories.

Options:
  --manifest PATH        Vendor category manifest
                         (default: /vendor/etc/atrace/atrace_categories.txt)
  --tracefs ROOT         tracefs mount point (default: auto-detect)
  --category NAME        Print the tracepoints for NAME (repeatable)
  --json                 Print the result as JSON
  --log-json             Emit JSON log lines on stderr
  --otlp-endpoint URL    Export spans to an OTLP collector
  --metrics              Print Prometheus metrics after the result
  -h, --help             Show this help

Log level is controlled by RUST_LOG.";

#[derive(Debug, Default)]
struct Args {
    config: DiscoveryConfig,
    log: LogOptions,
    categories: Vec<String>,
    json: bool,
    metrics: bool,
}

/// Parse command-line flags. `Ok(None)` means help was requested.
fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Option<Args>, String> {
    let mut args = Args::default();

    while let Some(flag) = argv.next() {
        let mut value = |name: &str| {
            argv.next()
                .ok_or_else(|| format!("{} requires a value", name))
        };

        match flag.as_str() {
            "--manifest" => args.config.manifest_path = PathBuf::from(value("--manifest")?),
            "--tracefs" => args.config.tracefs_root = Some(PathBuf::from(value("--tracefs")?)),
            "--category" => args.categories.push(value("--category")?),
            "--otlp-endpoint" => args.log.otlp_endpoint = Some(value("--otlp-endpoint")?),
            "--json" => args.json = true,
            "--log-json" => args.log.json = true,
            "--metrics" => args.metrics = true,
            "-h" | "--help" => return Ok(None),
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    Ok(Some(args))
}

/// Render the result in manifest syntax, so it can be saved as one.
fn render_text(discovery: &Discovery) -> String {
    let mut out = String::new();
    for (category, tracepoints) in discovery.categories.iter() {
        out.push_str(category);
        out.push('\n');
        for tp in tracepoints {
            out.push(' ');
            out.push_str(&tp.to_string());
            out.push('\n');
        }
    }
    out
}

fn print_result(args: &Args, discovery: &Discovery) -> Result<(), serde_json::Error> {
    if args.categories.is_empty() {
        if args.json {
            println!("{}", serde_json::to_string_pretty(discovery)?);
        } else {
            print!("{}", render_text(discovery));
        }
        return Ok(());
    }

    let resolved = discovery.categories.resolve(&args.categories);
    for name in &resolved.unknown {
        tracing::warn!(category = %name, "Unknown vendor category");
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    } else {
        for tp in &resolved.tracepoints {
            println!("{}", tp);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, USAGE);
            return ExitCode::from(1);
        }
    };

    if let Err(e) = init_tracing("vendor-tracepoints", &args.log) {
        eprintln!("error: failed to initialize tracing: {}", e);
        return ExitCode::from(1);
    }

    // No vendor HAL binding is linked into this binary, so tracefs is never
    // touched: only the manifest path can produce categories here.
    let discovery = discover(&args.config, None, None);

    let mut code = ExitCode::SUCCESS;
    if let Err(e) = print_result(&args, &discovery) {
        tracing::error!(error = %e, "Failed to serialize result");
        code = ExitCode::from(1);
    }
    if args.metrics {
        print!("{}", metrics::render());
    }
    if discovery.manifest_error.is_some() {
        code = ExitCode::from(2);
    }

    shutdown_tracing();
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use vendor_tracepoints::{CategoryMap, DiscoverySource, Tracepoint};

    fn tp(group: &str, name: &str) -> Tracepoint {
        Tracepoint::new(group, name).unwrap()
    }

    fn argv(args: &[&str]) -> impl Iterator<Item = String> {
        args.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_args_defaults() {
        let args = parse_args(argv(&[])).unwrap().unwrap();
        assert!(args.categories.is_empty());
        assert!(!args.json);
        assert!(args.config.tracefs_root.is_none());
    }

    #[test]
    fn test_parse_args_flags() {
        let args = parse_args(argv(&[
            "--manifest",
            "/tmp/cats.txt",
            "--tracefs",
            "/sys/kernel/tracing/",
            "--category",
            "gfx",
            "--category",
            "memory",
            "--json",
            "--log-json",
            "--metrics",
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(args.config.manifest_path, PathBuf::from("/tmp/cats.txt"));
        assert_eq!(
            args.config.tracefs_root,
            Some(PathBuf::from("/sys/kernel/tracing/"))
        );
        assert_eq!(args.categories, vec!["gfx", "memory"]);
        assert!(args.json && args.log.json && args.metrics);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(argv(&["--manifest"])).is_err());
        assert!(parse_args(argv(&["--bogus"])).is_err());
        assert!(parse_args(argv(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn test_render_text_is_manifest_syntax() {
        let mut categories = CategoryMap::new();
        categories.push("gfx", tp("foo", "bar"));
        categories.push("memory", tp("grp", "evt"));
        let discovery = Discovery {
            run_id: "test".to_string(),
            source: DiscoverySource::Manifest,
            categories: categories.clone(),
            manifest_error: None,
        };

        let text = render_text(&discovery);
        assert_eq!(text, "gfx\n foo/bar\nmemory\n grp/evt\n");
        assert_eq!(
            vendor_tracepoints::manifest::parse_str(&text).unwrap(),
            categories
        );
    }
}
