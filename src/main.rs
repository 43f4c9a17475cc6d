//! url-loader: stream one URL through the middleware pipeline.
//!
//! ```text
//! url-loader [--config FILE] [-H NAME:VALUE]... [--expect-size N]
//!            [--max-size N] [--referrer URL] [-o FILE] URL
//! ```
//!
//! The body goes to stdout (or `--output`), logs and the summary go to
//! stderr. Ctrl-C aborts the exchange cleanly.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use url::Url;

use url_loader::config::{load_config, HeaderValues, ParamConfig};
use url_loader::loader::WriterSink;
use url_loader::observability::logging::init_logging;
use url_loader::{AbortReason, ExchangeOutcome, Loader, LoaderConfig, RequestContext};

#[derive(Parser)]
#[command(name = "url-loader")]
#[command(about = "Stream a URL through a middleware pipeline", long_about = None)]
struct Cli {
    /// URL to fetch.
    url: Url,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra request header, appended after configured params.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Fail unless the body is exactly this many bytes.
    #[arg(long)]
    expect_size: Option<u64>,

    /// Fail as soon as the body exceeds this many bytes.
    #[arg(long)]
    max_size: Option<u64>,

    /// Referrer, sent only to same-origin targets.
    #[arg(long)]
    referrer: Option<String>,

    /// Write the body here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Group `-H` flags by name. Repeated names keep every value, in flag order.
fn header_param(headers: Vec<(String, String)>) -> ParamConfig {
    let mut values: BTreeMap<String, HeaderValues> = BTreeMap::new();
    for (name, value) in headers {
        match values.entry(name) {
            Entry::Vacant(entry) => {
                entry.insert(HeaderValues::from(value));
            }
            Entry::Occupied(mut entry) => entry.get_mut().push(value),
        }
    }
    ParamConfig::Headers { values }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LoaderConfig::default(),
    };
    init_logging(&config.observability);

    if !cli.headers.is_empty() {
        config.params.push(header_param(cli.headers));
    }
    if cli.expect_size.is_some() || cli.max_size.is_some() {
        config.params.push(ParamConfig::Size {
            expected: cli.expect_size,
            max: cli.max_size,
        });
    }

    let loader = Arc::new(Loader::from_config(cli.url, &config)?);
    tracing::info!(
        url = %loader.url(),
        exchange_id = %loader.exchange_id(),
        params = config.params.len(),
        "Loader ready"
    );

    let writer: Box<dyn Write + Send> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let mut sink = WriterSink::new(writer).on_write_error({
        let loader = loader.clone();
        move |err| {
            let reason = AbortReason::Caller(format!("write failed: {}", err));
            tokio::spawn(async move { loader.abort(reason).await });
        }
    });

    let interrupt = {
        let loader = loader.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received");
                loader.abort(AbortReason::Caller("interrupted".into())).await;
            }
        })
    };

    let ctx = RequestContext {
        referrer: cli.referrer,
        ..RequestContext::get()
    };
    let outcome = loader.request(&ctx, &mut sink).await;
    interrupt.abort();

    let written = sink.written();
    sink.finish()?;

    match outcome {
        ExchangeOutcome::Completed => {
            eprintln!("{} bytes from {}", written, loader.url());
            Ok(ExitCode::SUCCESS)
        }
        ExchangeOutcome::Failed(err) => {
            eprintln!("error: {} ({} bytes received)", err, loader.bytes_read());
            Ok(ExitCode::FAILURE)
        }
        ExchangeOutcome::Aborted => {
            eprintln!("aborted after {} bytes", loader.bytes_read());
            Ok(ExitCode::from(130))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url_loader::http::RequestArgs;
    use url_loader::params::build_chain;
    use url_loader::ParamMod;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("X-Token: abc").unwrap(),
            ("X-Token".to_string(), "abc".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "url-loader",
            "-H",
            "a: 1",
            "--expect-size",
            "10",
            "https://example.com/file",
        ])
        .unwrap();
        assert_eq!(cli.url.as_str(), "https://example.com/file");
        assert_eq!(cli.headers.len(), 1);
        assert_eq!(cli.expect_size, Some(10));
    }

    #[test]
    fn test_repeated_header_flags_keep_every_value() {
        let cli = Cli::try_parse_from([
            "url-loader",
            "-H",
            "Accept: a/a",
            "-H",
            "Accept: b/b",
            "-H",
            "X-Token: t",
            "https://example.com/file",
        ])
        .unwrap();

        let mut chain = build_chain(&[header_param(cli.headers)]).unwrap();
        let ctx = RequestContext::get();
        let mut req = RequestArgs::from_context(&ctx);
        chain[0].on_request(&mut req, &ctx).unwrap();

        let accept: Vec<_> = req.headers.get_all("accept").iter().collect();
        assert_eq!(accept, vec!["a/a", "b/b"]);
        assert_eq!(req.headers["x-token"], "t");
    }
}
