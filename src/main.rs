//! stringkv - An In-Process String Key-Value Store
//!
//! This is the entry point for the stringkv shell.
//! It reads commands from stdin, one per line, executes them against a fresh
//! store and prints each reply the way redis-cli would.

use anyhow::Context;
use bytes::Bytes;
use std::iter::{Copied, Peekable};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use stringkv::commands::CommandHandler;
use stringkv::storage::{ExpiryConfig, ExpirySweeper, StoreConfig, StringStore, DEFAULT_SHARDS};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Shell configuration
struct Config {
    /// Number of lock shards in the store
    shards: usize,
    /// Base interval of the expiry sweeper, `None` to disable it
    sweep_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
            sweep_interval: Some(ExpiryConfig::default().base_interval),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--shards" | "-s" => {
                    config.shards = flag_value(&args, i, "--shards");
                    if config.shards == 0 {
                        eprintln!("Error: --shards must be at least 1");
                        std::process::exit(1);
                    }
                    i += 2;
                }
                "--sweep-interval-ms" => {
                    let millis: u64 = flag_value(&args, i, "--sweep-interval-ms");
                    config.sweep_interval = Some(Duration::from_millis(millis.max(1)));
                    i += 2;
                }
                "--no-sweeper" => {
                    config.sweep_interval = None;
                    i += 1;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("stringkv version {}", stringkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Expiry sweeper settings derived from the requested interval
    fn expiry_config(&self, interval: Duration) -> ExpiryConfig {
        let defaults = ExpiryConfig::default();
        ExpiryConfig {
            base_interval: interval,
            min_interval: defaults.min_interval.min(interval),
            max_interval: defaults.max_interval.max(interval),
            ..defaults
        }
    }
}

/// Reads and parses the value following the flag at `args[i]`, exiting on error
fn flag_value<T: FromStr>(args: &[String], i: usize, flag: &str) -> T {
    let Some(raw) = args.get(i + 1) else {
        eprintln!("Error: {} requires a value", flag);
        std::process::exit(1);
    };
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid value for {}: {}", flag, raw);
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r#"
stringkv - An In-Process String Key-Value Store

USAGE:
    stringkv [OPTIONS] < commands.txt

OPTIONS:
    -s, --shards <N>               Number of lock shards (default: 64)
        --sweep-interval-ms <MS>   Base interval of the expiry sweeper (default: 100)
        --no-sweeper               Only expire keys lazily, on access
    -v, --version                  Print version information
    -h, --help                     Print this help message

INPUT:
    One command per line. Blank lines and lines starting with '#' are skipped.
    Use quotes for arguments containing spaces; double quotes understand
    \n, \t, \r, \\, \" and \xHH escapes.

EXAMPLE:
    $ printf 'SET key2 hello\nAPPEND key2 --world\nGETRANGE key2 2 6\n' | stringkv
    OK
    (integer) 12
    "llo--"

LOGGING:
    Logs go to stderr. Set RUST_LOG (e.g. RUST_LOG=debug) to change the level.
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging on stderr, replies own stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Create the store
    let store = Arc::new(StringStore::with_config(StoreConfig {
        shards: config.shards,
    }));
    info!(shards = store.shard_count(), "String store initialized");

    // Start the background expiry sweeper
    let _sweeper = config
        .sweep_interval
        .map(|interval| ExpirySweeper::start(Arc::clone(&store), config.expiry_config(interval)));

    let handler = CommandHandler::new(store);

    tokio::select! {
        result = run_shell(&handler) => result?,
        _ = signal::ctrl_c() => {
            info!("Interrupted, stopping shell...");
        }
    }

    let stats = handler.store().stats();
    info!(
        keys = stats.keys,
        reads = stats.reads,
        writes = stats.writes,
        expired = stats.expired,
        "Shell exited"
    );
    Ok(())
}

/// Executes every command line on stdin until end of input
async fn run_shell(handler: &CommandHandler) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut executed: u64 = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read command from stdin")?
    {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match tokenize(line) {
            Ok(args) => {
                println!("{}", handler.execute(&args));
                executed += 1;
            }
            Err(e) => {
                warn!(error = %e, "Rejected input line");
                println!("(error) ERR {}", e);
            }
        }
    }

    debug!(executed, "End of input");
    Ok(())
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Why a command line could not be split into arguments.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
enum TokenizeError {
    #[error("unbalanced quotes in request")]
    UnbalancedQuotes,

    #[error("closing quote must be followed by a space")]
    QuoteNotSeparated,

    #[error("invalid \\x escape, expected two hex digits")]
    InvalidHexEscape,
}

type Input<'a> = Peekable<Copied<std::slice::Iter<'a, u8>>>;

/// Splits a command line into binary-safe arguments.
///
/// Arguments are separated by whitespace. `"..."` groups an argument and
/// decodes backslash escapes, `'...'` groups it literally (only `\'` is
/// special).
fn tokenize(line: &str) -> Result<Vec<Bytes>, TokenizeError> {
    let mut input: Input<'_> = line.as_bytes().iter().copied().peekable();
    let mut tokens = Vec::new();

    loop {
        while input.next_if(u8::is_ascii_whitespace).is_some() {}
        let Some(&first) = input.peek() else {
            return Ok(tokens);
        };

        let mut token = Vec::new();
        match first {
            b'"' => {
                input.next();
                read_double_quoted(&mut input, &mut token)?;
                expect_separator(&mut input)?;
            }
            b'\'' => {
                input.next();
                read_single_quoted(&mut input, &mut token)?;
                expect_separator(&mut input)?;
            }
            _ => {
                while let Some(b) = input.next_if(|b| !b.is_ascii_whitespace()) {
                    token.push(b);
                }
            }
        }
        tokens.push(Bytes::from(token));
    }
}

fn read_double_quoted(input: &mut Input<'_>, token: &mut Vec<u8>) -> Result<(), TokenizeError> {
    loop {
        match input.next().ok_or(TokenizeError::UnbalancedQuotes)? {
            b'"' => return Ok(()),
            b'\\' => {
                let escaped = match input.next().ok_or(TokenizeError::UnbalancedQuotes)? {
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'r' => b'\r',
                    b'x' => {
                        let hi = hex_digit(input.next()).ok_or(TokenizeError::InvalidHexEscape)?;
                        let lo = hex_digit(input.next()).ok_or(TokenizeError::InvalidHexEscape)?;
                        (hi << 4) | lo
                    }
                    other => other,
                };
                token.push(escaped);
            }
            b => token.push(b),
        }
    }
}

fn read_single_quoted(input: &mut Input<'_>, token: &mut Vec<u8>) -> Result<(), TokenizeError> {
    loop {
        match input.next().ok_or(TokenizeError::UnbalancedQuotes)? {
            b'\'' => return Ok(()),
            b'\\' if input.peek() == Some(&b'\'') => {
                input.next();
                token.push(b'\'');
            }
            b => token.push(b),
        }
    }
}

fn expect_separator(input: &mut Input<'_>) -> Result<(), TokenizeError> {
    match input.peek() {
        Some(b) if !b.is_ascii_whitespace() => Err(TokenizeError::QuoteNotSeparated),
        _ => Ok(()),
    }
}

fn hex_digit(b: Option<u8>) -> Option<u8> {
    char::from(b?).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        tokenize(line)
            .unwrap()
            .iter()
            .map(|t| String::from_utf8_lossy(t).into_owned())
            .collect()
    }

    #[test]
    fn test_tokenize_plain() {
        assert_eq!(words("SET key2 hello"), vec!["SET", "key2", "hello"]);
        assert_eq!(words("  GET\tkey2  "), vec!["GET", "key2"]);
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            words(r#"SET greeting "hello world""#),
            vec!["SET", "greeting", "hello world"]
        );
        assert_eq!(words(r"ECHO 'a \'b\' c'"), vec!["ECHO", "a 'b' c"]);
        assert_eq!(words(r#"ECHO """#), vec!["ECHO", ""]);
    }

    #[test]
    fn test_tokenize_escapes() {
        let tokens = tokenize(r#"SET k "\x00\x00\x00ab\n\"q\"\\""#).unwrap();
        assert_eq!(tokens[2], Bytes::from_static(b"\0\0\0ab\n\"q\"\\"));
    }

    #[test]
    fn test_tokenize_errors() {
        assert_eq!(
            tokenize(r#"SET k "unterminated"#),
            Err(TokenizeError::UnbalancedQuotes)
        );
        assert_eq!(
            tokenize("SET k 'unterminated"),
            Err(TokenizeError::UnbalancedQuotes)
        );
        assert_eq!(
            tokenize(r#"SET k "a"b"#),
            Err(TokenizeError::QuoteNotSeparated)
        );
        assert_eq!(
            tokenize(r#"SET k "\xZZ""#),
            Err(TokenizeError::InvalidHexEscape)
        );
    }

    #[test]
    fn test_expiry_config_widens_bounds() {
        let config = Config::default();

        let fast = config.expiry_config(Duration::from_millis(1));
        assert_eq!(fast.min_interval, Duration::from_millis(1));

        let slow = config.expiry_config(Duration::from_secs(5));
        assert_eq!(slow.max_interval, Duration::from_secs(5));
        assert_eq!(slow.base_interval, Duration::from_secs(5));
    }
}
