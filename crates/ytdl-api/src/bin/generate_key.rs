//! Print freshly generated API keys and how to configure them.

use clap::Parser;

use ytdl_api::auth::{generate_api_key, DEFAULT_KEY_BYTES};

/// Keys shorter than this many bytes trigger a warning.
const MIN_RECOMMENDED_BYTES: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "generate-key", about = "Generate API keys for the ytdl service")]
struct Cli {
    /// Random bytes per key
    #[arg(long, short, default_value_t = DEFAULT_KEY_BYTES as u64, value_parser = clap::value_parser!(u64).range(1..=1024))]
    length: u64,
    /// Number of keys to generate
    #[arg(long, short, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    count: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let length = cli.length as usize;

    if length < MIN_RECOMMENDED_BYTES {
        eprintln!(
            "warning: keys shorter than {} bytes are not recommended",
            MIN_RECOMMENDED_BYTES
        );
    }

    let keys: Vec<String> = (0..cli.count).map(|_| generate_api_key(length)).collect();

    println!("Generated API key(s):\n");
    for (i, key) in keys.iter().enumerate() {
        println!("  {}. {}", i + 1, key);
    }

    println!("\nAdd to your environment, either one variable per key:\n");
    for (i, key) in keys.iter().enumerate() {
        println!("  API_KEY_{}={}", i + 1, key);
    }
    println!("\nor as a comma-separated list:\n");
    println!("  API_KEYS={}", keys.join(","));
    println!("\nClients send: Authorization: Bearer <api_key>");
    println!("Keys cannot be recovered; store them securely.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("generate-key").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.length, DEFAULT_KEY_BYTES as u64);
        assert_eq!(cli.count, 1);
    }

    #[test]
    fn test_length_and_count() {
        let cli = parse(&["--length", "48", "-c", "3"]).unwrap();
        assert_eq!(cli.length, 48);
        assert_eq!(cli.count, 3);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&["--length"]).is_err());
        assert!(parse(&["--count", "many"]).is_err());
        assert!(parse(&["--count", "0"]).is_err());
        assert!(parse(&["--length", "0"]).is_err());
        assert!(parse(&["--length", "4096"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
