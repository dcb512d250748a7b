use anyhow::Context;
use std::io::{BufRead, Write};
use tracing_subscriber::EnvFilter;

/// Log filter: `RUST_LOG` when set, otherwise `info` (or `debug` with the debug flag).
pub fn log_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "debug" } else { "info" })
    })
}

/// Initialize tracing for the CLI.
pub fn init_tracing(debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(debug))
        .with_writer(std::io::stderr)
        .init();
}

/// Ask for the API token until a non-empty line is entered.
pub fn prompt_token(mut input: impl BufRead, mut output: impl Write) -> anyhow::Result<String> {
    loop {
        write!(output, "Enter your API token: ").context("Write prompt")?;
        output.flush().context("Write prompt")?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("Read API token")?;
        if read == 0 {
            anyhow::bail!("No API token entered");
        }

        let token = line.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn prompt_token_skips_blank_lines() {
        let mut output = Vec::new();
        let token = prompt_token(Cursor::new("\n  \nabc123\n"), &mut output).unwrap();
        assert_eq!(token, "abc123");
        assert_eq!(
            String::from_utf8(output).unwrap().matches("Enter your API token").count(),
            3
        );
    }

    #[test]
    fn prompt_token_fails_on_eof() {
        let result = prompt_token(Cursor::new(""), Vec::new());
        assert!(result.is_err());
    }
}
