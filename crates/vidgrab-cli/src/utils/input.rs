//! User input utilities for interactive command-line prompts.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

/// Interpret a yes/no answer. Empty input means no; anything unrecognised
/// is `None`.
fn parse_confirmation(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Ask a yes/no question on `output`, reading answers from `input` until
/// one is recognised. End of input counts as no.
fn confirm_with<R: BufRead, W: Write>(prompt: &str, mut input: R, mut output: W) -> Result<bool> {
    loop {
        write!(output, "{prompt} (y/N): ").context("Failed to write prompt")?;
        output.flush().context("Failed to write prompt")?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read user input")?;
        if read == 0 {
            writeln!(output).ok();
            return Ok(false);
        }
        if let Some(answer) = parse_confirmation(&line) {
            return Ok(answer);
        }
        writeln!(output, "Please enter 'y' for yes or 'n' for no.").ok();
    }
}

/// Prompts the user for a yes/no confirmation.
///
/// Accepts 'y', 'yes', 'n', 'no' (case insensitive).
/// Empty input is treated as 'no'.
///
/// # Errors
///
/// Returns an error if reading from stdin fails.
pub fn prompt_confirmation(prompt: &str) -> Result<bool> {
    confirm_with(prompt, io::stdin().lock(), io::stdout())
}
