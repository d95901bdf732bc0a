//! Interactive prompts for values not given on the command line.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags
//! - the prompt provides the "run `critters` and answer two questions" UX
//!
//! Prompts are generic over the reader/writer so tests can drive them.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::error::AppError;

/// Ask for the taxon id on stdin.
pub fn prompt_taxon_id() -> Result<i64, AppError> {
    let stdin = io::stdin();
    prompt_with(&mut stdin.lock(), &mut io::stdout(), "Enter the iNaturalist taxon id")
}

/// Ask for the number of observations on stdin.
pub fn prompt_count() -> Result<usize, AppError> {
    let stdin = io::stdin();
    prompt_with(
        &mut stdin.lock(),
        &mut io::stdout(),
        "Enter the number of observations to fetch",
    )
}

/// Prompt until the answer parses as `T`.
///
/// Behavior:
/// - unparsable answers print a hint and re-prompt
/// - `q` cancels
/// - end of input is an error
pub fn prompt_with<R, W, T>(input: &mut R, output: &mut W, question: &str) -> Result<T, AppError>
where
    R: BufRead,
    W: Write,
    T: FromStr,
{
    loop {
        write!(output, "{question} (q to quit): ")
            .and_then(|_| output.flush())
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(
                2,
                "No input received. Pass --taxon-id and --count to run non-interactively.",
            ));
        }

        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        match answer.parse::<T>() {
            Ok(value) => return Ok(value),
            Err(_) => {
                writeln!(output, "Invalid number: '{answer}'. Try again.")
                    .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;
            }
        }
    }
}
