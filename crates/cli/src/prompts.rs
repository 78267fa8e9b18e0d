//! Operator confirmation before anything is written.

use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
  Proceed,
  Aborted,
}

/// Ask `[y/N]` on stderr. `--yes` skips the question entirely.
pub fn confirm(question: &str, yes: bool) -> Result<Confirmation> {
  if yes {
    return Ok(Confirmation::Proceed);
  }

  if !io::stdin().is_terminal() {
    bail!("stdin is not a terminal, pass --yes to apply without confirmation");
  }

  let mut stderr = io::stderr().lock();
  write!(stderr, "{} [y/N] ", question)?;
  stderr.flush()?;

  let mut answer = String::new();
  io::stdin().lock().read_line(&mut answer)?;
  Ok(parse_answer(&answer))
}

fn parse_answer(answer: &str) -> Confirmation {
  match answer.trim() {
    "y" | "Y" | "yes" | "Yes" | "YES" => Confirmation::Proceed,
    _ => Confirmation::Aborted,
  }
}
