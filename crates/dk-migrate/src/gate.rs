//! Operator confirmation before destructive runs

use dk_core::Plan;
use std::io::{self, BufRead, Write};

/// Decides whether a plan may run
pub trait Confirmation {
    fn confirm(&mut self, plan: &Plan) -> io::Result<bool>;
}

/// Any `FnMut(&Plan) -> io::Result<bool>` can act as a gate
impl<F> Confirmation for F
where
    F: FnMut(&Plan) -> io::Result<bool>,
{
    fn confirm(&mut self, plan: &Plan) -> io::Result<bool> {
        self(plan)
    }
}

/// Always confirms, for `--yes` and non-interactive runs
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm(&mut self, plan: &Plan) -> io::Result<bool> {
        log::debug!("Confirmation assumed for {} {} migration(s)", plan.len(), plan.direction());
        Ok(true)
    }
}

/// Interactive y/N prompt. Reads stdin and writes stdout unless built
/// with [`StdinPrompt::with_io`].
pub struct StdinPrompt<R = io::StdinLock<'static>, W = io::Stdout> {
    input: R,
    output: W,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> StdinPrompt<R, W> {
    pub fn with_io(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the writer, mostly so tests can inspect what was printed
    pub fn into_output(self) -> W {
        self.output
    }
}

/// Only `y`/`Y` as the first non-whitespace character means yes
fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim_start().chars().next(), Some('y' | 'Y'))
}

impl<R: BufRead, W: Write> Confirmation for StdinPrompt<R, W> {
    fn confirm(&mut self, plan: &Plan) -> io::Result<bool> {
        writeln!(
            self.output,
            "Heads up! You're about to run {} {} migration(s). These migrations are likely destructive.",
            plan.len(),
            plan.direction().to_string().to_uppercase()
        )?;
        for migration in plan.migrations() {
            writeln!(self.output, "  {}", migration.name())?;
        }
        write!(self.output, "Would you like to continue? y/N: ")?;
        self.output.flush()?;

        // EOF reads as an empty answer, which declines
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }
}
