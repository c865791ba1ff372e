use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::thread;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::ShellError;

#[async_trait]
pub trait LineSource: Send {
    /// Next line of input, or `None` when the user interrupts or input ends.
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Terminal input; Ctrl+C while waiting for a line yields `None`.
///
/// Lines are read on a detached OS thread, so a read still blocked on the
/// terminal never holds up runtime shutdown.
pub struct StdinLines {
    rx: mpsc::Receiver<io::Result<String>>,
}

impl StdinLines {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineSource for StdinLines {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        tokio::select! {
            line = self.rx.recv() => line.transpose(),
            interrupted = tokio::signal::ctrl_c() => {
                interrupted?;
                Ok(None)
            }
        }
    }
}

/// Prompt/parse/validate loop over a line source and an output sink.
pub struct Prompter<I, W> {
    input: I,
    out: W,
}

impl<I: LineSource, W: Write> Prompter<I, W> {
    pub fn new(input: I, out: W) -> Self {
        Self { input, out }
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub async fn ask<T>(&mut self, prompt: &str) -> Result<T, ShellError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.ask_checked(prompt, |_: &T| true).await
    }

    /// Re-prompts until the trimmed line parses as `T` and passes `check`.
    pub async fn ask_checked<T, F>(&mut self, prompt: &str, check: F) -> Result<T, ShellError>
    where
        T: FromStr,
        T::Err: Display,
        F: Fn(&T) -> bool,
    {
        loop {
            write!(self.out, "{}", prompt)?;
            self.out.flush()?;

            let line = match self.input.next_line().await? {
                Some(line) => line,
                None => return Err(ShellError::Cancelled),
            };

            match line.trim().parse::<T>() {
                Ok(value) if check(&value) => return Ok(value),
                Ok(_) => writeln!(self.out, "Invalid input. Please try again.")?,
                Err(e) => writeln!(self.out, "Invalid input: {}. Please try again.", e)?,
            }
        }
    }
}
