//! User-facing output channels and interactive prompts.
//!
//! Commands and steps talk to the terminal only through [`Presenter`];
//! diagnostics go through `tracing` instead.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow};

pub trait Presenter {
    /// Headline for a command or workflow.
    fn summary(&self, message: &str);
    /// A workflow step about to execute.
    fn step(&self, message: &str);
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    /// Indented supporting text.
    fn detail(&self, message: &str);
    /// A suggested next action for the user.
    fn advice(&self, message: &str);
    fn newline(&self);

    /// Yes/no question; the default answer is no.
    fn confirm(&self, question: &str) -> Result<bool>;
    /// Free-form line input; an empty answer yields `default` when given.
    fn input(&self, question: &str, default: Option<&str>) -> Result<String>;
    /// Pick one of `options`, returning its index.
    fn select(&self, question: &str, options: &[&str], default: usize) -> Result<usize>;
}

/// Plain terminal presenter: errors and warnings on stderr, the rest on
/// stdout, answers read line by line from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TermPresenter;

impl TermPresenter {
    fn read_answer(&self, prompt: &str) -> Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}").context("write prompt")?;
        stdout.flush().context("flush prompt")?;
        drop(stdout);

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("read answer from stdin")?;
        if read == 0 {
            return Err(anyhow!("stdin closed while waiting for an answer"));
        }
        Ok(line.trim().to_string())
    }
}

impl Presenter for TermPresenter {
    fn summary(&self, message: &str) {
        println!("\n== {message} ==");
    }

    fn step(&self, message: &str) {
        println!("-> {message}");
    }

    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn success(&self, message: &str) {
        println!("OK: {message}");
    }

    fn warning(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn detail(&self, message: &str) {
        println!("   {message}");
    }

    fn advice(&self, message: &str) {
        println!("hint: {message}");
    }

    fn newline(&self) {
        println!();
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        let answer = self.read_answer(&format!("{question} [y/N]: "))?;
        Ok(parse_yes(&answer))
    }

    fn input(&self, question: &str, default: Option<&str>) -> Result<String> {
        let prompt = match default {
            Some(d) if !d.is_empty() => format!("{question} [{d}]: "),
            _ => format!("{question}: "),
        };
        let answer = self.read_answer(&prompt)?;
        if answer.is_empty() {
            return Ok(default.unwrap_or_default().to_string());
        }
        Ok(answer)
    }

    fn select(&self, question: &str, options: &[&str], default: usize) -> Result<usize> {
        println!("{question}");
        for (i, option) in options.iter().enumerate() {
            let marker = if i == default { "*" } else { " " };
            println!(" {marker} {}. {option}", i + 1);
        }
        loop {
            let answer = self.read_answer(&format!("Choose 1-{} [{}]: ", options.len(), default + 1))?;
            match parse_choice(&answer, options.len(), default) {
                Some(index) => return Ok(index),
                None => eprintln!("warning: enter a number between 1 and {}", options.len()),
            }
        }
    }
}

fn parse_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

/// One-based choice to index; empty input selects `default`.
fn parse_choice(answer: &str, len: usize, default: usize) -> Option<usize> {
    if answer.is_empty() {
        return Some(default);
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_defaults_to_no() {
        assert!(parse_yes("y"));
        assert!(parse_yes("YES"));
        assert!(!parse_yes(""));
        assert!(!parse_yes("n"));
        assert!(!parse_yes("yep"));
    }

    #[test]
    fn choice_parsing() {
        assert_eq!(parse_choice("", 3, 1), Some(1));
        assert_eq!(parse_choice("3", 3, 0), Some(2));
        assert_eq!(parse_choice("0", 3, 0), None);
        assert_eq!(parse_choice("4", 3, 0), None);
        assert_eq!(parse_choice("x", 3, 0), None);
    }
}
