//! Line-based interactive prompts.
//!
//! [`Prompter`] reads answers from any [`BufRead`] and writes questions to
//! any [`Write`], so the interactive paths run unchanged under test with
//! in-memory buffers.

use std::io::{BufRead, Write};

use crate::error::{ResolveError, Result};

/// Asks questions on `output` and reads answers from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Create a prompter over the given streams.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the output stream.
    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ResolveError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    /// Let the user pick one of `options` by its 1-based number.
    ///
    /// A single option is chosen without asking. Invalid answers repeat the
    /// question.
    ///
    /// # Errors
    ///
    /// Fails when `options` is empty, when input ends, or on I/O errors.
    pub fn choose(&mut self, prompt: &str, options: &[String]) -> Result<usize> {
        match options.len() {
            0 => return Err(ResolveError::NoOptions),
            1 => return Ok(0),
            _ => {}
        }

        loop {
            writeln!(self.output)?;
            writeln!(self.output, "{prompt}")?;
            for (i, option) in options.iter().enumerate() {
                writeln!(self.output, "  {}. {option}", i + 1)?;
            }

            let answer = self.ask("Enter selection number: ")?;
            let Ok(index) = answer.parse::<usize>() else {
                writeln!(self.output, "Please enter a valid integer selection.")?;
                continue;
            };
            if (1..=options.len()).contains(&index) {
                return Ok(index - 1);
            }
            writeln!(
                self.output,
                "Selection must be between 1 and {}.",
                options.len()
            )?;
        }
    }

    /// Like [`Self::choose`], but an empty answer picks `default` and the
    /// default option is starred.
    ///
    /// # Errors
    ///
    /// Fails when input ends or on I/O errors.
    pub fn choose_with_default(
        &mut self,
        prompt: &str,
        options: &[&str],
        default: usize,
    ) -> Result<usize> {
        loop {
            writeln!(self.output, "{prompt}")?;
            for (i, option) in options.iter().enumerate() {
                let marker = if i == default { "*" } else { " " };
                writeln!(self.output, "  {}. {option} {marker}", i + 1)?;
            }

            let answer = self.ask("Enter number: ")?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                Ok(_) => writeln!(self.output, "Selection out of range.")?,
                Err(_) => writeln!(self.output, "Please enter a valid integer.")?,
            }
        }
    }

    /// Ask a yes/no question. An empty answer returns `default` when given.
    ///
    /// # Errors
    ///
    /// Fails when input ends or on I/O errors.
    pub fn confirm(&mut self, prompt: &str, default: Option<bool>) -> Result<bool> {
        let suffix = match default {
            Some(true) => "[Y/n]",
            Some(false) => "[y/N]",
            None => "[y/n]",
        };

        loop {
            let answer = self.ask(&format!("{prompt} {suffix}: "))?.to_lowercase();
            match (answer.as_str(), default) {
                ("", Some(value)) => return Ok(value),
                ("y" | "yes", _) => return Ok(true),
                ("n" | "no", _) => return Ok(false),
                _ => writeln!(self.output, "Please answer 'y' or 'n'.")?,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn prompter(input: &str) -> Prompter<&[u8], Vec<u8>> {
        Prompter::new(input.as_bytes(), Vec::new())
    }

    fn options(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_choose_single_option_does_not_ask() {
        let mut p = prompter("");
        assert_eq!(p.choose("Pick:", &options(&["only"])).unwrap(), 0);
        assert!(p.into_output().is_empty());
    }

    #[test]
    fn test_choose_retries_until_valid() {
        let mut p = prompter("abc\n7\n2\n");
        let index = p.choose("Pick:", &options(&["a", "b", "c"])).unwrap();
        assert_eq!(index, 1);

        let text = String::from_utf8(p.into_output()).unwrap();
        assert!(text.contains("  1. a\n  2. b\n  3. c\n"));
        assert!(text.contains("Please enter a valid integer selection."));
        assert!(text.contains("Selection must be between 1 and 3."));
    }

    #[test]
    fn test_choose_input_closed() {
        let mut p = prompter("");
        assert!(matches!(
            p.choose("Pick:", &options(&["a", "b"])),
            Err(ResolveError::InputClosed)
        ));
    }

    #[test]
    fn test_choose_with_default() {
        let mut p = prompter("\n");
        assert_eq!(p.choose_with_default("Geometry:", &["collision", "visual"], 0).unwrap(), 0);
        let text = String::from_utf8(p.into_output()).unwrap();
        assert!(text.contains("  1. collision *"));

        let mut p = prompter("9\n2\n");
        assert_eq!(p.choose_with_default("Geometry:", &["collision", "visual"], 0).unwrap(), 1);
        let text = String::from_utf8(p.into_output()).unwrap();
        assert!(text.contains("Selection out of range."));
    }

    #[test]
    fn test_confirm() {
        assert!(prompter("\n").confirm("Go?", Some(true)).unwrap());
        assert!(!prompter("\n").confirm("Go?", Some(false)).unwrap());
        assert!(prompter("YES\n").confirm("Go?", Some(false)).unwrap());

        let mut p = prompter("maybe\nn\n");
        assert!(!p.confirm("Go?", None).unwrap());
        let text = String::from_utf8(p.into_output()).unwrap();
        assert!(text.starts_with("Go? [y/n]: "));
        assert!(text.contains("Please answer 'y' or 'n'."));
    }
}
