//! Sequential operator prompts.
//!
//! Each [`PromptStep`] is asked in order and answered by a [`PromptSource`].
//! Steps already answered by a command-line flag are skipped.

#[cfg(test)]
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};

use sheetmail_core::{Orientation, SheetId};

/// One question asked of the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStep {
    SheetId,
    Range,
    Orientation,
    AuthCode,
}

impl PromptStep {
    pub fn text(self) -> &'static str {
        match self {
            PromptStep::SheetId => "Enter spreadsheet ID: ",
            PromptStep::Range => "Enter data range (including headers): ",
            PromptStep::Orientation => "Header Column (C) or Header Row (R)? ",
            PromptStep::AuthCode => "Enter the code from that page here: ",
        }
    }
}

/// Answers prompt steps, one line each.
pub trait PromptSource {
    fn ask(&mut self, step: PromptStep) -> Result<String>;
}

/// Interactive terminal prompts.
pub struct StdinPrompts<R> {
    input: R,
}

impl StdinPrompts<io::StdinLock<'static>> {
    pub fn new() -> Self {
        StdinPrompts {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> PromptSource for StdinPrompts<R> {
    fn ask(&mut self, step: PromptStep) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", step.text())?;
        stdout.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read answer from stdin")?;
        if read == 0 {
            bail!("input closed before '{}' was answered", step.text().trim_end());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Pre-recorded answers, consumed in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompts {
    answers: VecDeque<String>,
    pub asked: Vec<PromptStep>,
}

#[cfg(test)]
impl ScriptedPrompts {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompts {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl PromptSource for ScriptedPrompts {
    fn ask(&mut self, step: PromptStep) -> Result<String> {
        self.asked.push(step);
        match self.answers.pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("no scripted answer for '{}'", step.text().trim_end()),
        }
    }
}

/// Values the operator supplies for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAnswers {
    pub sheet_id: SheetId,
    pub range: String,
    pub orientation: Orientation,
}

/// Flag values that pre-answer prompts.
#[derive(Debug, Clone, Default)]
pub struct Preset {
    pub sheet_id: Option<String>,
    pub range: Option<String>,
    pub orientation: Option<String>,
}

/// Ask, in order, for whatever `preset` leaves open.
///
/// The orientation is validated right after it is answered, so a bad entry
/// stops the run before anything is fetched.
pub fn collect(source: &mut dyn PromptSource, preset: Preset) -> Result<RunAnswers> {
    let sheet_id = answer(source, PromptStep::SheetId, preset.sheet_id)?;
    let range = answer(source, PromptStep::Range, preset.range)?;
    let token = answer(source, PromptStep::Orientation, preset.orientation)?;
    let orientation = Orientation::parse(&token)?;
    Ok(RunAnswers {
        sheet_id: SheetId::from(sheet_id.trim()),
        range: range.trim().to_string(),
        orientation,
    })
}

fn answer(source: &mut dyn PromptSource, step: PromptStep, preset: Option<String>) -> Result<String> {
    match preset {
        Some(value) => Ok(value),
        None => source.ask(step),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asks_every_step_in_order() {
        let mut prompts = ScriptedPrompts::new(["abc123", "Sheet1!A1:C4", "R"]);
        let answers = collect(&mut prompts, Preset::default()).unwrap();
        assert_eq!(
            prompts.asked,
            vec![PromptStep::SheetId, PromptStep::Range, PromptStep::Orientation]
        );
        assert_eq!(answers.sheet_id, SheetId::from("abc123"));
        assert_eq!(answers.range, "Sheet1!A1:C4");
        assert_eq!(answers.orientation, Orientation::Rows);
    }

    #[test]
    fn flags_skip_their_prompts() {
        let mut prompts = ScriptedPrompts::new(["C"]);
        let preset = Preset {
            sheet_id: Some("abc".into()),
            range: Some("A1:B2".into()),
            orientation: None,
        };
        let answers = collect(&mut prompts, preset).unwrap();
        assert_eq!(prompts.asked, vec![PromptStep::Orientation]);
        assert_eq!(answers.orientation, Orientation::Columns);
    }

    #[test]
    fn bad_orientation_is_rejected() {
        let mut prompts = ScriptedPrompts::new(["abc", "A1:B2", "x"]);
        let err = collect(&mut prompts, Preset::default()).unwrap_err();
        assert!(err.to_string().contains("incorrect header entry"), "got: {err}");
    }

    #[test]
    fn stdin_answers_drop_line_endings() {
        let mut prompts = StdinPrompts {
            input: io::Cursor::new("abc\r\nA1:B2\nR\n"),
        };
        assert_eq!(prompts.ask(PromptStep::SheetId).unwrap(), "abc");
        assert_eq!(prompts.ask(PromptStep::Range).unwrap(), "A1:B2");
        assert_eq!(prompts.ask(PromptStep::Orientation).unwrap(), "R");
        assert!(prompts.ask(PromptStep::AuthCode).is_err());
    }
}
