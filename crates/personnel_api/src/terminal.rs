use std::collections::VecDeque;

use shared::error::ActionError;

use crate::table::Table;

/// Input rule applied to a free-text prompt. A rejected answer is re-asked,
/// never surfaced as a handler error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Rejects blank input; the payload names the field.
    NotBlank(&'static str),
    /// Accepts only a finite number.
    Numeric(&'static str),
}

impl Validation {
    pub fn check(&self, input: &str) -> Result<(), String> {
        match self {
            Validation::NotBlank(field) => {
                if input.trim().is_empty() {
                    return Err(format!("Please enter a valid {field}."));
                }
            }
            Validation::Numeric(field) => {
                let is_number = input
                    .trim()
                    .parse::<f64>()
                    .map(f64::is_finite)
                    .unwrap_or(false);
                if !is_number {
                    return Err(format!("Please enter a valid {field} (numeric value)."));
                }
            }
        }
        Ok(())
    }
}

/// The operator side of the tool.
pub trait Terminal {
    /// Presents `labels` and returns the index of the chosen one.
    fn select(&mut self, message: &str, labels: &[String]) -> Result<usize, ActionError>;

    /// Asks until `validation` accepts the answer.
    fn input(&mut self, message: &str, validation: Validation) -> Result<String, ActionError>;

    fn table(&mut self, table: &Table);

    fn info(&mut self, line: &str);

    fn error(&mut self, line: &str);
}

/// Replays queued answers and records everything shown.
///
/// Select answers may be the exact label or its zero-based index. Running out
/// of answers behaves like the operator closing the input stream.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub tables: Vec<Table>,
    pub infos: Vec<String>,
    pub errors: Vec<String>,
    pub rejections: Vec<String>,
}

impl ScriptedTerminal {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn next_answer(&mut self, message: &str) -> Result<String, ActionError> {
        self.prompts.push(message.to_string());
        self.answers.pop_front().ok_or_else(ActionError::interrupted)
    }
}

impl Terminal for ScriptedTerminal {
    fn select(&mut self, message: &str, labels: &[String]) -> Result<usize, ActionError> {
        if labels.is_empty() {
            return Err(ActionError::validation("nothing to choose from"));
        }
        loop {
            let answer = self.next_answer(message)?;
            if let Some(index) = labels.iter().position(|label| *label == answer) {
                return Ok(index);
            }
            match answer.parse::<usize>() {
                Ok(index) if index < labels.len() => return Ok(index),
                _ => self.rejections.push(format!("'{answer}' is not a choice")),
            }
        }
    }

    fn input(&mut self, message: &str, validation: Validation) -> Result<String, ActionError> {
        loop {
            let answer = self.next_answer(message)?;
            match validation.check(&answer) {
                Ok(()) => return Ok(answer.trim().to_string()),
                Err(reason) => self.rejections.push(reason),
            }
        }
    }

    fn table(&mut self, table: &Table) {
        self.tables.push(table.clone());
    }

    fn info(&mut self, line: &str) {
        self.infos.push(line.to_string());
    }

    fn error(&mut self, line: &str) {
        self.errors.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_blank_rejects_whitespace() {
        let rule = Validation::NotBlank("department name");
        assert_eq!(
            rule.check("   "),
            Err("Please enter a valid department name.".to_string())
        );
        assert_eq!(rule.check(" Sales "), Ok(()));
    }

    #[test]
    fn numeric_accepts_decimals_and_rejects_non_finite() {
        let rule = Validation::Numeric("salary");
        assert_eq!(rule.check("95000.50"), Ok(()));
        assert_eq!(rule.check("50000"), Ok(()));
        for bad in ["", "abc", "NaN", "inf", "12k"] {
            assert_eq!(
                rule.check(bad),
                Err("Please enter a valid salary (numeric value).".to_string()),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn scripted_input_reprompts_until_valid() {
        let mut terminal = ScriptedTerminal::new(["", "  Sales  "]);
        let answer = terminal
            .input("name?", Validation::NotBlank("department name"))
            .expect("answer");
        assert_eq!(answer, "Sales");
        assert_eq!(terminal.prompts.len(), 2);
        assert_eq!(terminal.rejections.len(), 1);
    }

    #[test]
    fn scripted_select_accepts_label_or_index() {
        let labels = vec!["Sales".to_string(), "Legal".to_string()];
        let mut terminal = ScriptedTerminal::new(["Legal", "nope", "0"]);
        assert_eq!(terminal.select("which?", &labels).expect("label"), 1);
        assert_eq!(terminal.select("which?", &labels).expect("index"), 0);
        assert_eq!(terminal.rejections, ["'nope' is not a choice"]);
    }

    #[test]
    fn exhausted_script_reads_as_interrupt() {
        let mut terminal = ScriptedTerminal::new(Vec::<String>::new());
        let err = terminal
            .input("name?", Validation::NotBlank("name"))
            .expect_err("no answers left");
        assert!(err.is_interrupted());
    }
}
