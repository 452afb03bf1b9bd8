use personnel_api::{Table, Terminal, Validation};
use rustyline::{error::ReadlineError, DefaultEditor};
use shared::error::ActionError;

/// Line-edited terminal on stdin/stdout. Choices are numbered from 1 and can
/// be picked by number or by typing the exact label.
pub struct ConsoleTerminal {
    editor: DefaultEditor,
}

impl ConsoleTerminal {
    pub fn new() -> Result<Self, ActionError> {
        let editor = DefaultEditor::new()
            .map_err(|err| ActionError::terminal(format!("failed to open terminal: {err}")))?;
        Ok(Self { editor })
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, ActionError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(line)
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Err(ActionError::interrupted()),
            Err(err) => Err(ActionError::terminal(err.to_string())),
        }
    }
}

impl Terminal for ConsoleTerminal {
    fn select(&mut self, message: &str, labels: &[String]) -> Result<usize, ActionError> {
        if labels.is_empty() {
            return Err(ActionError::validation("nothing to choose from"));
        }
        println!("? {message}");
        for (number, label) in labels.iter().enumerate() {
            println!("  {:>2}) {label}", number + 1);
        }
        loop {
            let answer = self.read_line("> ")?;
            if let Some(index) = pick(labels, &answer) {
                return Ok(index);
            }
            println!(">> Please enter a number between 1 and {}.", labels.len());
        }
    }

    fn input(&mut self, message: &str, validation: Validation) -> Result<String, ActionError> {
        loop {
            let answer = self.read_line(&format!("? {message} "))?;
            match validation.check(&answer) {
                Ok(()) => return Ok(answer.trim().to_string()),
                Err(reason) => println!(">> {reason}"),
            }
        }
    }

    fn table(&mut self, table: &Table) {
        println!("{table}");
    }

    fn info(&mut self, line: &str) {
        println!("{line}");
    }

    fn error(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

fn pick(labels: &[String], answer: &str) -> Option<usize> {
    let answer = answer.trim();
    if let Ok(number) = answer.parse::<usize>() {
        return (1..=labels.len()).contains(&number).then(|| number - 1);
    }
    labels.iter().position(|label| label == answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_by_one_based_number_or_label() {
        let labels = vec!["Sales".to_string(), "Legal".to_string()];
        assert_eq!(pick(&labels, "1"), Some(0));
        assert_eq!(pick(&labels, " 2 "), Some(1));
        assert_eq!(pick(&labels, "Legal"), Some(1));
        assert_eq!(pick(&labels, "0"), None);
        assert_eq!(pick(&labels, "3"), None);
        assert_eq!(pick(&labels, "legal"), None);
    }
}
