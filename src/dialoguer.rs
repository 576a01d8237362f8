use std::fmt;
use std::path::PathBuf;

use colored::Colorize;
use dialoguer::{console::Term, theme::ColorfulTheme, Input, Select};
use error_stack::{IntoReport, Report, Result, ResultExt};

use crate::Suggestion;

#[derive(Debug)]
pub struct DialoguerError;

impl fmt::Display for DialoguerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dialoguer error")
    }
}

impl std::error::Error for DialoguerError {}

pub type DialoguerResult<T> = error_stack::Result<T, DialoguerError>;

#[derive(Debug, Clone)]
pub struct Dialoguer;

impl Dialoguer {
    pub fn select<T>(
        prompt_text: String,
        items: Vec<T>,
        default: Option<usize>,
    ) -> Result<usize, DialoguerError>
    where
        T: ToString + Clone,
    {
        let colorful_theme = &ColorfulTheme::default();
        let mut select = Select::with_theme(colorful_theme);
        let mut dialog = select.with_prompt(&prompt_text).items(&items);

        if let Some(def) = default {
            dialog = dialog.default(def);
        } else {
            dialog = dialog.default(0);
        }

        Ok(dialog
            .interact_on_opt(&Term::stderr())
            .into_report()
            .change_context(DialoguerError)?
            .ok_or(DialoguerError)
            .into_report()?)
    }

    pub fn input(prompt_text: String) -> Result<String, DialoguerError> {
        let colorful_theme = &ColorfulTheme::default();
        let mut input = Input::with_theme(colorful_theme);
        let dialog: String = input
            .with_prompt(&prompt_text)
            .allow_empty(true)
            .interact_text()
            .into_report()
            .change_context(DialoguerError)?;

        Ok(dialog)
    }

    /// Prints the files as a numbered list and asks for the number of one of them.
    pub fn select_file(
        header_text: String,
        prompt_text: String,
        files: Vec<PathBuf>,
    ) -> DialoguerResult<PathBuf> {
        println!("{}", header_text);
        for (index, file) in files.iter().enumerate() {
            let name = file
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| file.display().to_string());
            println!("{}. {}", (index + 1).to_string().cyan(), name);
        }
        let answer = Self::input(prompt_text)?;
        let index = parse_selection(&answer, files.len())?;
        Ok(files[index].clone())
    }
}

/// Turns a 1-based answer into an index into a list of `count` items.
pub fn parse_selection(answer: &str, count: usize) -> DialoguerResult<usize> {
    let number: usize = answer
        .trim()
        .parse()
        .into_report()
        .attach_printable(format!("'{}' is not a number", answer.trim()))
        .change_context(DialoguerError)
        .attach(Suggestion("Type the number shown next to the file".to_string()))?;
    if number == 0 || number > count {
        return Err(Report::new(DialoguerError)
            .attach_printable(format!("{number} is not in the list"))
            .attach(Suggestion(format!("Pick a number between 1 and {count}"))));
    }
    Ok(number - 1)
}
