//! Interactive job-notes editor backed by the undo/redo history store.
//!
//! Each entered line commits a new note list; `:undo`, `:redo` and
//! `:clear` walk or reset the history, and `:done` finishes the session.

use anyhow::Result;
use inquire::Text;

use quote_core::History;

/// What a single editor input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum EditorAction {
    Continue,
    Finish,
}

/// Applies one line of input to the note history.
///
/// Unknown `:commands` and blank lines are ignored; anything else is
/// appended as a note. Identical consecutive appends are absorbed by the
/// history's equality short-circuit.
pub fn apply_input(history: &mut History<Vec<String>>, input: &str) -> EditorAction {
    match input.trim() {
        "" => EditorAction::Continue,
        ":done" | ":d" => EditorAction::Finish,
        ":undo" | ":u" => {
            if !history.undo() {
                println!("nothing to undo");
            }
            EditorAction::Continue
        }
        ":redo" | ":r" => {
            if !history.redo() {
                println!("nothing to redo");
            }
            EditorAction::Continue
        }
        ":clear" => {
            history.commit(Vec::new());
            EditorAction::Continue
        }
        line if line.starts_with(':') => {
            println!("unknown command '{line}' (try :undo, :redo, :clear, :done)");
            EditorAction::Continue
        }
        line => {
            history.commit_with(|notes| {
                let mut next = notes.clone();
                next.push(line.to_string());
                next
            });
            EditorAction::Continue
        }
    }
}

/// Runs the interactive editor and returns the final note list.
pub fn edit_notes(initial: Vec<String>) -> Result<Vec<String>> {
    let mut history = History::new(initial);
    println!("Enter job notes, one per line. :undo / :redo / :clear / :done");

    loop {
        for (index, note) in history.present().iter().enumerate() {
            println!("  {}. {note}", index + 1);
        }
        let hints = format!(
            "[{}{}]",
            if history.can_undo() { "u" } else { "-" },
            if history.can_redo() { "r" } else { "-" },
        );
        let input = Text::new(&format!("note {hints} >")).prompt()?;
        if apply_input(&mut history, &input) == EditorAction::Finish {
            break;
        }
    }

    Ok(history.present().clone())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lines_append_and_undo_steps_back() {
        let mut history = History::new(Vec::new());

        apply_input(&mut history, "Sitting room 60m2");
        apply_input(&mut history, "Kitchen 15m2");
        assert_eq!(history.present().len(), 2);

        apply_input(&mut history, ":undo");
        assert_eq!(history.present(), &vec!["Sitting room 60m2".to_string()]);
        assert!(history.can_redo());

        apply_input(&mut history, ":redo");
        assert_eq!(history.present().len(), 2);
    }

    #[test]
    fn a_new_line_after_undo_drops_the_redo_branch() {
        let mut history = History::new(Vec::new());
        apply_input(&mut history, "first");
        apply_input(&mut history, "second");
        apply_input(&mut history, ":undo");

        apply_input(&mut history, "replacement");

        assert!(!history.can_redo());
        assert_eq!(
            history.present(),
            &vec!["first".to_string(), "replacement".to_string()]
        );
    }

    #[test]
    fn blank_and_unknown_commands_change_nothing() {
        let mut history = History::new(vec!["keep".to_string()]);

        apply_input(&mut history, "   ");
        apply_input(&mut history, ":frobnicate");

        assert_eq!(history.present(), &vec!["keep".to_string()]);
        assert!(!history.can_undo());
    }

    #[test]
    fn clear_commits_an_empty_list_that_can_be_undone() {
        let mut history = History::new(vec!["a".to_string()]);

        apply_input(&mut history, ":clear");
        assert!(history.present().is_empty());

        apply_input(&mut history, ":undo");
        assert_eq!(history.present(), &vec!["a".to_string()]);
    }

    #[test]
    fn done_finishes_the_session() {
        let mut history = History::new(Vec::new());

        assert_eq!(apply_input(&mut history, ":done"), EditorAction::Finish);
    }
}
