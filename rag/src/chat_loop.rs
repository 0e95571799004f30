use std::fmt::Display;
use std::io::{BufRead, Write};

use crossterm::style::{StyledContent, Stylize};

use crate::build_chain::{ChainKind, QaSession};
use crate::error::Result;

pub const EXIT_TOKENS: [&str; 5] = ["quit", "q", "exit", "quit()", "exit()"];
pub const DEFAULT_QUESTION: &str = "What is your name?";
pub const DEFAULT_CHAIN: &str = "basic";
const MENU_EXIT: &str = "exit";
const SEPARATOR: &str = "---------------";

pub fn is_exit_token(text: &str) -> bool {
    EXIT_TOKENS.contains(&text)
}

/// Terminal front end: chain menu, then question/answer rounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChatLoop {
    color: bool,
}

impl ChatLoop {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Ask which chain to use. `None` means the user chose to leave.
    pub fn select_chain<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
    ) -> Result<Option<ChainKind>> {
        let mut choices: Vec<&str> = ChainKind::ALL.iter().map(|k| k.name()).collect();
        choices.push(MENU_EXIT);
        let picked = self.prompt_with_default(
            input,
            out,
            "Which QA model would you like to work with?",
            DEFAULT_CHAIN,
            &choices,
        )?;
        match picked.as_deref() {
            None | Some(MENU_EXIT) => Ok(None),
            Some(name) => Ok(Some(name.parse()?)),
        }
    }

    /// Read one answer; blank input takes `default`. With `choices`, keeps
    /// asking until one of them is entered. `None` on end of input.
    pub fn prompt_with_default<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
        prompt: &str,
        default: &str,
        choices: &[&str],
    ) -> Result<Option<String>> {
        loop {
            write!(out, "{}", prompt)?;
            if !choices.is_empty() {
                let listed = format!("[{}]", choices.join("/"));
                write!(out, " {}", self.paint(listed.magenta().bold()))?;
            }
            write!(out, " {}: ", self.paint(format!("({})", default).cyan().bold()))?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(None);
            }
            let answer = match line.trim() {
                "" => default,
                text => text,
            };
            if !choices.is_empty() && !choices.contains(&answer) {
                let warning = "Please select one of the available options".red();
                writeln!(out, "{}", self.paint(warning))?;
                continue;
            }
            return Ok(Some(answer.to_string()));
        }
    }

    /// Question/answer rounds until an exit token or end of input. A failed
    /// chain call ends the loop with that error.
    pub fn run<R: BufRead, W: Write>(
        &self,
        session: &mut QaSession,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        writeln!(out, "{}", self.paint("Chat with custom data!".bold()))?;
        writeln!(out, "{}", self.paint(SEPARATOR.bold().red()))?;

        loop {
            let Some(question) =
                self.prompt_with_default(input, out, "Your Question: ", DEFAULT_QUESTION, &[])?
            else {
                return Ok(());
            };
            if is_exit_token(&question) {
                return Ok(());
            }

            let result = session.ask(&question)?;
            writeln!(out, "{}{}", self.paint("Answer: ".green()), result.answer)?;

            if session.kind() == ChainKind::WithSources && !result.source_documents.is_empty() {
                writeln!(out, "{}", self.paint("Sources: ".green()))?;
                for doc in &result.source_documents {
                    let source = doc.source.as_str().bold().underlined().green();
                    writeln!(out, "{}", self.paint(source))?;
                    writeln!(out, "{}", self.paint(doc.content.as_str().green()))?;
                }
            }
            writeln!(out, "{}", self.paint(SEPARATOR.bold().red()))?;
        }
    }

    fn paint<D: Display>(&self, styled: StyledContent<D>) -> String {
        if self.color {
            styled.to_string()
        } else {
            styled.content().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn exit_tokens_are_exact() {
        for token in EXIT_TOKENS {
            assert!(is_exit_token(token));
        }
        assert!(!is_exit_token("Quit"));
        assert!(!is_exit_token("quit please"));
    }

    #[test]
    fn prompt_falls_back_to_default_and_revalidates_choices() {
        let ui = ChatLoop::new(false);
        let mut out = Vec::new();
        let mut input = Cursor::new("bogus\n\n");
        let picked = ui
            .prompt_with_default(&mut input, &mut out, "Pick", "b", &["a", "b"])
            .unwrap();
        assert_eq!(picked.as_deref(), Some("b"));
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown.matches("Pick [a/b] (b): ").count(), 2);
        assert!(shown.contains("Please select one of the available options"));
    }

    #[test]
    fn menu_exit_and_eof_mean_no_chain() {
        let ui = ChatLoop::new(false);
        let mut out = Vec::new();
        assert_eq!(ui.select_chain(&mut Cursor::new("exit\n"), &mut out).unwrap(), None);
        assert_eq!(ui.select_chain(&mut Cursor::new(""), &mut out).unwrap(), None);
        assert_eq!(
            ui.select_chain(&mut Cursor::new("\n"), &mut out).unwrap(),
            Some(ChainKind::Basic)
        );
        assert_eq!(
            ui.select_chain(&mut Cursor::new(" with_sources \n"), &mut out).unwrap(),
            Some(ChainKind::WithSources)
        );
    }
}
