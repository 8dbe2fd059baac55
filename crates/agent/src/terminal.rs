use std::collections::VecDeque;
use std::io;

/// Blocking terminal interaction. The session runner depends on this pair of
/// operations only, which keeps the whole pipeline scriptable in tests.
pub trait Terminal {
    /// Print `text` as a prompt and return one trimmed line of input.
    fn prompt(&mut self, text: &str) -> io::Result<String>;

    /// Print one line of output.
    fn say(&mut self, text: &str) -> io::Result<()>;
}

/// Canned terminal used by session tests and the smoke demo: replies are
/// popped in order and everything printed is kept in a transcript.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    replies: VecDeque<String>,
    pub transcript: Vec<String>,
}

impl ScriptedTerminal {
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn printed(&self, needle: &str) -> bool {
        self.transcript.iter().any(|line| line.contains(needle))
    }
}

impl Terminal for ScriptedTerminal {
    fn prompt(&mut self, text: &str) -> io::Result<String> {
        self.transcript.push(text.to_string());
        self.replies.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "scripted terminal ran out of replies")
        })
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        self.transcript.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ScriptedTerminal, Terminal};

    #[test]
    fn scripted_terminal_replays_in_order_and_records_output() {
        let mut terminal = ScriptedTerminal::with_replies(["first", "second"]);
        terminal.say("hello").expect("say");
        assert_eq!(terminal.prompt("> ").expect("reply"), "first");
        assert_eq!(terminal.prompt("> ").expect("reply"), "second");
        assert!(terminal.prompt("> ").is_err());
        assert!(terminal.printed("hello"));
    }
}
