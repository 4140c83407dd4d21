//! Classification of interactive input lines.
//!
//! Control words are accepted in English and Portuguese.

/// One line of interactive input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line; nothing to do.
    Empty,
    /// End the session (`exit`, `quit`, `sair`).
    Exit,
    /// Show available commands (`help`, `ajuda`).
    Help,
    /// Attach one file (`file:<path>`, `arquivo:<path>`). `None` if the
    /// path is missing.
    AddFile(Option<String>),
    /// Discover and attach files for a prompt (`auto:<prompt>`). `None` if
    /// the prompt is missing.
    Discover(Option<String>),
    /// A question for the model.
    Message(String),
}

const EXIT_WORDS: &[&str] = &["exit", "quit", "sair"];
const HELP_WORDS: &[&str] = &["help", "ajuda"];
const FILE_PREFIXES: &[&str] = &["file:", "arquivo:"];
const AUTO_PREFIXES: &[&str] = &["auto:"];

pub const HELP_TEXT: &str = "Available commands:
  exit | quit | sair       end the session
  file:<path>              add a file to the context (also arquivo:<path>)
  auto:<prompt>            discover and add files related to the prompt
  help | ajuda             show this message
Anything else is sent to the assistant.";

impl Command {
    pub fn parse(line: &str) -> Self {
        let input = line.trim();
        if input.is_empty() {
            return Command::Empty;
        }

        let lowered = input.to_lowercase();
        if EXIT_WORDS.contains(&lowered.as_str()) {
            return Command::Exit;
        }
        if HELP_WORDS.contains(&lowered.as_str()) {
            return Command::Help;
        }
        if let Some(rest) = strip_any_prefix(input, FILE_PREFIXES) {
            return Command::AddFile(non_empty(rest));
        }
        if let Some(rest) = strip_any_prefix(input, AUTO_PREFIXES) {
            return Command::Discover(non_empty(rest));
        }

        Command::Message(input.to_string())
    }
}

fn strip_any_prefix<'a>(input: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| input.strip_prefix(p))
}

fn non_empty(rest: &str) -> Option<String> {
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}
