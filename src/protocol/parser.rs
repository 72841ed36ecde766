//! Command line parsing

use crate::protocol::commands::Command;

/// Width of the verb field at the start of every command line.
pub const VERB_WIDTH: usize = 4;

/// Splits a raw control line into its verb and optional argument.
///
/// The verb is the first four characters of the line, trimmed and uppercased.
/// The argument is whatever follows, trimmed, or `None` when nothing is left.
pub fn split_command_line(raw: &str) -> (String, Option<String>) {
    let line = raw.trim_end();
    let split_at = line
        .char_indices()
        .nth(VERB_WIDTH)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len());
    let (head, tail) = line.split_at(split_at);

    let verb = head.trim().to_ascii_uppercase();
    let arg = match tail.trim() {
        "" => None,
        rest => Some(rest.to_string()),
    };
    (verb, arg)
}

/// Parses a raw command string received from a client into the `Command` enum.
pub fn parse_command(raw: &str) -> Command {
    let (verb, arg) = split_command_line(raw);
    Command::from_parts(&verb, arg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_is_first_four_characters_uppercased() {
        assert_eq!(
            split_command_line("retr file.bin\r\n"),
            ("RETR".to_string(), Some("file.bin".to_string()))
        );
        assert_eq!(split_command_line("pwd\r\n"), ("PWD".to_string(), None));
        assert_eq!(
            split_command_line("CWD   /tmp  \r\n"),
            ("CWD".to_string(), Some("/tmp".to_string()))
        );
    }

    #[test]
    fn argument_is_remainder_after_verb_width() {
        // No separator is required between verb and argument.
        assert_eq!(
            split_command_line("STORnew.txt"),
            ("STOR".to_string(), Some("new.txt".to_string()))
        );
        assert_eq!(
            split_command_line("USERNAME bob"),
            ("USER".to_string(), Some("NAME bob".to_string()))
        );
    }

    #[test]
    fn blank_argument_is_absent() {
        assert_eq!(split_command_line("LIST    \r\n"), ("LIST".to_string(), None));
        assert_eq!(split_command_line(""), (String::new(), None));
    }

    #[test]
    fn multibyte_input_does_not_split_inside_a_character() {
        let (verb, arg) = split_command_line("ÜSER x");
        assert_eq!(verb, "ÜSER");
        assert_eq!(arg.as_deref(), Some("x"));
    }

    #[test]
    fn maps_known_and_unknown_verbs() {
        assert_eq!(parse_command("PASV\r\n"), Command::PASV);
        assert_eq!(
            parse_command("type I\r\n"),
            Command::TYPE(Some("I".to_string()))
        );
        assert_eq!(parse_command("LIST\r\n"), Command::LIST(None));
        assert_eq!(
            parse_command("XYZZY\r\n"),
            Command::UNKNOWN("XYZZ".to_string())
        );
    }
}
