//! Module `commands`
//!
//! Defines the console command set, command parsing, and the structures
//! used to report a command's outcome.

use std::path::PathBuf;

/// A console command parsed from one client line.
#[derive(Debug, PartialEq)]
pub enum Command {
    Quit,
    Pwd,
    /// Show the root, or replace it when a path is given
    Root(Option<String>),
    Cwd(String),
    List(Option<String>),
    Retr(String),
    /// Remember the source of the next RNTO/CPTO/MVTO
    From(String),
    Rnto(String),
    Cpto(String),
    Mvto(String),
    Dele(String),
    /// Raw multipart body of `length` bytes follows the `150` reply
    Upld { length: u64, content_type: String },
    /// Known command with missing or malformed arguments
    Invalid(String),
    Unknown(String),
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Follow-up work the session loop performs after sending the message.
#[derive(Debug, PartialEq)]
pub enum CommandData {
    /// Stream this file, then send `226`
    File { path: PathBuf, size: u64 },
    /// Read this many raw bytes and hand them to the upload handler
    AwaitUpload { length: u64, content_type: String },
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
    pub data: Option<CommandData>,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn failure(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Parses a raw command line into the `Command` enum.
///
/// Commands are case-insensitive; everything after the first run of
/// whitespace is the argument, so paths may contain spaces.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();
    let optional = || (!arg.is_empty()).then(|| arg.to_string());

    let required = |build: fn(String) -> Command| {
        if arg.is_empty() {
            Command::Invalid(format!("{cmd} requires a path"))
        } else {
            build(arg.to_string())
        }
    };

    match cmd.as_str() {
        "QUIT" => Command::Quit,
        "PWD" => Command::Pwd,
        "ROOT" => Command::Root(optional()),
        "LIST" => Command::List(optional()),
        "CWD" => required(Command::Cwd),
        "RETR" => required(Command::Retr),
        "FROM" => required(Command::From),
        "RNTO" => required(Command::Rnto),
        "CPTO" => required(Command::Cpto),
        "MVTO" => required(Command::Mvto),
        "DELE" => required(Command::Dele),
        "UPLD" => parse_upload(arg),
        _ => Command::Unknown(trimmed.to_string()),
    }
}

fn parse_upload(arg: &str) -> Command {
    let Some((length, content_type)) = arg.split_once(char::is_whitespace) else {
        return Command::Invalid("UPLD requires <length> <content-type>".into());
    };
    match length.parse::<u64>() {
        Ok(length) => Command::Upld {
            length,
            content_type: content_type.trim().to_string(),
        },
        Err(_) => Command::Invalid(format!("invalid upload length {length:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_command("QUIT"), Command::Quit);
        assert_eq!(parse_command("pwd"), Command::Pwd);
        assert_eq!(parse_command("ROOT"), Command::Root(None));
        assert_eq!(parse_command("LIST"), Command::List(None));
    }

    #[test]
    fn test_parse_commands_with_args() {
        assert_eq!(
            parse_command("CWD Namiseon Vid/2023"),
            Command::Cwd("Namiseon Vid/2023".to_string())
        );
        assert_eq!(
            parse_command("root /srv/share"),
            Command::Root(Some("/srv/share".to_string()))
        );
        assert_eq!(parse_command("FROM a.txt"), Command::From("a.txt".to_string()));
        assert_eq!(parse_command("MVTO archive"), Command::Mvto("archive".to_string()));
        assert_eq!(
            parse_command("UPLD 128 multipart/form-data; boundary=B123"),
            Command::Upld {
                length: 128,
                content_type: "multipart/form-data; boundary=B123".to_string()
            }
        );
    }

    #[test]
    fn test_missing_arguments_are_invalid() {
        assert!(matches!(parse_command("DELE"), Command::Invalid(_)));
        assert!(matches!(parse_command("RNTO   "), Command::Invalid(_)));
        assert!(matches!(parse_command("UPLD 12"), Command::Invalid(_)));
        assert!(matches!(parse_command("UPLD x text/plain"), Command::Invalid(_)));
    }

    #[test]
    fn test_unknown_commands() {
        assert_eq!(
            parse_command("STOR file"),
            Command::Unknown("STOR file".to_string())
        );
        assert_eq!(parse_command(""), Command::Unknown("".to_string()));
    }
}
