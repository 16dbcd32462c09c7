//! Bot command parser for drivebot.
//!
//! This module parses chat input into slash commands like /setfolder,
//! /folders and /skip, or plain text replies.

/// Result of parsing a chat text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotInput {
    /// Plain text (e.g. a filename reply).
    Text(String),
    /// Parsed command.
    Command(BotCommand),
}

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Greeting and usage.
    Start,
    /// Show help message.
    Help,
    /// Select the upload folder; an empty path resets to root.
    SetFolder(String),
    /// Show the selected folder.
    ShowFolder,
    /// List the backend's folders.
    ListFolders,
    /// Keep the original name of the pending file.
    Skip,
    /// Unknown command.
    Unknown(String),
}

impl BotCommand {
    /// Get the command name.
    pub fn name(&self) -> &str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Help => "help",
            BotCommand::SetFolder(_) => "setfolder",
            BotCommand::ShowFolder => "folder",
            BotCommand::ListFolders => "folders",
            BotCommand::Skip => "skip",
            BotCommand::Unknown(cmd) => cmd,
        }
    }
}

impl std::fmt::Display for BotCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotCommand::SetFolder(path) if !path.is_empty() => write!(f, "/setfolder {path}"),
            other => write!(f, "/{}", other.name()),
        }
    }
}

/// Parse a chat text message into plain text or a command.
pub fn parse_input(input: &str) -> BotInput {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return BotInput::Text(trimmed.to_string());
    }

    let without_slash = &trimmed[1..];
    let (cmd, args) = match without_slash.find(char::is_whitespace) {
        Some(pos) => (&without_slash[..pos], without_slash[pos..].trim()),
        None => (without_slash, ""),
    };

    // Group chats address commands as /command@BotName
    let cmd = cmd.split('@').next().unwrap_or(cmd);

    let command = match cmd.to_lowercase().as_str() {
        "start" => BotCommand::Start,
        "help" | "h" | "?" => BotCommand::Help,
        "setfolder" => BotCommand::SetFolder(join_args(args)),
        "folder" | "pwd" => BotCommand::ShowFolder,
        "folders" | "listfolders" | "list" => BotCommand::ListFolders,
        "skip" => BotCommand::Skip,
        _ => BotCommand::Unknown(cmd.to_string()),
    };

    BotInput::Command(command)
}

/// Re-join whitespace-separated arguments with single spaces.
fn join_args(args: &str) -> String {
    args.split_whitespace().collect::<Vec<_>>().join(" ")
}
