//! Wire protocol shared by the chat server and the terminal client.
//!
//! The protocol is newline-delimited UTF-8 text over TCP. The only line that
//! is not newline-terminated is the nickname prompt, which the client answers
//! on the same terminal line.

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Longest line the server accepts, not counting the `\n` terminator
pub const MAX_LINE_BYTES: usize = 1024;

/// Lines starting with this character are commands, everything else is chat.
pub const COMMAND_PREFIX: char = '/';

/// First bytes the server sends on every new connection.
pub const NICKNAME_PROMPT: &str = "Enter your nickname: ";

pub const WELCOME_BANNER: &str = concat!(
    "Welcome to the server! Available commands:\n",
    "  /TIME          show the current server time\n",
    "  /ECHO <text>   repeat <text> back to you\n",
    "  /ADD <a> <b>   add two numbers\n",
    "  /WHO           list active users\n",
    "  /EXIT          leave the chat\n",
    "Any other line is sent to the other users as a chat message.\n",
);

/// Nickname used when the client answers the prompt with an empty line.
pub fn default_nickname(remote_port: u16) -> String {
    format!("User_{}", remote_port)
}

/// Announcement sent to everyone else when a user completes the handshake
pub fn join_notice(nickname: &str) -> String {
    format!("*** {} joined the chat ***\n", nickname)
}

/// Announcement sent to the remaining users when a session closes
pub fn leave_notice(nickname: &str) -> String {
    format!("*** {} left the chat ***\n", nickname)
}

/// A chat message as relayed to the other users
pub fn chat_line(nickname: &str, text: &str) -> String {
    format!("[{}] {}\n", nickname, text)
}

/// Returns the command body if `line` is a command, `None` for chat.
pub fn strip_command(line: &str) -> Option<&str> {
    line.strip_prefix(COMMAND_PREFIX)
}

/// `host:port` the client connects to when no server is given
pub fn default_address() -> String {
    format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT)
}
