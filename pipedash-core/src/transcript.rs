//! Transcript parsing
//!
//! The backend persists the conversation as plain text, one message per line:
//!
//! ```text
//! Você: quais pokémon são do tipo fogo?
//! IA: Charmander, Vulpix e Growlithe.
//! ```
//!
//! Lines that carry neither marker are kept as assistant text so that legacy
//! or malformed entries still show up in the conversation.

use crate::types::{Message, Sender};

/// Prefix of lines written by the user.
pub const USER_MARKER: &str = "Você:";

/// Prefix of lines written by the assistant.
pub const ASSISTANT_MARKER: &str = "IA:";

/// Parse a transcript into an ordered list of messages.
///
/// `None` and the empty string both yield an empty conversation.
pub fn parse_transcript(transcript: Option<&str>) -> Vec<Message> {
    let Some(transcript) = transcript else {
        return Vec::new();
    };

    transcript
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

/// Classify a single non-empty line.
fn parse_line(line: &str) -> Message {
    if let Some(rest) = line.strip_prefix(USER_MARKER) {
        Message::user(rest.trim())
    } else if let Some(rest) = line.strip_prefix(ASSISTANT_MARKER) {
        Message::assistant(rest.trim())
    } else {
        Message::assistant(line.trim())
    }
}

/// Marker used when writing a message of the given sender.
pub fn marker_for(sender: Sender) -> &'static str {
    match sender {
        Sender::User => USER_MARKER,
        Sender::Assistant => ASSISTANT_MARKER,
    }
}

/// Serialize messages back into the transcript line format.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        out.push_str(marker_for(msg.sender));
        out.push(' ');
        out.push_str(&msg.text);
        out.push('\n');
    }
    out
}
