//! Request and reply model.
//!
//! Inbound text is resolved into a [`Request`] once, at the transport
//! boundary; the runtime matches on it exhaustively and answers with a
//! [`Reply`] that the transport knows how to deliver.

use shellix_shared::constants::transport as const_transport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Create a container. Without a label the user is offered a choice.
    Create { label: Option<String> },
    Destroy,
    Restart,
    /// Send a file back. An empty path is a usage error.
    Fetch { path: String },
    Help,
    /// A slash command that is not recognized.
    Unknown { verb: String },
    /// Anything that is not a command runs as a shell line.
    Run { command: String },
}

impl Request {
    /// Resolve a chat message. Returns `None` for blank messages.
    ///
    /// Commands may carry a `@botname` suffix (`/create@shellix_bot`).
    pub fn parse(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }

        let Some((verb, rest)) = split_command(text) else {
            return Some(Request::Run {
                command: text.to_string(),
            });
        };

        let request = match verb.as_str() {
            "create" => Request::Create {
                label: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "destroy" => Request::Destroy,
            "restart" => Request::Restart,
            "fetch" => Request::Fetch {
                path: rest.to_string(),
            },
            "help" | "start" => Request::Help,
            _ => Request::Unknown { verb },
        };
        Some(request)
    }

    /// Resolve inline-keyboard callback data (`create:<label>`).
    pub fn from_callback(data: &str) -> Option<Self> {
        let label = data.strip_prefix(const_transport::CREATE_CALLBACK_PREFIX)?;
        if label.trim().is_empty() {
            return None;
        }
        Some(Request::Create {
            label: Some(label.to_string()),
        })
    }

    /// Short name used in logs.
    pub fn verb(&self) -> &str {
        match self {
            Request::Create { .. } => "create",
            Request::Destroy => "destroy",
            Request::Restart => "restart",
            Request::Fetch { .. } => "fetch",
            Request::Help => "help",
            Request::Unknown { verb } => verb,
            Request::Run { .. } => "run",
        }
    }
}

/// Split `/verb@bot rest` into a lowercase verb and the trimmed remainder.
///
/// Only `[A-Za-z0-9_]` verbs count as commands, so `/bin/ls -la` is a shell
/// line rather than an unknown command.
fn split_command(text: &str) -> Option<(String, &str)> {
    let body = text.trim_start().strip_prefix('/')?;
    let (token, rest) = match body.find(char::is_whitespace) {
        Some(i) => (&body[..i], body[i..].trim()),
        None => (body, ""),
    };
    let verb = token.split_once('@').map_or(token, |(verb, _bot)| verb);
    if verb.is_empty() || !verb.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }
    Some((verb.to_ascii_lowercase(), rest))
}

/// Outbound message for the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Plain text, no markup.
    Text(String),
    /// Command output, already sanitized for a fenced block.
    Code { language: String, body: String },
    /// Binary attachment.
    Document { file_name: String, bytes: Vec<u8> },
    /// Ask the user to pick one of `labels`.
    ChooseDistribution { prompt: String, labels: Vec<String> },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn code(body: impl Into<String>) -> Self {
        Reply::Code {
            language: const_transport::CODE_LANGUAGE.to_string(),
            body: body.into(),
        }
    }

    /// Fenced MarkdownV2 rendering of a [`Reply::Code`].
    pub fn code_block(&self) -> Option<String> {
        match self {
            Reply::Code { language, body } => Some(format!("```{}\n{}\n```", language, body)),
            _ => None,
        }
    }

    /// Text content of the reply, if it has any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Code { body, .. } => Some(body),
            Reply::ChooseDistribution { prompt, .. } => Some(prompt),
            Reply::Document { .. } => None,
        }
    }
}
