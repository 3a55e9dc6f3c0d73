//! HTTP client for the Bot API.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use shellix::Reply;
use shellix_shared::constants::transport as const_transport;
use shellix_shared::errors::{ShellixError, ShellixResult};

use super::Update;
use super::types::{
    AnswerCallbackQuery, ApiResponse, BotInfo, GetUpdates, InlineKeyboardButton,
    InlineKeyboardMarkup, SendMessage,
};

const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Slack on top of the long-poll timeout before the HTTP request gives up.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct BotClient {
    http: reqwest::Client,
    base_url: String,
}

impl BotClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> ShellixResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + HTTP_TIMEOUT_SLACK)
            .build()
            .map_err(|e| ShellixError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    /// Check the token. Returns the bot's username.
    pub async fn get_me(&self) -> ShellixResult<String> {
        let info: BotInfo = self.call("getMe", &serde_json::json!({})).await?;
        tracing::debug!(bot_id = info.id, "Authenticated");
        Ok(info.username.unwrap_or_default())
    }

    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> ShellixResult<Vec<Update>> {
        let body = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &body).await
    }

    pub async fn answer_callback(&self, callback_id: &str) -> ShellixResult<()> {
        let body = AnswerCallbackQuery {
            callback_query_id: callback_id,
        };
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    /// Deliver a runtime reply to a chat.
    pub async fn deliver(&self, chat_id: i64, reply: &Reply) -> ShellixResult<()> {
        match reply {
            Reply::Text(text) => self.send_message(chat_id, &clamp(text), None, None).await,
            Reply::Code { .. } => {
                let block = reply.code_block().unwrap_or_default();
                self.send_message(chat_id, &block, Some("MarkdownV2"), None)
                    .await
            }
            Reply::ChooseDistribution { prompt, labels } => {
                let keyboard = InlineKeyboardMarkup {
                    inline_keyboard: labels
                        .iter()
                        .map(|label| {
                            vec![InlineKeyboardButton {
                                text: label.clone(),
                                callback_data: format!(
                                    "{}{}",
                                    const_transport::CREATE_CALLBACK_PREFIX,
                                    label
                                ),
                            }]
                        })
                        .collect(),
                };
                self.send_message(chat_id, &clamp(prompt), None, Some(keyboard))
                    .await
            }
            Reply::Document { file_name, bytes } => {
                self.send_document(chat_id, file_name, bytes.clone()).await
            }
        }
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> ShellixResult<()> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode,
            reply_markup,
        };
        let _: IgnoredAny = self.call("sendMessage", &body).await?;
        Ok(())
    }

    async fn send_document(&self, chat_id: i64, file_name: &str, bytes: Vec<u8>) -> ShellixResult<()> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name.to_string()));
        let response = self
            .http
            .post(self.url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let _: IgnoredAny = parse_response("sendDocument", response).await?;
        Ok(())
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> ShellixResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        parse_response(method, response).await
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }
}

async fn parse_response<T: DeserializeOwned>(
    method: &str,
    response: reqwest::Response,
) -> ShellixResult<T> {
    let status = response.status();
    let envelope: ApiResponse<T> = response.json().await.map_err(transport_error)?;
    match envelope {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse { description, .. } => Err(ShellixError::Transport(format!(
            "{} failed ({}): {}",
            method,
            status,
            description.unwrap_or_else(|| "no description".into())
        ))),
    }
}

fn transport_error(err: reqwest::Error) -> ShellixError {
    // Strip the URL, it embeds the bot token.
    ShellixError::Transport(err.without_url().to_string())
}

/// Plain text longer than a message is cut to fit.
fn clamp(text: &str) -> String {
    text.chars().take(const_transport::MAX_MESSAGE_LEN).collect()
}
