use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Serialize;
use tracing::debug;

use crate::reply::Reply;

/// Delivers a reply for an inbound event.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn reply(&self, reply_token: &str, reply: &Reply) -> Result<()>;
}

#[derive(Clone)]
pub struct LineClient {
    client: Client,
    base_api: String,
}

impl LineClient {
    pub fn new(base_api: String, channel_token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {channel_token}"))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_api })
    }
}

#[async_trait]
impl Messenger for LineClient {
    async fn reply(&self, reply_token: &str, reply: &Reply) -> Result<()> {
        let url = format!(
            "{}/v2/bot/message/reply",
            self.base_api.trim_end_matches('/')
        );

        self.client
            .post(url)
            .json(&ReplyRequest::new(reply_token, reply))
            .send()
            .await?
            .error_for_status()?;

        debug!(quick_actions = reply.quick_actions.len(), "reply delivered");
        Ok(())
    }
}

//
// Match LINE reply message JSON
// https://developers.line.biz/en/reference/messaging-api/#send-reply-message
//
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<TextPayload<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextPayload<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    quick_reply: Option<QuickReplyPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct QuickReplyPayload<'a> {
    items: Vec<QuickReplyItem<'a>>,
}

#[derive(Debug, Serialize)]
struct QuickReplyItem<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    action: MessageAction<'a>,
}

#[derive(Debug, Serialize)]
struct MessageAction<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    label: &'a str,
    text: &'a str,
}

impl<'a> ReplyRequest<'a> {
    fn new(reply_token: &'a str, reply: &'a Reply) -> Self {
        let quick_reply = (!reply.quick_actions.is_empty()).then(|| QuickReplyPayload {
            items: reply
                .quick_actions
                .iter()
                .map(|action| QuickReplyItem {
                    kind: "action",
                    action: MessageAction {
                        kind: "message",
                        label: &action.label,
                        text: &action.text,
                    },
                })
                .collect(),
        });

        Self {
            reply_token,
            messages: vec![TextPayload {
                kind: "text",
                text: &reply.text,
                quick_reply,
            }],
        }
    }
}
