use serde::Deserialize;

//
// Subset of the LINE webhook payload
// https://developers.line.biz/en/reference/messaging-api/#webhook-event-objects
//
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub reply_token: Option<String>,
    pub source: Option<Source>,
    pub message: Option<EventMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
}

/// A text message event with everything needed to answer it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMessage<'a> {
    pub user_id: &'a str,
    pub reply_token: &'a str,
    pub text: &'a str,
}

impl Event {
    pub fn as_text_message(&self) -> Option<TextMessage<'_>> {
        if self.kind != "message" {
            return None;
        }

        let message = self.message.as_ref().filter(|m| m.kind == "text")?;

        Some(TextMessage {
            user_id: self.source.as_ref()?.user_id.as_deref()?,
            reply_token: self.reply_token.as_deref()?,
            text: message.text.as_deref()?,
        })
    }
}
