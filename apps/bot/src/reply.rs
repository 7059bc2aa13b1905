/// Label of the quick action that watches the queried instrument.
pub const WATCH_LABEL: &str = "關注";
/// Label of the quick action that stops watching it.
pub const REMOVE_LABEL: &str = "移除";

/// A suggested follow-up message shown under a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAction {
    pub label: String,
    pub text: String,
}

impl QuickAction {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub quick_actions: Vec<QuickAction>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quick_actions: Vec::new(),
        }
    }

    /// Attach the watch / remove pair for `message`.
    pub fn with_watch_actions(mut self, message: &str) -> Self {
        self.quick_actions = vec![
            QuickAction::new(WATCH_LABEL, format!("+{message}")),
            QuickAction::new(REMOVE_LABEL, format!("-{message}")),
        ];
        self
    }
}

pub fn unavailable(symbol: &str) -> String {
    format!("目前無法取得{symbol}")
}

pub fn added(symbol: &str) -> String {
    format!("成功關注{symbol}")
}

pub fn already_watching(symbol: &str) -> String {
    format!("已經關注{symbol}")
}

pub fn removed(symbol: &str) -> String {
    format!("成功移除{symbol}")
}

pub fn not_watching(symbol: &str) -> String {
    format!("尚未關注{symbol}")
}
