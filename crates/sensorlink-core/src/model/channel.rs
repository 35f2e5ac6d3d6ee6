// ── Channels ──

use serde::{Deserialize, Serialize};

/// One channel toggle as reported by a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u32,
    pub enabled: bool,
}

impl Channel {
    pub fn label(&self) -> String {
        channel_label(self.id)
    }
}

/// Human label for a channel id. Unknown ids fall back to `Channel N`.
pub fn channel_label(id: u32) -> String {
    match id {
        1 => "Raw Data (ch1)".into(),
        2 => "CJC Temperature (ch2)".into(),
        n => format!("Channel {n}"),
    }
}
