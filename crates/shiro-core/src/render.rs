//! Progress feedback rendering.
//!
//! A [`DisplayPayload`] is a host-agnostic piece of styled text. Hosts turn it
//! into whatever their client understands (action bar component, chat line,
//! HUD widget). [`LoadingBarRenderer`] draws the default bar:
//!
//! ```text
//! ╞══════════╡ 50%
//! ```
//!
//! with filled cells in green and empty cells in gray.

use serde::{Deserialize, Serialize};

/// Named palette shared by every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TextColor {
    White,
    Gray,
    Green,
    Yellow,
    Gold,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub color: TextColor,
    #[serde(default)]
    pub bold: bool,
}

impl TextSegment {
    pub fn new(text: impl Into<String>, color: TextColor) -> Self {
        Self {
            text: text.into(),
            color,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Ordered styled segments delivered to a player as one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPayload {
    pub segments: Vec<TextSegment>,
}

impl DisplayPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single unstyled line.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().push(TextSegment::new(text, TextColor::White))
    }

    pub fn push(mut self, segment: TextSegment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Concatenated text with styling stripped.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.is_empty())
    }
}

/// Alert in the form `(i) content`.
pub fn alert(content: impl Into<String>, color: TextColor) -> DisplayPayload {
    DisplayPayload::new()
        .push(TextSegment::new("(", TextColor::Gold).bold())
        .push(TextSegment::new("i", TextColor::Red).bold())
        .push(TextSegment::new(")", TextColor::Gold).bold())
        .push(TextSegment::new(" ", TextColor::White))
        .push(TextSegment::new(content, color))
}

/// Turns a progress percentage into something to show the player.
pub trait ProgressRenderer: Send + Sync {
    fn render(&self, percentage: f32) -> DisplayPayload;
}

/// Ten-cell loading bar with a rounded percentage label.
#[derive(Debug, Clone, Copy)]
pub struct LoadingBarRenderer {
    pub cells: usize,
    pub filled: TextColor,
    pub empty: TextColor,
}

impl Default for LoadingBarRenderer {
    fn default() -> Self {
        Self {
            cells: 10,
            filled: TextColor::Green,
            empty: TextColor::Gray,
        }
    }
}

impl ProgressRenderer for LoadingBarRenderer {
    fn render(&self, percentage: f32) -> DisplayPayload {
        let track = "═".repeat(self.cells);

        if percentage <= 0.0 || percentage.is_nan() {
            return DisplayPayload::new()
                .push(TextSegment::new(format!("╞{track}╡ 0%"), self.empty));
        }
        if percentage >= 100.0 {
            return DisplayPayload::new()
                .push(TextSegment::new(format!("╞{track}╡ 100%"), self.filled));
        }

        let step = 100.0 / self.cells as f32;
        let filled = ((percentage / step) as usize).min(self.cells);

        let mut payload = DisplayPayload::new().push(TextSegment::new("╞", self.filled));
        if filled > 0 {
            payload = payload.push(TextSegment::new("═".repeat(filled), self.filled));
        }
        if filled < self.cells {
            payload = payload.push(TextSegment::new("═".repeat(self.cells - filled), self.empty));
        }
        payload
            .push(TextSegment::new("╡", self.empty))
            .push(TextSegment::new(
                format!(" {}%", percentage.round() as u32),
                TextColor::White,
            ))
    }
}
