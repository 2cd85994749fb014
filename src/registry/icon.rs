//! Display icon for a tool, chosen by name

use std::fmt;

/// Icon variant shown next to a tool.
///
/// Known tool names map to a specific variant; everything else gets
/// [`ToolIcon::Robot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolIcon {
    Camera,
    Image,
    Envelope,
    Slack,
    #[default]
    Robot,
}

impl ToolIcon {
    /// Pick the icon for a tool name
    pub fn for_tool(name: &str) -> Self {
        match name {
            "take_a_picture" => ToolIcon::Camera,
            "call_diffusion_model" => ToolIcon::Image,
            "send_mail" => ToolIcon::Envelope,
            "get_slack_messages" | "post_slack_message" | "get_channel_members" => ToolIcon::Slack,
            _ => ToolIcon::default(),
        }
    }

    /// Terminal glyph for the icon
    pub fn glyph(&self) -> &'static str {
        match self {
            ToolIcon::Camera => "📷",
            ToolIcon::Image => "🖼",
            ToolIcon::Envelope => "✉",
            ToolIcon::Slack => "#",
            ToolIcon::Robot => "🤖",
        }
    }
}

impl fmt::Display for ToolIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}
