//! Notification content and its HTML rendering

use otatrack_metadata::OtaMetadata;

/// Label of the inline download button
pub const BUTTON_TEXT: &str = "Google OTA Link";

/// One update announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Device model
    pub device: String,
    /// Update title
    pub title: String,
    /// Changelog as delivered by the vendor, raw HTML
    pub description: String,
    /// Human-readable package size
    pub size: String,
    /// Target build fingerprint
    pub fingerprint: String,
    /// Package download URL, used for the button
    pub url: String,
    /// Extra `<b>Label:</b> value` lines shown above the fingerprint
    pub details: Vec<String>,
}

impl Notification {
    /// Announcement without build details
    pub fn new(
        device: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        size: impl Into<String>,
        fingerprint: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            title: title.into(),
            description: description.into(),
            size: size.into(),
            fingerprint: fingerprint.into(),
            url: url.into(),
            details: Vec::new(),
        }
    }

    /// Add Android version, security patch and build date lines
    pub fn with_metadata(mut self, metadata: &OtaMetadata) -> Self {
        if let Some(summary) = metadata.sdk_summary() {
            let line = match summary.log_line.split_once(": ") {
                Some((label, value)) => detail(label, value),
                None => summary.log_line,
            };
            self.details.push(line);
        }
        if let Some(patch) = &metadata.security_patch_level {
            self.details.push(detail("Security patch", patch));
        }
        if let Some(date) = &metadata.build_date {
            self.details.push(detail("Build date", &format!("{date} (CST)")));
        }
        self
    }

    /// Title used for an overflow page
    pub fn page_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("{} - Update", self.device)
        } else {
            self.title.clone()
        }
    }

    /// Render the message with `description` in place of the changelog
    ///
    /// `description` is expected to be cleaned already; every other field is escaped.
    pub fn render(&self, description: &str) -> String {
        let mut text = format!(
            "<blockquote><b>OTA Update Available</b></blockquote>\n\n\
             <b>Device:</b> {}\n\n\
             <b>Title:</b> {}\n\n",
            escape(&self.device),
            escape(&self.title),
        );
        if !description.is_empty() {
            text.push_str(description);
            text.push_str("\n\n");
        }
        text.push_str(&format!("<b>Size:</b> {}\n", escape(&self.size)));
        for line in &self.details {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&format!(
            "<b>Fingerprint:</b>\n<code>{}</code>",
            escape(&self.fingerprint)
        ));
        text
    }
}

fn detail(label: &str, value: &str) -> String {
    format!("<b>{}:</b> {}", escape(label), escape(value))
}

/// Escape the characters Telegram's HTML parser treats specially
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
