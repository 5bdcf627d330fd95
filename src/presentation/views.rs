//! HTML-facing output: audio elements and the display sink seam.

use std::io::{self, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::domain::types::AudioFormat;

/// Build a self-contained `<audio>` element carrying the payload as a
/// base64 `data:` URI.
pub fn audio_element(format: AudioFormat, payload: &[u8]) -> String {
    audio_element_from_base64(format, &STANDARD.encode(payload))
}

/// Same as [`audio_element`], for payloads that are already encoded.
pub fn audio_element_from_base64(format: AudioFormat, encoded: &str) -> String {
    let mime = format.mime_type();
    format!("<audio controls type=\"{mime}\" src=\"data:{mime};base64,{encoded}\"></audio>")
}

/// Destination for rendered HTML fragments.
///
/// Stands in for the notebook output cell: each successful pipeline stage
/// pushes its element here as soon as the clip exists.
pub trait DisplaySink {
    fn display_html(&mut self, html: &str) -> io::Result<()>;
}

/// Writes each fragment to stdout on its own line.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl DisplaySink for StdoutSink {
    fn display_html(&mut self, html: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{html}")
    }
}

/// Buffers fragments in memory for callers that assemble a document.
#[derive(Debug, Default)]
pub struct HtmlCollector {
    fragments: Vec<String>,
}

impl HtmlCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn into_document(self) -> String {
        self.fragments.join("\n")
    }
}

impl DisplaySink for HtmlCollector {
    fn display_html(&mut self, html: &str) -> io::Result<()> {
        self.fragments.push(html.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    #[test]
    fn audio_element_embeds_encoded_payload() {
        let element = audio_element(AudioFormat::OggVorbis, b"vorbis-bytes");
        let encoded = STANDARD.encode(b"vorbis-bytes");

        assert!(element.starts_with("<audio controls type=\"audio/ogg\""));
        assert!(element.contains(&format!("src=\"data:audio/ogg;base64,{encoded}\"")));
        assert!(element.ends_with("</audio>"));
    }

    #[test]
    fn collector_preserves_emission_order() {
        let mut sink = HtmlCollector::new();
        sink.display_html("<p>one</p>").expect("collect");
        sink.display_html("<p>two</p>").expect("collect");

        assert_eq!(sink.fragments(), ["<p>one</p>", "<p>two</p>"]);
        assert_eq!(sink.into_document(), "<p>one</p>\n<p>two</p>");
    }
}
