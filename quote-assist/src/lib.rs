//! AI-assisted drafting with a deterministic local stand-in.
//!
//! The application never depends on which implementation is active: every
//! capability returns a usable value, and the remote variant degrades to
//! the local one on any failure (missing credentials, network error,
//! malformed response). Nothing in here surfaces an error to a caller.

mod draft;
mod gemini;
mod local;

use async_trait::async_trait;

use quote_core::models::{Quotation, Settings};

pub use draft::DraftQuotation;
pub use gemini::GeminiAssistant;
pub use local::LocalAssistant;

/// The capabilities the application asks of an assistant.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Extracts plain text from a photographed job note.
    async fn text_from_image(&self, image: &[u8], mime: &str) -> String;

    /// Short free-text assessment of site conditions from a photo.
    async fn assess_site(&self, image: &[u8], mime: &str) -> String;

    /// Turns free-text job notes into a structured quotation draft.
    async fn draft_quotation(&self, notes: &str, settings: &Settings) -> DraftQuotation;

    /// Revises a quotation per a natural-language instruction, preserving
    /// its structure. Returns the input unchanged when revision fails.
    async fn refine_quotation(&self, quotation: &Quotation, instruction: &str) -> Quotation;
}

/// Picks the implementation at construction time: remote when an API key
/// is configured, the deterministic local stand-in otherwise.
pub fn assistant_from_key(api_key: Option<String>) -> Box<dyn Assistant> {
    match api_key.filter(|key| !key.trim().is_empty()) {
        Some(key) => Box::new(GeminiAssistant::new(key)),
        None => {
            tracing::info!("no assistant API key; using local drafting");
            Box::new(LocalAssistant)
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn blank_key_selects_the_local_assistant() {
        // Selection only; behaviour of each variant is tested in its module.
        let _local = super::assistant_from_key(None);
        let _also_local = super::assistant_from_key(Some("  ".to_string()));
        let _remote = super::assistant_from_key(Some("key".to_string()));
    }
}
