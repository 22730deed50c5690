//! Gated content provider
//!
//! Builds the per-token payload returned once admission succeeds. The
//! audio URL is derived from a configured base; with no base configured
//! the payload still renders with the audio marked unavailable.

use crate::domain::entities::ContentPayload;
use crate::domain::repository::ContentProvider;
use crate::domain::value_objects::EthAddress;
use crate::error::GateResult;

pub struct TokenContentProvider {
    audio_base_url: Option<String>,
}

impl TokenContentProvider {
    pub fn new(audio_base_url: Option<String>) -> Self {
        Self { audio_base_url }
    }
}

impl ContentProvider for TokenContentProvider {
    async fn generate(&self, token_id: u64, address: &EthAddress) -> GateResult<ContentPayload> {
        let audio_url = self
            .audio_base_url
            .as_ref()
            .map(|base| format!("{}/{token_id}.mp3", base.trim_end_matches('/')));
        let audio_error = audio_url.is_none();

        tracing::debug!(token_id, address = %address, "content generated");
        Ok(ContentPayload {
            title: format!("Key #{token_id}"),
            message: format!(
                "Welcome, {}. Your key #{token_id} has been verified.",
                address.as_str()
            ),
            audio_url,
            audio_error,
        })
    }
}
