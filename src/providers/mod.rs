use std::sync::Arc;

use chat_provider::{ChatProvider, ProviderInitError};
use chat_provider_mock::{MockChatProvider, MOCK_PROVIDER_ID};

pub const DEFAULT_PROVIDER_ID: &str = MOCK_PROVIDER_ID;

pub fn provider_for_id(provider_id: &str) -> Result<Arc<dyn ChatProvider>, ProviderInitError> {
    match provider_id.trim() {
        MOCK_PROVIDER_ID => Ok(Arc::new(MockChatProvider::new())),
        unknown => Err(ProviderInitError::new(format!(
            "Unsupported provider '{unknown}'. Available providers: {MOCK_PROVIDER_ID}"
        ))),
    }
}
