//! Schema-mode operations behind the three direct-entry endpoints.
//!
//! Each one is a single [`generate_structured`] call on the structured
//! model at the configured (near-zero) temperature. The user's text is sent
//! verbatim as the prompt; the task lives in the system instruction.

use crate::config::ServiceConfig;
use crate::error::AnkonaError;
use crate::model::{generate_structured, GenerativeModel, ModelRequest};
use crate::prompts::{select_customer_instruction, INFO_DESK_INSTRUCTION, KHATA_ENTRY_INSTRUCTION};
use crate::records::{BookkeepingEntry, CustomerSelection, InfoDeskReply, ResponseSchema};
use tracing::debug;

fn structured_request(config: &ServiceConfig, input: &str, instruction: String) -> ModelRequest {
    ModelRequest::new(&config.structured_model, input)
        .system_instruction(instruction)
        .temperature(config.structured_temperature)
}

async fn run<T: ResponseSchema>(
    model: Option<&dyn GenerativeModel>,
    request: ModelRequest,
) -> Result<T, AnkonaError> {
    debug!("{} request: {} chars of input", T::NAME, request.prompt.len());
    generate_structured(model, request).await
}

/// Extract one khata entry from free-form text.
pub async fn parse_khata_entry(
    model: Option<&dyn GenerativeModel>,
    config: &ServiceConfig,
    input: &str,
) -> Result<BookkeepingEntry, AnkonaError> {
    let request = structured_request(config, input, KHATA_ENTRY_INSTRUCTION.to_string());
    run(model, request).await
}

/// Pick the customer `input` refers to from `customer_list`.
pub async fn select_khata_customer(
    model: Option<&dyn GenerativeModel>,
    config: &ServiceConfig,
    input: &str,
    customer_list: &str,
) -> Result<CustomerSelection, AnkonaError> {
    let request = structured_request(config, input, select_customer_instruction(customer_list));
    run(model, request).await
}

/// Answer a general inquiry.
pub async fn information_desk(
    model: Option<&dyn GenerativeModel>,
    config: &ServiceConfig,
    input: &str,
) -> Result<InfoDeskReply, AnkonaError> {
    let request = structured_request(config, input, INFO_DESK_INSTRUCTION.to_string());
    run(model, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::EntryType;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Fixed {
        reply: &'static str,
        seen: Mutex<Option<ModelRequest>>,
    }

    impl Fixed {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                seen: Mutex::new(None),
            }
        }

        fn request(&self) -> ModelRequest {
            self.seen.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl GenerativeModel for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<String, AnkonaError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(self.reply.to_string())
        }
    }

    #[tokio::test]
    async fn khata_entry_request_and_parse() {
        let model = Fixed::new(
            r#"{"customer_name":"Rahim","amount":500,"entry_type":"দিলাম","notes":null}"#,
        );
        let config = ServiceConfig::default();
        let entry = parse_khata_entry(Some(&model), &config, "rahim ke 500 taka dilam")
            .await
            .unwrap();
        assert_eq!(entry.entry_type, Some(EntryType::Dilam));
        assert_eq!(entry.amount, Some(500));

        let req = model.request();
        assert_eq!(req.model, "gemini-2.0-flash");
        assert_eq!(req.prompt, "rahim ke 500 taka dilam");
        assert_eq!(req.temperature, Some(0.01));
        assert_eq!(req.system_instruction.as_deref(), Some(KHATA_ENTRY_INSTRUCTION));
        assert_eq!(req.response_schema, Some(BookkeepingEntry::response_schema()));
    }

    #[tokio::test]
    async fn customer_list_reaches_instruction() {
        let model = Fixed::new(r#"{"selected_name":"Karim Mia"}"#);
        let out = select_khata_customer(
            Some(&model),
            &ServiceConfig::default(),
            "korim",
            "Rahim\nKarim Mia",
        )
        .await
        .unwrap();
        assert_eq!(out.selected_name.as_deref(), Some("Karim Mia"));
        let instruction = model.request().system_instruction.unwrap();
        assert!(instruction.contains("Rahim\nKarim Mia"));
    }

    #[tokio::test]
    async fn information_desk_all_null() {
        let model = Fixed::new(r#"{"answer":null,"reference":null,"image":null}"#);
        let out = information_desk(Some(&model), &ServiceConfig::default(), "hello")
            .await
            .unwrap();
        assert_eq!(out, InfoDeskReply::default());
    }

    #[tokio::test]
    async fn unconfigured_fails_fast() {
        let err = information_desk(None, &ServiceConfig::default(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AnkonaError::ProviderNotConfigured { .. }));
    }

    #[tokio::test]
    async fn temperature_follows_config() {
        let model = Fixed::new(r#"{"selected_name":null}"#);
        let config = ServiceConfig::builder()
            .structured_temperature(0.3)
            .structured_model("gemini-test")
            .build()
            .unwrap();
        let out = select_khata_customer(Some(&model), &config, "x", "a")
            .await
            .unwrap();
        assert_eq!(out, CustomerSelection::default());
        let req = model.request();
        assert_eq!(req.temperature, Some(0.3));
        assert_eq!(req.model, "gemini-test");
    }
}
