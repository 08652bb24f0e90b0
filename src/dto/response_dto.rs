use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponsePayload {
    #[validate(length(max = 255))]
    pub respondent_id: Option<String>,
    #[serde(default = "default_completed")]
    pub completed: bool,
    #[validate(range(min = 0))]
    pub time_taken: Option<i32>,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub field_id: Uuid,
    pub value: JsonValue,
}

fn default_completed() -> bool {
    true
}

/// Request context captured alongside a submission.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}
