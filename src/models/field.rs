use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: Uuid,
    pub form_id: Uuid,
    pub title: String,
    pub field_type: String,
    pub position: i32,
    pub required: bool,
    pub properties: Option<JsonValue>,
}

impl Field {
    pub fn kind(&self) -> FieldType {
        FieldType::from(self.field_type.as_str())
    }
}

/// Question kinds understood by the analytics aggregator. Anything else is
/// stored verbatim and only counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    ShortText,
    LongText,
    Email,
    Phone,
    Url,
    Date,
    Number,
    MultipleChoice,
    Dropdown,
    Checkboxes,
    Rating,
    OpinionScale,
    YesNo,
    Other,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::ShortText => "short_text",
            FieldType::LongText => "long_text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Url => "url",
            FieldType::Date => "date",
            FieldType::Number => "number",
            FieldType::MultipleChoice => "multiple_choice",
            FieldType::Dropdown => "dropdown",
            FieldType::Checkboxes => "checkboxes",
            FieldType::Rating => "rating",
            FieldType::OpinionScale => "opinion_scale",
            FieldType::YesNo => "yes_no",
            FieldType::Other => "other",
        }
    }
}

impl From<&str> for FieldType {
    fn from(raw: &str) -> Self {
        match raw {
            "short_text" => FieldType::ShortText,
            "long_text" => FieldType::LongText,
            "email" => FieldType::Email,
            "phone" => FieldType::Phone,
            "url" => FieldType::Url,
            "date" => FieldType::Date,
            "number" => FieldType::Number,
            "multiple_choice" => FieldType::MultipleChoice,
            "dropdown" => FieldType::Dropdown,
            "checkboxes" => FieldType::Checkboxes,
            "rating" => FieldType::Rating,
            "opinion_scale" => FieldType::OpinionScale,
            "yes_no" => FieldType::YesNo,
            _ => FieldType::Other,
        }
    }
}
