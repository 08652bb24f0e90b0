use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAnalytics {
    pub total_responses: u64,
    pub completed_responses: u64,
    /// Whole percent, 0 when there are no responses.
    pub completion_rate: u32,
    /// Unrounded mean in seconds; `None` when no response reported a positive duration.
    pub average_completion_time: Option<f64>,
    pub responses_over_time: Vec<DailyCount>,
    pub field_analytics: BTreeMap<String, FieldAnalytics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnalytics {
    pub field_id: String,
    pub field_title: String,
    pub field_type: String,
    pub total_answers: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_counts: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_percentages: Option<BTreeMap<String, u32>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_distribution: Option<BTreeMap<String, u64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_percentage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_percentage: Option<u32>,
}
