use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::dto::analytics_dto::{DailyCount, FieldAnalytics, FormAnalytics};
use crate::models::field::{Field, FieldType};
use crate::models::response::Response;

pub const TIME_SERIES_DAYS: i64 = 30;

pub struct AnalyticsService;

impl AnalyticsService {
    pub fn calculate(responses: &[Response], fields: &[Field]) -> FormAnalytics {
        Self::calculate_at(responses, fields, Utc::now())
    }

    pub fn calculate_at(responses: &[Response], fields: &[Field], now: DateTime<Utc>) -> FormAnalytics {
        let total_responses = responses.len() as u64;
        let completed_responses = responses.iter().filter(|r| r.completed).count() as u64;

        let durations: Vec<f64> = responses
            .iter()
            .filter_map(|r| r.time_taken)
            .filter(|t| *t > 0)
            .map(f64::from)
            .collect();
        let average_completion_time = mean(&durations);

        let answers_by_field = group_answers(responses);
        let field_analytics = fields
            .iter()
            .map(|field| {
                let values = answers_by_field
                    .get(&field.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                (field.id.to_string(), analyze_field(field, values))
            })
            .collect();

        FormAnalytics {
            total_responses,
            completed_responses,
            completion_rate: percent(completed_responses, total_responses),
            average_completion_time,
            responses_over_time: daily_counts(responses, now.date_naive()),
            field_analytics,
        }
    }
}

/// Unwraps one level of `{"value": ...}` storage wrapping. Nulls, empty
/// strings and empty arrays count as "no answer".
pub fn extract_value(raw: &JsonValue) -> Option<&JsonValue> {
    let value = match raw {
        JsonValue::Object(map) => map.get("value").unwrap_or(raw),
        other => other,
    };
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) if s.trim().is_empty() => None,
        JsonValue::Array(items) if items.is_empty() => None,
        v => Some(v),
    }
}

fn group_answers(responses: &[Response]) -> HashMap<Uuid, Vec<&JsonValue>> {
    let mut by_field: HashMap<Uuid, Vec<&JsonValue>> = HashMap::new();
    for answer in responses.iter().flat_map(|r| r.answers.iter()) {
        if let Some(value) = extract_value(&answer.value) {
            by_field.entry(answer.field_id).or_default().push(value);
        }
    }
    by_field
}

fn daily_counts(responses: &[Response], today: NaiveDate) -> Vec<DailyCount> {
    let start = today - Duration::days(TIME_SERIES_DAYS - 1);
    let mut buckets: BTreeMap<NaiveDate, u64> = (0..TIME_SERIES_DAYS)
        .map(|offset| (start + Duration::days(offset), 0))
        .collect();

    for response in responses {
        if let Some(count) = buckets.get_mut(&response.created_at.date_naive()) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, count)| DailyCount {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

fn analyze_field(field: &Field, values: &[&JsonValue]) -> FieldAnalytics {
    let mut stats = FieldAnalytics {
        field_id: field.id.to_string(),
        field_title: field.title.clone(),
        field_type: field.field_type.clone(),
        total_answers: values.len() as u64,
        ..Default::default()
    };

    match field.kind() {
        FieldType::MultipleChoice | FieldType::Dropdown => {
            let counts = tally(values.iter().map(|v| display_value(v)));
            let total = values.len() as u64;
            stats.option_percentages = Some(percentages(&counts, total));
            stats.option_counts = Some(counts);
        }
        FieldType::Checkboxes => {
            let selections: Vec<String> = values
                .iter()
                .filter_map(|v| v.as_array())
                .flat_map(|items| items.iter().map(display_value))
                .collect();
            let total = selections.len() as u64;
            let counts = tally(selections.into_iter());
            stats.option_percentages = Some(percentages(&counts, total));
            stats.option_counts = Some(counts);
        }
        FieldType::Rating | FieldType::OpinionScale => {
            let numbers: Vec<f64> = values.iter().filter_map(|v| as_number(v)).collect();
            stats.average_rating = mean(&numbers).map(|avg| round_to(avg, 1));
            stats.rating_distribution = Some(tally(numbers.iter().map(|n| n.to_string())));
        }
        FieldType::Number => {
            let numbers: Vec<f64> = values.iter().filter_map(|v| as_number(v)).collect();
            stats.average = mean(&numbers).map(|avg| round_to(avg, 2));
            stats.min = numbers.iter().copied().reduce(f64::min);
            stats.max = numbers.iter().copied().reduce(f64::max);
        }
        FieldType::YesNo => {
            let (yes, no) = values.iter().fold((0u64, 0u64), |(yes, no), v| match as_yes_no(v) {
                Some(true) => (yes + 1, no),
                Some(false) => (yes, no + 1),
                None => (yes, no),
            });
            stats.yes_count = Some(yes);
            stats.no_count = Some(no);
            stats.yes_percentage = Some(percent(yes, yes + no));
            stats.no_percentage = Some(percent(no, yes + no));
        }
        _ => {}
    }

    stats
}

fn tally(items: impl Iterator<Item = String>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

fn percentages(counts: &BTreeMap<String, u64>, total: u64) -> BTreeMap<String, u32> {
    counts
        .iter()
        .map(|(option, count)| (option.clone(), percent(*count, total)))
        .collect()
}

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(value: &JsonValue) -> Option<f64> {
    let number = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn as_yes_no(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => match s.as_str() {
            "true" | "yes" | "Yes" => Some(true),
            "false" | "no" | "No" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn percent(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::Answer;
    use serde_json::json;

    fn field(field_type: &str) -> Field {
        Field {
            id: Uuid::new_v4(),
            form_id: Uuid::nil(),
            title: format!("{} question", field_type),
            field_type: field_type.to_string(),
            position: 0,
            required: false,
            properties: None,
        }
    }

    fn response(completed: bool, time_taken: Option<i32>, created_at: DateTime<Utc>) -> Response {
        Response {
            id: Uuid::new_v4(),
            form_id: Uuid::nil(),
            respondent_id: None,
            completed,
            time_taken,
            ip_address: None,
            user_agent: None,
            created_at,
            completed_at: None,
            answers: Vec::new(),
        }
    }

    fn answered(field: &Field, values: Vec<JsonValue>) -> Vec<Response> {
        values
            .into_iter()
            .map(|value| {
                let mut r = response(true, None, Utc::now());
                r.answers.push(Answer {
                    id: Uuid::new_v4(),
                    response_id: r.id,
                    field_id: field.id,
                    value,
                });
                r
            })
            .collect()
    }

    fn stats_for(field: &Field, values: Vec<JsonValue>) -> FieldAnalytics {
        let responses = answered(field, values);
        let analytics = AnalyticsService::calculate(&responses, std::slice::from_ref(field));
        analytics.field_analytics[&field.id.to_string()].clone()
    }

    #[test]
    fn empty_input_has_zero_rate_and_no_average() {
        let fields = vec![field("short_text")];
        let analytics = AnalyticsService::calculate(&[], &fields);
        assert_eq!(analytics.total_responses, 0);
        assert_eq!(analytics.completion_rate, 0);
        assert_eq!(analytics.average_completion_time, None);
        assert_eq!(analytics.responses_over_time.len(), 30);
        assert_eq!(analytics.field_analytics.len(), 1);
    }

    #[test]
    fn completion_rate_is_whole_percent() {
        let now = Utc::now();
        let responses = vec![
            response(true, Some(60), now),
            response(true, Some(120), now),
            response(true, None, now),
            response(false, Some(0), now),
        ];
        let analytics = AnalyticsService::calculate(&responses, &[]);
        assert_eq!(analytics.total_responses, 4);
        assert_eq!(analytics.completed_responses, 3);
        assert_eq!(analytics.completion_rate, 75);
        assert_eq!(analytics.average_completion_time, Some(90.0));
    }

    #[test]
    fn average_completion_time_is_not_rounded() {
        let now = Utc::now();
        let responses = vec![response(true, Some(10), now), response(true, Some(15), now)];
        let analytics = AnalyticsService::calculate(&responses, &[]);
        assert_eq!(analytics.average_completion_time, Some(12.5));
    }

    #[test]
    fn time_series_covers_thirty_days_and_drops_outliers() {
        let now = DateTime::parse_from_rfc3339("2026-03-31T12:00:00Z")
            .map(|d| d.with_timezone(&Utc))
            .unwrap();
        let responses = vec![
            response(true, None, now),
            response(true, None, now - Duration::days(29)),
            response(true, None, now - Duration::days(30)),
            response(true, None, now + Duration::days(1)),
        ];
        let analytics = AnalyticsService::calculate_at(&responses, &[], now);
        let series = &analytics.responses_over_time;
        assert_eq!(series.len(), 30);
        assert_eq!(series[0], DailyCount { date: "2026-03-02".into(), count: 1 });
        assert_eq!(series[29], DailyCount { date: "2026-03-31".into(), count: 1 });
        assert_eq!(series.iter().map(|d| d.count).sum::<u64>(), 2);
    }

    #[test]
    fn rating_average_and_histogram() {
        let f = field("rating");
        let stats = stats_for(&f, vec![json!(3), json!(4), json!(5), json!(4)]);
        assert_eq!(stats.average_rating, Some(4.0));
        let dist = stats.rating_distribution.unwrap();
        assert_eq!(dist.get("3"), Some(&1));
        assert_eq!(dist.get("4"), Some(&2));
        assert_eq!(dist.get("5"), Some(&1));
        assert_eq!(dist.len(), 3);
    }

    #[test]
    fn opinion_scale_skips_non_numeric() {
        let f = field("opinion_scale");
        let stats = stats_for(&f, vec![json!("7"), json!("n/a"), json!(8), json!({"value": 9})]);
        assert_eq!(stats.average_rating, Some(8.0));
        assert_eq!(stats.total_answers, 4);
    }

    #[test]
    fn checkbox_percentages_use_total_selections() {
        let f = field("checkboxes");
        let stats = stats_for(&f, vec![json!(["a", "b"]), json!(["a"])]);
        let counts = stats.option_counts.unwrap();
        let pct = stats.option_percentages.unwrap();
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&1));
        assert_eq!(pct.get("a"), Some(&67));
        assert_eq!(pct.get("b"), Some(&33));
    }

    #[test]
    fn single_choice_tallies_unwrapped_values() {
        let f = field("multiple_choice");
        let stats = stats_for(
            &f,
            vec![json!("Red"), json!({"value": "Red"}), json!("Blue"), json!(""), json!(null)],
        );
        assert_eq!(stats.total_answers, 3);
        let counts = stats.option_counts.unwrap();
        assert_eq!(counts.get("Red"), Some(&2));
        assert_eq!(stats.option_percentages.unwrap().get("Blue"), Some(&33));
    }

    #[test]
    fn number_stats_round_to_two_decimals() {
        let f = field("number");
        let stats = stats_for(&f, vec![json!(1), json!("2.5"), json!(3.333), json!("abc")]);
        assert_eq!(stats.average, Some(2.28));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(3.333));
    }

    #[test]
    fn yes_no_accepts_string_variants_only() {
        let f = field("yes_no");
        let stats = stats_for(
            &f,
            vec![json!(true), json!("yes"), json!("Yes"), json!("No"), json!("maybe"), json!("YES")],
        );
        assert_eq!(stats.yes_count, Some(3));
        assert_eq!(stats.no_count, Some(1));
        assert_eq!(stats.yes_percentage, Some(75));
        assert_eq!(stats.no_percentage, Some(25));
    }

    #[test]
    fn free_text_only_counts() {
        let f = field("long_text");
        let stats = stats_for(&f, vec![json!("hello"), json!("  "), json!("world")]);
        assert_eq!(stats.total_answers, 2);
        assert!(stats.option_counts.is_none());
        assert!(stats.average.is_none());
    }

    #[test]
    fn extract_value_unwraps_exactly_one_level() {
        let nested = json!({"value": {"value": 1}});
        assert_eq!(extract_value(&nested), Some(&json!({"value": 1})));
        assert_eq!(extract_value(&json!({"value": null})), None);
        assert_eq!(extract_value(&json!({"other": 1})), Some(&json!({"other": 1})));
    }
}
