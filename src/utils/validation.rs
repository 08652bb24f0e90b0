use std::borrow::Cow;

use validator::ValidationError;

/// Webhook targets must be absolute http(s) URLs with a host.
pub fn validate_webhook_url(raw: &str) -> Result<(), ValidationError> {
    let parsed = url::Url::parse(raw).map_err(|_| invalid_url("malformed url"))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        "http" | "https" => Err(invalid_url("url has no host")),
        _ => Err(invalid_url("url scheme must be http or https")),
    }
}

pub fn validate_event_names(events: &[String]) -> Result<(), ValidationError> {
    if events.is_empty() {
        return Err(with_message("events", Cow::from("at least one event is required")));
    }
    match events
        .iter()
        .find(|e| crate::models::webhook::WebhookEvent::parse(e).is_none())
    {
        Some(unknown) => Err(with_message(
            "events",
            Cow::from(format!("unknown event: {}", unknown)),
        )),
        None => Ok(()),
    }
}

fn invalid_url(msg: &'static str) -> ValidationError {
    with_message("url", Cow::from(msg))
}

fn with_message(code: &'static str, message: Cow<'static, str>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message);
    err
}
