use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Failed to communicate with back-end server. Please try again later!")]
    Transport,
    /// The server answered `result: "fail"`; carries its `reason` verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error("Unexpected error occurred.")]
    Unexpected,
}

/// Ordered multipart text fields, kept inspectable until the request is sent.
pub type FormFields = Vec<(&'static str, String)>;

pub fn to_form(fields: FormFields) -> Form {
    fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
}

/// Single POST of `fields` to `url`. No retries.
pub fn fetch_backend_resources(
    client: &Client,
    url: &str,
    fields: FormFields,
) -> Result<Value, BackendError> {
    tracing::debug!(%url, fields = fields.len(), "posting form");
    let resp = client
        .post(url)
        .multipart(to_form(fields))
        .send()
        .map_err(|err| {
            tracing::warn!(%url, error = %err, "request failed");
            BackendError::Transport
        })?;

    let status = resp.status();
    let body = resp.text().map_err(|err| {
        tracing::warn!(%url, error = %err, "failed reading body");
        BackendError::Transport
    })?;
    let result = interpret_response(status, &body);
    if let Err(err) = &result {
        tracing::info!(%url, %status, error = %err, "backend rejected request");
    }
    result
}

/// Applies the `result`/`reason` contract to a raw response.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<Value, BackendError> {
    if !status.is_success() {
        return Err(BackendError::Transport);
    }
    let Ok(data) = serde_json::from_str::<Value>(body.trim()) else {
        return Err(BackendError::Unexpected);
    };
    match data.get("result").and_then(Value::as_str) {
        Some("success") => Ok(data),
        Some("fail") => {
            let reason = data
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Err(BackendError::Rejected(reason))
        }
        _ => Err(BackendError::Unexpected),
    }
}
