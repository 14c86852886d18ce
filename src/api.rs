use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::backend::{BackendError, FormFields, fetch_backend_resources};
use crate::config::Config;
use crate::history::{HistoryEntry, parse_history_images};
use crate::http_client::http_client;
use crate::session::{Credentials, SignUpForm};

pub const LOGIN_PATH: &str = "login";
pub const SIGN_UP_PATH: &str = "sign-up";
pub const HISTORY_PATH: &str = "history";
pub const PREDICT_PATH: &str = "predict";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub binary: Vec<f64>,
    #[serde(default)]
    pub multiclass: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = http_client(config.request_timeout)?.clone();
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn post(&self, path: &str, fields: FormFields) -> Result<Value, BackendError> {
        fetch_backend_resources(&self.client, &self.config.endpoint(path), fields)
    }

    pub fn login(&self, credentials: &Credentials) -> Result<(), BackendError> {
        self.post(LOGIN_PATH, credentials.form_fields())?;
        tracing::info!(email = %credentials.email, "logged in");
        Ok(())
    }

    pub fn sign_up(&self, form: &SignUpForm) -> Result<(), BackendError> {
        self.post(SIGN_UP_PATH, form.form_fields())?;
        tracing::info!(email = %form.email, "signed up");
        Ok(())
    }

    pub fn history(&self, credentials: &Credentials) -> Result<Vec<HistoryEntry>, BackendError> {
        let body = self.post(HISTORY_PATH, credentials.form_fields())?;
        parse_history_images(body.get("images").unwrap_or(&Value::Null)).map_err(|err| {
            tracing::warn!(error = %err, "malformed history payload");
            BackendError::Unexpected
        })
    }

    /// `image_base64` is the output of [`crate::transform`].
    pub fn predict(
        &self,
        credentials: &Credentials,
        image_base64: String,
    ) -> Result<PredictResponse, BackendError> {
        let body = self.post(PREDICT_PATH, predict_fields(credentials, image_base64))?;
        let prediction = body.get("prediction").cloned().unwrap_or(Value::Null);
        serde_json::from_value(prediction).map_err(|err| {
            tracing::warn!(error = %err, "malformed prediction payload");
            BackendError::Unexpected
        })
    }
}

pub fn predict_fields(credentials: &Credentials, image_base64: String) -> FormFields {
    let mut fields = credentials.form_fields();
    fields.push(("base64", image_base64));
    fields
}
