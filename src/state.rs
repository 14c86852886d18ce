use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::history::HistoryEntry;
use crate::photos::{is_image_path, resolve_input_path};
use crate::prediction::{LabeledPrediction, label_with_biggest_value};
use crate::session::{Credentials, SignUpForm};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Email,
    Password,
    RepeatPassword,
    FirstName,
}

impl AuthMode {
    pub fn fields(self) -> &'static [AuthField] {
        match self {
            AuthMode::Login => &[AuthField::Email, AuthField::Password],
            AuthMode::SignUp => &[
                AuthField::Email,
                AuthField::Password,
                AuthField::RepeatPassword,
                AuthField::FirstName,
            ],
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            AuthMode::Login => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::Login,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub email: String,
    pub password: String,
    pub repeated_password: String,
    pub first_name: String,
    pub focus: usize,
}

impl AuthForm {
    pub fn value(&self, field: AuthField) -> &str {
        match field {
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
            AuthField::RepeatPassword => &self.repeated_password,
            AuthField::FirstName => &self.first_name,
        }
    }

    pub fn value_mut(&mut self, field: AuthField) -> &mut String {
        match field {
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
            AuthField::RepeatPassword => &mut self.repeated_password,
            AuthField::FirstName => &mut self.first_name,
        }
    }

    pub fn focused(&self, mode: AuthMode) -> AuthField {
        let fields = mode.fields();
        fields[self.focus % fields.len()]
    }

    pub fn focus_next(&mut self, mode: AuthMode) {
        self.focus = (self.focus + 1) % mode.fields().len();
    }

    pub fn focus_prev(&mut self, mode: AuthMode) {
        let len = mode.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn sign_up_form(&self) -> SignUpForm {
        SignUpForm {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            password: self.password.clone(),
            repeated_password: self.repeated_password.clone(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Authorize { mode: AuthMode },
    Home,
    ChoosingPhoto,
    Predicting,
    ViewingHistory { enlarged: Option<usize> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub binary: LabeledPrediction,
    pub multiclass: LabeledPrediction,
    pub predicted_class: Option<&'static str>,
}

impl PredictionOutcome {
    pub fn new(binary: LabeledPrediction, multiclass: LabeledPrediction) -> Self {
        let predicted_class = label_with_biggest_value(&binary);
        Self {
            binary,
            multiclass,
            predicted_class,
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkerCommand {
    Login(Credentials),
    SignUp(SignUpForm),
    Predict {
        credentials: Credentials,
        image: PathBuf,
    },
    FetchHistory(Credentials),
    ScanPhotos(PathBuf),
}

#[derive(Debug, Clone)]
pub enum Delta {
    Authorized(Credentials),
    AuthFailed(String),
    SetPhotos(Vec<PathBuf>),
    PredictionReady(PredictionOutcome),
    PredictionFailed(String),
    SetHistory(Vec<HistoryEntry>),
    HistoryFailed(String),
    Log(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub auth: AuthForm,
    pub session: Option<Credentials>,
    pub photo_dir: PathBuf,
    pub photos: Vec<PathBuf>,
    pub photo_selected: usize,
    /// `Some` while the user is typing a path in the photo picker.
    pub path_input: Option<String>,
    pub image_path: Option<PathBuf>,
    pub prediction: Option<PredictionOutcome>,
    pub history: Vec<HistoryEntry>,
    pub history_selected: usize,
    pub loading: Option<String>,
    /// Blocking message; must be dismissed before anything else.
    pub alert: Option<String>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(photo_dir: impl Into<PathBuf>) -> Self {
        Self {
            screen: Screen::Authorize {
                mode: AuthMode::Login,
            },
            auth: AuthForm::default(),
            session: None,
            photo_dir: photo_dir.into(),
            photos: Vec::new(),
            photo_selected: 0,
            path_input: None,
            image_path: None,
            prediction: None,
            history: Vec::new(),
            history_selected: 0,
            loading: None,
            alert: None,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.loading.is_some()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn toggle_auth_mode(&mut self) {
        if let Screen::Authorize { mode } = self.screen {
            self.screen = Screen::Authorize {
                mode: mode.toggled(),
            };
            self.auth.focus = 0;
        }
    }

    /// Validates the auth form and, if complete, returns the request to send.
    pub fn submit_auth(&mut self) -> Option<WorkerCommand> {
        let Screen::Authorize { mode } = self.screen else {
            return None;
        };
        if self.is_busy() {
            return None;
        }
        let command = match mode {
            AuthMode::Login => Credentials::new(self.auth.email.clone(), self.auth.password.clone())
                .map(WorkerCommand::Login),
            AuthMode::SignUp => {
                let form = self.auth.sign_up_form();
                form.validate().map(|_| WorkerCommand::SignUp(form))
            }
        };
        match command {
            Ok(cmd) => {
                let text = match mode {
                    AuthMode::Login => "Logging in...",
                    AuthMode::SignUp => "Signing up...",
                };
                self.loading = Some(text.to_string());
                Some(cmd)
            }
            Err(err) => {
                self.alert = Some(err.to_string());
                None
            }
        }
    }

    pub fn open_photo_picker(&mut self) -> Option<WorkerCommand> {
        if self.screen != Screen::Home || self.is_busy() {
            return None;
        }
        self.screen = Screen::ChoosingPhoto;
        self.prediction = None;
        self.path_input = None;
        Some(WorkerCommand::ScanPhotos(self.photo_dir.clone()))
    }

    pub fn cancel_photo_picker(&mut self) {
        if self.screen == Screen::ChoosingPhoto {
            self.path_input = None;
            self.screen = Screen::Home;
        }
    }

    pub fn pick_photo(&mut self, path: PathBuf) -> bool {
        if self.screen != Screen::ChoosingPhoto {
            return false;
        }
        self.push_log(format!("[INFO] Selected {}", path.display()));
        self.image_path = Some(path);
        self.prediction = None;
        self.path_input = None;
        self.screen = Screen::Home;
        true
    }

    pub fn pick_selected_photo(&mut self) -> bool {
        match self.photos.get(self.photo_selected).cloned() {
            Some(path) => self.pick_photo(path),
            None => false,
        }
    }

    pub fn start_path_input(&mut self) {
        if self.screen == Screen::ChoosingPhoto {
            self.path_input = Some(String::new());
        }
    }

    pub fn submit_path_input(&mut self) -> bool {
        let Some(input) = self.path_input.take() else {
            return false;
        };
        let Some(path) = resolve_input_path(&input, &self.photo_dir) else {
            return false;
        };
        if !path.is_file() || !is_image_path(&path) {
            self.alert = Some(format!("No image file at {}", path.display()));
            return false;
        }
        self.pick_photo(path)
    }

    pub fn request_prediction(&mut self) -> Option<WorkerCommand> {
        if self.screen != Screen::Home || self.is_busy() {
            return None;
        }
        let Some(image) = self.image_path.clone() else {
            self.push_log("[INFO] Choose a photo first");
            return None;
        };
        let credentials = self.session.clone()?;
        self.screen = Screen::Predicting;
        self.prediction = None;
        self.loading = Some("Predicting...".to_string());
        Some(WorkerCommand::Predict { credentials, image })
    }

    pub fn open_history(&mut self) -> Option<WorkerCommand> {
        if self.screen != Screen::Home || self.is_busy() {
            return None;
        }
        let credentials = self.session.clone()?;
        self.screen = Screen::ViewingHistory { enlarged: None };
        self.history.clear();
        self.history_selected = 0;
        self.loading = Some("Loading history...".to_string());
        Some(WorkerCommand::FetchHistory(credentials))
    }

    /// Minimizes an enlarged item first, then leaves the history screen.
    pub fn close_history(&mut self) {
        match self.screen {
            Screen::ViewingHistory { enlarged: Some(_) } => {
                self.screen = Screen::ViewingHistory { enlarged: None };
            }
            Screen::ViewingHistory { enlarged: None } => self.screen = Screen::Home,
            _ => {}
        }
    }

    pub fn enlarge_selected_history(&mut self) {
        if matches!(self.screen, Screen::ViewingHistory { .. })
            && self.history_selected < self.history.len()
        {
            self.screen = Screen::ViewingHistory {
                enlarged: Some(self.history_selected),
            };
        }
    }

    pub fn enlarged_history(&self) -> Option<&HistoryEntry> {
        match self.screen {
            Screen::ViewingHistory { enlarged: Some(idx) } => self.history.get(idx),
            _ => None,
        }
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::ChoosingPhoto if !self.photos.is_empty() => {
                self.photo_selected = (self.photo_selected + 1).min(self.photos.len() - 1);
            }
            Screen::ViewingHistory { enlarged: None } if !self.history.is_empty() => {
                self.history_selected = (self.history_selected + 1).min(self.history.len() - 1);
            }
            _ => {}
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::ChoosingPhoto => self.photo_selected = self.photo_selected.saturating_sub(1),
            Screen::ViewingHistory { enlarged: None } => {
                self.history_selected = self.history_selected.saturating_sub(1)
            }
            _ => {}
        }
    }

    pub fn log_out(&mut self) {
        if self.session.take().is_none() {
            return;
        }
        self.auth.clear();
        self.image_path = None;
        self.prediction = None;
        self.history.clear();
        self.history_selected = 0;
        self.photos.clear();
        self.photo_selected = 0;
        self.path_input = None;
        self.loading = None;
        self.screen = Screen::Authorize {
            mode: AuthMode::Login,
        };
        self.push_log("[INFO] Logged out");
    }

    pub fn image_file_name(&self) -> Option<String> {
        self.image_path.as_deref().map(display_name)
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Authorized(credentials) => {
            state.loading = None;
            state.push_log(format!("[INFO] Signed in as {}", credentials.email));
            state.session = Some(credentials);
            state.auth.clear();
            state.screen = Screen::Home;
        }
        Delta::AuthFailed(message) => {
            state.loading = None;
            state.alert = Some(message);
        }
        Delta::SetPhotos(photos) => {
            if photos.is_empty() {
                state.push_log(format!(
                    "[INFO] No images in {}",
                    state.photo_dir.display()
                ));
            }
            state.photos = photos;
            state.photo_selected = 0;
        }
        Delta::PredictionReady(outcome) => {
            state.loading = None;
            match outcome.predicted_class {
                Some(class) => state.push_log(format!("[INFO] Predicted: {class}")),
                None => state.push_log("[WARN] Unrecognised prediction"),
            }
            state.prediction = Some(outcome);
            if state.screen == Screen::Predicting {
                state.screen = Screen::Home;
            }
        }
        Delta::PredictionFailed(message) => {
            state.loading = None;
            state.alert = Some(message);
            if state.screen == Screen::Predicting {
                state.screen = Screen::Home;
            }
        }
        Delta::SetHistory(entries) => {
            state.loading = None;
            state.push_log(format!("[INFO] Loaded {} history items", entries.len()));
            state.history = entries;
            state.history_selected = 0;
        }
        Delta::HistoryFailed(message) => {
            // Logged only; the history screen stays open and empty.
            state.loading = None;
            state.push_log(format!("[WARN] History error: {message}"));
        }
        Delta::Log(message) => state.push_log(message),
    }
}
