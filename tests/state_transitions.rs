use std::fs;
use std::path::PathBuf;

use lesion_terminal::prediction::interpret_prediction;
use lesion_terminal::session::Credentials;
use lesion_terminal::state::{
    AppState, AuthField, AuthMode, Delta, PredictionOutcome, Screen, WorkerCommand, apply_delta,
};

fn logged_in_state() -> AppState {
    let mut state = AppState::new("/photos");
    let creds = Credentials::new("ada@example.com", "secret").expect("valid");
    apply_delta(&mut state, Delta::Authorized(creds));
    state
}

#[test]
fn starts_on_login_screen() {
    let state = AppState::new(".");
    assert_eq!(
        state.screen,
        Screen::Authorize {
            mode: AuthMode::Login
        }
    );
    assert!(state.session.is_none());
}

#[test]
fn empty_login_shows_alert_without_request() {
    let mut state = AppState::new(".");
    state.auth.email = "ada@example.com".to_string();
    assert!(state.submit_auth().is_none());
    assert_eq!(state.alert.as_deref(), Some("Fill up all of the fields!"));
    assert!(!state.is_busy());
}

#[test]
fn complete_login_issues_command_and_shows_loading() {
    let mut state = AppState::new(".");
    state.auth.email = "ada@example.com".to_string();
    state.auth.password = "secret".to_string();
    let cmd = state.submit_auth();
    assert!(matches!(cmd, Some(WorkerCommand::Login(ref c)) if c.email == "ada@example.com"));
    assert_eq!(state.loading.as_deref(), Some("Logging in..."));
}

#[test]
fn sign_up_requires_all_four_fields() {
    let mut state = AppState::new(".");
    state.toggle_auth_mode();
    assert_eq!(
        state.screen,
        Screen::Authorize {
            mode: AuthMode::SignUp
        }
    );
    state.auth.email = "ada@example.com".to_string();
    state.auth.password = "secret".to_string();
    state.auth.repeated_password = "secret".to_string();
    assert!(state.submit_auth().is_none());
    assert!(state.alert.is_some());

    state.dismiss_alert();
    state.auth.first_name = "Ada".to_string();
    assert!(matches!(state.submit_auth(), Some(WorkerCommand::SignUp(_))));
}

#[test]
fn auth_focus_cycles_through_mode_fields() {
    let mut state = AppState::new(".");
    let mode = AuthMode::SignUp;
    assert_eq!(state.auth.focused(mode), AuthField::Email);
    state.auth.focus_prev(mode);
    assert_eq!(state.auth.focused(mode), AuthField::FirstName);
    state.auth.focus_next(mode);
    state.auth.focus_next(mode);
    assert_eq!(state.auth.focused(mode), AuthField::Password);
}

#[test]
fn authorized_moves_home_and_clears_form() {
    let mut state = AppState::new(".");
    state.auth.email = "ada@example.com".to_string();
    state.auth.password = "secret".to_string();
    state.submit_auth();

    let creds = Credentials::new("ada@example.com", "secret").expect("valid");
    apply_delta(&mut state, Delta::Authorized(creds));
    assert_eq!(state.screen, Screen::Home);
    assert!(state.auth.email.is_empty());
    assert!(state.loading.is_none());
    assert!(state.session.is_some());
}

#[test]
fn auth_failure_keeps_login_screen_with_alert() {
    let mut state = AppState::new(".");
    state.loading = Some("Logging in...".to_string());
    apply_delta(
        &mut state,
        Delta::AuthFailed("Password is incorrect!".to_string()),
    );
    assert!(matches!(state.screen, Screen::Authorize { .. }));
    assert_eq!(state.alert.as_deref(), Some("Password is incorrect!"));
    assert!(state.loading.is_none());
}

#[test]
fn predict_needs_a_photo() {
    let mut state = logged_in_state();
    assert!(state.request_prediction().is_none());
    assert_eq!(state.screen, Screen::Home);
}

#[test]
fn photo_picker_flow_then_prediction() {
    let mut state = logged_in_state();
    state.prediction = Some(PredictionOutcome::new(
        interpret_prediction(&[0.1, 0.9]),
        interpret_prediction(&[]),
    ));

    let cmd = state.open_photo_picker();
    assert!(matches!(cmd, Some(WorkerCommand::ScanPhotos(ref dir)) if dir == &PathBuf::from("/photos")));
    assert_eq!(state.screen, Screen::ChoosingPhoto);
    assert!(state.prediction.is_none());

    apply_delta(
        &mut state,
        Delta::SetPhotos(vec![PathBuf::from("/photos/a.jpg"), PathBuf::from("/photos/b.jpg")]),
    );
    state.select_next();
    state.select_next();
    assert_eq!(state.photo_selected, 1);
    assert!(state.pick_selected_photo());
    assert_eq!(state.screen, Screen::Home);
    assert_eq!(state.image_file_name().as_deref(), Some("b.jpg"));

    let cmd = state.request_prediction();
    assert!(matches!(cmd, Some(WorkerCommand::Predict { ref image, .. }) if image == &PathBuf::from("/photos/b.jpg")));
    assert_eq!(state.screen, Screen::Predicting);
    assert_eq!(state.loading.as_deref(), Some("Predicting..."));

    apply_delta(
        &mut state,
        Delta::PredictionReady(PredictionOutcome::new(
            interpret_prediction(&[0.3, 0.7]),
            interpret_prediction(&[0.0; 8]),
        )),
    );
    assert_eq!(state.screen, Screen::Home);
    assert!(state.loading.is_none());
    let outcome = state.prediction.as_ref().expect("prediction stored");
    assert_eq!(outcome.predicted_class, Some("Malignant"));
}

#[test]
fn prediction_failure_returns_home_with_alert() {
    let mut state = logged_in_state();
    state.image_path = Some(PathBuf::from("/photos/a.jpg"));
    state.request_prediction();
    apply_delta(
        &mut state,
        Delta::PredictionFailed("Unexpected error occurred.".to_string()),
    );
    assert_eq!(state.screen, Screen::Home);
    assert_eq!(state.alert.as_deref(), Some("Unexpected error occurred."));
    assert!(state.prediction.is_none());
}

#[test]
fn unrecognised_prediction_is_logged() {
    let mut state = logged_in_state();
    apply_delta(
        &mut state,
        Delta::PredictionReady(PredictionOutcome::new(
            interpret_prediction(&[0.1, 0.2, 0.7]),
            interpret_prediction(&[]),
        )),
    );
    let outcome = state.prediction.as_ref().expect("stored");
    assert!(outcome.binary.is_empty());
    assert_eq!(outcome.predicted_class, None);
    assert!(state.logs.iter().any(|l| l.contains("Unrecognised prediction")));
}

#[test]
fn typed_path_must_be_an_existing_image() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = dir.path().join("arm.png");
    fs::write(&photo, b"png-ish").expect("write");

    let mut state = logged_in_state();
    state.photo_dir = dir.path().to_path_buf();
    state.open_photo_picker();

    state.start_path_input();
    state.path_input = Some("missing.png".to_string());
    assert!(!state.submit_path_input());
    assert!(state.alert.is_some());
    assert_eq!(state.screen, Screen::ChoosingPhoto);

    state.dismiss_alert();
    state.start_path_input();
    state.path_input = Some("arm.png".to_string());
    assert!(state.submit_path_input());
    assert_eq!(state.image_path.as_deref(), Some(photo.as_path()));
}

#[test]
fn history_errors_are_logged_not_alerted() {
    let mut state = logged_in_state();
    let cmd = state.open_history();
    assert!(matches!(cmd, Some(WorkerCommand::FetchHistory(_))));
    assert_eq!(state.screen, Screen::ViewingHistory { enlarged: None });
    assert_eq!(state.loading.as_deref(), Some("Loading history..."));

    apply_delta(
        &mut state,
        Delta::HistoryFailed("Failed to communicate with back-end server. Please try again later!".to_string()),
    );
    assert!(state.alert.is_none());
    assert!(state.loading.is_none());
    assert!(state.logs.back().is_some_and(|l| l.starts_with("[WARN] History error")));
}

#[test]
fn history_enlarge_and_back() {
    let raw = "{'binary': [0.2, 0.8], 'multiclass': [0.1, 0.1, 0.1, 0.1, 0.3, 0.1, 0.1, 0.1]}";
    let (binary, multiclass) =
        lesion_terminal::history::parse_stored_prediction(raw).expect("parses");
    let entry = lesion_terminal::history::HistoryEntry {
        name: "user_1_image_0.jpg".to_string(),
        url: "https://example.com/user_1_image_0.jpg".to_string(),
        binary,
        multiclass,
    };

    let mut state = logged_in_state();
    state.open_history();
    apply_delta(&mut state, Delta::SetHistory(vec![entry.clone(), entry]));
    state.select_next();
    state.enlarge_selected_history();
    assert_eq!(state.screen, Screen::ViewingHistory { enlarged: Some(1) });
    assert!(state.enlarged_history().is_some());

    // Selection is frozen while an item is enlarged.
    state.select_prev();
    assert_eq!(state.history_selected, 1);

    state.close_history();
    assert_eq!(state.screen, Screen::ViewingHistory { enlarged: None });
    state.close_history();
    assert_eq!(state.screen, Screen::Home);
}

#[test]
fn logout_clears_session_and_returns_to_login() {
    let mut state = logged_in_state();
    state.image_path = Some(PathBuf::from("/photos/a.jpg"));
    state.log_out();
    assert!(state.session.is_none());
    assert!(state.image_path.is_none());
    assert_eq!(
        state.screen,
        Screen::Authorize {
            mode: AuthMode::Login
        }
    );
    assert!(state.open_history().is_none());
}

#[test]
fn busy_state_blocks_new_requests() {
    let mut state = logged_in_state();
    state.image_path = Some(PathBuf::from("/photos/a.jpg"));
    assert!(state.request_prediction().is_some());
    assert!(state.request_prediction().is_none());
    assert!(state.open_history().is_none());
}

#[test]
fn console_log_is_bounded() {
    let mut state = AppState::new(".");
    for i in 0..250 {
        state.push_log(format!("line {i}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
}
