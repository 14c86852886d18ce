use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use lesion_terminal::api::ApiClient;
use lesion_terminal::config::Config;
use lesion_terminal::logging;
use lesion_terminal::prediction::{LabeledPrediction, format_score, interpret_prediction};
use lesion_terminal::session::Credentials;
use lesion_terminal::state::PredictionOutcome;
use lesion_terminal::transform::{TransportEncoding, encode_file};

const USAGE: &str = "usage: lesion_predict <image-path> | lesion_predict --history";

// One-shot client for scripting: credentials come from LESION_EMAIL / LESION_PASSWORD.
fn main() -> Result<()> {
    let config = Config::load();
    logging::init_stderr();

    let arg = std::env::args().nth(1).context(USAGE)?;
    let email = std::env::var("LESION_EMAIL").unwrap_or_default();
    let password = std::env::var("LESION_PASSWORD").unwrap_or_default();
    let credentials = Credentials::new(email, password)
        .context("set LESION_EMAIL and LESION_PASSWORD")?;

    let api = ApiClient::new(config)?;

    if arg == "--history" {
        let entries = api.history(&credentials)?;
        if entries.is_empty() {
            println!("No history yet");
        }
        for entry in entries {
            println!("{}  {}", entry.name, entry.url);
            print_table(&entry.binary);
            print_table(&entry.multiclass);
            println!();
        }
        return Ok(());
    }
    if arg.starts_with('-') {
        bail!(USAGE);
    }

    let path = PathBuf::from(arg);
    let encoded = encode_file(&path, TransportEncoding::Raw)?;
    let resp = api.predict(&credentials, encoded)?;
    let outcome = PredictionOutcome::new(
        interpret_prediction(&resp.binary),
        interpret_prediction(&resp.multiclass),
    );

    match outcome.predicted_class {
        Some(class) => println!("Predicted class: {class}"),
        None => println!("Unrecognised prediction ({} scores)", resp.binary.len()),
    }
    print_table(&outcome.binary);
    print_table(&outcome.multiclass);
    Ok(())
}

fn print_table(prediction: &LabeledPrediction) {
    for (label, score) in prediction.sorted_desc() {
        println!("  {label:<30} {:>8}", format_score(score));
    }
}
