// External crates
use anyhow::{bail, Context, Result};
use burn::tensor::backend::Backend as BurnBackendTrait;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

// Local crate
use spam_lstm::constants;
use spam_lstm::spam::step_1_data_loader::load_messages;
use spam_lstm::spam::step_6_train_model::{train_classifier, TrainingConfig};
use spam_lstm::spam::step_7_prediction::predict_spam;
use spam_lstm::spam::step_8_model_serialization::{load_classifier, save_classifier, verify_model};
use spam_lstm::spam::{InferenceBackend, TrainingBackend};
use spam_lstm::util::file_utils::TextEncoding;
use spam_lstm::util::history_report::{plot_history, write_history_csv};
use spam_lstm::util::model_logger::ModelExperiment;

const USAGE: &str = "usage:\n  spam_lstm [train] [CSV_PATH] [MODEL_DIR] [SEED]\n  spam_lstm predict MODEL_DIR TEXT...";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("predict") => {
            let model_dir = args.get(1).context(USAGE)?;
            if args.len() < 3 {
                bail!(USAGE);
            }
            let text = args[2..].join(" ");
            run_predict(Path::new(model_dir), &text)
        }
        Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some("train") => run_train(&args[1..]),
        _ => run_train(&args),
    }
}

fn run_train(args: &[String]) -> Result<()> {
    let csv_path = args.first().map(String::as_str).unwrap_or(constants::DEFAULT_DATA_PATH);
    let model_dir = PathBuf::from(args.get(1).map(String::as_str).unwrap_or(constants::DEFAULT_MODEL_DIR));
    let mut config = TrainingConfig::default();
    if let Some(seed) = args.get(2) {
        config.seed = seed.parse().with_context(|| format!("Invalid seed: {}", seed))?;
    }
    println!("Using data: {} | model dir: {} | seed: {}", csv_path, model_dir.display(), config.seed);

    let device = <TrainingBackend as BurnBackendTrait>::Device::default();

    let messages = load_messages(csv_path, TextEncoding::Latin1)
        .with_context(|| format!("Failed to load dataset {}", csv_path))?;

    let started = Instant::now();
    let outcome = train_classifier::<TrainingBackend>(messages, &config, &device)?;
    let elapsed = started.elapsed().as_secs_f64();
    println!("Training completed in {:.1}s.", elapsed);

    save_classifier(&outcome.classifier, &model_dir)?;
    println!("Model saved at: {}", model_dir.display());

    let history_path = write_history_csv(&outcome.history, &model_dir)?;
    let (loss_plot, accuracy_plot) = plot_history(&outcome.history, &model_dir)?;
    println!(
        "History written to {} (plots: {}, {})",
        history_path.display(),
        loss_plot.display(),
        accuracy_plot.display()
    );

    let mut experiment = ModelExperiment::new(
        csv_path,
        &config,
        outcome.classifier.vocabulary().len(),
        outcome.classifier.sequence_length(),
    );
    experiment.set_final_metrics(&outcome.history);
    experiment.set_training_time(elapsed);
    experiment.add_note(&format!(
        "train rows: {} | test rows: {} | backend: ndarray (cpu)",
        outcome.train_shape.0, outcome.test_shape.0
    ));
    experiment.save(&model_dir)?;

    let result = predict_spam(constants::EXAMPLE_SPAM, &outcome.classifier, &device)?;
    println!("Prediction: {}", result);

    Ok(())
}

fn run_predict(model_dir: &Path, text: &str) -> Result<()> {
    if !verify_model(model_dir)? {
        bail!("No saved model in {}", model_dir.display());
    }

    let device = <InferenceBackend as BurnBackendTrait>::Device::default();
    let classifier = load_classifier::<InferenceBackend>(model_dir, &device)?;
    let result = predict_spam(text, &classifier, &device)?;
    println!("Prediction: {}", result);
    Ok(())
}
