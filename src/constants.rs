// Vocabulary
pub const MAX_VOCAB_SIZE: usize = 20_000; // Only the MAX_VOCAB_SIZE - 1 most frequent tokens get an index
pub const PADDING_INDEX: i64 = 0;

// Characters stripped from text before splitting into tokens
pub const TOKEN_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

// Model parameters
pub const EMBEDDING_DIM: usize = 20;
pub const HIDDEN_SIZE: usize = 15;

// Training
pub const EPOCHS: usize = 10;
pub const BATCH_SIZE: usize = 32;
pub const LEARNING_RATE: f64 = 0.001;
pub const ADAM_EPSILON: f32 = 1e-7;
pub const BCE_EPSILON: f64 = 1e-7; // Probabilities are clamped to [eps, 1 - eps] before log
pub const DEFAULT_SEED: u64 = 42;

// Data preprocessing
pub const TEST_SPLIT_RATIO: f64 = 0.33; // 33% of rows are held out

// Prediction
pub const SPAM_THRESHOLD: f64 = 0.5; // Inclusive: p >= threshold is spam

// Default paths and artifact file names
pub const DEFAULT_DATA_PATH: &str = "spam.csv";
pub const DEFAULT_MODEL_DIR: &str = "models/spam_lstm";
pub const MODEL_FILE_NAME: &str = "model";
pub const VOCAB_FILE_NAME: &str = "vocab.json";
pub const HISTORY_FILE_NAME: &str = "history.csv";
pub const LOSS_PLOT_FILE_NAME: &str = "loss.svg";
pub const ACCURACY_PLOT_FILE_NAME: &str = "accuracy.svg";
pub const EXPERIMENT_FILE_NAME: &str = "experiment.json";

// Example messages used for the post-training sanity prediction
pub const EXAMPLE_HAM: &str = "Nah I don't think he goes to usf, he lives around here though";
pub const EXAMPLE_SPAM: &str = "WINNER!! As a valued network customer you have been selected to receivea \u{a3}900 prize reward! To claim call 09061701461. Claim code KL341. Valid 12 hours only.";
