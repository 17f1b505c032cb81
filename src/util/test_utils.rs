// External imports
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

// Internal imports
use crate::spam::step_1_data_loader::{Label, Message};

static BACKEND_RNG: Mutex<()> = Mutex::new(());

/// Hold while seeding the backend or initialising parameters. Burn draws
/// parameter values from one process-wide RNG, so concurrent tests would
/// otherwise interleave their draws.
pub fn backend_rng_guard() -> MutexGuard<'static, ()> {
    BACKEND_RNG.lock().unwrap_or_else(PoisonError::into_inner)
}

const HAM_PHRASES: [&str; 10] = [
    "are you coming home for dinner tonight",
    "ok see you at the station later",
    "i will call you when i get there",
    "nah i don't think he goes there",
    "can you pick up some milk on the way",
    "sorry i missed your call",
    "what time does the movie start",
    "he lives around here though",
    "lunch tomorrow sounds good",
    "i am running a bit late",
];

const SPAM_PHRASES: [&str; 10] = [
    "winner you have been selected for a cash prize",
    "urgent claim your free reward now",
    "call now to claim your prize",
    "txt win to receive a free ringtone",
    "congratulations you won a holiday voucher",
    "free entry in a weekly competition",
    "valid 12 hours only claim code",
    "you have won a guaranteed cash award",
    "reply stop to opt out of free offers",
    "your mobile number has won a bonus",
];

/// Generate a labelled message corpus with distinct ham and spam vocabularies
pub fn generate_messages(num_rows: usize, seed: u64) -> Vec<Message> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_rows)
        .map(|i| {
            // Roughly one message in four is spam
            let label = if i % 4 == 0 { Label::Spam } else { Label::Ham };
            let phrases = match label {
                Label::Ham => &HAM_PHRASES,
                Label::Spam => &SPAM_PHRASES,
            };
            let n_phrases = rng.random_range(1..=2);
            let text = (0..n_phrases)
                .filter_map(|_| phrases.choose(&mut rng).copied())
                .collect::<Vec<_>>()
                .join(". ");
            Message::new(label, text)
        })
        .collect()
}

/// Write messages as a Latin-1 CSV with the three trailing blank columns of
/// the public SMS spam dataset
pub fn write_sms_csv(messages: &[Message]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "v1,v2,,,").expect("Failed to write header");
    for message in messages {
        let text = message.text().replace('"', "\"\"");
        writeln!(file, "{},\"{}\",,,", message.label().as_raw(), text).expect("Failed to write row");
    }
    file.flush().expect("Failed to flush temp file");
    file
}
