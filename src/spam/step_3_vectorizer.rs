// External imports
use burn::tensor::{backend::Backend, Int, Tensor, TensorData};
use log::info;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Internal imports
use super::step_1_data_loader::Message;
use crate::constants::{PADDING_INDEX, TOKEN_FILTERS};
use crate::error::{SpamError, SpamResult};

/// Split text into lowercase tokens
///
/// Every character in `TOKEN_FILTERS` acts as a separator, as does the space.
/// Apostrophes and non-ASCII symbols stay inside tokens.
pub fn text_to_word_sequence(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c == ' ' || TOKEN_FILTERS.contains(c))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Frequency-ranked token index, fitted once on the training texts
///
/// Index 0 is reserved for padding, so the most frequent token is 1. Only
/// the `max_words - 1` most frequent tokens get an index; everything else is
/// out of vocabulary and silently dropped when encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VocabularyRecord", into = "VocabularyRecord")]
pub struct Vocabulary {
    max_words: usize,
    unique_tokens: usize,
    index_word: Vec<String>,
    word_index: HashMap<String, usize>,
}

/// On-disk form of a vocabulary: tokens in index order
#[derive(Serialize, Deserialize)]
struct VocabularyRecord {
    max_words: usize,
    unique_tokens: usize,
    words: Vec<String>,
}

impl From<VocabularyRecord> for Vocabulary {
    fn from(record: VocabularyRecord) -> Self {
        Self::from_ranked(record.words, record.max_words, record.unique_tokens)
    }
}

impl From<Vocabulary> for VocabularyRecord {
    fn from(vocab: Vocabulary) -> Self {
        Self {
            max_words: vocab.max_words,
            unique_tokens: vocab.unique_tokens,
            words: vocab.index_word,
        }
    }
}

impl Vocabulary {
    /// Fit a vocabulary on `texts`
    ///
    /// Tokens are ranked by descending count; ties keep the order in which
    /// the tokens first appeared.
    pub fn fit<S: AsRef<str>>(texts: &[S], max_words: usize) -> Self {
        // token -> (count, first appearance)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        for text in texts {
            for token in text_to_word_sequence(text.as_ref()) {
                let next = counts.len();
                counts.entry(token).or_insert((0, next)).0 += 1;
            }
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

        let unique_tokens = ranked.len();
        let words = ranked.into_iter().map(|(word, _)| word).collect();
        Self::from_ranked(words, max_words, unique_tokens)
    }

    fn from_ranked(mut words: Vec<String>, max_words: usize, unique_tokens: usize) -> Self {
        words.truncate(max_words.saturating_sub(1));
        let word_index = words
            .iter()
            .enumerate()
            .map(|(i, word)| (word.clone(), i + 1))
            .collect();
        Self {
            max_words,
            unique_tokens,
            index_word: words,
            word_index,
        }
    }

    /// Number of indexed tokens (excluding padding)
    pub fn len(&self) -> usize {
        self.index_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_word.is_empty()
    }

    /// Rows needed in an embedding table: one per token plus padding
    pub fn embedding_rows(&self) -> usize {
        self.len() + 1
    }

    /// Distinct tokens seen while fitting, before capping
    pub fn unique_tokens(&self) -> usize {
        self.unique_tokens
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.word_index.get(token).copied()
    }

    /// Encode text as vocabulary indices, preserving token order
    pub fn encode(&self, text: &str) -> Vec<usize> {
        text_to_word_sequence(text)
            .iter()
            .filter_map(|token| self.index_of(token))
            .collect()
    }

    /// Map indices back to tokens, skipping padding and unknown indices
    pub fn decode(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .filter(|&&i| i > 0)
            .filter_map(|&i| self.index_word.get(i - 1).cloned())
            .collect()
    }

    /// Encode a batch of texts in parallel
    pub fn texts_to_sequences<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Vec<usize>> {
        texts.par_iter().map(|text| self.encode(text.as_ref())).collect()
    }
}

/// Length of the longest sequence, 0 for an empty slice
pub fn longest_sequence(sequences: &[Vec<usize>]) -> usize {
    sequences.iter().map(Vec::len).max().unwrap_or(0)
}

/// Pad or truncate every sequence to `width`
///
/// Short sequences are zero-filled on the left. Long sequences lose their
/// leading tokens so that the end of each message is kept.
pub fn pad_sequences(sequences: &[Vec<usize>], width: usize) -> Array2<i64> {
    let mut padded = Array2::from_elem((sequences.len(), width), PADDING_INDEX);
    for (mut row, seq) in padded.rows_mut().into_iter().zip(sequences) {
        let kept = &seq[seq.len().saturating_sub(width)..];
        let start = width - kept.len();
        for (cell, &index) in row.iter_mut().skip(start).zip(kept) {
            *cell = index as i64;
        }
    }
    padded
}

/// Padded sequences and binary targets for one split
#[derive(Debug, Clone)]
pub struct EncodedSplit {
    pub sequences: Array2<i64>,
    pub labels: Vec<f32>,
}

impl EncodedSplit {
    pub fn new(sequences: Array2<i64>, labels: Vec<f32>) -> Self {
        Self { sequences, labels }
    }

    pub fn len(&self) -> usize {
        self.sequences.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        self.sequences.ncols()
    }

    /// Build input and target tensors for the rows at `indices`
    ///
    /// # Returns
    ///
    /// Returns (inputs `[batch, width]`, targets `[batch, 1]`)
    pub fn batch_tensors<B: Backend>(
        &self,
        indices: &[usize],
        device: &B::Device,
    ) -> (Tensor<B, 2, Int>, Tensor<B, 2>) {
        let width = self.width();
        let mut inputs = Vec::with_capacity(indices.len() * width);
        let mut targets = Vec::with_capacity(indices.len());
        for &i in indices {
            inputs.extend(self.sequences.row(i).iter().copied());
            targets.push(self.labels[i]);
        }

        let inputs = sequences_tensor::<B>(inputs, indices.len(), width, device);
        let targets = Tensor::<B, 2>::from_data(TensorData::new(targets, [indices.len(), 1]), device);
        (inputs, targets)
    }
}

/// Wrap a row-major index buffer as an integer tensor `[rows, width]`
pub fn sequences_tensor<B: Backend>(
    flat: Vec<i64>,
    rows: usize,
    width: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    Tensor::<B, 2, Int>::from_data(TensorData::new(flat, [rows, width]), device)
}

/// Copy a float tensor back to the host
pub fn tensor_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> SpamResult<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| SpamError::TensorData(format!("{:?}", e)))
}

/// Vocabulary, sequence width and both encoded splits
#[derive(Debug, Clone)]
pub struct VectorizedData {
    pub vocabulary: Vocabulary,
    pub sequence_length: usize,
    pub train: EncodedSplit,
    pub test: EncodedSplit,
}

fn binary_targets(messages: &[Message]) -> Vec<f32> {
    messages.iter().map(|m| m.binary_label() as f32).collect()
}

/// Fit the vocabulary on the training split and encode both splits
///
/// The sequence width is the longest training sequence; the test split is
/// padded or truncated to the same width.
pub fn vectorize_splits(train: &[Message], test: &[Message], max_words: usize) -> SpamResult<VectorizedData> {
    let train_texts: Vec<&str> = train.iter().map(Message::text).collect();
    let test_texts: Vec<&str> = test.iter().map(Message::text).collect();

    let vocabulary = Vocabulary::fit(&train_texts, max_words);
    info!(
        "Found {} unique tokens, {} indexed",
        vocabulary.unique_tokens(),
        vocabulary.len()
    );

    let train_sequences = vocabulary.texts_to_sequences(&train_texts);
    let sequence_length = longest_sequence(&train_sequences);
    if sequence_length == 0 {
        return Err(SpamError::EmptySequences);
    }
    let test_sequences = vocabulary.texts_to_sequences(&test_texts);

    let train = EncodedSplit::new(pad_sequences(&train_sequences, sequence_length), binary_targets(train));
    let test = EncodedSplit::new(pad_sequences(&test_sequences, sequence_length), binary_targets(test));

    Ok(VectorizedData {
        vocabulary,
        sequence_length,
        train,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spam::step_1_data_loader::Label;
    use burn_ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn test_text_to_word_sequence() {
        let tokens = text_to_word_sequence("Nah I don't think he goes to usf, he lives around here though");
        assert_eq!(
            tokens,
            vec!["nah", "i", "don't", "think", "he", "goes", "to", "usf", "he", "lives", "around", "here", "though"]
        );
        assert_eq!(text_to_word_sequence("WIN!!  \u{a3}900\tnow"), vec!["win", "\u{a3}900", "now"]);
        assert!(text_to_word_sequence("?!...").is_empty());
    }

    #[test]
    fn test_vocabulary_ranking() {
        let vocab = Vocabulary::fit(&["b a c", "a c", "a"], 100);
        assert_eq!(vocab.index_of("a"), Some(1));
        assert_eq!(vocab.index_of("c"), Some(2));
        assert_eq!(vocab.index_of("b"), Some(3));

        // ties keep first appearance order
        let vocab = Vocabulary::fit(&["z y x"], 100);
        assert_eq!(vocab.encode("x y z"), vec![3, 2, 1]);
    }

    #[test]
    fn test_vocabulary_cap() {
        let vocab = Vocabulary::fit(&["a a a b b c"], 3);
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.unique_tokens(), 3);
        assert_eq!(vocab.embedding_rows(), 3);
        assert_eq!(vocab.index_of("c"), None);
        assert_eq!(vocab.encode("c b a"), vec![2, 1]);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let vocab = Vocabulary::fit(&["free prize call now", "call me later"], 100);
        let encoded = vocab.encode("Call me now, unknownword free");
        let decoded = vocab.decode(&encoded);
        assert_eq!(decoded, vec!["call", "me", "now", "free"]);

        // padding and out-of-range indices are skipped
        assert_eq!(vocab.decode(&[0, 0, 1, 999]), vec!["call"]);
    }

    #[test]
    fn test_pad_sequences() {
        let sequences = vec![vec![1, 2], vec![3, 4, 5, 6, 7], vec![]];
        let padded = pad_sequences(&sequences, 4);
        assert_eq!(padded.dim(), (3, 4));
        assert_eq!(padded.row(0).to_vec(), vec![0, 0, 1, 2]);
        // truncation keeps the trailing tokens
        assert_eq!(padded.row(1).to_vec(), vec![4, 5, 6, 7]);
        assert_eq!(padded.row(2).to_vec(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_vectorize_splits_uses_train_width_and_vocabulary() {
        let train = vec![
            Message::new(Label::Ham, "see you at home"),
            Message::new(Label::Spam, "win cash now"),
        ];
        let test = vec![
            Message::new(Label::Spam, "win win win cash prize now claim today"),
            Message::new(Label::Ham, "home"),
        ];

        let data = vectorize_splits(&train, &test, 100).unwrap();
        let fitted = Vocabulary::fit(&["see you at home", "win cash now"], 100);
        assert_eq!(data.vocabulary, fitted);
        assert_eq!(data.vocabulary.len(), 7);
        assert_eq!(data.sequence_length, 4);
        assert_eq!(data.train.width(), 4);
        assert_eq!(data.test.width(), 4);
        assert_eq!(data.train.labels, vec![0.0, 1.0]);
        assert_eq!(data.test.labels, vec![1.0, 0.0]);

        // "prize", "claim", "today" are unknown; the last four known tokens are kept
        let win = data.vocabulary.index_of("win").unwrap() as i64;
        let cash = data.vocabulary.index_of("cash").unwrap() as i64;
        let now = data.vocabulary.index_of("now").unwrap() as i64;
        assert_eq!(data.test.sequences.row(0).to_vec(), vec![win, win, cash, now]);
    }

    #[test]
    fn test_vectorize_rejects_empty_training_text() {
        let train = vec![Message::new(Label::Ham, "..."), Message::new(Label::Spam, "!!!")];
        let result = vectorize_splits(&train, &[], 100);
        assert!(matches!(result, Err(SpamError::EmptySequences)));
    }

    #[test]
    fn test_vocabulary_serde_round_trip() {
        let vocab = Vocabulary::fit(&["a b c a"], 3);
        let json = serde_json::to_string(&vocab).unwrap();
        let restored: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vocab);
        assert_eq!(restored.index_of("a"), Some(1));
    }

    #[test]
    fn test_batch_tensors() {
        let device = NdArrayDevice::default();
        let split = EncodedSplit::new(pad_sequences(&[vec![1], vec![2, 3]], 3), vec![0.0, 1.0]);
        let (inputs, targets) = split.batch_tensors::<NdArray>(&[1, 0], &device);
        assert_eq!(inputs.dims(), [2, 3]);
        assert_eq!(targets.dims(), [2, 1]);
        let values: Vec<i64> = inputs.into_data().to_vec::<i64>().unwrap();
        assert_eq!(values, vec![0, 2, 3, 0, 0, 1]);
    }
}
