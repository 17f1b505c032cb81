// External imports
use log::{debug, info};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// Internal imports
use crate::error::{SpamError, SpamResult};
use crate::util::file_utils::{read_text_csv, TextEncoding};

pub const LABEL_COLUMN: &str = "labels";
pub const TEXT_COLUMN: &str = "data";

/// Class of an SMS message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// Parse a raw label cell. Only the exact strings `ham` and `spam` are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        [Label::Ham, Label::Spam]
            .into_iter()
            .find(|label| label.as_raw() == raw)
    }

    /// Binary target: ham is 0, spam is 1
    pub fn as_binary(self) -> u8 {
        match self {
            Label::Ham => 0,
            Label::Spam => 1,
        }
    }

    /// The raw label as it appears in the dataset
    pub fn as_raw(self) -> &'static str {
        match self {
            Label::Ham => "ham",
            Label::Spam => "spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Ham => write!(f, "Ham"),
            Label::Spam => write!(f, "Spam"),
        }
    }
}

/// One dataset row. The binary label is derived when the row is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    label: Label,
    text: String,
    binary_label: u8,
}

impl Message {
    pub fn new(label: Label, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
            binary_label: label.as_binary(),
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn binary_label(&self) -> u8 {
        self.binary_label
    }
}

/// Load labelled messages from a CSV file
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file; the first row is a header
/// * `encoding` - Byte encoding of the file
///
/// # Returns
///
/// Returns every row as a `Message`, or the first data error encountered
pub fn load_messages<P: AsRef<Path>>(file_path: P, encoding: TextEncoding) -> SpamResult<Vec<Message>> {
    info!("Loading data from {}", file_path.as_ref().display());
    let raw = read_text_csv(file_path, encoding)?;
    let df = select_label_and_text(raw)?;
    let messages = messages_from_dataframe(&df)?;

    let spam = messages.iter().filter(|m| m.label() == Label::Spam).count();
    info!(
        "Loaded {} messages ({} ham, {} spam)",
        messages.len(),
        messages.len() - spam,
        spam
    );
    Ok(messages)
}

/// Keep the first two columns as `labels` / `data` and drop the header row
///
/// Any trailing columns (blank header cells, overflow from unquoted commas)
/// are discarded.
pub fn select_label_and_text(raw: DataFrame) -> SpamResult<DataFrame> {
    let width = raw.width();
    if width < 2 {
        return Err(SpamError::MissingColumns { expected: 2, found: width });
    }
    if width > 2 {
        debug!("Dropping {} trailing columns", width - 2);
    }

    let mut columns: Vec<Column> = raw.get_columns()[..2].to_vec();
    columns[0].rename(PlSmallStr::from_static(LABEL_COLUMN));
    columns[1].rename(PlSmallStr::from_static(TEXT_COLUMN));
    let df = DataFrame::new(columns)?;

    Ok(df.slice(1, df.height().saturating_sub(1)))
}

/// Convert a DataFrame with `labels` and `data` columns into messages
///
/// Rows are numbered from 1 in error messages. Rows with an unknown label or
/// an empty cell are rejected rather than coerced.
pub fn messages_from_dataframe(df: &DataFrame) -> SpamResult<Vec<Message>> {
    let labels = df.column(LABEL_COLUMN)?.str()?;
    let texts = df.column(TEXT_COLUMN)?.str()?;

    labels
        .into_iter()
        .zip(texts.into_iter())
        .enumerate()
        .map(|(i, (label, text))| {
            let row = i + 1;
            let raw = label.ok_or(SpamError::MissingValue { row, column: LABEL_COLUMN })?;
            let label = Label::parse(raw).ok_or_else(|| SpamError::UnknownLabel {
                row,
                value: raw.to_string(),
            })?;
            let text = text.ok_or(SpamError::MissingValue { row, column: TEXT_COLUMN })?;
            Ok(Message::new(label, text))
        })
        .collect()
}
