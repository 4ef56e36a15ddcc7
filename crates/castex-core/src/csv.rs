//! Record flattening and CSV rendering.
//!
//! CSV output is a fixed projection of each record, not a dump of every
//! flattened path: upstream can add fields without changing the columns.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{Error, InvalidInputError};
use crate::record::{FeedRecord, count_value, embed_url};

/// Column names, in output order.
pub const COLUMNS: [&str; 13] = [
    "hash",
    "thread_hash",
    "parent_hash",
    "fid",
    "username",
    "display_name",
    "text",
    "timestamp",
    "likes",
    "recasts",
    "replies",
    "embed_url",
    "channel_id",
];

/// Flatten a record into dotted paths.
///
/// Nested objects are walked and their keys joined with `.`; arrays,
/// scalars and nulls are leaves. An empty nested object contributes nothing.
///
/// ```
/// use castex_core::{FeedRecord, flatten};
/// use serde_json::json;
///
/// let record = FeedRecord::new(json!({
///     "hash": "0x1",
///     "author": {"fid": 3, "pfp": {"url": "https://x/y.png"}},
///     "embeds": [{"url": "https://a"}]
/// })).unwrap();
///
/// let flat = flatten(&record);
/// assert_eq!(flat["author.fid"], json!(3));
/// assert_eq!(flat["author.pfp.url"], json!("https://x/y.png"));
/// assert!(flat["embeds"].is_array());
/// ```
pub fn flatten(record: &FeedRecord) -> Map<String, Value> {
    let mut flat = Map::new();
    flatten_into(&mut flat, "", record.as_map());
    flat
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: &str, object: &Map<String, Value>) {
    for (key, value) in object {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(child) => flatten_into(flat, &path, child),
            leaf => {
                flat.insert(path, leaf.clone());
            }
        }
    }
}

/// Channel URL if `parent_url` looks like one.
///
/// Upstream has no dedicated channel field on this endpoint, so any parent
/// URL containing `"channel"` is taken as the channel reference.
pub fn channel_reference(parent_url: Option<&str>) -> Option<&str> {
    parent_url.filter(|url| url.contains("channel"))
}

/// One CSV cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvValue {
    Text(String),
    Number(u64),
    /// Renders as an empty, unquoted cell.
    Empty,
}

impl CsvValue {
    fn text(value: Option<&Value>) -> Self {
        CsvValue::Text(value.and_then(Value::as_str).unwrap_or_default().to_string())
    }

    fn number_or_empty(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_u64)
            .map(CsvValue::Number)
            .unwrap_or(CsvValue::Empty)
    }

    fn render_legacy(&self, out: &mut String) {
        match self {
            CsvValue::Text(s) => {
                let cleaned = s
                    .replace('"', "\"\"")
                    .replace("\r\n", " ")
                    .replace(['\n', '\r'], " ");
                out.push('"');
                out.push_str(cleaned.trim());
                out.push('"');
            }
            CsvValue::Number(n) => out.push_str(&n.to_string()),
            CsvValue::Empty => {}
        }
    }

    fn as_field(&self) -> String {
        match self {
            CsvValue::Text(s) => s.clone(),
            CsvValue::Number(n) => n.to_string(),
            CsvValue::Empty => String::new(),
        }
    }
}

/// The fixed 13-column projection of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastRow {
    cells: [CsvValue; 13],
}

impl CastRow {
    /// Project a record onto [`COLUMNS`].
    pub fn from_record(record: &FeedRecord) -> Self {
        Self::from_flat(&flatten(record))
    }

    /// Project an already flattened record onto [`COLUMNS`].
    pub fn from_flat(flat: &Map<String, Value>) -> Self {
        let count = |paths: &[&str]| {
            let n = paths
                .iter()
                .find_map(|path| count_value(flat.get(*path)))
                .unwrap_or(0);
            CsvValue::Number(n)
        };

        let embed = flat
            .get("embeds")
            .and_then(Value::as_array)
            .and_then(|embeds| embeds.first())
            .and_then(embed_url);

        let channel = channel_reference(flat.get("parent_url").and_then(Value::as_str));

        Self {
            cells: [
                CsvValue::text(flat.get("hash")),
                CsvValue::text(flat.get("thread_hash")),
                CsvValue::text(flat.get("parent_hash")),
                CsvValue::number_or_empty(flat.get("author.fid")),
                CsvValue::text(flat.get("author.username")),
                CsvValue::text(flat.get("author.display_name")),
                CsvValue::text(flat.get("text")),
                CsvValue::text(flat.get("timestamp")),
                count(&["reactions.likes_count", "reactions.likes"]),
                count(&["reactions.recasts_count", "reactions.recasts"]),
                count(&["replies.count"]),
                CsvValue::Text(embed.unwrap_or_default().to_string()),
                CsvValue::Text(channel.unwrap_or_default().to_string()),
            ],
        }
    }

    /// Cell for a column name.
    pub fn get(&self, column: &str) -> Option<&CsvValue> {
        COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| &self.cells[idx])
    }

    /// Cells in column order.
    pub fn cells(&self) -> &[CsvValue] {
        &self.cells
    }
}

/// How cells are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvDialect {
    /// Strings quoted with `""` escaping, newlines folded to spaces,
    /// surrounding whitespace trimmed, numbers bare, `\n` line ends.
    #[default]
    Legacy,
    /// Every field quoted, newlines kept inside quotes, `\r\n` line ends.
    Rfc4180,
}

impl FromStr for CsvDialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(CsvDialect::Legacy),
            "rfc4180" => Ok(CsvDialect::Rfc4180),
            _ => Err(InvalidInputError::Other {
                message: format!("unknown CSV dialect '{}' (expected legacy or rfc4180)", s),
            }
            .into()),
        }
    }
}

/// Render rows as CSV text. No rows yields the empty string, header included.
pub fn to_csv(rows: &[CastRow], dialect: CsvDialect) -> Result<String, Error> {
    if rows.is_empty() {
        return Ok(String::new());
    }

    match dialect {
        CsvDialect::Legacy => Ok(render_legacy(rows)),
        CsvDialect::Rfc4180 => render_rfc4180(rows),
    }
}

/// Project and render records in one step.
pub fn records_to_csv(records: &[FeedRecord], dialect: CsvDialect) -> Result<String, Error> {
    let rows: Vec<CastRow> = records.iter().map(CastRow::from_record).collect();
    to_csv(&rows, dialect)
}

fn render_legacy(rows: &[CastRow]) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');

    for row in rows {
        for (idx, cell) in row.cells.iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            cell.render_legacy(&mut out);
        }
        out.push('\n');
    }

    out
}

fn render_rfc4180(rows: &[CastRow]) -> Result<String, Error> {
    let mut writer = ::csv::WriterBuilder::new()
        .quote_style(::csv::QuoteStyle::Always)
        .terminator(::csv::Terminator::CRLF)
        .from_writer(Vec::new());

    let ser = |e: ::csv::Error| Error::Serialization(e.to_string());

    writer.write_record(COLUMNS).map_err(ser)?;
    for row in rows {
        writer
            .write_record(row.cells.iter().map(CsvValue::as_field))
            .map_err(ser)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Serialization(e.to_string()))
}
