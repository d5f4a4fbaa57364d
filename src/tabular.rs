use crate::error::Result;
use std::io::Read;

/// Rows of string cells. Rows keep their own length; nothing is padded.
pub type TabularData = Vec<Vec<String>>;

/// Read delimiter-separated text, one row per record. Quoted fields may span
/// lines. A blank line is kept as a row holding one empty cell so later rows
/// stay where they were in the file.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<TabularData> {
    let mut builder = csv::ReaderBuilder::new();
    builder.delimiter(delimiter).has_headers(false).flexible(true);

    read_rows(reader, &builder, Some(delimiter))
}

/// Read tab-separated text, one row per line. Quotes are taken literally.
pub fn read_tsv<R: Read>(reader: R) -> Result<TabularData> {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false);

    read_rows(reader, &builder, None)
}

/// Split the input into records and parse each one on its own; the csv
/// reader would otherwise drop blank lines. `quoted_by` is the delimiter when
/// quoting is enabled.
fn read_rows<R: Read>(
    mut reader: R,
    builder: &csv::ReaderBuilder,
    quoted_by: Option<u8>,
) -> Result<TabularData> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    let mut rows = Vec::new();
    let mut pending: Option<String> = None;
    let mut state = QuoteState::FieldStart;

    for line in input.lines() {
        let record = match pending.take() {
            Some(mut record) => {
                record.push('\n');
                record.push_str(line);
                record
            }
            None => line.to_string(),
        };

        if let Some(delimiter) = quoted_by {
            state = state.scan(line, char::from(delimiter));
            if state == QuoteState::Quoted {
                pending = Some(record);
                continue;
            }
            state = QuoteState::FieldStart;
        }

        rows.push(parse_record(builder, &record)?);
    }

    // Unterminated quote at end of input; let csv make what it can of it
    if let Some(record) = pending {
        rows.push(parse_record(builder, &record)?);
    }

    Ok(rows)
}

fn parse_record(builder: &csv::ReaderBuilder, record: &str) -> Result<Vec<String>> {
    let mut reader = builder.from_reader(record.as_bytes());
    match reader.records().next() {
        Some(fields) => Ok(fields?.iter().map(str::to_string).collect()),
        None => Ok(vec![String::new()]),
    }
}

/// Where a line leaves the quoting rules csv applies: a quote opens a field
/// only at its start, and `""` inside a quoted field is an escaped quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

impl QuoteState {
    fn scan(self, line: &str, delimiter: char) -> Self {
        line.chars().fold(self, |state, c| match (state, c) {
            (QuoteState::FieldStart, '"') => QuoteState::Quoted,
            (QuoteState::Quoted, '"') => QuoteState::QuoteInQuoted,
            (QuoteState::Quoted, _) => QuoteState::Quoted,
            (QuoteState::QuoteInQuoted, '"') => QuoteState::Quoted,
            (_, c) if c == delimiter => QuoteState::FieldStart,
            _ => QuoteState::Unquoted,
        })
    }
}
