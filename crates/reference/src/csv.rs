//! Minimal CSV reader and writer for reference files.
//!
//! Dialect: comma separator, double-quote quoting with `""` escapes, quoted
//! fields may span lines, optional UTF-8 BOM, `\n` or `\r\n` line endings.
//! Blank lines are skipped.

/// A parsed CSV file: header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CsvError {
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },

    #[error("missing header row")]
    MissingHeader,
}

impl Sheet {
    /// Parse CSV text. The first record becomes the header.
    pub fn parse(input: &str) -> Result<Self, CsvError> {
        let mut records = parse_records(input)?.into_iter();
        let header = records.next().ok_or(CsvError::MissingHeader)?;
        Ok(Self {
            header,
            rows: records.collect(),
        })
    }

    /// Build a sheet from records whose first entry is the header.
    pub fn from_records(records: Vec<Vec<String>>) -> Self {
        let mut records = records.into_iter();
        Self {
            header: records.next().unwrap_or_default(),
            rows: records.collect(),
        }
    }

    /// Value of column `index` in the first data row, if any.
    pub fn first_value(&self, index: usize) -> Option<&str> {
        self.rows.first().and_then(|row| row.get(index)).map(String::as_str)
    }

    pub fn to_csv(&self) -> String {
        let mut out = write_record(&self.header);
        for row in &self.rows {
            out.push_str(&write_record(row));
        }
        out
    }
}

/// Split CSV text into records of fields.
pub fn parse_records(input: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut dirty = false;
    let mut line = 1;
    let mut quote_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                quote_line = line;
                dirty = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                dirty = true;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                line += 1;
                if dirty {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                dirty = false;
            }
            _ => {
                field.push(c);
                dirty = true;
            }
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: quote_line });
    }
    if dirty {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

/// Serialize one record, quoting fields that need it.
pub fn write_record(fields: &[String]) -> String {
    let mut line = fields
        .iter()
        .map(|f| quote_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn quote_field(field: &str) -> String {
    let needs_quotes = field.is_empty()
        || field.contains([',', '"', '\n', '\r'])
        || field.starts_with(' ')
        || field.ends_with(' ');
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
