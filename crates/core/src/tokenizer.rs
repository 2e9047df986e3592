use crate::error::{CompareError, Result};

const QUOTE: char = '"';
const BOM: char = '\u{feff}';

/// Removes a leading UTF-8 byte-order mark, if any.
pub fn strip_bom(line: &str) -> &str {
    line.strip_prefix(BOM).unwrap_or(line)
}

/// Splits one line of delimited text into fields.
///
/// A field that starts with a double quote is quoted: the quote is dropped, `""` inside
/// it is a literal quote, and a quote closes the field only at end of line or right
/// before `separator`. A separator at end of line yields a trailing empty field.
pub fn tokenize(line: &str, separator: char) -> Result<Vec<String>> {
    let chars: Vec<char> = line.chars().collect();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut at_field_start = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if quoted {
            if c == QUOTE {
                match chars.get(i + 1) {
                    None => quoted = false,
                    Some(&next) if next == separator => quoted = false,
                    Some(&QUOTE) => {
                        field.push(QUOTE);
                        i += 2;
                        continue;
                    }
                    Some(_) => {
                        return Err(CompareError::MalformedRow(format!(
                            "unescaped doublequote at column {}",
                            i + 1
                        )))
                    }
                }
            } else {
                field.push(c);
            }
        } else if c == separator {
            fields.push(std::mem::take(&mut field));
            at_field_start = true;
            i += 1;
            continue;
        } else if c == QUOTE && at_field_start {
            quoted = true;
        } else {
            field.push(c);
        }
        at_field_start = false;
        i += 1;
    }

    if quoted {
        return Err(CompareError::MalformedRow(
            "doublequote sequence not closed".to_string(),
        ));
    }
    fields.push(field);
    Ok(fields)
}

/// Joins fields into one line that [`tokenize`] splits back into the same fields.
///
/// Only fields containing the separator or a double quote get quoted.
pub fn render_line<S: AsRef<str>>(fields: &[S], separator: char) -> String {
    let mut out = String::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(separator);
        }
        let field = field.as_ref();
        if field.contains(separator) || field.contains(QUOTE) {
            out.push(QUOTE);
            for c in field.chars() {
                if c == QUOTE {
                    out.push(QUOTE);
                }
                out.push(c);
            }
            out.push(QUOTE);
        } else {
            out.push_str(field);
        }
    }
    out
}
