//! This module provides encoding functionality for writing a [`RuleTable`] back out
//! in the `.tm` text format understood by the parser.

use crate::rules::RuleTable;

/// Encodes a table into `.tm` source.
///
/// Triples are separated by wider gaps so each symbol column stays readable:
///
/// ```text
/// name: Busy beaver 2
/// symbols: 2
/// rules:
///   [0,  1, 1, 1,  1, 0, 1]
///   [1,  1, 0, 0,  1, 1, -1]
/// ```
pub fn encode(table: &RuleTable) -> String {
    let mut out = format!(
        "name: {}\nsymbols: {}\nrules:\n",
        encode_name(table.name()),
        table.symbol_count()
    );

    for row in table.to_rows() {
        out.push_str("  ");
        out.push_str(&encode_row(&row));
        out.push('\n');
    }

    out
}

/// Writes a name bare when it reads back unchanged, quoted otherwise.
fn encode_name(name: &str) -> String {
    let bare = !name.is_empty()
        && name.trim() == name
        && !name.starts_with('"')
        && !name.contains(['#', '\n', '\r']);
    if bare {
        return name.to_string();
    }

    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Encodes a single raw row as `[id,  w, m, n,  w, m, n]`.
fn encode_row(row: &[i64]) -> String {
    let Some((id, triples)) = row.split_first() else {
        return "[]".to_string();
    };

    let columns = triples
        .chunks(3)
        .map(|triple| {
            triple
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>();

    format!("[{id},  {}]", columns.join(",  "))
}
