//! Conflict audit log: one CSV row per resolved collision.

use std::borrow::Cow;
use std::io::Write;

use serde_json::Value;

use crate::error::MergeError;
use crate::model::ConflictRecord;

pub const AUDIT_HEADERS: [&str; 6] = [
    "bucket",
    "key",
    "kept_value",
    "dropped_value",
    "kept_source",
    "dropped_source",
];

/// Strings are written raw, other values as compact JSON.
fn cell(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

pub fn write_conflicts_csv<W: Write>(writer: W, conflicts: &[ConflictRecord]) -> Result<(), MergeError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(AUDIT_HEADERS)
        .map_err(|e| MergeError::Audit(e.to_string()))?;

    for c in conflicts {
        let kept = cell(&c.kept_value);
        let dropped = cell(&c.dropped_value);
        wtr.write_record([
            c.bucket.as_str(),
            c.key.as_str(),
            kept.as_ref(),
            dropped.as_ref(),
            c.kept_source.as_str(),
            c.dropped_source.as_str(),
        ])
        .map_err(|e| MergeError::Audit(e.to_string()))?;
    }

    wtr.flush().map_err(|e| MergeError::Audit(e.to_string()))?;
    Ok(())
}

pub fn conflicts_to_csv(conflicts: &[ConflictRecord]) -> Result<String, MergeError> {
    let mut buf = Vec::new();
    write_conflicts_csv(&mut buf, conflicts)?;
    String::from_utf8(buf).map_err(|e| MergeError::Audit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_only_when_empty() {
        let out = conflicts_to_csv(&[]).unwrap();
        assert_eq!(out, "bucket,key,kept_value,dropped_value,kept_source,dropped_source\n");
    }

    #[test]
    fn multiline_values_survive() {
        let conflicts = vec![ConflictRecord {
            bucket: "actors".into(),
            key: "Compendium.core.actors.ID1.description".into(),
            kept_value: json!("Riga uno,\n\"due\""),
            dropped_value: json!(7),
            kept_source: "Compendium/a.json".into(),
            dropped_source: "Compendium/b.json".into(),
        }];
        let out = conflicts_to_csv(&conflicts).unwrap();

        let mut rdr = csv::Reader::from_reader(out.as_bytes());
        let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "actors");
        assert_eq!(&rows[0][2], "Riga uno,\n\"due\"");
        assert_eq!(&rows[0][3], "7");
        assert_eq!(&rows[0][5], "Compendium/b.json");
    }
}
