use crate::entities::{courses, leads, staff, OpError};
use crate::store::ListStore;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

pub const TEMPLATE_HEADER: &str =
    "name,email,phone,interestedCourse,source,status,enquiryDate,comments,assignedTo";

#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub errors: Vec<String>,
}

fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                buf.push('"');
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
            i += 1;
            continue;
        }
        if ch == ',' && !in_quotes {
            out.push(buf);
            buf = String::new();
            i += 1;
            continue;
        }
        buf.push(ch);
        i += 1;
    }
    out.push(buf);
    out
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn normalize_key(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

/// Imports leads from a CSV file. Courses and staff are matched by
/// case-insensitive exact name. Row failures are collected and reported
/// together; a failed row creates nothing and does not abort the rest.
pub fn import_leads(store: &ListStore, path: &Path) -> Result<ImportOutcome, OpError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| OpError::new("io_failed", format!("cannot read {}: {}", path.display(), e)))?;

    let course_by_name: HashMap<String, String> = courses::fetch_all(store)?
        .into_iter()
        .map(|c| (normalize_key(&c.name), c.id))
        .collect();
    let staff_by_name: HashMap<String, String> = staff::fetch_all(store)?
        .into_iter()
        .map(|s| (normalize_key(&s.name), s.id))
        .collect();

    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header_line)) = lines.next() else {
        return Err(OpError::bad_params("file has no header row"));
    };
    let header: Vec<String> = parse_csv_record(header_line)
        .iter()
        .map(|h| normalize_key(h))
        .collect();
    let col = |name: &str| header.iter().position(|h| h == &normalize_key(name));
    let Some(name_col) = col("name") else {
        return Err(OpError::bad_params("missing column: name"));
    };
    let Some(course_col) = col("interestedCourse") else {
        return Err(OpError::bad_params("missing column: interestedCourse"));
    };
    let email_col = col("email");
    let phone_col = col("phone");
    let source_col = col("source");
    let status_col = col("status");
    let date_col = col("enquiryDate");
    let comments_col = col("comments");
    let assigned_col = col("assignedTo");

    let cell = |fields: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| fields.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let mut imported = 0usize;
    let mut errors: Vec<String> = Vec::new();
    for (line_no, line) in lines {
        let row = line_no + 1;
        let fields = parse_csv_record(line);

        let course_name = cell(&fields, Some(course_col));
        let Some(course_id) = course_by_name.get(&normalize_key(&course_name)) else {
            errors.push(format!("row {}: unknown course {:?}", row, course_name));
            continue;
        };
        let assigned_name = cell(&fields, assigned_col);
        let assigned_to = if assigned_name.is_empty() {
            None
        } else {
            match staff_by_name.get(&normalize_key(&assigned_name)) {
                Some(id) => Some(id.clone()),
                None => {
                    errors.push(format!("row {}: unknown staff {:?}", row, assigned_name));
                    continue;
                }
            }
        };
        let enquiry_date = cell(&fields, date_col);
        if !enquiry_date.is_empty() && crate::entities::normalize_date(&enquiry_date).is_empty() {
            errors.push(format!("row {}: bad enquiryDate {:?}", row, enquiry_date));
            continue;
        }

        let input = leads::LeadInput {
            id: None,
            name: cell(&fields, Some(name_col)),
            email: cell(&fields, email_col),
            phone: cell(&fields, phone_col),
            interested_course_id: course_id.clone(),
            source: non_empty(cell(&fields, source_col)),
            status: non_empty(cell(&fields, status_col)),
            enquiry_date: non_empty(enquiry_date),
            next_follow_up_date: None,
            assigned_to,
        };
        let comment = cell(&fields, comments_col);
        match leads::add(store, &input) {
            Ok(all) => {
                if !comment.is_empty() {
                    // The import has no author; the comment stands on its own.
                    if let Some(new_lead) = all.last() {
                        leads::add_comment(store, &new_lead.id, &comment, "")?;
                    }
                }
                imported += 1;
            }
            Err(e) => errors.push(format!("row {}: {}", row, e.message)),
        }
    }

    Ok(ImportOutcome { imported, errors })
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Writes the import template: the recognized header and one sample row.
pub fn export_template(path: &Path) -> Result<(), OpError> {
    let sample = [
        "Jane Smith",
        "jane@example.com",
        "9876543210",
        "Spoken English Basic",
        "Walk-in",
        "New",
        "2024-07-01",
        "Asked about weekend batches",
        "",
    ]
    .iter()
    .map(|s| csv_quote(s))
    .collect::<Vec<_>>()
    .join(",");
    let body = format!("{}\n{}\n", TEMPLATE_HEADER, sample);
    std::fs::write(path, body)
        .map_err(|e| OpError::new("io_failed", format!("cannot write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::{csv_quote, parse_csv_record};

    #[test]
    fn plain_fields_split_on_commas() {
        assert_eq!(
            parse_csv_record("a,b,c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn quoted_fields_keep_commas_and_escaped_quotes() {
        assert_eq!(
            parse_csv_record("\"Smith, Jane\",\"say \"\"hi\"\"\",x"),
            vec![
                "Smith, Jane".to_string(),
                "say \"hi\"".to_string(),
                "x".to_string()
            ]
        );
    }

    #[test]
    fn trailing_empty_field_is_preserved() {
        assert_eq!(parse_csv_record("a,"), vec!["a".to_string(), String::new()]);
    }

    #[test]
    fn quote_round_trips_through_parse() {
        for raw in ["plain", "with, comma", "with \"quotes\"", ""] {
            let line = csv_quote(raw);
            assert_eq!(parse_csv_record(&line), vec![raw.to_string()]);
        }
    }
}
