//! Locating and rewriting the `incremental` field

use otatrack_device::DeviceIdentity;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::ConfigWriteError;
use crate::line::{QuoteStyle, indent, is_key, rewrite_value};

const FIELD: &str = "incremental";
const VARIANTS: &str = "variants";

/// What a rewrite did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditOperation {
    /// An existing value was replaced
    Modify,
    /// A field was inserted into a variant
    Add,
    /// The document already held the value
    Unchanged,
}

/// Description of a rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncrementalEdit {
    /// Variant that was edited, if any
    pub variant_index: Option<usize>,
    /// One-based line that was changed or inserted
    pub line: Option<usize>,
    /// Value before the edit
    pub old_value: Option<String>,
    /// Value after the edit
    pub new_value: String,
    /// Kind of edit
    pub operation: EditOperation,
}

impl IncrementalEdit {
    /// Whether the document text changed
    pub fn changed(&self) -> bool {
        self.operation != EditOperation::Unchanged
    }

    fn unchanged(variant_index: Option<usize>, value: &str) -> Self {
        Self {
            variant_index,
            line: None,
            old_value: Some(value.to_string()),
            new_value: value.to_string(),
            operation: EditOperation::Unchanged,
        }
    }
}

/// One physical line split from its terminator
#[derive(Debug, Clone)]
struct SourceLine<'a> {
    body: &'a str,
    terminator: &'a str,
}

fn split_lines(text: &str) -> Vec<SourceLine<'_>> {
    text.split_inclusive('\n')
        .map(|raw| {
            let body = raw
                .strip_suffix("\r\n")
                .or_else(|| raw.strip_suffix('\n'))
                .unwrap_or(raw);
            SourceLine {
                body,
                terminator: raw.split_at(body.len()).1,
            }
        })
        .collect()
}

fn is_content(body: &str) -> bool {
    let trimmed = body.trim_start();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn is_list_item(trimmed: &str) -> bool {
    trimmed == "-" || trimmed.starts_with("- ")
}

/// Set the `incremental` that applies to `identity` to `new_value`
///
/// Returns the new document text and a description of the edit. When the value is
/// already in place the text is returned as is.
pub fn rewrite_incremental(
    text: &str,
    identity: &DeviceIdentity,
    new_value: &str,
) -> Result<(String, IncrementalEdit), ConfigWriteError> {
    let new_value = new_value.trim();
    if new_value.is_empty() || new_value.contains(['\n', '\r']) {
        return Err(ConfigWriteError::InvalidValue(new_value.to_string()));
    }

    let document: Value = serde_yaml::from_str(text)?;
    let root = match &document {
        Value::Mapping(map) => map.clone(),
        _ => Mapping::new(),
    };
    let lines = split_lines(text);

    match root.get(VARIANTS) {
        Some(Value::Sequence(variants)) => {
            rewrite_variant(text, &lines, &root, variants, identity, new_value)
        }
        _ => rewrite_top_level(text, &lines, &root, new_value),
    }
}

fn rewrite_top_level(
    text: &str,
    lines: &[SourceLine<'_>],
    root: &Mapping,
    new_value: &str,
) -> Result<(String, IncrementalEdit), ConfigWriteError> {
    if scalar(root.get(FIELD)).as_deref() == Some(new_value) {
        return Ok((text.to_string(), IncrementalEdit::unchanged(None, new_value)));
    }

    let top = top_level_indent(lines);
    let index = lines
        .iter()
        .position(|line| {
            is_content(line.body)
                && indent(line.body) == top
                && is_key(line.body.trim_start(), FIELD)
        })
        .ok_or(ConfigWriteError::FieldNotFound)?;

    replace_line(lines, index, None, new_value)
}

fn rewrite_variant(
    text: &str,
    lines: &[SourceLine<'_>],
    root: &Mapping,
    variants: &[Value],
    identity: &DeviceIdentity,
    new_value: &str,
) -> Result<(String, IncrementalEdit), ConfigWriteError> {
    let base_product = scalar(root.get("product"));
    let effective_product = |entry: &Value| {
        scalar(entry.get("product")).or_else(|| base_product.clone())
    };
    let matches = |entry: &Value| effective_product(entry).as_deref() == Some(identity.product.as_str());

    let preferred = identity
        .variant_index
        .filter(|index| variants.get(*index).is_some_and(matches));
    let index = preferred
        .or_else(|| variants.iter().position(matches))
        .ok_or_else(|| ConfigWriteError::VariantNotFound {
            product: identity.product.clone(),
        })?;

    let current = variants.get(index).and_then(|entry| scalar(entry.get(FIELD)));
    if current.as_deref() == Some(new_value) {
        return Ok((
            text.to_string(),
            IncrementalEdit::unchanged(Some(index), new_value),
        ));
    }

    let top = top_level_indent(lines);
    let section = lines
        .iter()
        .position(|line| {
            is_content(line.body)
                && indent(line.body) == top
                && is_key(line.body.trim_start(), VARIANTS)
        })
        .ok_or(ConfigWriteError::VariantsSectionMissing)?;
    let section_indent = indent(lines.get(section).map_or("", |line| line.body));

    let header = find_entry(lines, section, section_indent, index)
        .ok_or(ConfigWriteError::EntryNotFound { index })?;
    let header_body = lines.get(header).map_or("", |line| line.body);
    let entry_indent = indent(header_body);
    let after_dash = header_body
        .trim_start()
        .strip_prefix('-')
        .unwrap_or_default();
    let inline = after_dash.trim_start();

    if is_key(inline, FIELD) {
        return replace_line(lines, header, Some(index), new_value);
    }

    // column of the entry's keys: right after "- " on the header, else the next line
    let mut key_column = (!inline.is_empty() && !inline.starts_with('#'))
        .then(|| header_body.len().saturating_sub(inline.len()));

    for (offset, line) in lines.iter().enumerate().skip(header + 1) {
        if !is_content(line.body) {
            continue;
        }
        let own = indent(line.body);
        if own <= entry_indent {
            break;
        }
        let column = *key_column.get_or_insert(own);
        if own == column && is_key(line.body.trim_start(), FIELD) {
            return replace_line(lines, offset, Some(index), new_value);
        }
    }

    let column = key_column.unwrap_or(entry_indent + 2);
    insert_after(lines, header, column, Some(index), current, new_value)
}

/// Index of the `target`-th list item under the `variants:` line
fn find_entry(
    lines: &[SourceLine<'_>],
    section: usize,
    section_indent: usize,
    target: usize,
) -> Option<usize> {
    let mut item_indent = None;
    let mut seen = 0usize;
    for (offset, line) in lines.iter().enumerate().skip(section + 1) {
        if !is_content(line.body) {
            continue;
        }
        let own = indent(line.body);
        let item = is_list_item(line.body.trim_start());
        if own < section_indent || (own == section_indent && !item) {
            break;
        }
        if item && *item_indent.get_or_insert(own) == own {
            if seen == target {
                return Some(offset);
            }
            seen += 1;
        }
    }
    None
}

fn replace_line(
    lines: &[SourceLine<'_>],
    index: usize,
    variant_index: Option<usize>,
    new_value: &str,
) -> Result<(String, IncrementalEdit), ConfigWriteError> {
    let mut out = String::new();
    let mut old_value = None;
    for (offset, line) in lines.iter().enumerate() {
        if offset == index {
            let (body, previous) =
                rewrite_value(line.body, new_value).ok_or(ConfigWriteError::FieldNotFound)?;
            out.push_str(&body);
            old_value = Some(previous);
        } else {
            out.push_str(line.body);
        }
        out.push_str(line.terminator);
    }

    let operation = if old_value.as_deref() == Some(new_value) {
        EditOperation::Unchanged
    } else {
        EditOperation::Modify
    };
    Ok((
        out,
        IncrementalEdit {
            variant_index,
            line: Some(index + 1),
            old_value,
            new_value: new_value.to_string(),
            operation,
        },
    ))
}

fn insert_after(
    lines: &[SourceLine<'_>],
    header: usize,
    column: usize,
    variant_index: Option<usize>,
    old_value: Option<String>,
    new_value: &str,
) -> Result<(String, IncrementalEdit), ConfigWriteError> {
    let newline = lines
        .iter()
        .map(|line| line.terminator)
        .find(|terminator| !terminator.is_empty())
        .unwrap_or("\n");
    let inserted = format!(
        "{}{FIELD}: {}",
        " ".repeat(column),
        QuoteStyle::Double.render(new_value)
    );

    let mut out = String::new();
    for (offset, line) in lines.iter().enumerate() {
        out.push_str(line.body);
        if offset == header {
            // header may be the last line without a terminator
            out.push_str(newline);
            out.push_str(&inserted);
            out.push_str(line.terminator);
        } else {
            out.push_str(line.terminator);
        }
    }

    Ok((
        out,
        IncrementalEdit {
            variant_index,
            line: Some(header + 2),
            old_value,
            new_value: new_value.to_string(),
            operation: EditOperation::Add,
        },
    ))
}

fn top_level_indent(lines: &[SourceLine<'_>]) -> usize {
    lines
        .iter()
        .map(|line| line.body)
        .find(|body| is_content(body) && !body.trim_start().starts_with("---"))
        .map_or(0, indent)
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
