// ABOUTME: Best-effort normalization of free-form model responses into JSON values
// ABOUTME: Tries strict JSON, balanced substrings, truncation repair, then line heuristics

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Which strategy produced a normalized response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationStrategy {
    StrictJson,
    BalancedSubstring,
    TruncationRepair,
    LineHeuristics,
}

impl std::fmt::Display for NormalizationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizationStrategy::StrictJson => write!(f, "strict_json"),
            NormalizationStrategy::BalancedSubstring => write!(f, "balanced_substring"),
            NormalizationStrategy::TruncationRepair => write!(f, "truncation_repair"),
            NormalizationStrategy::LineHeuristics => write!(f, "line_heuristics"),
        }
    }
}

/// No strategy could extract structure from the response
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Malformed model response: {reason}")]
pub struct MalformedResponse {
    pub reason: String,
    /// Leading part of the raw text, for diagnostics
    pub excerpt: String,
}

impl MalformedResponse {
    fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            excerpt: raw.chars().take(200).collect(),
        }
    }
}

/// A response reduced to a JSON object or array
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub value: Value,
    pub strategy: NormalizationStrategy,
}

impl NormalizedResponse {
    /// Root object, when the response is an object
    pub fn root(&self) -> Option<&Map<String, Value>> {
        self.value.as_object()
    }

    /// First non-empty string among the given root keys
    pub fn root_str(&self, keys: &[&str]) -> Option<&str> {
        let root = self.root()?;
        keys.iter()
            .filter_map(|key| root.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    /// Requirement-like records: a root array, a `requirements` array, or a
    /// single requirement-shaped object. Bare strings become `{"title": ...}`.
    pub fn candidate_records(&self) -> Vec<Map<String, Value>> {
        match &self.value {
            Value::Array(items) => records_from_items(items),
            Value::Object(root) => {
                if let Some(Value::Array(items)) = root.get("requirements") {
                    records_from_items(items)
                } else if root.get("title").and_then(Value::as_str).is_some() {
                    vec![root.clone()]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    /// Objects found at the root, or under the first array-valued key
    pub fn objects(&self) -> Vec<Map<String, Value>> {
        match &self.value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect(),
            Value::Object(root) => root
                .values()
                .find_map(|value| value.as_array())
                .filter(|items| items.iter().all(Value::is_object) && !items.is_empty())
                .map(|items| items.iter().filter_map(|i| i.as_object().cloned()).collect())
                .unwrap_or_else(|| vec![root.clone()]),
            _ => Vec::new(),
        }
    }
}

fn records_from_items(items: &[Value]) -> Vec<Map<String, Value>> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map.clone()),
            Value::String(text) if !text.trim().is_empty() => {
                let mut map = Map::new();
                map.insert("title".to_string(), Value::String(text.trim().to_string()));
                Some(map)
            }
            _ => None,
        })
        .collect()
}

/// Normalize a raw model response
pub fn normalize(raw: &str) -> Result<NormalizedResponse, MalformedResponse> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        warn!("Model response is empty");
        return Err(MalformedResponse::new("response is empty", raw));
    }

    let unfenced = strip_code_fence(trimmed);

    if let Some(value) = parse_structured(unfenced) {
        return Ok(found(value, NormalizationStrategy::StrictJson));
    }

    if let Some(value) = largest_balanced_json(unfenced) {
        return Ok(found(value, NormalizationStrategy::BalancedSubstring));
    }

    if let Some(value) = repair_truncated_json(unfenced) {
        return Ok(found(value, NormalizationStrategy::TruncationRepair));
    }

    if let Some(value) = line_heuristics(unfenced) {
        return Ok(found(value, NormalizationStrategy::LineHeuristics));
    }

    warn!(
        "No structure found in model response ({} chars)",
        trimmed.chars().count()
    );
    Err(MalformedResponse::new(
        "no JSON, key/value lines, list items, or enumeration found",
        raw,
    ))
}

fn found(value: Value, strategy: NormalizationStrategy) -> NormalizedResponse {
    debug!("Normalized model response using {}", strategy);
    NormalizedResponse { value, strategy }
}

/// Strip markdown code fences if present (```json ... ```)
fn strip_code_fence(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }
    // Find the first newline after opening fence
    let start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    // Search from start to avoid finding the opening fence
    let end = text[start..]
        .rfind("```")
        .map(|i| i + start)
        .unwrap_or(text.len());
    text[start..end].trim()
}

/// Parse as JSON, accepting only objects and arrays
fn parse_structured(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

/// Top-level balanced `{...}` / `[...]` spans, ignoring brackets inside strings
fn balanced_spans(raw: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for (index, ch) in raw.char_indices() {
        let Some(begin) = start else {
            if ch == '{' || ch == '[' {
                start = Some(index);
                stack.clear();
                stack.push(closer(ch));
                in_string = false;
                escape = false;
            }
            continue;
        };

        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => stack.push(closer(ch)),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    // Mismatched bracket, drop this span
                    start = None;
                    continue;
                }
                if stack.is_empty() {
                    spans.push(&raw[begin..index + ch.len_utf8()]);
                    start = None;
                }
            }
            _ => {}
        }
    }

    spans
}

fn closer(open: char) -> char {
    if open == '{' {
        '}'
    } else {
        ']'
    }
}

fn largest_balanced_json(raw: &str) -> Option<Value> {
    let mut spans = balanced_spans(raw);
    spans.sort_by_key(|span| std::cmp::Reverse(span.len()));
    spans.into_iter().find_map(parse_structured)
}

/// Close an unterminated JSON document, backing off to earlier element
/// boundaries until the result parses.
fn repair_truncated_json(raw: &str) -> Option<Value> {
    const MAX_BACKOFF: usize = 64;

    let begin = raw.find(['{', '['])?;
    let body = &raw[begin..];

    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape = false;
    // (byte offset of a separating comma, open containers at that point)
    let mut boundaries: Vec<(usize, Vec<char>)> = Vec::new();

    for (index, ch) in body.char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => stack.push(closer(ch)),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    // Document closed; nothing truncated here
                    return None;
                }
            }
            ',' => boundaries.push((index, stack.clone())),
            _ => {}
        }
    }

    if stack.is_empty() {
        return None;
    }

    let mut candidate = body.trim_end().to_string();
    if in_string {
        if escape {
            candidate.pop();
        }
        candidate.push('"');
    }
    let trimmed = candidate.trim_end_matches(|c: char| c == ',' || c.is_whitespace());
    if let Some(value) = parse_structured(&close_with(trimmed, &stack)) {
        return Some(value);
    }

    for (offset, open) in boundaries.iter().rev().take(MAX_BACKOFF) {
        let prefix = body[..*offset].trim_end();
        if let Some(value) = parse_structured(&close_with(prefix, open)) {
            return Some(value);
        }
    }

    None
}

fn close_with(prefix: &str, open: &[char]) -> String {
    let mut repaired = String::with_capacity(prefix.len() + open.len());
    repaired.push_str(prefix);
    repaired.extend(open.iter().rev());
    repaired
}

// ----------------------------------------------------------------------------
// Line heuristics
// ----------------------------------------------------------------------------

const MAX_ENUMERATION_ITEM_CHARS: usize = 40;
const MAX_ENUMERATION_ITEM_WORDS: usize = 6;
const ENUMERATION_SEPARATORS: [char; 5] = [',', '，', '、', ';', '；'];
const SENTENCE_PUNCTUATION: [char; 6] = ['.', '。', '!', '！', '?', '？'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineField {
    Title,
    Description,
    Type,
    Priority,
    Rationale,
    AcceptanceCriteria,
    Overview,
    Audience,
}

fn line_field(key: &str) -> Option<LineField> {
    let key = key
        .trim()
        .trim_matches(|c: char| c == '*' || c == '#' || c == '_' || c == '`')
        .trim()
        .to_lowercase()
        .replace(['_', '-'], " ");
    let field = match key.as_str() {
        "title" | "name" | "requirement" | "标题" | "需求" | "名称" => LineField::Title,
        "description" | "desc" | "details" | "描述" | "说明" => LineField::Description,
        "type" | "category" | "类型" => LineField::Type,
        "priority" | "优先级" => LineField::Priority,
        "rationale" | "reason" | "理由" | "原因" => LineField::Rationale,
        "acceptance criteria" | "acceptance" | "criteria" | "验收标准" => {
            LineField::AcceptanceCriteria
        }
        "overview" | "project overview" | "summary" | "概述" | "项目概述" => LineField::Overview,
        "audience" | "target audience" | "users" | "目标用户" | "用户群体" => LineField::Audience,
        _ => return None,
    };
    Some(field)
}

/// Split `key: value` (ASCII or full-width colon)
fn split_key_value(line: &str) -> Option<(LineField, &str)> {
    let (index, colon) = line.char_indices().find(|(_, c)| *c == ':' || *c == '：')?;
    let field = line_field(&line[..index])?;
    let value = line[index + colon.len_utf8()..]
        .trim()
        .trim_matches('*')
        .trim();
    Some((field, value))
}

/// Remove a leading list marker (`-`, `*`, `•`, `1.`, `1)`, `1、`)
fn strip_list_marker(line: &str) -> Option<&str> {
    let line = line.trim_start();
    for bullet in ["- ", "* ", "• ", "· "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return Some(rest.trim());
        }
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    for marker in [". ", ") ", "、", "．"] {
        if let Some(item) = rest.strip_prefix(marker) {
            return Some(item.trim());
        }
    }
    None
}

fn line_heuristics(text: &str) -> Option<Value> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    key_value_records(&lines)
        .or_else(|| list_item_records(&lines))
        .or_else(|| enumeration_records(&lines))
}

fn key_value_records(lines: &[&str]) -> Option<Value> {
    let mut root = Map::new();
    let mut records: Vec<Map<String, Value>> = Vec::new();
    let mut current: Option<Map<String, Value>> = None;
    let mut in_criteria = false;

    for line in lines {
        let content = strip_list_marker(line).unwrap_or(line);

        if let Some((field, value)) = split_key_value(content) {
            in_criteria = false;
            match field {
                LineField::Overview => {
                    root.insert("project_overview".into(), Value::String(value.into()));
                }
                LineField::Audience => {
                    root.insert("target_audience".into(), Value::String(value.into()));
                }
                LineField::Title => {
                    if let Some(done) = current.take() {
                        records.push(done);
                    }
                    let mut record = Map::new();
                    record.insert("title".into(), Value::String(value.into()));
                    current = Some(record);
                }
                LineField::AcceptanceCriteria => {
                    let record = current.get_or_insert_with(Map::new);
                    let criteria = record
                        .entry("acceptance_criteria")
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let (Value::Array(items), false) = (criteria, value.is_empty()) {
                        items.push(Value::String(value.into()));
                    }
                    in_criteria = true;
                }
                other => {
                    let key = match other {
                        LineField::Description => "description",
                        LineField::Type => "type",
                        LineField::Priority => "priority",
                        _ => "rationale",
                    };
                    current
                        .get_or_insert_with(Map::new)
                        .insert(key.into(), Value::String(value.into()));
                }
            }
            continue;
        }

        // Bulleted lines directly under an acceptance criteria header
        if in_criteria {
            if let (Some(item), Some(record)) = (strip_list_marker(line), current.as_mut()) {
                if let Some(Value::Array(items)) = record.get_mut("acceptance_criteria") {
                    items.push(Value::String(item.into()));
                    continue;
                }
            }
            in_criteria = false;
        }
    }

    if let Some(done) = current.take() {
        records.push(done);
    }
    records.retain(|record| record.contains_key("title"));

    if records.is_empty() && root.is_empty() {
        return None;
    }
    root.insert(
        "requirements".into(),
        Value::Array(records.into_iter().map(Value::Object).collect()),
    );
    Some(Value::Object(root))
}

fn list_item_records(lines: &[&str]) -> Option<Value> {
    let records: Vec<Value> = lines
        .iter()
        .filter_map(|line| strip_list_marker(line))
        .filter(|item| !item.is_empty())
        .map(|item| {
            let mut record = Map::new();
            match item.split_once([':', '：']) {
                Some((title, description))
                    if !title.trim().is_empty()
                        && title.chars().count() <= MAX_ENUMERATION_ITEM_CHARS =>
                {
                    record.insert("title".into(), Value::String(title.trim().into()));
                    record.insert("description".into(), Value::String(description.trim().into()));
                }
                _ => {
                    record.insert("title".into(), Value::String(item.into()));
                }
            }
            Value::Object(record)
        })
        .collect();

    if records.is_empty() {
        return None;
    }
    let mut root = Map::new();
    root.insert("requirements".into(), Value::Array(records));
    Some(Value::Object(root))
}

fn enumeration_records(lines: &[&str]) -> Option<Value> {
    let mut records = Vec::new();
    for line in lines {
        if let Some(items) = split_enumeration(line) {
            records.extend(items.into_iter().map(|item| {
                let mut record = Map::new();
                record.insert("title".into(), Value::String(item.to_string()));
                Value::Object(record)
            }));
        }
    }

    if records.is_empty() {
        return None;
    }
    let mut root = Map::new();
    root.insert("requirements".into(), Value::Array(records));
    Some(Value::Object(root))
}

/// Split a line like `login, create task, task list` into its items
///
/// Requires two or more items, each short and without sentence punctuation.
fn split_enumeration(line: &str) -> Option<Vec<&str>> {
    if !line.contains(ENUMERATION_SEPARATORS) {
        return None;
    }
    let items: Vec<&str> = line
        .split(ENUMERATION_SEPARATORS)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            ["and ", "or ", "和", "及", "以及"]
                .iter()
                .find_map(|prefix| item.strip_prefix(prefix))
                .map(str::trim)
                .unwrap_or(item)
        })
        .collect();

    let short = |item: &&str| {
        item.chars().count() <= MAX_ENUMERATION_ITEM_CHARS
            && item.split_whitespace().count() <= MAX_ENUMERATION_ITEM_WORDS
            && !item.contains(SENTENCE_PUNCTUATION)
    };

    if items.len() >= 2 && items.iter().all(short) {
        Some(items)
    } else {
        None
    }
}
