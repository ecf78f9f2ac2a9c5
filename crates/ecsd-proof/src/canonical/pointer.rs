//! JSON Pointer (RFC 6901) parsing and pointer-driven selection.
//!
//! A selection is the smallest document that still carries every selected
//! value: each object on a selected path keeps its `id` and `type`, the
//! root keeps its `@context`, and arrays keep only the selected elements.

use serde_json::{Map, Value};

use ecsd_core::ProofError;

/// Split a pointer into unescaped reference tokens. `""` is the whole
/// document.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, ProofError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer.strip_prefix('/').ok_or_else(|| {
        ProofError::validation("pointer", format!("\"{}\" must start with '/'", pointer))
    })?;
    rest.split('/').map(|token| unescape(token, pointer)).collect()
}

fn unescape(token: &str, pointer: &str) -> Result<String, ProofError> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => {
                return Err(ProofError::validation(
                    "pointer",
                    format!("\"{}\" contains an invalid '~' escape", pointer),
                ))
            }
        }
    }
    Ok(out)
}

/// Select the values named by `pointers`. `None` when `pointers` is empty.
pub fn select_by_pointers(
    document: &Value,
    pointers: &[String],
) -> Result<Option<Value>, ProofError> {
    if pointers.is_empty() {
        return Ok(None);
    }
    let root = document
        .as_object()
        .ok_or_else(|| ProofError::validation("document", "must be a JSON object"))?;

    let mut selection = skeleton(document);
    if let (Some(context), Value::Object(map)) = (root.get("@context"), &mut selection) {
        map.insert("@context".into(), context.clone());
    }
    for pointer in pointers {
        let tokens = parse_pointer(pointer)?;
        select_path(document, &tokens, pointer, &mut selection)?;
    }
    compact_arrays(&mut selection);
    Ok(Some(selection))
}

fn select_path(
    document: &Value,
    tokens: &[String],
    pointer: &str,
    selection: &mut Value,
) -> Result<(), ProofError> {
    if tokens.is_empty() {
        *selection = document.clone();
        return Ok(());
    }

    let unresolved =
        || ProofError::validation("pointer", format!("\"{}\" does not resolve", pointer));
    let mut source = document;
    let mut target = selection;
    for (depth, token) in tokens.iter().enumerate() {
        let child = step(source, token).ok_or_else(unresolved)?;
        let slot = match target {
            Value::Object(map) => map.entry(token.clone()).or_insert(Value::Null),
            Value::Array(items) => token
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(unresolved)?,
            _ => return Err(unresolved()),
        };
        if depth + 1 == tokens.len() {
            *slot = child.clone();
        } else if slot.is_null() {
            *slot = skeleton(child);
        }
        source = child;
        target = slot;
    }
    Ok(())
}

fn step<'a>(value: &'a Value, token: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(token),
        Value::Array(items) => {
            if token.len() > 1 && token.starts_with('0') {
                return None;
            }
            token.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        _ => None,
    }
}

/// Empty stand-in for a value on a selected path.
fn skeleton(value: &Value) -> Value {
    match value {
        Value::Object(source) => {
            let mut map = Map::new();
            for key in ["id", "type"] {
                if let Some(v) = source.get(key) {
                    map.insert(key.into(), v.clone());
                }
            }
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(vec![Value::Null; items.len()]),
        _ => Value::Null,
    }
}

fn compact_arrays(value: &mut Value) {
    match value {
        Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(compact_arrays);
        }
        Value::Object(map) => map.values_mut().for_each(compact_arrays),
        _ => {}
    }
}
