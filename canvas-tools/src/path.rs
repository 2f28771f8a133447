//! Dot-notation path updates applied to a `World`'s `foundation` tree by
//! `world_manager`'s `update` operation. Unknown intermediate segments
//! auto-create empty mappings; the root value is never replaced in
//! place — every update folds over a clone and returns a new tree.

use canvas_tool::ToolError;
use serde_json::{Map, Value};

/// A single `{path, value}` update entry.
pub struct PathUpdate<'a> {
    /// Dot-separated path into the tree, e.g. `"geography.regions.0.name"`.
    pub path: &'a str,
    /// The value to set at `path`.
    pub value: Value,
}

/// Keys that would otherwise let a crafted path reach into JSON
/// serialization internals or, if this tree were ever deserialized into
/// a scripting-language object, onto its prototype chain. Rejected
/// outright rather than silently skipped.
const DISALLOWED_SEGMENTS: &[&str] = &["__proto__", "constructor", "prototype"];

/// Apply every update in `updates` to a clone of `root`, in order, and
/// return the result. `root` itself is never mutated.
pub fn apply_updates(root: &Value, updates: &[PathUpdate<'_>]) -> Result<Value, ToolError> {
    let mut next = root.clone();
    for update in updates {
        set_path(&mut next, update.path, update.value.clone())?;
    }
    Ok(next)
}

/// Set a single dot-notation path on `target` in place.
fn set_path(target: &mut Value, path: &str, value: Value) -> Result<(), ToolError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(ToolError::PathInvalid(path.to_owned()));
    }
    for segment in &segments {
        if DISALLOWED_SEGMENTS.contains(segment) {
            return Err(ToolError::PathInvalid(path.to_owned()));
        }
    }
    set_segments(target, &segments, value, path)
}

fn set_segments(
    target: &mut Value,
    segments: &[&str],
    value: Value,
    full_path: &str,
) -> Result<(), ToolError> {
    let (head, rest) = segments
        .split_first()
        .expect("set_path guarantees at least one segment");

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let obj = target
        .as_object_mut()
        .expect("just coerced target to an object");

    if rest.is_empty() {
        obj.insert((*head).to_owned(), value);
        return Ok(());
    }

    let child = obj.entry((*head).to_owned()).or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    set_segments(child, rest, value, full_path)
}
