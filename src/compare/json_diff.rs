//! Structural JSON diff.
//!
//! Produces an ordered list of patch-like operations whose paths are RFC 6901
//! JSON pointers (`/items/0/name`). Exclusion paths in the configuration are
//! matched against these strings verbatim.
//!
//! Ordering: object members are visited in key order (removals and changes
//! of `a`'s keys first, then additions from `b`); array elements by index,
//! trailing removals highest index first, trailing additions lowest first.

use serde::Serialize;
use serde_json::{Number, Value};

/// Kind of a diff operation, named after JSON Patch verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffType {
    /// Present only in the second document.
    Add,
    /// Present only in the first document.
    Remove,
    /// Present in both with a different value or type.
    Replace,
}

impl DiffType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffType::Add => "add",
            DiffType::Remove => "remove",
            DiffType::Replace => "replace",
        }
    }
}

/// One difference between two documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffOp {
    #[serde(rename = "type")]
    pub op: DiffType,
    pub path: String,
}

/// Diff `a` against `b`. Empty when the documents are equivalent.
pub fn diff(a: &Value, b: &Value) -> Vec<DiffOp> {
    let mut ops = Vec::new();
    diff_at(&mut String::new(), a, b, &mut ops);
    ops
}

fn diff_at(path: &mut String, a: &Value, b: &Value, ops: &mut Vec<DiffOp>) {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            let mut keys: Vec<&String> = left.keys().collect();
            keys.sort();
            for key in keys {
                let len = push_segment(path, key);
                match right.get(key) {
                    Some(rv) => diff_at(path, &left[key], rv, ops),
                    None => ops.push(op(DiffType::Remove, path)),
                }
                path.truncate(len);
            }

            let mut added: Vec<&String> = right.keys().filter(|k| !left.contains_key(*k)).collect();
            added.sort();
            for key in added {
                let len = push_segment(path, key);
                ops.push(op(DiffType::Add, path));
                path.truncate(len);
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            if equivalent(a, b) {
                return;
            }

            let shared = left.len().min(right.len());
            for i in 0..shared {
                let len = push_segment(path, &i.to_string());
                diff_at(path, &left[i], &right[i], ops);
                path.truncate(len);
            }
            for i in (shared..left.len()).rev() {
                let len = push_segment(path, &i.to_string());
                ops.push(op(DiffType::Remove, path));
                path.truncate(len);
            }
            for i in shared..right.len() {
                let len = push_segment(path, &i.to_string());
                ops.push(op(DiffType::Add, path));
                path.truncate(len);
            }
        }
        _ => {
            if !equivalent(a, b) {
                ops.push(op(DiffType::Replace, path));
            }
        }
    }
}

/// Semantic equality: numbers by value, arrays of equal length in any
/// order, objects member-wise.
fn equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && (left.iter().zip(right).all(|(l, r)| equivalent(l, r))
                    || same_elements_unordered(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(k, lv)| right.get(k).is_some_and(|rv| equivalent(lv, rv)))
        }
        _ => a == b,
    }
}

/// `1`, `1.0` and `1e0` are the same number. Integers are compared exactly
/// so large values do not collapse through `f64`.
fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    x.as_f64() == y.as_f64()
}

fn op(op: DiffType, path: &str) -> DiffOp {
    DiffOp {
        op,
        path: path.to_string(),
    }
}

/// Append `/segment` (escaped) and return the previous length.
fn push_segment(path: &mut String, segment: &str) -> usize {
    let len = path.len();
    path.push('/');
    for c in segment.chars() {
        match c {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            c => path.push(c),
        }
    }
    len
}

/// Multiset equality for arrays of equal length.
fn same_elements_unordered(left: &[Value], right: &[Value]) -> bool {
    let mut used = vec![false; right.len()];
    left.iter().all(|lv| {
        match right
            .iter()
            .enumerate()
            .find(|(i, rv)| !used[*i] && equivalent(lv, rv))
        {
            Some((i, _)) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}
