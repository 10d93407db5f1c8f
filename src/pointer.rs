//! RFC 6901 JSON Pointer parsing and navigation.

use crate::error::PointerError;
use crate::value::Value;

/// A parsed JSON Pointer: an ordered list of reference tokens, already
/// `~1`/`~0`-unescaped. The empty pointer (`""`) addresses the whole
/// document and has zero segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pointer {
    segments: Vec<String>,
}

/// The `-` token RFC 6901 reserves for "one past the end of the array".
const APPEND_TOKEN: &str = "-";

impl Pointer {
    /// The pointer addressing the whole document.
    pub fn root() -> Pointer {
        Pointer { segments: Vec::new() }
    }

    /// Build a pointer directly from already-unescaped segments.
    pub fn from_segments(segments: Vec<String>) -> Pointer {
        Pointer { segments }
    }

    /// Parse pointer text (`""` or starting with `/`) into a [`Pointer`].
    pub fn parse(text: &str) -> Result<Pointer, PointerError> {
        if text.is_empty() {
            return Ok(Pointer::root());
        }
        if !text.starts_with('/') {
            return Err(PointerError::MalformedPointer {
                text: text.to_string(),
                reason: "a non-empty pointer must start with `/`".to_string(),
            });
        }
        let segments = text[1..]
            .split('/')
            .map(decode_segment)
            .collect::<Vec<_>>();
        Ok(Pointer { segments })
    }

    /// Render back to RFC 6901 text (`~`→`~0`, `/`→`~1`).
    pub fn to_text(&self) -> String {
        if self.segments.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        for seg in &self.segments {
            out.push('/');
            out.push_str(&encode_segment(seg));
        }
        out
    }

    /// Borrow the unescaped segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// `true` if this pointer addresses the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Build the pointer for this pointer's parent and the last segment,
    /// or `None` at the root. Used by `add`/`remove`/`replace` to split
    /// "navigate to container" from "act on the final key".
    pub fn split_last(&self) -> Option<(Pointer, &str)> {
        let (last, rest) = self.segments.split_last()?;
        Some((Pointer::from_segments(rest.to_vec()), last.as_str()))
    }

    /// Append one more unescaped segment, returning a new pointer.
    pub fn join(&self, segment: impl Into<String>) -> Pointer {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Pointer { segments }
    }

    /// Concatenate `relative`'s segments onto this pointer, turning a
    /// scope-relative pointer into an absolute one.
    pub fn extend(&self, relative: &Pointer) -> Pointer {
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        Pointer { segments }
    }

    /// `true` if `self` is `scope` or a descendant of it — used to
    /// enforce control ops' "pointer must stay within scope" invariant.
    pub fn is_within(&self, scope: &Pointer) -> bool {
        self.segments.len() >= scope.segments.len()
            && self.segments[..scope.segments.len()] == scope.segments[..]
    }

    /// The segments of `self` past the `scope` prefix. Panics if `self`
    /// is not within `scope`; callers must check [`Pointer::is_within`]
    /// first.
    pub fn strip_prefix(&self, scope: &Pointer) -> Pointer {
        debug_assert!(self.is_within(scope));
        Pointer::from_segments(self.segments[scope.segments.len()..].to_vec())
    }

    /// `true` if the addressed location exists in `doc`.
    pub fn exists(&self, doc: &Value) -> bool {
        self.navigate(doc).is_ok()
    }

    /// Read the value at this pointer.
    pub fn get<'a>(&self, doc: &'a Value) -> Result<&'a Value, PointerError> {
        self.navigate(doc)
    }

    /// Read the value at this pointer, or `default` if any step along the
    /// way is missing (spec §4.B's `get-or-default`).
    pub fn get_or_default<'a>(&self, doc: &'a Value, default: &'a Value) -> &'a Value {
        self.navigate(doc).unwrap_or(default)
    }

    /// Mutably borrow the value at this pointer. Used by control
    /// operators to obtain the sub-view their nested patch runs against:
    /// the root pointer (`self.is_root()`) returns `doc` itself, so a
    /// scope of `""` is indistinguishable from running against the whole
    /// document.
    pub fn get_mut<'a>(&self, doc: &'a mut Value) -> Result<&'a mut Value, PointerError> {
        self.navigate_mut(doc)
    }

    fn navigate<'a>(&self, doc: &'a Value) -> Result<&'a Value, PointerError> {
        let mut current = doc;
        for (consumed, seg) in self.segments.iter().enumerate() {
            current = step(current, seg, &self.prefix_text(consumed + 1))?;
        }
        Ok(current)
    }

    /// Insert or overwrite the value at this pointer (RFC 6902 `add`
    /// semantics): object keys are set-or-created, array indices insert
    /// (shifting later elements), `-` appends.
    pub fn add(&self, doc: &mut Value, value: Value) -> Result<(), PointerError> {
        match self.split_last() {
            None => {
                *doc = value;
                Ok(())
            }
            Some((parent, key)) => {
                let parent_text = parent.to_text();
                let container = parent.navigate_mut(doc)?;
                match container {
                    Value::Object(map) => {
                        map.insert(key.to_string(), value);
                        Ok(())
                    }
                    Value::Array(arr) => {
                        let index = sanitize_index(key, arr.len(), true, &parent_text)?;
                        arr.insert(index, value);
                        Ok(())
                    }
                    other => Err(PointerError::KeyError {
                        pointer: parent_text,
                        key: format!("{key} (container is a {})", other.kind()),
                    }),
                }
            }
        }
    }

    /// Remove and return the value at this pointer.
    pub fn remove(&self, doc: &mut Value) -> Result<Value, PointerError> {
        let (parent, key) = self.split_last().ok_or_else(|| PointerError::KeyError {
            pointer: String::new(),
            key: "(root cannot be removed)".to_string(),
        })?;
        let parent_text = parent.to_text();
        let container = parent.navigate_mut(doc)?;
        match container {
            Value::Object(map) => map.shift_remove(key).ok_or_else(|| PointerError::KeyError {
                pointer: parent_text,
                key: key.to_string(),
            }),
            Value::Array(arr) => {
                let index = sanitize_index(key, arr.len(), false, &parent_text)?;
                Ok(arr.remove(index))
            }
            other => Err(PointerError::KeyError {
                pointer: parent_text,
                key: format!("{key} (container is a {})", other.kind()),
            }),
        }
    }

    fn navigate_mut<'a>(&self, doc: &'a mut Value) -> Result<&'a mut Value, PointerError> {
        let mut current = doc;
        for (consumed, seg) in self.segments.iter().enumerate() {
            current = step_mut(current, seg, &self.prefix_text(consumed + 1))?;
        }
        Ok(current)
    }

    fn prefix_text(&self, len: usize) -> String {
        Pointer::from_segments(self.segments[..len].to_vec()).to_text()
    }
}

fn step<'a>(current: &'a Value, seg: &str, pointer_so_far: &str) -> Result<&'a Value, PointerError> {
    match current {
        Value::Object(map) => map.get(seg).ok_or_else(|| PointerError::KeyError {
            pointer: pointer_so_far.to_string(),
            key: seg.to_string(),
        }),
        Value::Array(arr) => {
            let index = sanitize_index(seg, arr.len(), false, pointer_so_far)?;
            Ok(&arr[index])
        }
        other => Err(PointerError::KeyError {
            pointer: pointer_so_far.to_string(),
            key: format!("{seg} (container is a {})", other.kind()),
        }),
    }
}

fn step_mut<'a>(current: &'a mut Value, seg: &str, pointer_so_far: &str) -> Result<&'a mut Value, PointerError> {
    match current {
        Value::Object(map) => map.get_mut(seg).ok_or_else(|| PointerError::KeyError {
            pointer: pointer_so_far.to_string(),
            key: seg.to_string(),
        }),
        Value::Array(arr) => {
            let index = sanitize_index(seg, arr.len(), false, pointer_so_far)?;
            Ok(&mut arr[index])
        }
        other => Err(PointerError::KeyError {
            pointer: pointer_so_far.to_string(),
            key: format!("{seg} (container is a {})", other.kind()),
        }),
    }
}

/// Turn an array reference token into a concrete index. `allow_append`
/// permits `-` and `len` (one past the end), matching `add`'s insertion
/// semantics; `remove`/read navigation never allows either.
fn sanitize_index(token: &str, len: usize, allow_append: bool, pointer: &str) -> Result<usize, PointerError> {
    if token == APPEND_TOKEN {
        if allow_append {
            return Ok(len);
        }
        return Err(PointerError::IndexError {
            pointer: pointer.to_string(),
            index: token.to_string(),
        });
    }
    if token.len() > 1 && token.starts_with('0') {
        return Err(PointerError::IndexError {
            pointer: pointer.to_string(),
            index: token.to_string(),
        });
    }
    let index: usize = token.parse().map_err(|_| PointerError::IndexError {
        pointer: pointer.to_string(),
        index: token.to_string(),
    })?;
    let bound = if allow_append { len } else { len.saturating_sub(1) };
    if allow_append {
        if index > len {
            return Err(PointerError::IndexError {
                pointer: pointer.to_string(),
                index: token.to_string(),
            });
        }
    } else if len == 0 || index > bound {
        return Err(PointerError::IndexError {
            pointer: pointer.to_string(),
            index: token.to_string(),
        });
    }
    Ok(index)
}

fn decode_segment(token: &str) -> String {
    // `~1` must decode before `~0` so a literal `~01` (escaped tilde
    // followed by a digit) doesn't get mis-read as `~1` first.
    token.replace("~1", "/").replace("~0", "~")
}

fn encode_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn doc() -> Value {
        let mut obj = IndexMap::new();
        obj.insert("a".to_string(), Value::Array(vec![Value::Number(1.into()), Value::Number(2.into())]));
        obj.insert("b".to_string(), Value::String("hi".to_string()));
        Value::Object(obj)
    }

    #[test]
    fn parse_round_trips_through_escaping() {
        let p = Pointer::parse("/a~1b/c~0d").unwrap();
        assert_eq!(p.segments(), &["a/b".to_string(), "c~d".to_string()]);
        assert_eq!(p.to_text(), "/a~1b/c~0d");
    }

    #[test]
    fn empty_pointer_is_root() {
        let p = Pointer::parse("").unwrap();
        assert!(p.is_root());
        assert_eq!(p.to_text(), "");
    }

    #[test]
    fn navigates_objects_and_arrays() {
        let d = doc();
        let p = Pointer::parse("/a/1").unwrap();
        assert_eq!(p.get(&d).unwrap(), &Value::Number(2.into()));
    }

    #[test]
    fn append_token_only_valid_for_add() {
        let mut d = doc();
        let p = Pointer::parse("/a/-").unwrap();
        p.add(&mut d, Value::Number(3.into())).unwrap();
        assert_eq!(p.exists(&d), false); // `-` itself never resolves as a read
        assert_eq!(Pointer::parse("/a/2").unwrap().get(&d).unwrap(), &Value::Number(3.into()));
    }

    #[test]
    fn rejects_leading_zero_index() {
        let d = doc();
        let err = Pointer::parse("/a/01").unwrap().get(&d).unwrap_err();
        assert!(matches!(err, PointerError::IndexError { .. }));
    }

    #[test]
    fn get_or_default_falls_back_when_missing() {
        let d = doc();
        let fallback = Value::Null;
        assert_eq!(Pointer::parse("/missing").unwrap().get_or_default(&d, &fallback), &Value::Null);
        assert_eq!(
            Pointer::parse("/a/0").unwrap().get_or_default(&d, &fallback),
            &Value::Number(1.into())
        );
    }

    #[test]
    fn is_within_and_strip_prefix() {
        let scope = Pointer::parse("/a").unwrap();
        let inner = Pointer::parse("/a/0").unwrap();
        assert!(inner.is_within(&scope));
        assert_eq!(inner.strip_prefix(&scope).to_text(), "/0");
        assert!(!Pointer::parse("/b").unwrap().is_within(&scope));
    }
}
