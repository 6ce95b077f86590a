//! Front-matter codec.
//!
//! A front-matter block is the first occurrence of bytes matching
//! `^---\n(.*?)\n---\n`. Each non-blank interior line is `key: value`; the
//! value is trimmed and has a single layer of matched `"`/`'` quoting
//! stripped. Unknown keys are preserved verbatim on round-trip; this
//! module never interprets any key but `id_outline`, and even that
//! interpretation happens in callers, not here.
//!
//! Parsing a file without a fenced block yields an empty map and a body
//! equal to the full input. Writing always emits a fenced block, even for
//! an empty map, followed by a blank line and the body.

const FENCE: &str = "---";

/// An ordered `key -> value` front-matter map. Order is preserved so a
/// round-trip through `parse` then `write` reproduces the original key
/// order, which matters for diff-friendliness of the on-disk files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
	entries: Vec<(String, String)>,
}

impl FrontMatter {
	pub fn new() -> Self {
		FrontMatter { entries: Vec::new() }
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	/// Set a key, preserving its existing position if present, else
	/// appending at the end.
	pub fn set(&mut self, key: &str, value: impl Into<String>) {
		let value = value.into();
		if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
			entry.1 = value;
		} else {
			self.entries.push((key.to_string(), value));
		}
	}

	pub fn remove(&mut self, key: &str) {
		self.entries.retain(|(k, _)| k != key);
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

/// Parse `content`, returning the front-matter map and the body that
/// follows it. If no fenced block is found at the very start of `content`,
/// returns an empty map and the full content as the body.
pub fn parse(content: &str) -> (FrontMatter, String) {
	let opening = format!("{}\n", FENCE);
	if !content.starts_with(&opening) {
		return (FrontMatter::new(), content.to_string());
	}

	let after_opening = &content[opening.len()..];
	let closing = format!("\n{}\n", FENCE);

	let close_pos = match after_opening.find(&closing) {
		Some(pos) => pos,
		None => return (FrontMatter::new(), content.to_string()),
	};

	let interior = &after_opening[..close_pos];
	let body = after_opening[close_pos + closing.len()..].to_string();

	let mut fm = FrontMatter::new();
	for line in interior.lines() {
		if line.trim().is_empty() {
			continue;
		}
		if let Some((key, raw_value)) = line.split_once(':') {
			let key = key.trim().to_string();
			let value = unquote(raw_value.trim());
			fm.entries.push((key, value));
		}
	}

	(fm, body)
}

/// Strip one layer of matched `"..."` or `'...'` quoting from `value`.
fn unquote(value: &str) -> String {
	let bytes = value.as_bytes();
	if bytes.len() >= 2 {
		let first = bytes[0];
		let last = bytes[bytes.len() - 1];
		if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
			return value[1..value.len() - 1].to_string();
		}
	}
	value.to_string()
}

/// A value is emitted unquoted only if it is an unambiguous simple
/// scalar: non-empty, single line, no leading/trailing whitespace, and
/// does not open with a character YAML would otherwise treat specially.
fn is_simple_scalar(value: &str) -> bool {
	if value.is_empty() || value.contains('\n') {
		return false;
	}
	if value.trim() != value {
		return false;
	}
	let first = value.chars().next().unwrap();
	if "\"'[{#&*!|>%@`,".contains(first) {
		return false;
	}
	if value.contains(": ") || value.ends_with(':') {
		return false;
	}
	true
}

/// Serialize `fm` followed by `body` into a full file. Always emits a
/// fenced block, even when `fm` is empty.
pub fn write(fm: &FrontMatter, body: &str) -> String {
	let mut out = String::new();
	out.push_str(FENCE);
	out.push('\n');
	for (key, value) in fm.iter() {
		out.push_str(key);
		out.push_str(": ");
		if is_simple_scalar(value) {
			out.push_str(value);
		} else {
			out.push_str(&serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value)));
		}
		out.push('\n');
	}
	out.push_str(FENCE);
	out.push('\n');
	out.push('\n');
	out.push_str(body);
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_missing_front_matter_yields_full_body() {
		let (fm, body) = parse("just a body\nno fences here\n");
		assert!(fm.is_empty());
		assert_eq!(body, "just a body\nno fences here\n");
	}

	#[test]
	fn parse_basic_block() {
		let content = "---\nid_outline: abc123\ntitle: \"Hello World\"\n---\n\nbody text\n";
		let (fm, body) = parse(content);
		assert_eq!(fm.get("id_outline"), Some("abc123"));
		assert_eq!(fm.get("title"), Some("Hello World"));
		assert_eq!(body, "body text\n");
	}

	#[test]
	fn parse_single_quoted_value() {
		let content = "---\nid_outline: 'xyz'\n---\nbody\n";
		let (fm, _) = parse(content);
		assert_eq!(fm.get("id_outline"), Some("xyz"));
	}

	#[test]
	fn parse_ignores_blank_interior_lines() {
		let content = "---\nid_outline: a\n\ntitle: b\n---\nbody\n";
		let (fm, _) = parse(content);
		assert_eq!(fm.get("id_outline"), Some("a"));
		assert_eq!(fm.get("title"), Some("b"));
	}

	#[test]
	fn round_trip_preserves_unknown_keys_and_order() {
		let content = "---\nfoo: bar\nid_outline: a1\nbaz: qux\n---\n\nbody here\n";
		let (mut fm, body) = parse(content);
		fm.set("id_outline", "a2");
		let rewritten = write(&fm, &body);
		let (fm2, body2) = parse(&rewritten);
		assert_eq!(fm2.get("foo"), Some("bar"));
		assert_eq!(fm2.get("baz"), Some("qux"));
		assert_eq!(fm2.get("id_outline"), Some("a2"));
		assert_eq!(body2, body);

		let keys: Vec<&str> = fm2.iter().map(|(k, _)| k).collect();
		assert_eq!(keys, vec!["foo", "id_outline", "baz"]);
	}

	#[test]
	fn write_emits_fence_even_when_empty() {
		let fm = FrontMatter::new();
		let out = write(&fm, "hello\n");
		assert_eq!(out, "---\n---\n\nhello\n");
	}

	#[test]
	fn write_quotes_non_simple_values() {
		let mut fm = FrontMatter::new();
		fm.set("title", "Has: a colon");
		let out = write(&fm, "");
		assert!(out.contains("title: \"Has: a colon\""));
	}
}
