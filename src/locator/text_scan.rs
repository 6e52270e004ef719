//! Text-scan locators for JSON files.
//!
//! Plan and state exports (and `.tf.json` configuration) carry no position
//! metadata, so spans are recovered from the raw text. The scan walks lines
//! while tracking bracket depth outside of string literals:
//!
//! - Named children (`"outputs": { "<name>": { ... } }`) are found by key, at
//!   the depth directly inside their parent object.
//! - Resource list elements are found by a discriminating field at element
//!   depth (`"type"` for state, `"address"` for plan), then confirmed by
//!   scanning the whole element for its sibling fields. State elements also
//!   have to agree on `"module"` and `"mode"`, which come before `"type"`.
//!
//! When no complete multi-line span is found, a minified file is handled by
//! decoding the surrounding JSON and returning the matching fragment with a
//! span covering the whole file.

use super::{slice_lines, BlockKind, BlockRef, LineTerminator, Locator, SourceSpan};
use crate::error::{Result, TfInspectError};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static RESOURCES_CONTAINER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""resources"\s*:\s*\["#).expect("Invalid regex"));

/// Which JSON layout a file follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `terraform show -json` plan
    Plan,
    /// `.tfstate`
    State,
    /// `.tf.json` configuration
    Configuration,
}

/// Locator for JSON files, selected per [`ExportFormat`].
pub struct JsonExportLocator<'a> {
    path: &'a Path,
    content: &'a str,
    lines: Vec<&'a str>,
    format: ExportFormat,
}

impl<'a> JsonExportLocator<'a> {
    #[must_use]
    pub fn new(path: &'a Path, content: &'a str, format: ExportFormat) -> Self {
        Self { path, content, lines: content.lines().collect(), format }
    }

    fn span(&self, (start, end): (usize, usize)) -> SourceSpan {
        SourceSpan::new(start, end, slice_lines(self.content, start, end, LineTerminator::Each))
    }

    fn not_found(&self, target: &BlockRef) -> TfInspectError {
        crate::err!(SourceNotFound {
            file: self.path.to_path_buf(),
            block: target.to_string(),
        })
    }

    /// Keys leading from the document root to the wanted value.
    fn key_path(&self, target: &BlockRef) -> Option<Vec<String>> {
        let container = match (self.format, target.kind) {
            (ExportFormat::Configuration, kind) => kind.keyword(),
            (_, BlockKind::Output) => "outputs",
            (_, BlockKind::Variable) => "variables",
            _ => return None,
        };
        let mut keys = vec![container.to_string()];
        keys.extend(target.labels.iter().cloned());
        keys.extend(target.attribute.iter().cloned());
        Some(keys)
    }

    fn resource_probe(&self, target: &BlockRef) -> Result<Option<ResourceProbe>> {
        let [resource_type, name] = target.labels.as_slice() else {
            return Ok(None);
        };
        let probe = match self.format {
            ExportFormat::State => {
                let module = target.module.as_deref();
                Some(ResourceProbe::state(resource_type, name, module, target.kind == BlockKind::Data)?)
            }
            ExportFormat::Plan => {
                let address = target.address.clone().unwrap_or_else(|| format!("{resource_type}.{name}"));
                Some(ResourceProbe::plan(&address, resource_type)?)
            }
            ExportFormat::Configuration => None,
        };
        Ok(probe)
    }

    fn segments(&self, from: Pos) -> impl Iterator<Item = (usize, usize, &'a str)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .skip(from.line)
            .map(move |(line, &text)| {
                let base = if line == from.line { from.offset.min(text.len()) } else { 0 };
                (line, base, &text[base..])
            })
    }

    // ---------------------------------------------------------------------
    // Named children
    // ---------------------------------------------------------------------

    fn scan_key_path(&self, keys: &[String]) -> Result<Option<(usize, usize)>> {
        let Some((last, parents)) = keys.split_last() else {
            return Ok(None);
        };

        // The first key sits directly inside the root object.
        let mut region = Pos::default();
        let mut depth = 1;
        for key in parents {
            let Some(found) = self.find_key(region, &key_regex(key)?, depth) else {
                return Ok(None);
            };
            let Some(inside) = self.enter_object(found.value_at) else {
                return Ok(None);
            };
            region = inside;
            depth = 0;
        }

        let Some(found) = self.find_key(region, &key_regex(last)?, depth) else {
            return Ok(None);
        };
        Ok(self.value_end(found.value_at).map(|end| (found.line + 1, end + 1)))
    }

    fn find_key(&self, from: Pos, key: &Regex, depth: usize) -> Option<KeyMatch> {
        let mut scanner = DepthScanner::default();
        for (line, base, text) in self.segments(from) {
            let at_line_start = scanner;
            let mut exited_at = None;
            scanner.feed(text, |edge| {
                if let Edge::Exited(offset) = edge {
                    exited_at.get_or_insert(offset);
                }
            });
            for m in key.find_iter(text) {
                if exited_at.is_some_and(|exit| m.start() > exit) {
                    break;
                }
                let state = at_line_start.after(&text[..m.start()]);
                if !state.in_string && state.depth == depth {
                    return Some(KeyMatch { line, value_at: Pos { line, offset: base + m.end() } });
                }
            }
            if exited_at.is_some() {
                return None;
            }
        }
        None
    }

    /// Position just inside the object starting at `from`.
    fn enter_object(&self, from: Pos) -> Option<Pos> {
        for (line, base, text) in self.segments(from) {
            let trimmed = text.trim_start();
            if trimmed.is_empty() {
                continue;
            }
            return trimmed
                .starts_with('{')
                .then(|| Pos { line, offset: base + (text.len() - trimmed.len()) + 1 });
        }
        None
    }

    /// Zero-based line where the value starting at `from` ends.
    fn value_end(&self, from: Pos) -> Option<usize> {
        let mut scanner = DepthScanner::default();
        let mut nested = false;
        for (line, _, text) in self.segments(from) {
            if !nested {
                let trimmed = text.trim_start();
                if trimmed.is_empty() {
                    continue;
                }
                let opens = trimmed.starts_with('{') || trimmed.starts_with('[');
                if !opens {
                    return Some(line);
                }
                nested = true;
            }
            let mut closed = false;
            scanner.feed(text, |edge| closed |= matches!(edge, Edge::Closed(_)));
            if closed {
                return Some(line);
            }
        }
        None
    }

    // ---------------------------------------------------------------------
    // Resource lists
    // ---------------------------------------------------------------------

    fn scan_resources(&self, probe: &ResourceProbe) -> Option<(usize, usize)> {
        let mut from = Pos::default();
        loop {
            let container = self.find_container(from)?;
            match self.scan_elements(container, probe) {
                Elements::Found(start, end) => return Some((start + 1, end + 1)),
                Elements::Truncated => return None,
                Elements::Exhausted(after) => from = after?,
            }
        }
    }

    fn find_container(&self, from: Pos) -> Option<Pos> {
        self.segments(from).find_map(|(line, base, text)| {
            RESOURCES_CONTAINER
                .find(text)
                .map(|m| Pos { line, offset: base + m.end() })
        })
    }

    fn scan_elements(&self, from: Pos, probe: &ResourceProbe) -> Elements {
        let mut scanner = DepthScanner::default();
        let mut element_open: Option<Pos> = None;
        let mut target: Option<Target> = None;

        for (line, base, text) in self.segments(from) {
            let at_line_start = scanner;
            let mut edges = Vec::new();
            scanner.feed(text, |edge| edges.push(edge));

            if target.is_none() {
                target = self.confirm_on_line(probe, line, base, text, at_line_start, &edges, element_open);
            }

            for edge in &edges {
                match *edge {
                    Edge::Opened(offset) if target.is_none() => element_open = Some(Pos { line, offset: base + offset }),
                    Edge::Opened(_) => {}
                    Edge::Closed(offset) => {
                        if let Some(found) = target {
                            if line > found.confirmed_line || offset > found.confirmed_offset {
                                return Elements::Found(found.start_line, line);
                            }
                        }
                    }
                    Edge::Exited(offset) => {
                        if target.is_some() {
                            return Elements::Truncated;
                        }
                        return Elements::Exhausted(Some(Pos { line, offset: base + offset + 1 }));
                    }
                }
            }
        }

        if target.is_some() {
            tracing::debug!(file = %self.path.display(), "Resource element never closed, discarding start");
            Elements::Truncated
        } else {
            Elements::Exhausted(None)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn confirm_on_line(
        &self,
        probe: &ResourceProbe,
        line: usize,
        base: usize,
        text: &str,
        at_line_start: DepthScanner,
        edges: &[Edge],
        element_open: Option<Pos>,
    ) -> Option<Target> {
        for m in probe.primary.find_iter(text) {
            let state = at_line_start.after(&text[..m.start()]);
            if state.in_string || state.depth != 1 {
                continue;
            }
            let opened_here = edges.iter().rev().find_map(|edge| match *edge {
                Edge::Opened(offset) if offset < m.start() => Some(Pos { line, offset: base + offset }),
                _ => None,
            });
            let Some(open) = opened_here.or(element_open) else {
                continue;
            };
            if self.element_matches(open, probe) {
                return Some(Target { start_line: open.line, confirmed_line: line, confirmed_offset: m.start() });
            }
        }
        None
    }

    /// Check every field of `probe` against the element opening at `open`.
    ///
    /// Only keys of the element itself count, not keys of nested values. An
    /// element that never closes does not match.
    fn element_matches(&self, open: Pos, probe: &ResourceProbe) -> bool {
        let mut scanner = DepthScanner::default();
        let mut seen = vec![false; probe.checks.len()];

        for (_, _, text) in self.segments(open) {
            let at_line_start = scanner;
            let mut closed_at = None;
            scanner.feed(text, |edge| {
                if let Edge::Closed(offset) | Edge::Exited(offset) = edge {
                    closed_at.get_or_insert(offset);
                }
            });
            for (check, seen) in probe.checks.iter().zip(seen.iter_mut()) {
                for m in check.pattern.find_iter(text) {
                    if closed_at.is_some_and(|close| m.start() > close) {
                        break;
                    }
                    let state = at_line_start.after(&text[..m.start()]);
                    if !state.in_string && state.depth == 1 {
                        *seen = true;
                        break;
                    }
                }
            }
            if closed_at.is_some() {
                return probe.checks.iter().zip(&seen).all(|(check, &seen)| seen == check.present);
            }
        }
        false
    }

    // ---------------------------------------------------------------------
    // Minified fallback
    // ---------------------------------------------------------------------

    fn minified_fragment(&self, target: &BlockRef, probe: Option<&ResourceProbe>) -> Option<String> {
        let fragment = match probe {
            Some(probe) => RESOURCES_CONTAINER.find_iter(self.content).find_map(|m| {
                let open = m.end() - 1;
                let array = balanced_slice(self.content, open)?;
                let elements: Vec<serde_json::Value> = serde_json::from_str(array).ok()?;
                elements.into_iter().find(|element| probe.matches_json(element))
            })?,
            None => {
                let keys = self.key_path(target)?;
                let root: serde_json::Value = serde_json::from_str(self.content).ok()?;
                keys.iter().try_fold(&root, |value, key| value.get(key))?.clone()
            }
        };
        serde_json::to_string(&fragment).ok()
    }
}

impl Locator for JsonExportLocator<'_> {
    fn locate(&self, target: &BlockRef) -> Result<SourceSpan> {
        let probe = match target.kind {
            BlockKind::Resource | BlockKind::Data => self.resource_probe(target)?,
            _ => None,
        };

        // A single-line file has no useful line range, only a fragment.
        let minified = self.lines.len() <= 1;
        let lines = match (&probe, self.key_path(target)) {
            _ if minified => None,
            (Some(probe), _) => self.scan_resources(probe),
            (None, Some(keys)) => self.scan_key_path(&keys)?,
            (None, None) => None,
        };
        if let Some(lines) = lines {
            return Ok(self.span(lines));
        }

        match self.minified_fragment(target, probe.as_ref()) {
            Some(fragment) => {
                tracing::debug!(file = %self.path.display(), block = %target, "Using minified fallback span");
                Ok(SourceSpan::new(1, self.lines.len(), fragment))
            }
            None => Err(self.not_found(target)),
        }
    }
}

/// Discriminating fields of one resource list element.
///
/// `primary` finds candidate lines; every check then has to hold for the
/// element the candidate sits in.
struct ResourceProbe {
    primary: Regex,
    checks: Vec<FieldCheck>,
}

/// One element-level field that must be present (`"key": "value"`) or
/// absent (`"key": "value"`, or the key at all when `value` is `None`).
struct FieldCheck {
    key: &'static str,
    value: Option<String>,
    present: bool,
    pattern: Regex,
}

impl FieldCheck {
    fn equals(key: &'static str, value: &str) -> Result<Self> {
        Ok(Self { key, value: Some(value.to_string()), present: true, pattern: field_regex(key, value)? })
    }

    fn not_equals(key: &'static str, value: &str) -> Result<Self> {
        Ok(Self { key, value: Some(value.to_string()), present: false, pattern: field_regex(key, value)? })
    }

    fn absent(key: &'static str) -> Result<Self> {
        Ok(Self { key, value: None, present: false, pattern: key_regex(key)? })
    }

    fn matches_json(&self, element: &serde_json::Value) -> bool {
        let actual = element.get(self.key);
        match (&self.value, self.present) {
            (Some(wanted), true) => actual.and_then(serde_json::Value::as_str) == Some(wanted.as_str()),
            (Some(unwanted), false) => actual.and_then(serde_json::Value::as_str) != Some(unwanted.as_str()),
            (None, _) => actual.is_none() != self.present,
        }
    }
}

impl ResourceProbe {
    /// State elements: `"type"` with `"name"`, in the given module and mode.
    /// Root module elements carry no `"module"` key.
    fn state(resource_type: &str, name: &str, module: Option<&str>, data: bool) -> Result<Self> {
        let mut checks = vec![FieldCheck::equals("type", resource_type)?, FieldCheck::equals("name", name)?];
        checks.push(match module {
            Some(module) => FieldCheck::equals("module", module)?,
            None => FieldCheck::absent("module")?,
        });
        checks.push(if data { FieldCheck::equals("mode", "data")? } else { FieldCheck::not_equals("mode", "data")? });
        Ok(Self { primary: field_regex("type", resource_type)?, checks })
    }

    /// Plan elements: `"address"` with `"type"`.
    fn plan(address: &str, resource_type: &str) -> Result<Self> {
        Ok(Self {
            primary: field_regex("address", address)?,
            checks: vec![FieldCheck::equals("address", address)?, FieldCheck::equals("type", resource_type)?],
        })
    }

    fn matches_json(&self, element: &serde_json::Value) -> bool {
        self.checks.iter().all(|check| check.matches_json(element))
    }
}

fn field_regex(key: &str, value: &str) -> Result<Regex> {
    let quoted = serde_json::to_string(value)?;
    compile(&format!(r#""{}"\s*:\s*{}"#, regex::escape(key), regex::escape(&quoted)))
}

fn key_regex(key: &str) -> Result<Regex> {
    let quoted = serde_json::to_string(key)?;
    compile(&format!(r"{}\s*:\s*", regex::escape(&quoted)))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| TfInspectError::internal(format!("invalid scan pattern '{pattern}': {e}"), file!(), line!()))
}

/// The bracketed value opening at byte `open`, including both brackets.
fn balanced_slice(content: &str, open: usize) -> Option<&str> {
    let mut scanner = DepthScanner::default();
    let mut end = None;
    scanner.feed(&content[open..], |edge| {
        if let Edge::Closed(offset) = edge {
            end.get_or_insert(offset);
        }
    });
    end.map(|end| &content[open..=open + end])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Pos {
    line: usize,
    offset: usize,
}

struct KeyMatch {
    line: usize,
    value_at: Pos,
}

#[derive(Debug, Clone, Copy)]
struct Target {
    start_line: usize,
    confirmed_line: usize,
    confirmed_offset: usize,
}

enum Elements {
    Found(usize, usize),
    Truncated,
    Exhausted(Option<Pos>),
}

/// Depth transitions reported by [`DepthScanner::feed`], with byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    /// Depth went from 0 to 1
    Opened(usize),
    /// Depth went from 1 to 0
    Closed(usize),
    /// A closing bracket at depth 0: the enclosing container ended
    Exited(usize),
}

/// Bracket depth tracker that ignores brackets inside JSON strings.
#[derive(Debug, Clone, Copy, Default)]
struct DepthScanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl DepthScanner {
    fn feed(&mut self, text: &str, mut on_edge: impl FnMut(Edge)) {
        for (offset, byte) in text.bytes().enumerate() {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }
            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => {
                    self.depth += 1;
                    if self.depth == 1 {
                        on_edge(Edge::Opened(offset));
                    }
                }
                b'}' | b']' => {
                    if self.depth == 0 {
                        on_edge(Edge::Exited(offset));
                    } else {
                        self.depth -= 1;
                        if self.depth == 0 {
                            on_edge(Edge::Closed(offset));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn after(mut self, text: &str) -> Self {
        self.feed(text, |_| {});
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn locate(content: &str, format: ExportFormat, target: &BlockRef) -> Result<SourceSpan> {
        JsonExportLocator::new(Path::new("fixture.json"), content, format).locate(target)
    }

    fn resource(resource_type: &str, name: &str) -> BlockRef {
        BlockRef::new(BlockKind::Resource, [resource_type, name])
    }

    const STATE: &str = r#"{
  "version": 4,
  "terraform_version": "1.6.0",
  "serial": 3,
  "lineage": "5b1c",
  "outputs": {
    "id": { "value": "i-1", "type": "string" }
  },
  "resources": [
    {
      "mode": "managed",
      "type": "aws_instance",
      "name": "web",
      "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
      "instances": [
        {
          "attributes": {
            "ami": "ami-123",
            "type": "aws_instance",
            "tags": { "Name": "web {0}" }
          },
          "dependencies": []
        }
      ]
    },
    {
      "mode": "managed",
      "type": "aws_instance",
      "name": "db",
      "instances": []
    }
  ]
}
"#;

    #[test]
    fn test_state_resource_span() {
        let span = locate(STATE, ExportFormat::State, &resource("aws_instance", "web")).unwrap();
        assert_eq!((span.start_line, span.end_line), (10, 25));
        assert!(span.source.starts_with("    {\n"));
        assert!(span.source.ends_with("    },\n"));
    }

    #[test]
    fn test_state_resource_sibling_must_match() {
        let span = locate(STATE, ExportFormat::State, &resource("aws_instance", "db")).unwrap();
        assert_eq!((span.start_line, span.end_line), (26, 31));

        let missing = locate(STATE, ExportFormat::State, &resource("aws_instance", "cache"));
        assert!(missing.unwrap_err().is_not_found());
    }

    #[test]
    fn test_state_output_span() {
        let target = BlockRef::new(BlockKind::Output, ["id"]);
        let span = locate(STATE, ExportFormat::State, &target).unwrap();
        assert_eq!((span.start_line, span.end_line), (7, 7));
        assert_eq!(span.source, "    \"id\": { \"value\": \"i-1\", \"type\": \"string\" }\n");
    }

    const PLAN: &str = r#"{
  "format_version": "1.2",
  "planned_values": {
    "root_module": {
      "resources": [
        {
          "address": "aws_instance.web[0]",
          "mode": "managed",
          "type": "aws_instance",
          "name": "web",
          "index": 0,
          "values": { "ami": "abc" }
        },
        {
          "address": "aws_instance.web[1]",
          "mode": "managed",
          "type": "aws_instance",
          "name": "web",
          "index": 1,
          "values": { "ami": "abc" }
        }
      ]
    }
  },
  "resource_changes": []
}
"#;

    #[test]
    fn test_plan_resource_span_by_address() {
        let first = resource("aws_instance", "web").with_address("aws_instance.web[0]");
        let span = locate(PLAN, ExportFormat::Plan, &first).unwrap();
        assert_eq!((span.start_line, span.end_line), (6, 13));

        let second = resource("aws_instance", "web").with_address("aws_instance.web[1]");
        let span = locate(PLAN, ExportFormat::Plan, &second).unwrap();
        assert_eq!((span.start_line, span.end_line), (14, 21));
    }

    #[test]
    fn test_truncated_element_is_not_found() {
        let truncated: String = STATE.lines().take(20).collect::<Vec<_>>().join("\n");
        let result = locate(&truncated, ExportFormat::State, &resource("aws_instance", "web"));
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_minified_plan_fallback() {
        let minified = r#"{"format_version":"1.2","planned_values":{"root_module":{"resources":[{"address":"aws_instance.web","mode":"managed","type":"aws_instance","name":"web","values":{"ami":"abc"}}]}},"resource_changes":[]}"#;
        let target = resource("aws_instance", "web").with_address("aws_instance.web");
        let span = locate(minified, ExportFormat::Plan, &target).unwrap();
        assert_eq!((span.start_line, span.end_line), (1, 1));
        let fragment: serde_json::Value = serde_json::from_str(&span.source).unwrap();
        assert_eq!(fragment["address"], "aws_instance.web");
        assert_eq!(fragment["values"]["ami"], "abc");
    }

    #[test]
    fn test_minified_state_fragment_respects_module() {
        let minified = r#"{"version":4,"resources":[{"module":"module.a","mode":"managed","type":"t","name":"n","instances":[]},{"module":"module.b","mode":"managed","type":"t","name":"n","instances":[]}]}"#;
        let target = resource("t", "n").in_module(Some("module.b"));
        let span = locate(minified, ExportFormat::State, &target).unwrap();
        let fragment: serde_json::Value = serde_json::from_str(&span.source).unwrap();
        assert_eq!(fragment["module"], "module.b");

        let root = locate(minified, ExportFormat::State, &resource("t", "n"));
        assert!(root.unwrap_err().is_not_found());
    }

    #[test]
    fn test_single_line_elements() {
        let content = "{\n\"resources\": [\n{\"type\": \"a\", \"name\": \"x\"}, {\"type\": \"a\", \"name\": \"y\"}\n]\n}\n";
        let span = locate(content, ExportFormat::State, &resource("a", "y")).unwrap();
        assert_eq!((span.start_line, span.end_line), (3, 3));
    }

    #[test]
    fn test_tf_json_configuration_key_path() {
        let content = r#"{
  "variable": {
    "region": {
      "default": "us-east-1"
    }
  },
  "resource": {
    "aws_instance": {
      "web": {
        "ami": "x"
      }
    }
  }
}
"#;
        let variable = BlockRef::new(BlockKind::Variable, ["region"]);
        let span = locate(content, ExportFormat::Configuration, &variable).unwrap();
        assert_eq!((span.start_line, span.end_line), (3, 5));

        let span = locate(content, ExportFormat::Configuration, &resource("aws_instance", "web")).unwrap();
        assert_eq!((span.start_line, span.end_line), (9, 11));
    }

    #[test]
    fn test_depth_scanner_ignores_brackets_in_strings() {
        let mut scanner = DepthScanner::default();
        let mut edges = Vec::new();
        scanner.feed(r#"{"a": "}{", "b": "\"}"}"#, |edge| edges.push(edge));
        assert_eq!(scanner.depth, 0);
        assert_eq!(edges.len(), 2);
    }
}
