// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Dotted-path access into GitHub REST/GraphQL payloads with typed, non-panicking extraction
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper (typed extraction, non-empty string helper)
// invariants:
// - No panics; missing paths and JSON nulls yield None
// - Numeric path segments index into arrays ("edges.0.node")
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;

pub struct JsonFetched<'a> {
  inner: Option<&'a serde_json::Value>,
}

impl<'a> JsonFetched<'a> {
  pub fn value(&self) -> Option<&'a serde_json::Value> {
    self.inner.filter(|v| !v.is_null())
  }

  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self.value().and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  /// String value with surrounding whitespace removed; blank strings count as absent.
  pub fn to_non_empty_string(&self) -> Option<String> {
    self
      .value()
      .and_then(|v| v.as_str())
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
  }
}

/// Fetch nested values via dotted paths like "author.login" or "edges.0.node".
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for serde_json::Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      let next = match cur {
        serde_json::Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => cur.get(key),
      };

      match next {
        Some(v) => cur = v,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
