//! Script generation: argument marshalling and template expansion.
//!
//! A code template contains positional placeholders `$v1…$vN` referring to the
//! call's arguments in declaration order. The template is parsed into a
//! structured segment list rather than substituted textually, so a shorter
//! placeholder can never partially match a longer one (`$v1` inside `$v10`).
//!
//! The generated script is self-contained: it imports what it needs, defines
//! the reporting primitive `pybridge_return`, decodes the argument record in a
//! single step, and only then runs the caller's code.

use std::net::SocketAddr;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Error, Result};

/// One parsed piece of a code template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Verbatim template text.
    Literal(String),
    /// A `$v{n}` placeholder, 1-based.
    Slot(usize),
}

/// A code template parsed into literal and placeholder segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template.
    ///
    /// A placeholder is `$v` followed by a maximal run of ASCII digits. `$v`
    /// without digits is ordinary text.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("$v") {
                let digits: &str = &after[..after
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after.len())];
                if !digits.is_empty() {
                    let slot: usize = digits.parse().map_err(|_| {
                        Error::Template(format!("placeholder index too large: $v{digits}"))
                    })?;
                    if slot == 0 {
                        return Err(Error::Template(
                            "placeholder indices are 1-based; $v0 is invalid".to_string(),
                        ));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(slot));
                    rest = &after[digits.len()..];
                    continue;
                }
            }

            if let Some(c) = rest.chars().next() {
                literal.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Highest slot index referenced, or 0 for a slot-free template.
    pub fn max_slot(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Slot(slot) => *slot,
                Segment::Literal(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// Render the template, substituting each slot with a lookup of its
    /// synthetic variable in the decoded argument record.
    pub fn render(&self, provided: usize) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    if *slot > provided {
                        return Err(Error::SlotOutOfRange {
                            slot: *slot,
                            provided,
                        });
                    }
                    out.push_str(&format!("vars['var{slot}']"));
                }
            }
        }
        Ok(out)
    }
}

/// Serialize arguments into the ordered `var1…varN` record.
///
/// Names are positional: reordering arguments changes their bound names.
pub fn argument_record(args: &[Value]) -> Map<String, Value> {
    let mut record = Map::new();
    for (i, arg) in args.iter().enumerate() {
        record.insert(format!("var{}", i + 1), arg.clone());
    }
    record
}

/// Python preamble defining the reporting primitive for one call.
///
/// The callback address and the call's correlation token are baked in; a
/// failed post is reported on the interpreter's own output, never escalated.
fn preamble(endpoint: SocketAddr, token: Uuid) -> String {
    format!(
        r#"import requests
import json

def pybridge_return(data, url="http://{endpoint}/result"):
    response = requests.post(url, json={{"token": "{token}", "data": data}})
    if response.status_code != 200:
        print(f"pybridge: failed to deliver result: {{response.status_code}}")

"#
    )
}

/// Build a self-contained script: preamble, argument record, then user code.
pub fn build_script(
    template: &str,
    args: &[Value],
    endpoint: SocketAddr,
    token: Uuid,
) -> Result<String> {
    let parsed = Template::parse(template)?;
    let body = parsed.render(args.len())?;

    let mut script = preamble(endpoint, token);
    if !args.is_empty() {
        let record = Value::Object(argument_record(args));
        let json_text = serde_json::to_string(&record)?;
        // The record is embedded as a string literal, so the JSON text itself
        // is escaped once more; quotes and backslashes inside argument values
        // survive the round trip.
        let embedded = serde_json::to_string(&json_text)?;
        script.push_str(&format!("vars = json.loads({embedded})\n"));
    }
    script.push_str(&body);
    script.push('\n');
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint() -> SocketAddr {
        "127.0.0.1:8763".parse().expect("bad addr")
    }

    #[test]
    fn test_parse_literal_only() {
        let template = Template::parse("print('hello')").expect("parse failed");
        assert_eq!(template.max_slot(), 0);
        assert_eq!(template.render(0).expect("render failed"), "print('hello')");
    }

    #[test]
    fn test_parse_slots_and_literals() {
        let template = Template::parse("a = $v1 + $v2").expect("parse failed");
        assert_eq!(template.max_slot(), 2);
        assert_eq!(
            template.render(2).expect("render failed"),
            "a = vars['var1'] + vars['var2']"
        );
    }

    #[test]
    fn test_v1_does_not_consume_v10() {
        let template = Template::parse("$v1 $v10").expect("parse failed");
        assert_eq!(
            template.render(10).expect("render failed"),
            "vars['var1'] vars['var10']"
        );
    }

    #[test]
    fn test_adjacent_digits_belong_to_slot() {
        // $v12 is slot 12, not slot 1 followed by "2"
        let template = Template::parse("$v12").expect("parse failed");
        assert_eq!(template.max_slot(), 12);
    }

    #[test]
    fn test_dollar_v_without_digits_is_literal() {
        let template = Template::parse("$value = 1").expect("parse failed");
        assert_eq!(template.render(0).expect("render failed"), "$value = 1");
    }

    #[test]
    fn test_slot_zero_rejected() {
        let err = Template::parse("$v0").expect_err("expected error");
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_slot_out_of_range() {
        let template = Template::parse("$v3").expect("parse failed");
        let err = template.render(2).expect_err("expected error");
        match err {
            Error::SlotOutOfRange { slot, provided } => {
                assert_eq!(slot, 3);
                assert_eq!(provided, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_argument_record_positional_names() {
        let args = vec![json!(3), json!("x"), json!([1, 2])];
        let record = argument_record(&args);
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("var1"), Some(&json!(3)));
        assert_eq!(record.get("var2"), Some(&json!("x")));
        assert_eq!(record.get("var3"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_argument_record_round_trips() {
        let args = vec![json!({"k": [1, 2.5, null]}), json!("he said \"hi\"\n")];
        let record = Value::Object(argument_record(&args));
        let text = serde_json::to_string(&record).expect("serialize failed");
        let back: Value = serde_json::from_str(&text).expect("deserialize failed");
        assert_eq!(back["var1"], args[0]);
        assert_eq!(back["var2"], args[1]);
    }

    #[test]
    fn test_build_script_is_self_contained() {
        let token = Uuid::new_v4();
        let script = build_script(
            "pybridge_return({'sum': $v1 + $v2})",
            &[json!(3), json!(4)],
            endpoint(),
            token,
        )
        .expect("build failed");

        assert!(script.starts_with("import requests\nimport json\n"));
        assert!(script.contains("def pybridge_return(data, url=\"http://127.0.0.1:8763/result\")"));
        assert!(script.contains(&token.to_string()));
        assert!(script.contains("vars = json.loads("));
        assert!(script.contains("pybridge_return({'sum': vars['var1'] + vars['var2']})"));
    }

    #[test]
    fn test_build_script_without_args_omits_record() {
        let script = build_script("pybridge_return({'ok': 1})", &[], endpoint(), Uuid::new_v4())
            .expect("build failed");
        assert!(!script.contains("vars ="));
        assert!(script.contains("pybridge_return({'ok': 1})"));
    }

    #[test]
    fn test_embedded_record_survives_quoting() {
        let args = vec![json!("quote \" backslash \\ newline \n")];
        let script = build_script("print($v1)", &args, endpoint(), Uuid::new_v4())
            .expect("build failed");

        // Recover the embedded literal and check it decodes back to the record.
        let line = script
            .lines()
            .find(|l| l.starts_with("vars = json.loads("))
            .expect("no vars line");
        let literal = &line["vars = json.loads(".len()..line.len() - 1];
        let json_text: String = serde_json::from_str(literal).expect("bad string literal");
        let record: Value = serde_json::from_str(&json_text).expect("bad record");
        assert_eq!(record["var1"], args[0]);
    }
}
