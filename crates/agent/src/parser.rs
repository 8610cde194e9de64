//! Directive parser: turns free backend text into a typed [`Directive`].
//!
//! The backend speaks a plain-text convention:
//!
//! ```text
//! Thought: ...
//! Action: update_node_category
//! Action Input: {"node_path": "root/商务标", "category": "business"}
//! ```
//!
//! or, when done,
//!
//! ```text
//! Final Answer: [ ...json forest... ]
//! ```
//!
//! `Final Answer:` wins when both markers appear. JSON payloads are read with
//! a streaming deserializer, so only the first complete value after the marker
//! is consumed and trailing prose is ignored.

use catalogist_core::tool::ToolCall;
use regex_lite::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const FINAL_ANSWER_MARKER: &str = "Final Answer:";
const ACTION_INPUT_MARKER: &str = "Action Input:";
const FENCE: &str = "```";

/// Matches `Action: <ident>`.
static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Action:\s*(\w+)").expect("action regex"));

/// What the backend asked for in one reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// A terminal forest candidate, not yet validated.
    FinalAnswer(Vec<Value>),
    /// A tool invocation.
    ToolCall(ToolCall),
    /// The reply could not be acted on.
    Malformed(Malformed),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Malformed {
    /// `Final Answer:` present but no usable JSON followed it.
    FinalAnswer { reason: String },
    /// `Action:` present but its input was not a JSON object.
    ActionInput { tool: String, reason: String },
    /// Neither marker found.
    NoDirective,
}

/// Parse one backend reply.
pub fn parse(response: &str) -> Directive {
    if let Some(pos) = response.find(FINAL_ANSWER_MARKER) {
        let tail = &response[pos + FINAL_ANSWER_MARKER.len()..];
        return match parse_final_answer(tail) {
            Ok(nodes) => Directive::FinalAnswer(nodes),
            Err(reason) => Directive::Malformed(Malformed::FinalAnswer { reason }),
        };
    }

    let Some((tool, after_action)) = find_action(response) else {
        return Directive::Malformed(Malformed::NoDirective);
    };

    let arguments = match after_action.find(ACTION_INPUT_MARKER) {
        None => Value::Object(serde_json::Map::new()),
        Some(pos) => {
            let tail = &after_action[pos + ACTION_INPUT_MARKER.len()..];
            match parse_action_input(tail) {
                Ok(arguments) => arguments,
                Err(reason) => {
                    return Directive::Malformed(Malformed::ActionInput { tool, reason });
                }
            }
        }
    };

    Directive::ToolCall(ToolCall {
        name: tool,
        arguments,
    })
}

/// Locate `Action: <ident>`; returns the name and the text after it.
fn find_action(response: &str) -> Option<(String, &str)> {
    let caps = ACTION_RE.captures(response)?;
    let name = caps.get(1)?;
    Some((name.as_str().to_string(), &response[name.end()..]))
}

fn parse_final_answer(tail: &str) -> Result<Vec<Value>, String> {
    let value = first_json_value(tail, &['[', '{'])?;
    match value {
        Value::Array(nodes) => Ok(nodes),
        Value::Object(mut object) => match object.remove("children") {
            Some(Value::Array(nodes)) => Ok(nodes),
            Some(_) => Err("the object's \"children\" field is not an array".into()),
            None => Err("expected a JSON array or an object with a \"children\" field".into()),
        },
        other => Err(format!(
            "expected a JSON array or an object with a \"children\" field, found {}",
            kind(&other)
        )),
    }
}

fn parse_action_input(tail: &str) -> Result<Value, String> {
    match first_json_value(tail, &['{'])? {
        object @ Value::Object(_) => Ok(object),
        other => Err(format!("expected a JSON object, found {}", kind(&other))),
    }
}

/// Read the first JSON value in `text`, skipping leading prose and an
/// optional code fence. The value must open with one of `openers`.
fn first_json_value(text: &str, openers: &[char]) -> Result<Value, String> {
    let start = text
        .find(|c: char| openers.contains(&c))
        .ok_or_else(|| "no JSON payload found".to_string())?;

    let body = match text.find(FENCE) {
        // A fence before the payload: skip the language tag, if any
        Some(fence) if fence < start => {
            let inner = text[fence + FENCE.len()..]
                .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            let open = inner
                .find(|c: char| openers.contains(&c))
                .ok_or_else(|| "no JSON payload inside the code block".to_string())?;
            &inner[open..]
        }
        _ => &text[start..],
    };

    let mut stream = serde_json::Deserializer::from_str(body).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(format!("invalid JSON: {e}")),
        None => Err("no JSON payload found".into()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_call(directive: Directive) -> ToolCall {
        match directive {
            Directive::ToolCall(call) => call,
            other => panic!("Expected ToolCall, got: {other:?}"),
        }
    }

    fn final_answer(directive: Directive) -> Vec<Value> {
        match directive {
            Directive::FinalAnswer(nodes) => nodes,
            other => panic!("Expected FinalAnswer, got: {other:?}"),
        }
    }

    #[test]
    fn bare_array_final_answer() {
        let nodes = final_answer(parse(r#"Final Answer: [{"name":"Root"}]"#));
        assert_eq!(nodes, vec![json!({"name": "Root"})]);
    }

    #[test]
    fn fenced_final_answer_with_prose() {
        let text = "Thought: all modules present.\nFinal Answer:\nHere it is:\n```json\n[\n  {\"name\": \"商务标\", \"children\": []}\n]\n```\nDone.";
        let nodes = final_answer(parse(text));
        assert_eq!(nodes[0]["name"], "商务标");
    }

    #[test]
    fn bare_fence_without_language_tag() {
        let text = "Final Answer: ```\n[{\"name\": \"a\"}]\n```";
        assert_eq!(final_answer(parse(text)).len(), 1);
    }

    #[test]
    fn one_line_fenced_final_answer() {
        let nodes = final_answer(parse("Final Answer: ```json [{\"name\": \"a\"}]```"));
        assert_eq!(nodes, vec![json!({"name": "a"})]);

        let nodes = final_answer(parse("Final Answer: ```[{\"name\": \"b\"}]```"));
        assert_eq!(nodes, vec![json!({"name": "b"})]);
    }

    #[test]
    fn one_line_fenced_action_input() {
        let text = "Action: get_default_template\nAction Input: ```json {\"module_type\": \"pricing\"}```";
        let call = tool_call(parse(text));
        assert_eq!(call.arguments, json!({"module_type": "pricing"}));
    }

    #[test]
    fn children_object_is_unwrapped() {
        let text = r#"Final Answer: {"name": "root", "children": [{"name": "a"}, {"name": "b"}]}"#;
        let nodes = final_answer(parse(text));
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1]["name"], "b");
    }

    #[test]
    fn trailing_text_and_nested_brackets() {
        let text = r#"Final Answer: [{"name": "报价 [含税]", "children": [{"name": "x}"}]}] trailing ] junk"#;
        let nodes = final_answer(parse(text));
        assert_eq!(nodes[0]["name"], "报价 [含税]");
        assert_eq!(nodes[0]["children"][0]["name"], "x}");
    }

    #[test]
    fn final_answer_beats_action() {
        let text = "Action: get_default_template\nAction Input: {\"module_type\": \"pricing\"}\nFinal Answer: []";
        assert_eq!(final_answer(parse(text)), Vec::<Value>::new());
    }

    #[test]
    fn truncated_final_answer_is_malformed() {
        let directive = parse(r#"Final Answer: [{"name": "a""#);
        assert!(matches!(
            directive,
            Directive::Malformed(Malformed::FinalAnswer { ref reason }) if reason.contains("invalid JSON")
        ));
    }

    #[test]
    fn object_without_children_is_malformed() {
        let directive = parse(r#"Final Answer: {"name": "root"}"#);
        assert!(matches!(directive, Directive::Malformed(Malformed::FinalAnswer { .. })));
    }

    #[test]
    fn missing_payload_is_malformed() {
        let directive = parse("Final Answer: I could not finish.");
        assert!(matches!(
            directive,
            Directive::Malformed(Malformed::FinalAnswer { ref reason }) if reason.contains("no JSON")
        ));
    }

    #[test]
    fn tool_call_with_input() {
        let text = "Thought: pricing is missing.\nAction: get_default_template\nAction Input: {\"module_type\": \"pricing\"}";
        let call = tool_call(parse(text));
        assert_eq!(call.name, "get_default_template");
        assert_eq!(call.arguments, json!({"module_type": "pricing"}));
    }

    #[test]
    fn tool_call_input_with_nested_braces_and_trailing_text() {
        let text = "Action: update_node_category\nAction Input: {\"node_path\": \"root/方案{一}\", \"category\": \"technical\"}\nObservation: (pending)";
        let call = tool_call(parse(text));
        assert_eq!(call.arguments["node_path"], "root/方案{一}");
    }

    #[test]
    fn tool_call_without_input_gets_empty_object() {
        let call = tool_call(parse("Action: get_default_template"));
        assert_eq!(call.arguments, json!({}));
    }

    #[test]
    fn bad_action_input_is_malformed() {
        let directive = parse("Action: update_node_category\nAction Input: {node_path: root}");
        match directive {
            Directive::Malformed(Malformed::ActionInput { tool, reason }) => {
                assert_eq!(tool, "update_node_category");
                assert!(reason.contains("invalid JSON"));
            }
            other => panic!("Expected ActionInput, got: {other:?}"),
        }
    }

    #[test]
    fn action_input_must_be_object() {
        let directive = parse("Action: get_default_template\nAction Input: \"pricing\"");
        assert!(matches!(directive, Directive::Malformed(Malformed::ActionInput { .. })));
    }

    #[test]
    fn plain_prose_is_no_directive() {
        assert_eq!(
            parse("Thought: I am still thinking about it."),
            Directive::Malformed(Malformed::NoDirective)
        );
        assert_eq!(parse(""), Directive::Malformed(Malformed::NoDirective));
    }
}
