use serde_json::{Map, Value};

pub const NO_JSON_ERROR: &str = "No JSON found in response";
pub const PARSE_ERROR: &str = "Failed to parse JSON response";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyJson {
    Structured(Map<String, Value>),
    Degraded { raw: String, error: &'static str },
}

impl ReplyJson {
    pub fn to_value(&self, fallback_key: &str) -> Value {
        match self {
            ReplyJson::Structured(map) => Value::Object(map.clone()),
            ReplyJson::Degraded { raw, error } => {
                let mut map = Map::new();
                map.insert(fallback_key.to_string(), Value::String(raw.clone()));
                map.insert("error".to_string(), Value::String((*error).to_string()));
                Value::Object(map)
            }
        }
    }
}

// Takes the span between the first '{' and the last '}' as the JSON candidate.
// A reply holding JSON followed by prose with a stray '}' therefore degrades
// instead of parsing; that matches the upstream behavior being reproduced.
pub fn extract_reply_json(text: &str) -> ReplyJson {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return ReplyJson::Degraded {
            raw: text.to_string(),
            error: NO_JSON_ERROR,
        };
    };
    if end < start {
        return ReplyJson::Degraded {
            raw: text.to_string(),
            error: NO_JSON_ERROR,
        };
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => ReplyJson::Structured(map),
        _ => ReplyJson::Degraded {
            raw: text.to_string(),
            error: PARSE_ERROR,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_surrounded_by_prose_is_extracted_deep_equal() {
        let reply = "Here is the analysis you asked for:\n{\"theme\": \"speed\", \"points\": [1, 2]}\nHope that helps.";
        let parsed = extract_reply_json(reply);
        assert_eq!(
            parsed.to_value("analysis"),
            json!({ "theme": "speed", "points": [1, 2] })
        );
    }

    #[test]
    fn urgency_reply_parses_to_its_embedded_object() {
        let parsed = extract_reply_json("Sure! {\"main_message\": \"urgency\"}");
        assert_eq!(parsed.to_value("analysis"), json!({ "main_message": "urgency" }));
    }

    #[test]
    fn reply_without_braces_degrades_with_verbatim_text() {
        let reply = "I cannot produce structured output for that request.";
        match extract_reply_json(reply) {
            ReplyJson::Degraded { raw, error } => {
                assert_eq!(raw, reply);
                assert_eq!(error, NO_JSON_ERROR);
            }
            other => panic!("expected degraded reply, got {other:?}"),
        }
    }

    #[test]
    fn closing_brace_before_opening_brace_counts_as_no_json() {
        let parsed = extract_reply_json("} nothing here {");
        assert_eq!(
            parsed,
            ReplyJson::Degraded {
                raw: "} nothing here {".to_string(),
                error: NO_JSON_ERROR,
            }
        );
    }

    #[test]
    fn unparseable_span_degrades_with_parse_error() {
        let reply = "{this is not json}";
        match extract_reply_json(reply) {
            ReplyJson::Degraded { raw, error } => {
                assert_eq!(raw, reply);
                assert_eq!(error, PARSE_ERROR);
            }
            other => panic!("expected degraded reply, got {other:?}"),
        }
    }

    #[test]
    fn stray_brace_in_trailing_prose_widens_the_span_and_degrades() {
        let reply = "{\"headline\": \"Go\"} and that closes things out }";
        assert!(matches!(
            extract_reply_json(reply),
            ReplyJson::Degraded { .. }
        ));
    }

    #[test]
    fn degraded_reply_serializes_under_the_requested_key() {
        let value = extract_reply_json("plain words").to_value("raw_text");
        assert_eq!(value["raw_text"], "plain words");
        assert_eq!(value["error"], NO_JSON_ERROR);
    }

    #[test]
    fn nested_objects_survive_extraction() {
        let reply = "{\"specs\": {\"width\": 728, \"height\": 90}}";
        let parsed = extract_reply_json(reply);
        assert_eq!(
            parsed.to_value("analysis"),
            json!({ "specs": { "width": 728, "height": 90 } })
        );
    }
}
