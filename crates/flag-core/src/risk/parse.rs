//! Parseo y validación de la respuesta cruda del razonador externo.

use flag_domain::{RiskAssessment, RiskLevel};
use serde_json::{Map, Value};

use crate::errors::ReasonerError;

const REQUIRED_FIELDS: [&str; 5] = ["risk_level", "risk_score", "detected_issues", "reasoning", "recommendation"];

/// Quita un bloque de código (```` ``` ```` o ```` ```json ````) alrededor del
/// JSON, si lo hay.
fn strip_fences(raw: &str) -> &str {
    let text = raw.trim();
    if !text.starts_with("```") {
        return text;
    }
    let inner = text.split("```").nth(1).unwrap_or("");
    let inner = inner.trim_start();
    inner.strip_prefix("json")
         .or_else(|| inner.strip_prefix("JSON"))
         .unwrap_or(inner)
         .trim()
}

fn field<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    match name {
        // Algunas variantes del prompt piden `ai_reasoning`.
        "reasoning" => obj.get("reasoning").or_else(|| obj.get("ai_reasoning")),
        _ => obj.get(name),
    }
}

fn malformed(msg: impl Into<String>) -> ReasonerError {
    ReasonerError::Malformed(msg.into())
}

fn as_score(v: &Value) -> Result<u8, ReasonerError> {
    let n = match v {
        Value::Number(n) => n,
        other => return Err(malformed(format!("risk_score must be a number, got {other}"))),
    };
    let as_int = if let Some(i) = n.as_i64() {
        i
    } else {
        match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.is_finite() => f as i64,
            _ => return Err(malformed(format!("risk_score must be an integer, got {n}"))),
        }
    };
    if !(0..=100).contains(&as_int) {
        return Err(malformed(format!("risk_score out of range: {as_int}")));
    }
    Ok(as_int as u8)
}

fn as_text(v: &Value, name: &str) -> Result<String, ReasonerError> {
    v.as_str()
     .map(str::to_string)
     .ok_or_else(|| malformed(format!("{name} must be a string")))
}

fn as_issues(v: &Value) -> Result<Vec<String>, ReasonerError> {
    let items = v.as_array().ok_or_else(|| malformed("detected_issues must be an array"))?;
    items.iter()
         .map(|i| i.as_str().map(str::to_string).ok_or_else(|| malformed("detected_issues must contain strings")))
         .collect()
}

/// Convierte la respuesta textual del razonador en un `RiskAssessment`.
///
/// Falla con `ReasonerError::Malformed` si el JSON no parsea, falta alguno de
/// los cinco campos, algún tipo no coincide, el score sale de [0,100] o el
/// nivel no corresponde al bucket del score.
pub fn parse_reasoner_reply(raw: &str) -> Result<RiskAssessment, ReasonerError> {
    let cleaned = strip_fences(raw);
    let value: Value = serde_json::from_str(cleaned).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    let obj = value.as_object().ok_or_else(|| malformed("reply is not a JSON object"))?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| field(obj, f).is_none()) {
        return Err(malformed(format!("missing required field: {missing}")));
    }

    let level_text = as_text(&obj["risk_level"], "risk_level")?;
    let level: RiskLevel = level_text.parse().map_err(|e| malformed(format!("{e}")))?;
    let score = as_score(&obj["risk_score"])?;
    let issues = as_issues(&obj["detected_issues"])?;
    let reasoning = field(obj, "reasoning").map(|v| as_text(v, "reasoning")).transpose()?.unwrap_or_default();
    let recommendation = as_text(&obj["recommendation"], "recommendation")?;

    RiskAssessment::new(level, score, issues, reasoning, recommendation).map_err(|e| malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK: &str = r#"{"risk_level":"high","risk_score":65,"detected_issues":["auth_change"],"reasoning":"touches login","recommendation":"manager review"}"#;

    #[test]
    fn parses_plain_json() {
        let a = parse_reasoner_reply(OK).unwrap();
        assert_eq!(a.risk_level(), RiskLevel::High);
        assert_eq!(a.risk_score(), 65);
        assert_eq!(a.detected_issues(), ["auth_change".to_string()]);
    }

    #[test]
    fn parses_fenced_json_with_tag() {
        let raw = format!("```json\n{OK}\n```");
        assert_eq!(parse_reasoner_reply(&raw).unwrap().risk_score(), 65);
        let raw = format!("  ```\n{OK}\n```  ");
        assert_eq!(parse_reasoner_reply(&raw).unwrap().risk_score(), 65);
    }

    #[test]
    fn prose_around_the_object_is_malformed() {
        let before = format!("Here you go: {OK}");
        assert!(matches!(parse_reasoner_reply(&before), Err(ReasonerError::Malformed(_))));
        let after = format!("{OK}\nHope this helps.");
        assert!(matches!(parse_reasoner_reply(&after), Err(ReasonerError::Malformed(_))));
    }

    #[test]
    fn accepts_ai_reasoning_alias_and_integral_float() {
        let raw = r#"{"risk_level":"medium","risk_score":40.0,"detected_issues":["x"],"ai_reasoning":"why","recommendation":"r"}"#;
        let a = parse_reasoner_reply(raw).unwrap();
        assert_eq!(a.reasoning(), "why");
        assert_eq!(a.risk_score(), 40);
    }

    #[test]
    fn missing_recommendation_is_malformed() {
        let raw = r#"{"risk_level":"low","risk_score":5,"detected_issues":["x"],"reasoning":"r"}"#;
        let err = parse_reasoner_reply(raw).unwrap_err();
        assert_eq!(err, ReasonerError::Malformed("missing required field: recommendation".into()));
    }

    #[test]
    fn rejects_bad_domains() {
        let out_of_range = r#"{"risk_level":"critical","risk_score":140,"detected_issues":["x"],"reasoning":"r","recommendation":"r"}"#;
        assert!(parse_reasoner_reply(out_of_range).is_err());
        let bad_level = r#"{"risk_level":"severe","risk_score":80,"detected_issues":["x"],"reasoning":"r","recommendation":"r"}"#;
        assert!(parse_reasoner_reply(bad_level).is_err());
        let mismatch = r#"{"risk_level":"low","risk_score":80,"detected_issues":["x"],"reasoning":"r","recommendation":"r"}"#;
        assert!(parse_reasoner_reply(mismatch).is_err());
        let fractional = r#"{"risk_level":"low","risk_score":12.5,"detected_issues":["x"],"reasoning":"r","recommendation":"r"}"#;
        assert!(parse_reasoner_reply(fractional).is_err());
        let wrong_type = r#"{"risk_level":"low","risk_score":"12","detected_issues":["x"],"reasoning":"r","recommendation":"r"}"#;
        assert!(parse_reasoner_reply(wrong_type).is_err());
    }

    #[test]
    fn rejects_non_json_and_non_object() {
        assert!(parse_reasoner_reply("I think this is risky").is_err());
        assert!(parse_reasoner_reply("[1,2,3]").is_err());
        assert!(parse_reasoner_reply("").is_err());
    }
}
