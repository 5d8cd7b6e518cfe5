//! Normalization of heterogeneous inference response bodies.
//!
//! Upstream models answer in several JSON layouts depending on route and
//! model family. Each recognized layout gets a pure decoder; decoders are
//! tried in a fixed priority order and the first match wins, keeping the
//! sniffing testable without any network code.

use serde_json::Value;

/// A span answer from the extractive model.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerCandidate {
    pub answer: String,
    pub score: Option<f32>,
}

/// Decodes an embedding response into a flat vector.
///
/// Recognized shapes, in priority order:
/// 1. bare numeric array
/// 2. nested single-row array
/// 3. `embedding` field
/// 4. `embeddings` field (flat or nested)
/// 5. `data[0].embedding` (OpenAI-style)
pub fn decode_embedding(body: &Value) -> Option<Vec<f32>> {
    const DECODERS: &[fn(&Value) -> Option<Vec<f32>>] = &[
        bare_vector,
        nested_single_row,
        embedding_field,
        embeddings_field,
        data_embedding_field,
    ];
    DECODERS.iter().find_map(|decode| decode(body))
}

fn numeric_vector(value: &Value) -> Option<Vec<f32>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

fn bare_vector(body: &Value) -> Option<Vec<f32>> {
    numeric_vector(body)
}

fn nested_single_row(body: &Value) -> Option<Vec<f32>> {
    numeric_vector(body.as_array()?.first()?)
}

fn embedding_field(body: &Value) -> Option<Vec<f32>> {
    numeric_vector(body.get("embedding")?)
}

fn embeddings_field(body: &Value) -> Option<Vec<f32>> {
    let field = body.get("embeddings")?;
    numeric_vector(field).or_else(|| numeric_vector(field.as_array()?.first()?))
}

fn data_embedding_field(body: &Value) -> Option<Vec<f32>> {
    numeric_vector(body.get("data")?.as_array()?.first()?.get("embedding")?)
}

/// Decodes an extractive QA response.
///
/// Accepts an array whose first element carries a string `answer` (with
/// optional `score`), or a single object with a string `answer`.
pub fn decode_qa_answer(body: &Value) -> Option<AnswerCandidate> {
    let obj = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let answer = obj.get("answer")?.as_str()?.to_string();
    let score = obj.get("score").and_then(|s| s.as_f64()).map(|f| f as f32);
    Some(AnswerCandidate { answer, score })
}

/// Extracts generated text, in priority order: `[0].generated_text`,
/// `generated_text`, `[0].text`.
pub fn decode_generated_text(body: &Value) -> Option<String> {
    let first = body.as_array().and_then(|items| items.first());
    if let Some(text) = first
        .and_then(|item| item.get("generated_text"))
        .and_then(|v| v.as_str())
    {
        return Some(text.to_string());
    }
    if let Some(text) = body.get("generated_text").and_then(|v| v.as_str()) {
        return Some(text.to_string());
    }
    first
        .and_then(|item| item.get("text"))
        .and_then(|v| v.as_str())
        .map(|t| t.to_string())
}

/// Truncated textual dump of a response body, for the lenient generation
/// path that returns whatever the service answered.
pub fn truncated_dump(body: &Value, limit: usize) -> String {
    let mut dump = body.to_string();
    if dump.len() > limit {
        let mut end = limit;
        while end > 0 && !dump.is_char_boundary(end) {
            end -= 1;
        }
        dump.truncate(end);
    }
    dump
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_bare_vector() {
        let body = json!([0.1, 0.2, 0.3]);
        assert_eq!(decode_embedding(&body), Some(vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn decodes_nested_single_row() {
        let body = json!([[0.5, -0.5]]);
        assert_eq!(decode_embedding(&body), Some(vec![0.5, -0.5]));
    }

    #[test]
    fn decodes_embedding_field() {
        let body = json!({"embedding": [1.0, 2.0]});
        assert_eq!(decode_embedding(&body), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn decodes_embeddings_field_flat_and_nested() {
        assert_eq!(
            decode_embedding(&json!({"embeddings": [1.0, 2.0]})),
            Some(vec![1.0, 2.0])
        );
        assert_eq!(
            decode_embedding(&json!({"embeddings": [[3.0, 4.0]]})),
            Some(vec![3.0, 4.0])
        );
    }

    #[test]
    fn decodes_data_embedding_field() {
        let body = json!({"data": [{"embedding": [9.0, 8.0]}]});
        assert_eq!(decode_embedding(&body), Some(vec![9.0, 8.0]));
    }

    #[test]
    fn rejects_unrecognized_embedding_shapes() {
        assert_eq!(decode_embedding(&json!({"vectors": [1.0]})), None);
        assert_eq!(decode_embedding(&json!("error")), None);
        assert_eq!(decode_embedding(&json!([])), None);
        assert_eq!(decode_embedding(&json!(["a", "b"])), None);
    }

    #[test]
    fn qa_array_shape_with_score() {
        let body = json!([{"answer": "INV-2025-07", "score": 0.91}]);
        let candidate = decode_qa_answer(&body).unwrap();
        assert_eq!(candidate.answer, "INV-2025-07");
        assert_eq!(candidate.score, Some(0.91));
    }

    #[test]
    fn qa_object_shape_without_score() {
        let body = json!({"answer": "yes"});
        let candidate = decode_qa_answer(&body).unwrap();
        assert_eq!(candidate.answer, "yes");
        assert_eq!(candidate.score, None);
    }

    #[test]
    fn qa_rejects_other_shapes() {
        assert_eq!(decode_qa_answer(&json!({"generated_text": "x"})), None);
        assert_eq!(decode_qa_answer(&json!([{"answer": 3}])), None);
        assert_eq!(decode_qa_answer(&json!([])), None);
    }

    #[test]
    fn generated_text_priority_order() {
        // [0].generated_text beats [0].text
        let body = json!([{"generated_text": "a", "text": "b"}]);
        assert_eq!(decode_generated_text(&body), Some("a".to_string()));

        let body = json!({"generated_text": "bare"});
        assert_eq!(decode_generated_text(&body), Some("bare".to_string()));

        let body = json!([{"text": "only text"}]);
        assert_eq!(decode_generated_text(&body), Some("only text".to_string()));

        assert_eq!(decode_generated_text(&json!({"output": "x"})), None);
    }

    #[test]
    fn dump_truncates_on_char_boundary() {
        let body = json!({"k": "éééééééééé"});
        let dump = truncated_dump(&body, 9);
        assert!(dump.len() <= 9);
        assert!(dump.is_char_boundary(dump.len()));

        let short = truncated_dump(&json!("ok"), 500);
        assert_eq!(short, "\"ok\"");
    }
}
