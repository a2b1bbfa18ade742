//! Payload extraction from untrusted model output.
//!
//! Models wrap JSON in prose, append commentary after the payload, and nest
//! braces inside explanation strings. We locate the outermost balanced
//! delimiter span with an explicit depth scan that ignores delimiters inside
//! quoted strings, then parse and validate before anything downstream trusts
//! a field. A first-closing-bracket regex would truncate nested payloads.

use std::collections::HashSet;

use serde_json::Value;

use crate::domain::{QuestionRecord, TestQuestionRecord};
use crate::error::ExtractionError;

/// Which payload delimiter pair we expect from the model.
#[derive(Clone, Copy, Debug)]
pub enum Shape {
  Object,
  Array,
}

impl Shape {
  fn open(self) -> char {
    match self {
      Shape::Object => '{',
      Shape::Array => '[',
    }
  }

  fn close(self) -> char {
    match self {
      Shape::Object => '}',
      Shape::Array => ']',
    }
  }
}

/// Find the outermost balanced span of the expected shape: leftmost opening
/// delimiter through its matching close. Delimiters inside double-quoted
/// strings are ignored, as are escaped quotes inside those strings.
pub fn balanced_span(raw: &str, shape: Shape) -> Option<&str> {
  let open = shape.open();
  let close = shape.close();
  let start = raw.find(open)?;

  let mut depth: usize = 0;
  let mut in_string = false;
  let mut escaped = false;
  for (i, ch) in raw[start..].char_indices() {
    if in_string {
      if escaped {
        escaped = false;
      } else if ch == '\\' {
        escaped = true;
      } else if ch == '"' {
        in_string = false;
      }
      continue;
    }
    if ch == '"' {
      in_string = true;
    } else if ch == open {
      depth += 1;
    } else if ch == close {
      depth -= 1;
      if depth == 0 {
        return Some(&raw[start..start + i + ch.len_utf8()]);
      }
    }
  }
  None
}

fn parse_span(raw: &str, shape: Shape) -> Result<Value, ExtractionError> {
  let span = balanced_span(raw, shape).ok_or(ExtractionError::NoBracketFound)?;
  serde_json::from_str(span).map_err(|e| ExtractionError::MalformedPayload(e.to_string()))
}

/// Extract and validate a single question object from raw model text.
pub fn extract_question(raw: &str) -> Result<QuestionRecord, ExtractionError> {
  question_from_value(parse_span(raw, Shape::Object)?)
}

/// Decode a provisional JSON value into a typed record, then enforce the
/// record invariants. Unknown extra fields from the model are dropped.
pub fn question_from_value(value: Value) -> Result<QuestionRecord, ExtractionError> {
  let record: QuestionRecord =
    serde_json::from_value(value).map_err(|e| ExtractionError::SchemaViolation(e.to_string()))?;
  record.validate().map_err(ExtractionError::SchemaViolation)?;
  Ok(record)
}

/// Extract and validate the question array for a mock test. Ids must be
/// positive and unique within the test.
pub fn extract_test_questions(raw: &str) -> Result<Vec<TestQuestionRecord>, ExtractionError> {
  let value = parse_span(raw, Shape::Array)?;
  let records: Vec<TestQuestionRecord> =
    serde_json::from_value(value).map_err(|e| ExtractionError::SchemaViolation(e.to_string()))?;
  if records.is_empty() {
    return Err(ExtractionError::SchemaViolation("test contains no questions".into()));
  }
  let mut seen = HashSet::new();
  for q in &records {
    q.validate().map_err(ExtractionError::SchemaViolation)?;
    if !seen.insert(q.id) {
      return Err(ExtractionError::SchemaViolation(format!("duplicate question id {}", q.id)));
    }
  }
  Ok(records)
}

#[cfg(test)]
mod tests {
  use super::*;

  const QUESTION_JSON: &str = r#"{
    "question": "What is the value of x in 2x = 6?",
    "options": ["3", "2", "6", "12"],
    "correctAnswer": "A",
    "explanation": "Divide both sides by 2.",
    "topic": "Algebra",
    "difficulty": "easy",
    "subject": "Mathematics",
    "examType": "JEE"
  }"#;

  #[test]
  fn recovers_record_embedded_in_prose() {
    let raw = format!("Sure! Here is your question:\n{QUESTION_JSON}\nLet me know if you need more.");
    let record = extract_question(&raw).unwrap();
    assert_eq!(record.correct_answer, "A");
    assert_eq!(record.topic, "Algebra");
  }

  #[test]
  fn extraction_is_idempotent_on_its_own_output() {
    let first = extract_question(QUESTION_JSON).unwrap();
    let serialized = serde_json::to_string(&first).unwrap();
    let again = extract_question(&serialized).unwrap();
    assert_eq!(first, again);
  }

  #[test]
  fn nested_braces_inside_strings_do_not_truncate_the_span() {
    let raw = r#"Here you go: {
      "question": "If {x} denotes the fractional part, what is {2.5}?",
      "options": ["0.5", "1", "2", "2.5"],
      "correctAnswer": "A",
      "explanation": "By definition {x} = x - floor(x), so {2.5} = 2.5 - 2 = 0.5.",
      "topic": "Functions",
      "difficulty": "medium",
      "subject": "Mathematics",
      "examType": "JEE"
    } — good luck!"#;
    let record = extract_question(raw).unwrap();
    assert!(record.explanation.contains("{2.5} = 2.5 - 2 = 0.5"));
  }

  #[test]
  fn escaped_quotes_inside_strings_are_handled() {
    let raw = r#"{"question":"He said \"a}b\" meant what?","options":["x","y","z","w"],"correctAnswer":"B","explanation":"Quoted braces don't count.","topic":"Parsing","difficulty":"easy","subject":"Mathematics","examType":"JEE"}"#;
    let record = extract_question(raw).unwrap();
    assert!(record.question.contains(r#"a}b"#));
  }

  #[test]
  fn no_payload_at_all_is_no_bracket_found() {
    let err = extract_question("Sure! Here's your question: Not JSON at all").unwrap_err();
    assert!(matches!(err, ExtractionError::NoBracketFound));
  }

  #[test]
  fn unterminated_span_is_no_bracket_found() {
    let err = extract_question(r#"{"question": "trailing off"#).unwrap_err();
    assert!(matches!(err, ExtractionError::NoBracketFound));
  }

  #[test]
  fn balanced_but_unparseable_span_is_malformed() {
    let err = extract_question("{question: not quoted}").unwrap_err();
    assert!(matches!(err, ExtractionError::MalformedPayload(_)));
  }

  #[test]
  fn two_option_record_is_a_schema_violation() {
    let raw = r#"{"question":"x?","options":["a","b"],"correctAnswer":"A","explanation":"e","topic":"t","difficulty":"easy","subject":"s","examType":"JEE"}"#;
    let err = extract_question(raw).unwrap_err();
    assert!(matches!(err, ExtractionError::SchemaViolation(_)));
  }

  #[test]
  fn missing_required_field_is_a_schema_violation() {
    let raw = r#"{"question":"x?","options":["a","b","c","d"],"correctAnswer":"A"}"#;
    let err = extract_question(raw).unwrap_err();
    assert!(matches!(err, ExtractionError::SchemaViolation(_)));
  }

  #[test]
  fn array_with_commentary_and_nested_objects_extracts() {
    let raw = r#"Here is the mock test you requested:
[
  {"id": 1, "question": "Unit of force?", "options": ["N", "J", "W", "Pa"], "correct": "A",
   "marks": 4, "negativeMarks": 1, "explanation": "Force is measured in newtons [N]."},
  {"id": 2, "question": "g on Earth?", "options": ["9.8", "8.9", "10.8", "1.6"], "correct": "A",
   "marks": 4, "negativeMarks": 1, "explanation": "Standard gravity is 9.8 m/s^2."}
]
Each question carries 4 marks."#;
    let questions = extract_test_questions(raw).unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions[0].explanation.contains("[N]"));
  }

  #[test]
  fn missing_marks_default_to_four_and_one() {
    let raw = r#"[{"id": 1, "question": "q?", "options": ["a","b","c","d"], "correct": "C", "explanation": "e"}]"#;
    let questions = extract_test_questions(raw).unwrap();
    assert_eq!(questions[0].marks, 4.0);
    assert_eq!(questions[0].negative_marks, 1.0);
  }

  #[test]
  fn duplicate_ids_are_a_schema_violation() {
    let raw = r#"[
      {"id": 1, "question": "q1?", "options": ["a","b","c","d"], "correct": "A", "explanation": "e"},
      {"id": 1, "question": "q2?", "options": ["a","b","c","d"], "correct": "B", "explanation": "e"}
    ]"#;
    let err = extract_test_questions(raw).unwrap_err();
    assert!(matches!(err, ExtractionError::SchemaViolation(ref m) if m.contains("duplicate")));
  }

  #[test]
  fn empty_test_array_is_a_schema_violation() {
    let err = extract_test_questions("The test: []").unwrap_err();
    assert!(matches!(err, ExtractionError::SchemaViolation(_)));
  }

  #[test]
  fn prose_before_the_array_does_not_confuse_the_scan() {
    let raw = r#"Notes: "unbalanced ] inside prose" then [{"id":1,"question":"q?","options":["a","b","c","d"],"correct":"D","explanation":"e"}]"#;
    let questions = extract_test_questions(raw).unwrap();
    assert_eq!(questions[0].correct, "D");
  }
}
