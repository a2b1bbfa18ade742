//! Hand-authored question pool: served by the sample endpoint and attached to
//! failed question generations so the caller never ends up empty-handed.

use rand::Rng;

use crate::domain::QuestionRecord;

/// Built-in records, one per major subject. Shape-checked at startup via
/// [`assert_pool_valid`] so a hand-edit cannot ship a record the pipelines
/// would reject from a model.
pub fn fallback_pool() -> Vec<QuestionRecord> {
  vec![
    QuestionRecord {
      question: "What is the value of ∫(x²)dx from 0 to 1?".into(),
      options: vec!["1/3".into(), "1/2".into(), "2/3".into(), "1".into()],
      correct_answer: "A".into(),
      explanation: "The integral of x² is (x³/3). Evaluating from 0 to 1 gives (1³/3) - (0³/3) = 1/3."
        .into(),
      topic: "Calculus".into(),
      difficulty: "medium".into(),
      subject: "Mathematics".into(),
      exam_type: "JEE".into(),
    },
    QuestionRecord {
      question: "Ohm's Law states that:".into(),
      options: vec!["V = IR".into(), "I = VR".into(), "R = VI".into(), "V = I/R".into()],
      correct_answer: "A".into(),
      explanation: "Ohm's Law states that voltage (V) is equal to current (I) multiplied by resistance (R)."
        .into(),
      topic: "Electricity".into(),
      difficulty: "easy".into(),
      subject: "Physics".into(),
      exam_type: "NEET".into(),
    },
  ]
}

/// Fixed general-knowledge record that rounds out the sample endpoint.
fn general_knowledge_sample() -> QuestionRecord {
  QuestionRecord {
    question: "Who is known as the Father of Indian Constitution?".into(),
    options: vec![
      "Mahatma Gandhi".into(),
      "Jawaharlal Nehru".into(),
      "B.R. Ambedkar".into(),
      "Sardar Patel".into(),
    ],
    correct_answer: "C".into(),
    explanation: "Dr. B.R. Ambedkar was the chairman of the drafting committee of the Indian Constitution."
      .into(),
    topic: "Indian Polity".into(),
    difficulty: "easy".into(),
    subject: "General Knowledge".into(),
    exam_type: "UPSC".into(),
  }
}

/// Uniform-random pick from the pool.
pub fn sample_question() -> QuestionRecord {
  let mut pool = fallback_pool();
  let idx = rand::thread_rng().gen_range(0..pool.len());
  pool.swap_remove(idx)
}

/// Records served by the sample endpoint: one random pool pick plus the fixed
/// general-knowledge question. Works with zero configuration and never calls
/// the upstream.
pub fn sample_set() -> Vec<QuestionRecord> {
  vec![sample_question(), general_knowledge_sample()]
}

/// Startup assertion: every built-in record satisfies the same invariants the
/// extractor enforces on generated payloads.
pub fn assert_pool_valid() {
  let pool = fallback_pool();
  assert!(!pool.is_empty(), "fallback pool must not be empty");
  for q in pool.iter().chain(std::iter::once(&general_knowledge_sample())) {
    if let Err(e) = q.validate() {
      panic!("built-in question on '{}' is invalid: {}", q.topic, e);
    }
  }
}
