//! Domain records produced by the generation pipelines, plus the task variants
//! that drive prompt selection.

use serde::{Deserialize, Serialize};

/// Every multiple-choice record carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

const ANSWER_KEYS: [&str; 4] = ["A", "B", "C", "D"];

fn default_marks() -> f64 {
  4.0
}

fn default_negative_marks() -> f64 {
  1.0
}

/// One generation capability with its caller-supplied parameters.
/// Defaults for absent fields are applied before a task is constructed,
/// so a task is always fully populated.
#[derive(Clone, Debug)]
pub enum GenerationTask {
  Question { exam_type: String, subject: String, difficulty: String, topic: String },
  Doubt { question: String, subject: String, student_grade: String },
  Test { exam_type: String, subject: String, count: u32 },
  Concept { concept: String, subject: String, level: String },
}

/// Single practice question as served to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  pub explanation: String,
  pub topic: String,
  pub difficulty: String,
  pub subject: String,
  pub exam_type: String,
}

impl QuestionRecord {
  /// Record invariants: non-empty question, exactly four options, and an
  /// answer key that indexes into them.
  pub fn validate(&self) -> Result<(), String> {
    if self.question.trim().is_empty() {
      return Err("question text is empty".into());
    }
    if self.options.len() != OPTION_COUNT {
      return Err(format!("expected {} options, got {}", OPTION_COUNT, self.options.len()));
    }
    if !ANSWER_KEYS.contains(&self.correct_answer.as_str()) {
      return Err(format!("correctAnswer '{}' is not one of A-D", self.correct_answer));
    }
    Ok(())
  }
}

/// One entry of a mock test. Marks fields default when the model omits them;
/// they are still re-summed server-side when the test is assembled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestQuestionRecord {
  pub id: u32,
  pub question: String,
  pub options: Vec<String>,
  pub correct: String,
  #[serde(default = "default_marks")]
  pub marks: f64,
  #[serde(default = "default_negative_marks")]
  pub negative_marks: f64,
  pub explanation: String,
}

impl TestQuestionRecord {
  /// Per-record invariants. Id uniqueness across a test is checked where the
  /// full array is in hand.
  pub fn validate(&self) -> Result<(), String> {
    if self.id == 0 {
      return Err("question id must be positive".into());
    }
    if self.question.trim().is_empty() {
      return Err(format!("question {} has empty text", self.id));
    }
    if self.options.len() != OPTION_COUNT {
      return Err(format!(
        "question {} has {} options, expected {}",
        self.id,
        self.options.len(),
        OPTION_COUNT
      ));
    }
    if !ANSWER_KEYS.contains(&self.correct.as_str()) {
      return Err(format!("question {}: correct '{}' is not one of A-D", self.id, self.correct));
    }
    if self.marks <= 0.0 {
      return Err(format!("question {} has non-positive marks", self.id));
    }
    if self.negative_marks < 0.0 {
      return Err(format!("question {} has negative negativeMarks", self.id));
    }
    Ok(())
  }
}

/// Assembled mock test. `total_questions`, `total_marks` and `duration` are
/// derived from the question list, never taken from model output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTest {
  pub exam_type: String,
  pub subject: String,
  pub total_questions: usize,
  pub total_marks: f64,
  pub duration: f64,
  pub questions: Vec<TestQuestionRecord>,
}

impl GeneratedTest {
  /// Build a test from validated records. Duration is 1.5 minutes per question.
  pub fn assemble(exam_type: String, subject: String, questions: Vec<TestQuestionRecord>) -> Self {
    let total_questions = questions.len();
    let total_marks = questions.iter().map(|q| q.marks).sum();
    Self {
      exam_type,
      subject,
      total_questions,
      total_marks,
      duration: total_questions as f64 * 1.5,
      questions,
    }
  }
}
