//! Runtime configuration: environment settings plus prompt templates
//! (defaults in code, optionally overridden from TOML).
//!
//! See `Settings` and `Prompts` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::GenerationTask;
use crate::util::fill_template;

/// Process-level settings read from the environment once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
  pub port: u16,
  /// Admissions per client identity per 60 s window.
  pub rate_limit: usize,
  /// Reserved capability: absent means "run without persistence".
  pub database_url: Option<String>,
}

impl Settings {
  pub fn from_env() -> Self {
    let port = std::env::var("PORT")
      .ok()
      .and_then(|p| p.parse::<u16>().ok())
      .unwrap_or(5000);
    let rate_limit = std::env::var("RATE_LIMIT")
      .ok()
      .and_then(|v| v.parse::<usize>().ok())
      .unwrap_or(100);
    let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
    Self { port, rate_limit, database_url }
  }
}

/// Prompt templates used by the pipelines. Defaults are sensible for Indian
/// competitive-exam preparation; override them in TOML to tune tone/structure.
/// Placeholders use `{name}` syntax and are substituted with `fill_template`.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub question_template: String,
  pub doubt_template: String,
  pub test_template: String,
  pub concept_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      question_template: r#"Generate a {difficulty} difficulty multiple choice question for {examType} {subject} on topic: {topic}.
Return ONLY valid JSON in this exact format:
{
    "question": "The actual question text here?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": "A",
    "explanation": "Detailed step-by-step explanation here",
    "topic": "{topic}",
    "difficulty": "{difficulty}",
    "subject": "{subject}",
    "examType": "{examType}"
}"#
      .into(),
      doubt_template: r#"You are an expert tutor for an Indian {studentGrade} student preparing for competitive exams.
Question: {question}
Subject: {subject}

Provide a helpful, detailed solution with:
1. Step-by-step explanation
2. Key concepts used
3. Formula if applicable
4. Final answer clearly stated
5. One similar practice question

Format your response in clear paragraphs."#
        .into(),
      test_template: r#"Generate a mock test of {count} questions for {examType} {subject}.
Return ONLY valid JSON array in this exact format:
[
    {
        "id": 1,
        "question": "Question text?",
        "options": ["A", "B", "C", "D"],
        "correct": "A",
        "marks": 4,
        "negativeMarks": 1,
        "explanation": "Detailed explanation"
    }
]
Generate exactly {count} questions."#
        .into(),
      concept_template: r#"Explain the concept "{concept}" for {subject} at {level} level suitable for Indian competitive exam preparation.
Include:
1. Simple definition
2. Key points
3. Formula/Diagrams if applicable
4. Real-life examples
5. Common exam questions on this topic
6. Memory tricks

Make it engaging and easy to understand."#
        .into(),
    }
  }
}

impl Prompts {
  /// Render the template for `task`. Total: every variant has a template and
  /// unmatched placeholders pass through verbatim.
  pub fn render(&self, task: &GenerationTask) -> String {
    match task {
      GenerationTask::Question { exam_type, subject, difficulty, topic } => fill_template(
        &self.question_template,
        &[
          ("examType", exam_type.as_str()),
          ("subject", subject.as_str()),
          ("difficulty", difficulty.as_str()),
          ("topic", topic.as_str()),
        ],
      ),
      GenerationTask::Doubt { question, subject, student_grade } => fill_template(
        &self.doubt_template,
        &[
          ("question", question.as_str()),
          ("subject", subject.as_str()),
          ("studentGrade", student_grade.as_str()),
        ],
      ),
      GenerationTask::Test { exam_type, subject, count } => {
        let count = count.to_string();
        fill_template(
          &self.test_template,
          &[
            ("examType", exam_type.as_str()),
            ("subject", subject.as_str()),
            ("count", count.as_str()),
          ],
        )
      }
      GenerationTask::Concept { concept, subject, level } => fill_template(
        &self.concept_template,
        &[
          ("concept", concept.as_str()),
          ("subject", subject.as_str()),
          ("level", level.as_str()),
        ],
      ),
    }
  }
}

/// Prompt overrides accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptConfig {
  #[serde(default)]
  pub prompts: Option<Prompts>,
}

/// Load prompt templates, preferring PROMPT_CONFIG_PATH when it parses.
/// On any read/parse error we log and fall back to the defaults.
pub fn load_prompts_from_env() -> Prompts {
  let Ok(path) = std::env::var("PROMPT_CONFIG_PATH") else {
    return Prompts::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<PromptConfig>(&s) {
      Ok(cfg) => {
        info!(target: "examprep_backend", %path, "Loaded prompt config (TOML)");
        cfg.prompts.unwrap_or_default()
      }
      Err(e) => {
        error!(target: "examprep_backend", %path, error = %e, "Failed to parse TOML prompt config");
        Prompts::default()
      }
    },
    Err(e) => {
      error!(target: "examprep_backend", %path, error = %e, "Failed to read TOML prompt config file");
      Prompts::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn question_template_substitutes_all_fields() {
    let prompts = Prompts::default();
    let task = GenerationTask::Question {
      exam_type: "NEET".into(),
      subject: "Physics".into(),
      difficulty: "hard".into(),
      topic: "Optics".into(),
    };
    let rendered = prompts.render(&task);
    assert!(rendered.contains("hard difficulty multiple choice question for NEET Physics"));
    assert!(rendered.contains(r#""topic": "Optics""#));
    assert!(!rendered.contains("{examType}"));
  }

  #[test]
  fn question_template_keeps_literal_json_braces() {
    let prompts = Prompts::default();
    let task = GenerationTask::Question {
      exam_type: "JEE".into(),
      subject: "Mathematics".into(),
      difficulty: "medium".into(),
      topic: "Algebra".into(),
    };
    let rendered = prompts.render(&task);
    assert!(rendered.contains(r#""correctAnswer": "A""#));
  }

  #[test]
  fn test_template_substitutes_count_twice() {
    let prompts = Prompts::default();
    let task = GenerationTask::Test { exam_type: "JEE Mains".into(), subject: "Physics".into(), count: 7 };
    let rendered = prompts.render(&task);
    assert!(rendered.contains("mock test of 7 questions"));
    assert!(rendered.contains("Generate exactly 7 questions."));
  }

  #[test]
  fn doubt_template_embeds_question_text() {
    let prompts = Prompts::default();
    let task = GenerationTask::Doubt {
      question: "Why is the sky blue?".into(),
      subject: "Physics".into(),
      student_grade: "10th".into(),
    };
    let rendered = prompts.render(&task);
    assert!(rendered.contains("Question: Why is the sky blue?"));
    assert!(rendered.contains("Indian 10th student"));
  }

  #[test]
  fn prompt_config_toml_round_trips() {
    let toml_src = r#"
[prompts]
question_template = "Q {topic}"
doubt_template = "D {question}"
test_template = "T {count}"
concept_template = "C {concept}"
"#;
    let cfg: PromptConfig = toml::from_str(toml_src).unwrap();
    let prompts = cfg.prompts.unwrap();
    assert_eq!(prompts.question_template, "Q {topic}");
    assert_eq!(prompts.concept_template, "C {concept}");
  }
}
