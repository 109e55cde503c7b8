//! Narrative analysis via the text model.
//!
//! The model is asked for a JSON breakdown of the narrative: a general
//! central stressor, a handful of contributing factors and the narrative's
//! language. Responses are parsed tolerantly (prose or code fences around the
//! object are fine, missing fields get defaults) and then validated. Any
//! failure along the way, including a slow or missing model, produces a
//! deterministic fallback built from the selected emotions, so callers always
//! get a usable [`StoryAnalysis`].

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use moodscape_domain::{AnalysisFactor, DomainError, EmotionId, Language, StoryAnalysis, MAX_FACTORS};

use crate::infrastructure::ports::{ChatMessage, LlmError, LlmPort, LlmRequest};

const UNIDENTIFIED_STRESSOR: &str = "Unidentified situation";

/// Fallback analyses never list more factors than this.
const MAX_FALLBACK_FACTORS: usize = 4;

const ANALYSIS_SYSTEM_PROMPT: &str =
    "You analyze personal narratives with empathy and reply with a single JSON object and nothing else.";
const ANALYSIS_TEMPERATURE: f32 = 0.3;
const ANALYSIS_MAX_TOKENS: u32 = 1024;

/// Why a model-backed analysis was abandoned in favour of the fallback
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Text model not configured")]
    NotConfigured,
    #[error("Text model call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("Text model did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Analysis task failed: {0}")]
    Task(String),
    #[error("No JSON object in model response")]
    NoJson,
    #[error("Malformed JSON in model response: {0}")]
    InvalidJson(String),
    #[error("Analysis rejected: {0}")]
    Invalid(#[from] DomainError),
}

/// Analyzes narratives with an optional text model.
///
/// Without a model every call goes straight to the fallback.
pub struct StoryAnalyzer {
    llm: Option<Arc<dyn LlmPort>>,
    timeout: Duration,
}

impl StoryAnalyzer {
    pub fn new(llm: Option<Arc<dyn LlmPort>>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Analyze a narrative. Never fails: model problems degrade to
    /// [`fallback_analysis`].
    pub async fn analyze(&self, narrative: &str, emotions: &[EmotionId]) -> StoryAnalysis {
        match self.analyze_with_model(narrative, emotions).await {
            Ok(analysis) => {
                tracing::info!(
                    language = %analysis.language,
                    factors_count = analysis.factors.len(),
                    "Story analysis complete"
                );
                analysis
            }
            Err(AnalysisError::NotConfigured) => {
                tracing::debug!("No text model configured, using fallback analysis");
                fallback_analysis(narrative, emotions)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Story analysis failed, using fallback analysis");
                fallback_analysis(narrative, emotions)
            }
        }
    }

    async fn analyze_with_model(
        &self,
        narrative: &str,
        emotions: &[EmotionId],
    ) -> Result<StoryAnalysis, AnalysisError> {
        let llm = self.llm.clone().ok_or(AnalysisError::NotConfigured)?;

        let request = LlmRequest::new(vec![
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(build_analysis_prompt(narrative, emotions)),
        ])
        .with_temperature(ANALYSIS_TEMPERATURE)
        .with_max_tokens(Some(ANALYSIS_MAX_TOKENS));

        // The call runs on its own task so a hung model cannot hold the
        // request past the timeout. On timeout the task is left to finish
        // against the HTTP client's own deadline.
        let handle = tokio::spawn(async move { llm.generate(request).await });
        let response = match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => return Err(AnalysisError::Task(join_error.to_string())),
            Err(_) => return Err(AnalysisError::Timeout(self.timeout)),
        };

        parse_analysis(&response.content)
    }
}

/// Prompt asking the model for a JSON-only breakdown of the narrative.
pub fn build_analysis_prompt(narrative: &str, emotions: &[EmotionId]) -> String {
    let emotion_names: Vec<String> = emotions.iter().map(|id| id.readable_name()).collect();

    format!(
        r#"Analyze this text where someone describes their feelings. They have said they feel: {emotions}

Their story:
"{narrative}"

Your task:
1. Detect the DOMINANT LANGUAGE of the text as an ISO 639-1 code ("en" for English, "zh" for Chinese, "es" for Spanish).
2. Name the CENTRAL STRESSOR as a general category of situation (for example "Work Performance Pressure"), never a retelling of the specific event.
3. Identify 3 to 5 EMOTIONAL FACTORS behind their emotional state. Give each a short Title Cased label and an insight that:
   - explains the root cause of the feeling,
   - describes any thinking pattern at play in plain words without naming it as a bias,
   - mentions social or relational context when it matters.
   Do not give advice or suggestions.

Write every label and insight in the SAME LANGUAGE as the dominant language of the text. For mixed-language input use the language that appears most.

Respond with JSON in exactly this shape:
{{
  "language": "en",
  "central_stressor": "General Category Of Situation",
  "factors": [
    {{ "factor": "Factor Label", "insight": "Why this factor shapes how they feel" }}
  ]
}}

Return ONLY the JSON, no other text."#,
        emotions = emotion_names.join(", "),
        narrative = narrative,
    )
}

/// Find the first balanced top-level `{...}` span.
///
/// Braces inside JSON string literals (including escaped quotes) are
/// ignored. Returns `None` when no object closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
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
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    central_stressor: Option<String>,
    #[serde(default)]
    factors: Vec<serde_json::Value>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFactor {
    #[serde(default)]
    factor: Option<String>,
    #[serde(default)]
    insight: Option<String>,
    /// Older prompt revisions asked for `description`
    #[serde(default)]
    description: Option<String>,
}

impl RawFactor {
    fn into_factor(self) -> Option<AnalysisFactor> {
        let label = self.factor?.trim().to_string();
        let insight = self.insight.or(self.description)?.trim().to_string();
        let factor = AnalysisFactor::new(label, insight);
        factor.is_well_formed().then_some(factor)
    }
}

/// Parse and validate a model response.
///
/// Missing fields default (`"Unidentified situation"`, no factors, `"en"`);
/// factors without a label or insight are dropped and at most
/// [`MAX_FACTORS`] are kept. An analysis left with no factors or a blank
/// stressor is rejected.
pub fn parse_analysis(response: &str) -> Result<StoryAnalysis, AnalysisError> {
    let json = extract_json_object(response).ok_or(AnalysisError::NoJson)?;
    let raw: RawAnalysis =
        serde_json::from_str(json).map_err(|e| AnalysisError::InvalidJson(e.to_string()))?;

    let central_stressor = raw
        .central_stressor
        .unwrap_or_else(|| UNIDENTIFIED_STRESSOR.to_string());
    let language = raw
        .language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| Language::English.code().to_string());

    let factors: Vec<AnalysisFactor> = raw
        .factors
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RawFactor>(value).ok())
        .filter_map(RawFactor::into_factor)
        .take(MAX_FACTORS)
        .collect();

    Ok(StoryAnalysis::new(central_stressor.trim(), factors, language)?)
}

/// Deterministic analysis from the selected emotions alone.
///
/// Language comes from [`Language::detect`]; up to four factors follow the
/// emotion order, with one generic factor when nothing is selected.
pub fn fallback_analysis(narrative: &str, emotions: &[EmotionId]) -> StoryAnalysis {
    let language = Language::detect(narrative);

    let mut factors: Vec<AnalysisFactor> = emotions
        .iter()
        .take(MAX_FALLBACK_FACTORS)
        .map(|id| {
            let (label, insight) = fallback_factor(language, *id);
            AnalysisFactor::new(label, insight)
        })
        .collect();
    if factors.is_empty() {
        let (label, insight) = generic_factor(language);
        factors.push(AnalysisFactor::new(label, insight));
    }

    StoryAnalysis {
        central_stressor: fallback_stressor(language).to_string(),
        factors,
        language: language.code().to_string(),
    }
}

fn fallback_stressor(language: Language) -> &'static str {
    match language {
        Language::English => "Current situation",
        Language::Chinese => "当前情况",
    }
}

fn generic_factor(language: Language) -> (&'static str, &'static str) {
    match language {
        Language::English => ("Emotional response", "Feelings about the situation"),
        Language::Chinese => ("情绪反应", "对情况的感受"),
    }
}

fn fallback_factor(language: Language, emotion: EmotionId) -> (&'static str, &'static str) {
    match language {
        Language::English => match emotion {
            EmotionId::SuperHappy => ("Positive Achievement", "Sense of accomplishment or joy"),
            EmotionId::Pumped => ("Excitement", "Energized feelings about the situation"),
            EmotionId::Cozy => ("Comfort", "Feeling of safety and warmth"),
            EmotionId::Chill => ("Relaxation", "Calm and peaceful state"),
            EmotionId::Content => ("Satisfaction", "Feeling fulfilled and at peace"),
            EmotionId::Fuming => ("Frustration", "Anger about the situation"),
            EmotionId::FreakedOut => ("Anxiety", "Worry and uncertainty"),
            EmotionId::MadAsHell => ("Intense Anger", "Strong negative reaction"),
            EmotionId::Blah => ("Apathy", "Lack of motivation or interest"),
            EmotionId::Down => ("Sadness", "Low mood and disappointment"),
            EmotionId::BoredStiff => ("Monotony", "Lack of stimulation"),
        },
        Language::Chinese => match emotion {
            EmotionId::SuperHappy => ("积极成就", "成就感或喜悦"),
            EmotionId::Pumped => ("兴奋", "对情况充满活力的感觉"),
            EmotionId::Cozy => ("舒适", "安全和温暖的感觉"),
            EmotionId::Chill => ("放松", "平静和平和的状态"),
            EmotionId::Content => ("满足", "感到充实和平静"),
            EmotionId::Fuming => ("挫折感", "对情况的愤怒"),
            EmotionId::FreakedOut => ("焦虑", "担忧和不确定"),
            EmotionId::MadAsHell => ("强烈愤怒", "强烈的负面反应"),
            EmotionId::Blah => ("冷漠", "缺乏动力或兴趣"),
            EmotionId::Down => ("悲伤", "低落的情绪和失望"),
            EmotionId::BoredStiff => ("单调", "缺乏刺激"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{FinishReason, LlmResponse, MessageRole, MockLlmPort};
    use async_trait::async_trait;

    const NARRATIVE: &str =
        "My manager criticized my report in front of the whole team and I could not sleep afterwards.";

    fn response(content: &str) -> LlmResponse {
        LlmResponse {
            content: content.to_string(),
            finish_reason: FinishReason::Stop,
            usage: None,
        }
    }

    fn analyzer_with(mock: MockLlmPort) -> StoryAnalyzer {
        let llm: Arc<dyn LlmPort> = Arc::new(mock);
        StoryAnalyzer::new(Some(llm), Duration::from_secs(30))
    }

    /// Text model that never answers in time
    struct StalledLlm;

    #[async_trait]
    impl LlmPort for StalledLlm {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(response("{}"))
        }

        async fn check_health(&self) -> Result<bool, LlmError> {
            Ok(true)
        }
    }

    #[test]
    fn extracts_object_from_fenced_prose() {
        let text = "Sure! Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\nHope it helps {not json}";
        assert_eq!(extract_json_object(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn braces_inside_strings_do_not_count() {
        let text = r#"{"insight": "feels like } and { \" quoted"} trailing }"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"insight": "feels like } and { \" quoted"}"#)
        );
    }

    #[test]
    fn unbalanced_object_is_not_extracted() {
        assert_eq!(extract_json_object("{\"a\": 1"), None);
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn parse_applies_defaults_and_drops_bad_factors() {
        let analysis = parse_analysis(
            r#"{"factors": [
                {"factor": "Fear Of Judgment", "insight": "Worry about how others see you"},
                {"factor": "", "insight": "no label"},
                {"factor": "No Insight"},
                "not an object",
                {"factor": "Perfectionism", "description": "Legacy key still works"}
            ]}"#,
        )
        .expect("valid analysis");

        assert_eq!(analysis.central_stressor, "Unidentified situation");
        assert_eq!(analysis.language, "en");
        assert_eq!(
            analysis.factor_labels().collect::<Vec<_>>(),
            vec!["Fear Of Judgment", "Perfectionism"]
        );
        assert_eq!(analysis.factors[1].insight, "Legacy key still works");
    }

    #[test]
    fn parse_caps_factors_at_five() {
        let factors: Vec<String> = (0..7)
            .map(|i| format!(r#"{{"factor": "F{}", "insight": "i"}}"#, i))
            .collect();
        let json = format!(
            r#"{{"central_stressor": "Family Conflict", "language": "zh", "factors": [{}]}}"#,
            factors.join(",")
        );
        let analysis = parse_analysis(&json).expect("valid analysis");
        assert_eq!(analysis.factors.len(), MAX_FACTORS);
        assert_eq!(analysis.language, "zh");
    }

    #[test]
    fn parse_rejects_empty_factors_and_blank_stressor() {
        assert!(matches!(
            parse_analysis(r#"{"central_stressor": "Work", "factors": []}"#),
            Err(AnalysisError::Invalid(_))
        ));
        assert!(matches!(
            parse_analysis(r#"{"central_stressor": "  ", "factors": [{"factor": "A", "insight": "B"}]}"#),
            Err(AnalysisError::Invalid(_))
        ));
        assert!(matches!(
            parse_analysis("{not json}"),
            Err(AnalysisError::InvalidJson(_))
        ));
    }

    #[test]
    fn fallback_follows_emotion_order_and_caps_at_four() {
        let emotions = [
            EmotionId::Down,
            EmotionId::Fuming,
            EmotionId::Blah,
            EmotionId::FreakedOut,
            EmotionId::BoredStiff,
        ];
        let analysis = fallback_analysis(NARRATIVE, &emotions);
        assert_eq!(analysis.central_stressor, "Current situation");
        assert_eq!(analysis.language, "en");
        assert_eq!(
            analysis.factor_labels().collect::<Vec<_>>(),
            vec!["Sadness", "Frustration", "Apathy", "Anxiety"]
        );
    }

    #[test]
    fn fallback_in_chinese() {
        let analysis = fallback_analysis("今天工作压力很大，我觉得自己做不好。", &[EmotionId::Down]);
        assert_eq!(analysis.language, "zh");
        assert_eq!(analysis.central_stressor, "当前情况");
        assert_eq!(analysis.factors, vec![AnalysisFactor::new("悲伤", "低落的情绪和失望")]);
    }

    #[test]
    fn fallback_without_emotions_uses_generic_factor() {
        let analysis = fallback_analysis(NARRATIVE, &[]);
        assert_eq!(
            analysis.factors,
            vec![AnalysisFactor::new("Emotional response", "Feelings about the situation")]
        );
    }

    #[test]
    fn fallback_is_always_valid() {
        for id in EmotionId::all() {
            let fb = fallback_analysis(NARRATIVE, &[*id]);
            assert!(StoryAnalysis::new(fb.central_stressor, fb.factors, fb.language).is_ok());
        }
    }

    #[test]
    fn prompt_lists_readable_emotions_and_narrative() {
        let prompt = build_analysis_prompt(NARRATIVE, &[EmotionId::MadAsHell, EmotionId::Down]);
        assert!(prompt.contains("They have said they feel: mad as hell, down"));
        assert!(prompt.contains(NARRATIVE));
        assert!(prompt.contains("\"central_stressor\""));
    }

    #[tokio::test]
    async fn analyze_uses_model_response() {
        let mut mock = MockLlmPort::new();
        mock.expect_generate().times(1).returning(|request| {
            assert_eq!(request.messages.len(), 2);
            assert_eq!(request.messages[0].role, MessageRole::System);
            assert!(request.messages[1].content.contains(NARRATIVE));
            assert_eq!(request.temperature, Some(0.3));
            Ok(response(
                r#"```json
{"language": "en", "central_stressor": "Workplace Criticism",
 "factors": [{"factor": "Public Embarrassment", "insight": "Being corrected in front of peers stings"}]}
```"#,
            ))
        });

        let analysis = analyzer_with(mock)
            .analyze(NARRATIVE, &[EmotionId::Down])
            .await;
        assert_eq!(analysis.central_stressor, "Workplace Criticism");
        assert_eq!(analysis.factors.len(), 1);
    }

    #[tokio::test]
    async fn analyze_falls_back_on_model_error() {
        let mut mock = MockLlmPort::new();
        mock.expect_generate()
            .returning(|_| Err(LlmError::RequestFailed("connection refused".into())));

        let analysis = analyzer_with(mock)
            .analyze(NARRATIVE, &[EmotionId::Fuming])
            .await;
        assert_eq!(analysis, fallback_analysis(NARRATIVE, &[EmotionId::Fuming]));
    }

    #[tokio::test]
    async fn analyze_falls_back_on_unusable_response() {
        let mut mock = MockLlmPort::new();
        mock.expect_generate()
            .returning(|_| Ok(response(r#"{"central_stressor": "Work", "factors": []}"#)));

        let analysis = analyzer_with(mock)
            .analyze(NARRATIVE, &[EmotionId::Blah])
            .await;
        assert_eq!(analysis.central_stressor, "Current situation");
    }

    #[tokio::test]
    async fn analyze_without_model_uses_fallback() {
        let analyzer = StoryAnalyzer::new(None, Duration::from_secs(30));
        let analysis = analyzer.analyze(NARRATIVE, &[EmotionId::Chill]).await;
        assert_eq!(analysis.factors[0].factor, "Relaxation");
    }

    #[tokio::test(start_paused = true)]
    async fn analyze_times_out_to_fallback() {
        let llm: Arc<dyn LlmPort> = Arc::new(StalledLlm);
        let analyzer = StoryAnalyzer::new(Some(llm), Duration::from_secs(30));
        let analysis = analyzer.analyze(NARRATIVE, &[EmotionId::Cozy]).await;
        assert_eq!(analysis.factors[0].factor, "Comfort");
    }
}
