// Text Analysis Pipeline
// attempt_gateway -> (on error) local_fallback, both ending in the same
// aggregation so the verdict shape never depends on which path ran.

use crate::models::{
    AnalysisSource, DocumentVerdict, RemoteTextVerdict, ScoredSentence, SentenceScore,
    TextAnalysis,
};
use crate::services::config_store::DetectionConfig;
use crate::services::detection::{
    aggregate, breakdown_rows, reconcile_sentences, score_sentences, text_verdict_label,
    DetectionError,
};
use crate::services::gateway::{parse_verdict, Gateway, GatewayError};
use crate::services::prompts::{text_user_prompt, TEXT_SYSTEM_PROMPT};
use crate::services::text_processor::{tokenize, truncate_for_prompt};
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

/// Overall percentage used when the gateway omits one.
const DEFAULT_REMOTE_PERCENT: f64 = 50.0;

/// One text analysis run. Holds everything the pipeline needs so nothing is
/// read from ambient state.
#[derive(Debug, Clone)]
pub struct TextAnalysisRequest {
    pub request_id: Uuid,
    pub text: String,
    pub max_prompt_chars: usize,
}

impl TextAnalysisRequest {
    /// Trims the input and rejects anything shorter than the configured floor
    /// or without a single sentence, so aggregation always has something to fold.
    pub fn new(input: &str, settings: &DetectionConfig) -> Result<Self, DetectionError> {
        let text = input.trim();
        let actual = text.chars().count();
        if actual < settings.min_input_chars {
            return Err(DetectionError::InputTooShort {
                min: settings.min_input_chars,
                actual,
            });
        }
        if tokenize(text).is_empty() {
            return Err(DetectionError::NoSentences);
        }
        Ok(Self {
            request_id: Uuid::new_v4(),
            text: text.to_string(),
            max_prompt_chars: settings.max_prompt_chars,
        })
    }

    pub fn user_prompt(&self) -> String {
        text_user_prompt(&truncate_for_prompt(&self.text, self.max_prompt_chars))
    }
}

pub async fn attempt_gateway(
    gateway: &dyn Gateway,
    request: &TextAnalysisRequest,
) -> Result<RemoteTextVerdict, GatewayError> {
    let value = gateway
        .complete(TEXT_SYSTEM_PROMPT, &request.user_prompt())
        .await?;
    parse_verdict(value)
}

/// Heuristic verdict over the tokenized input.
pub fn local_fallback<R: Rng + ?Sized>(
    request: &TextAnalysisRequest,
    rng: &mut R,
) -> Result<TextAnalysis, DetectionError> {
    let sentences = tokenize(&request.text);
    let scored = score_sentences(&sentences, rng);
    let verdict = aggregate(&scored_values(&scored))?;
    Ok(build_analysis(request, AnalysisSource::Fallback, verdict, scored, None))
}

/// Verdict from a remote response. Uses the remote sentence labels when there
/// are any, otherwise scores the local tokenization for the breakdown.
pub fn from_gateway_verdict<R: Rng + ?Sized>(
    request: &TextAnalysisRequest,
    remote: RemoteTextVerdict,
    rng: &mut R,
) -> TextAnalysis {
    let ai_percent = remote_percent(remote.ai_probability);

    let scored = if remote.sentences.is_empty() {
        score_sentences(&tokenize(&request.text), rng)
    } else {
        reconcile_sentences(&remote.sentences)
    };

    let verdict = match aggregate(&scored_values(&scored)) {
        Ok(v) => v.with_overall(ai_percent),
        Err(_) => overall_only(ai_percent),
    };

    build_analysis(request, AnalysisSource::Gateway, verdict, scored, remote.reasoning)
}

/// Gateway first; any gateway error is logged and recovered by the local heuristic.
/// `gateway = None` skips straight to the fallback.
pub async fn analyze_text<R: Rng + ?Sized>(
    gateway: Option<&dyn Gateway>,
    request: &TextAnalysisRequest,
    rng: &mut R,
) -> Result<TextAnalysis, DetectionError> {
    info!(
        request_id = %request.request_id,
        chars = request.text.chars().count(),
        "[TEXT] analysis started"
    );

    let Some(gateway) = gateway else {
        info!(request_id = %request.request_id, "[TEXT] gateway disabled, using fallback");
        return local_fallback(request, rng);
    };

    match attempt_gateway(gateway, request).await {
        Ok(remote) => {
            let analysis = from_gateway_verdict(request, remote, rng);
            info!(
                request_id = %request.request_id,
                ai_percent = analysis.verdict.ai_percent,
                "[TEXT] gateway verdict"
            );
            Ok(analysis)
        }
        Err(e) => {
            warn!(
                request_id = %request.request_id,
                unavailable = e.is_unavailable(),
                "[TEXT] gateway failed, falling back to heuristic: {}",
                e
            );
            local_fallback(request, rng)
        }
    }
}

/// Clamp to `[0, 100]`; absent or zero means the model gave us nothing.
fn remote_percent(value: Option<f64>) -> i32 {
    let v = value
        .filter(|v| v.is_finite() && *v != 0.0)
        .unwrap_or(DEFAULT_REMOTE_PERCENT);
    v.clamp(0.0, 100.0).round() as i32
}

fn overall_only(ai_percent: i32) -> DocumentVerdict {
    DocumentVerdict {
        ai_percent: 0,
        human_percent: 100,
        sentence_count: 0,
        counts: Default::default(),
        breakdown: Default::default(),
    }
    .with_overall(ai_percent)
}

fn scored_values(scored: &[ScoredSentence]) -> Vec<SentenceScore> {
    scored.iter().map(|s| s.score).collect()
}

fn build_analysis(
    request: &TextAnalysisRequest,
    source: AnalysisSource,
    verdict: DocumentVerdict,
    sentences: Vec<ScoredSentence>,
    reasoning: Option<String>,
) -> TextAnalysis {
    TextAnalysis {
        request_id: request.request_id,
        source,
        label: text_verdict_label(verdict.ai_percent).to_string(),
        breakdown: breakdown_rows(&sentences),
        verdict,
        sentences,
        reasoning,
    }
}
