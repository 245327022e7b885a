//! Prompt templates sent with the uploaded video

use serde::{Deserialize, Serialize};

/// Which question to ask about the video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptProfile {
    /// Coaching feedback plus per-second confidence/engagement scores
    #[default]
    Feedback,
    /// Summary and qualitative feedback only, no scores
    Summary,
}

impl PromptProfile {
    #[must_use]
    pub fn template(self) -> &'static str {
        match self {
            Self::Feedback => FEEDBACK_PROMPT,
            Self::Summary => SUMMARY_PROMPT,
        }
    }

    /// Whether the answer should carry score series worth extracting
    #[must_use]
    pub fn expects_series(self) -> bool {
        matches!(self, Self::Feedback)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feedback => "feedback",
            Self::Summary => "summary",
        }
    }
}

const SUMMARY_PROMPT: &str = "Summarize this video. Then give detailed feedback on the \
quality of the presentation: tone, fluency, vocabulary and pronunciation. Point out the \
moments where the speaker sounded confident and the moments of nervousness that could be \
improved.";

const FEEDBACK_PROMPT: &str = r#"Analyze this video presentation and give detailed feedback. The speaker is learning English as a second language. Act as an honest, direct coach: do not inflate scores, the speaker needs a realistic assessment to improve.

Cover these areas:
- Tone: appropriate, monotone, over-energetic or well balanced?
- Fluency: how smooth is the speech? Frequent pauses, stutters or hesitations?
- Vocabulary: is the word choice appropriate, clear and understandable?
- Pronunciation: are words pronounced clearly? Which mispronunciations hurt understanding?
- Engagement: enthusiasm, gestures, vocal variety, or mumbling and low energy?
- Confidence: posture, body language, eye contact, voice clarity, overall delivery.

Speak to me directly as the presenter. Give specific examples of what worked and what needs work, and keep every point actionable.

Then provide two data sets as a single JSON object, with one data point for EVERY SECOND of the video:

{
  "confidenceData": [
    {"timestamp": 0, "confidence": <0-100>},
    {"timestamp": 1, "confidence": <0-100>},
    ...
  ],
  "engagementData": [
    {"timestamp": 0, "engagement": <0-100>},
    {"timestamp": 1, "engagement": <0-100>},
    ...
  ]
}

CONFIDENCE (0-100) reflects:
- body language and posture (open or closed, upright or slouched)
- voice tone and clarity (clear or mumbled, strong or weak)
- fluency and pace (smooth or halting, appropriate or too fast/slow)
- presence, composure and eye contact

ENGAGEMENT (0-100) reflects:
- enthusiasm and energy
- vocal variation (monotone or expressive)
- gestures and movement
- connection with the audience
- overall interest generated

SCORING:
- Average presentations score 70-80; filler words, hesitation and unclear speech weigh heavily.
- Mediocre delivery scores 40-55.
- Only truly excellent moments score above 95.

Timestamps are whole seconds starting at 0 and running to the end of the video. Both arrays must have the same number of entries."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_prompt_requests_both_series() {
        let prompt = PromptProfile::Feedback.template();
        assert!(prompt.contains("\"confidenceData\""));
        assert!(prompt.contains("\"engagementData\""));
        assert!(prompt.contains("EVERY SECOND"));
        assert!(PromptProfile::Feedback.expects_series());
    }

    #[test]
    fn test_summary_prompt_has_no_series() {
        let prompt = PromptProfile::Summary.template();
        assert!(!prompt.contains("confidenceData"));
        assert!(!PromptProfile::Summary.expects_series());
    }

    #[test]
    fn test_default_profile() {
        assert_eq!(PromptProfile::default(), PromptProfile::Feedback);
        assert_eq!(PromptProfile::Summary.as_str(), "summary");
    }
}
