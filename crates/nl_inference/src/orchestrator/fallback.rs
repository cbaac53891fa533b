use nl_core::FallbackDecision;

/// Phrases that mark an answer as declining the question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    markers: Vec<String>,
}

impl FallbackPolicy {
    pub const DEFAULT_MARKERS: [&'static str; 2] = ["cannot", "does not cover"];

    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Case-insensitive substring match against every marker.
    pub fn decide(&self, answer: &str) -> FallbackDecision {
        let answer = answer.to_lowercase();
        if self.markers.iter().any(|m| answer.contains(m.as_str())) {
            FallbackDecision::Escalate
        } else {
            FallbackDecision::Keep
        }
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARKERS)
    }
}
