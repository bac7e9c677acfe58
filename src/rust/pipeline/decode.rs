use super::error::PipelineError;
use super::NUM_CLASSES;

/// Numerically stable softmax: the maximum logit is subtracted before
/// exponentiating so large scores cannot overflow.
pub fn softmax(logits: &[f32; NUM_CLASSES]) -> [f32; NUM_CLASSES] {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut probabilities = [0.0; NUM_CLASSES];
    let mut sum = 0.0;
    for (p, &logit) in probabilities.iter_mut().zip(logits) {
        *p = (logit - max).exp();
        sum += *p;
    }
    for p in &mut probabilities {
        *p /= sum;
    }
    probabilities
}

/// Index of the largest value; ties go to the lowest index.
///
/// Returns `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &value) in values.iter().enumerate() {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Outcome of decoding one score vector
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub class_index: usize,
    pub label: String,
    pub probabilities: [f32; NUM_CLASSES],
}

/// Maps classifier logits onto the model's price-range labels
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionDecoder {
    labels: Vec<String>,
}

impl DecisionDecoder {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// # Errors
    /// - `Invariant` if the winning index has no label, which means the
    ///   runtime and the label vocabulary disagree
    pub fn decode(&self, logits: &[f32; NUM_CLASSES]) -> Result<Decision, PipelineError> {
        let probabilities = softmax(logits);
        let class_index = argmax(&probabilities)
            .ok_or_else(|| PipelineError::Invariant("no class probabilities to decode".into()))?;
        let label = self.labels.get(class_index).cloned().ok_or_else(|| {
            PipelineError::Invariant(format!(
                "class index {} outside the {} known labels",
                class_index,
                self.labels.len()
            ))
        })?;
        Ok(Decision {
            class_index,
            label,
            probabilities,
        })
    }
}
