//! In-memory classifier returning scripted answers. Used in tests and for
//! offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::classifier::{Classify, ClassifierFields, ClassifyError};

type Answer = Result<ClassifierFields, ClassifyError>;

/// Replays a queue of answers, then repeats the fallback answer.
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Answer>>,
    fallback: Answer,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    /// Answers in order; once exhausted every call fails permanently.
    pub fn new(script: Vec<Answer>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Err(ClassifyError::Permanent("script exhausted".into())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// The same answer for every call.
    pub fn repeating(answer: Answer) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: answer,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `classify` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_answer(&self) -> Answer {
        let mut script = match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        script.pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Classify for ScriptedClassifier {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, _text: &str) -> Result<ClassifierFields, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_answer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_then_falls_back() {
        let fake = ScriptedClassifier::new(vec![Ok(ClassifierFields::default())]);
        assert!(fake.classify("a").await.is_ok());
        assert!(matches!(
            fake.classify("b").await,
            Err(ClassifyError::Permanent(_))
        ));
        assert_eq!(fake.calls(), 2);
    }
}
