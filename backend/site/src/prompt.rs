//! Sequential question/answer input for the payment and demo flows.
//!
//! On the page the answers come from blocking `prompt()` dialogs; the
//! service receives them as submitted fields and replays them in order.

use std::collections::VecDeque;

pub trait Prompt {
    /// Ask one question. `None` means the dialog was cancelled or left blank.
    fn ask(&mut self, question: &str) -> Option<String>;
}

/// Answers collected ahead of time, handed out in question order.
#[derive(Debug, Default)]
pub struct Answers {
    queue: VecDeque<Option<String>>,
    asked: Vec<String>,
}

impl Answers {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Answers {
            queue: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Questions asked so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompt for Answers {
    fn ask(&mut self, question: &str) -> Option<String> {
        self.asked.push(question.to_string());
        self.queue
            .pop_front()
            .flatten()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
    }
}
