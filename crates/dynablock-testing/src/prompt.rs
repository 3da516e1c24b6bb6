//! Scripted answers for command prompts.

use std::collections::VecDeque;

use dynablock_commands::Prompt;
use dynablock_core::{ObjectId, Point3d};

/// One scripted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Text(String),
    Real(f64),
    /// Accept the default offered by the prompt.
    Default,
    Point(Point3d),
    Choice(String),
    Pick(ObjectId),
    Cancel,
}

/// Prompt that replays a queue of answers and records every message shown.
///
/// Running out of answers counts as cancelling.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Answer>,
    pub messages: Vec<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    fn next(&mut self, message: &str) -> Option<Answer> {
        self.asked.push(message.to_string());
        match self.answers.pop_front() {
            Some(Answer::Cancel) | None => None,
            Some(answer) => Some(answer),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn get_string(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        match self.next(message)? {
            Answer::Text(text) => Some(text),
            Answer::Default => default.map(str::to_string),
            other => panic!("expected text for '{}', script has {:?}", message, other),
        }
    }

    fn get_real(&mut self, message: &str, default: f64, minimum: f64) -> Option<f64> {
        let value = match self.next(message)? {
            Answer::Real(value) => value,
            Answer::Default => default,
            other => panic!("expected a number for '{}', script has {:?}", message, other),
        };
        assert!(value >= minimum, "'{}' answered {} below minimum {}", message, value, minimum);
        Some(value)
    }

    fn get_point(&mut self, message: &str) -> Option<Point3d> {
        match self.next(message)? {
            Answer::Point(point) => Some(point),
            Answer::Default => Some(Point3d::ORIGIN),
            other => panic!("expected a point for '{}', script has {:?}", message, other),
        }
    }

    fn choose(&mut self, items: &[String], message: &str, _title: &str) -> Option<String> {
        match self.next(message)? {
            Answer::Choice(choice) => {
                assert!(items.contains(&choice), "'{}' is not offered in {:?}", choice, items);
                Some(choice)
            }
            Answer::Default => items.first().cloned(),
            other => panic!("expected a choice for '{}', script has {:?}", message, other),
        }
    }

    fn pick_instance(&mut self, message: &str) -> Option<ObjectId> {
        match self.next(message)? {
            Answer::Pick(id) => Some(id),
            other => panic!("expected a pick for '{}', script has {:?}", message, other),
        }
    }

    fn message(&mut self, text: &str, _title: &str) {
        self.messages.push(text.to_string());
    }
}
