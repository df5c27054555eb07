use crate::state::message::PendingQuestion;
use crate::types::Question;
use std::collections::BTreeMap;

const LABEL_SEPARATOR: &str = ", ";

/// Local draft of answers to a pending question block.
///
/// Submission is gated on every question having either at least one selected
/// option or a non-empty custom free-text answer. This is UI policy only; the
/// wire format accepts any string per question.
#[derive(Debug, Clone)]
pub struct AnswerDraft {
    tool_use_id: String,
    questions: Vec<Question>,
    selections: Vec<Vec<String>>,
    custom: Vec<Option<String>>,
}

impl AnswerDraft {
    pub fn new(pending: &PendingQuestion) -> Self {
        let count = pending.questions.len();
        Self {
            tool_use_id: pending.tool_use_id.clone(),
            questions: pending.questions.clone(),
            selections: vec![Vec::new(); count],
            custom: vec![None; count],
        }
    }

    pub fn tool_use_id(&self) -> &str {
        &self.tool_use_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Select or deselect an option. Single-select questions replace the
    /// previous choice; multi-select questions toggle. Picking a predefined
    /// option leaves custom free-text mode.
    pub fn toggle_option(&mut self, question_index: usize, label: &str) {
        let Some(question) = self.questions.get(question_index) else {
            return;
        };
        let selected = &mut self.selections[question_index];

        if question.multi_select {
            if let Some(position) = selected.iter().position(|l| l == label) {
                selected.remove(position);
            } else {
                selected.push(label.to_string());
            }
        } else if selected.first().is_some_and(|l| l == label) {
            selected.clear();
        } else {
            selected.clear();
            selected.push(label.to_string());
        }

        self.custom[question_index] = None;
    }

    /// Enter or leave custom free-text mode. Entering clears any predefined
    /// selections for the question.
    pub fn toggle_custom(&mut self, question_index: usize) {
        let Some(slot) = self.custom.get_mut(question_index) else {
            return;
        };
        if slot.is_some() {
            *slot = None;
        } else {
            *slot = Some(String::new());
            self.selections[question_index].clear();
        }
    }

    pub fn set_custom_text(&mut self, question_index: usize, text: String) {
        if let Some(slot) = self.custom.get_mut(question_index) {
            *slot = Some(text);
            self.selections[question_index].clear();
        }
    }

    pub fn custom_text(&self, question_index: usize) -> Option<&str> {
        self.custom.get(question_index)?.as_deref()
    }

    pub fn is_selected(&self, question_index: usize, label: &str) -> bool {
        self.selections
            .get(question_index)
            .is_some_and(|selected| selected.iter().any(|l| l == label))
    }

    pub fn is_question_answered(&self, question_index: usize) -> bool {
        match self.custom.get(question_index) {
            Some(Some(text)) => !text.trim().is_empty(),
            Some(None) => !self.selections[question_index].is_empty(),
            None => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.questions.is_empty()
            && (0..self.questions.len()).all(|index| self.is_question_answered(index))
    }

    /// Answers keyed by question text, or None while any question is
    /// unanswered. Selected labels join with `", "`.
    pub fn finalize(&self) -> Option<BTreeMap<String, String>> {
        if !self.is_complete() {
            return None;
        }

        let mut answers = BTreeMap::new();
        for (index, question) in self.questions.iter().enumerate() {
            let answer = match &self.custom[index] {
                Some(text) => text.trim().to_string(),
                None => self.selections[index].join(LABEL_SEPARATOR),
            };
            answers.insert(question.question.clone(), answer);
        }
        Some(answers)
    }
}
