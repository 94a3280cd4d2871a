//! Session tracking and round progression.
//!
//! A [`Session`] owns the current [`Round`] and the [`ScoreBoard`]. The four
//! presentation triggers map onto it as follows:
//!
//! - submit translation: [`Session::submit_translation`]
//! - submit sentence: [`Session::begin_sentence`] then [`Session::complete_sentence`]
//! - request pronunciation grading: [`Session::begin_pronunciation`] then
//!   [`Session::complete_pronunciation`]
//! - next verb: [`Session::next_verb`], or [`Session::begin_advance`] then
//!   [`Session::complete_advance`] when the verb comes from a slow source
//!
//! The `begin_*` calls take the session's single in-flight slot and hand back a
//! ticket. While a ticket is outstanding every other guarded action fails with
//! [`SessionError::EvaluationInProgress`]. A ticket is redeemed exactly once,
//! either by its `complete_*` call or by [`Session::abandon`], which releases
//! the slot without touching any state.

use serde::Serialize;

use crate::error::{Result, SessionError};
use crate::matching::{check_sentence_usage, check_translation};
use crate::types::{
    DifficultyLevel, EvaluationResult, PronunciationAttempt, Round, RoundStage, ScoreBoard,
    SentenceEvaluation, SentenceUsage, SessionSettings, VerbEntry,
};

/// Kind of action holding the in-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    Sentence,
    Pronunciation,
    Advance,
}

/// Identifies one in-flight action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    id: u64,
    round_number: u64,
    action: PendingAction,
}

impl Ticket {
    pub fn action(&self) -> PendingAction {
        self.action
    }
}

/// Result of a translation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationOutcome {
    pub correct: bool,
    pub expected: String,
    pub scoreboard: ScoreBoard,
    pub stage: RoundStage,
}

/// A sentence waiting for its evaluation.
#[derive(Debug)]
#[must_use = "redeem with complete_sentence or abandon"]
pub struct PendingSentence {
    ticket: Ticket,
    pub verb: VerbEntry,
    pub sentence: String,
    pub usage: SentenceUsage,
    pub difficulty: DifficultyLevel,
    pub ai_grading: bool,
}

impl PendingSentence {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

/// A pronunciation attempt waiting for transcription and grading.
#[derive(Debug)]
#[must_use = "redeem with complete_pronunciation or abandon"]
pub struct PendingPronunciation {
    ticket: Ticket,
    pub target_sentence: String,
    pub difficulty: DifficultyLevel,
    pub ai_grading: bool,
}

impl PendingPronunciation {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

/// A progression waiting for its next verb.
#[derive(Debug)]
#[must_use = "redeem with complete_advance or abandon"]
pub struct PendingAdvance {
    ticket: Ticket,
    pub difficulty: DifficultyLevel,
}

impl PendingAdvance {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

/// One learner's practice session.
#[derive(Debug, Clone)]
pub struct Session {
    round: Round,
    scoreboard: ScoreBoard,
    settings: SessionSettings,
    in_flight: Option<Ticket>,
    next_ticket: u64,
}

impl Session {
    /// Start a session on the given verb with default settings.
    pub fn new(verb: VerbEntry) -> Self {
        Self::with_settings(verb, SessionSettings::default())
    }

    pub fn with_settings(verb: VerbEntry, settings: SessionSettings) -> Self {
        Self {
            round: Round::new(1, verb),
            scoreboard: ScoreBoard::new(),
            settings,
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn stage(&self) -> RoundStage {
        self.round.stage
    }

    pub fn scoreboard(&self) -> &ScoreBoard {
        &self.scoreboard
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Settings may change at any time; they never affect the score or round.
    pub fn settings_mut(&mut self) -> &mut SessionSettings {
        &mut self.settings
    }

    /// The action currently holding the in-flight slot, if any.
    pub fn pending(&self) -> Option<PendingAction> {
        self.in_flight.map(|t| t.action)
    }

    /// Check the typed translation, record the score and move on to the
    /// sentence prompt, whether or not the answer was right.
    pub fn submit_translation(&mut self, answer: &str) -> Result<TranslationOutcome> {
        self.expect_stage(RoundStage::AwaitingTranslation)?;
        let answer = non_empty(answer)?;

        let correct = check_translation(answer, &self.round.verb.english_translation);
        self.scoreboard.record(correct);

        self.round.user_translation = Some(answer.to_string());
        self.round.translation_correct = Some(correct);
        self.round.translation_submitted = true;
        self.round.stage = RoundStage::AwaitingSentence;

        Ok(TranslationOutcome {
            correct,
            expected: self.round.verb.english_translation.clone(),
            scoreboard: self.scoreboard,
            stage: self.round.stage,
        })
    }

    /// Validate a sentence submission and reserve the in-flight slot for its
    /// evaluation.
    pub fn begin_sentence(&mut self, sentence: &str) -> Result<PendingSentence> {
        self.expect_idle()?;
        self.expect_stage(RoundStage::AwaitingSentence)?;
        let sentence = non_empty(sentence)?;

        let usage = check_sentence_usage(sentence, &self.round.verb.german_verb);
        let ticket = self.issue(PendingAction::Sentence);

        Ok(PendingSentence {
            ticket,
            verb: self.round.verb.clone(),
            sentence: sentence.to_string(),
            usage,
            difficulty: self.settings.difficulty,
            ai_grading: self.settings.ai_grading,
        })
    }

    /// Store the sentence and its evaluation and complete the round.
    pub fn complete_sentence(
        &mut self,
        pending: PendingSentence,
        evaluation: SentenceEvaluation,
    ) -> Result<&Round> {
        self.redeem(pending.ticket)?;

        self.round.user_sentence = Some(pending.sentence);
        self.round.usage = Some(pending.usage);
        self.round.evaluation = Some(evaluation);
        self.round.sentence_submitted = true;
        self.round.stage = RoundStage::Complete;

        Ok(&self.round)
    }

    /// Reserve the in-flight slot for a pronunciation attempt. Allowed once
    /// the translation has been submitted.
    pub fn begin_pronunciation(&mut self) -> Result<PendingPronunciation> {
        self.expect_idle()?;
        if !self.round.translation_submitted {
            return Err(SessionError::NothingToPronounce);
        }

        let ticket = self.issue(PendingAction::Pronunciation);
        Ok(PendingPronunciation {
            ticket,
            target_sentence: self.round.pronunciation_target().to_string(),
            difficulty: self.settings.difficulty,
            ai_grading: self.settings.ai_grading,
        })
    }

    /// Store a graded attempt, replacing any earlier one. Stage and score are
    /// unchanged.
    pub fn complete_pronunciation(
        &mut self,
        pending: PendingPronunciation,
        transcript: String,
        evaluation: EvaluationResult,
    ) -> Result<&PronunciationAttempt> {
        self.redeem(pending.ticket)?;

        let attempt: &PronunciationAttempt = self.round.pronunciation.insert(PronunciationAttempt {
            target_sentence: pending.target_sentence,
            transcript,
            evaluation,
        });
        Ok(attempt)
    }

    /// Drop the current pronunciation attempt so the learner can try again.
    pub fn clear_pronunciation(&mut self) -> Result<()> {
        self.expect_idle()?;
        self.round.pronunciation = None;
        Ok(())
    }

    /// Replace the round with a fresh one on `verb`. Only allowed once the
    /// round is complete; the score board is untouched.
    pub fn next_verb(&mut self, verb: VerbEntry) -> Result<&Round> {
        self.expect_idle()?;
        self.expect_complete()?;
        self.replace_round(verb);
        Ok(&self.round)
    }

    /// Like [`Session::next_verb`], but reserves the in-flight slot while the
    /// next verb is fetched.
    pub fn begin_advance(&mut self) -> Result<PendingAdvance> {
        self.expect_idle()?;
        self.expect_complete()?;

        let ticket = self.issue(PendingAction::Advance);
        Ok(PendingAdvance {
            ticket,
            difficulty: self.settings.difficulty,
        })
    }

    pub fn complete_advance(&mut self, pending: PendingAdvance, verb: VerbEntry) -> Result<&Round> {
        self.redeem(pending.ticket)?;
        self.replace_round(verb);
        Ok(&self.round)
    }

    /// Release the in-flight slot without changing anything. Tickets that no
    /// longer hold the slot are ignored.
    pub fn abandon(&mut self, ticket: Ticket) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
    }

    fn replace_round(&mut self, verb: VerbEntry) {
        let number = self.round.number + 1;
        self.round = Round::new(number, verb);
    }

    fn issue(&mut self, action: PendingAction) -> Ticket {
        let ticket = Ticket {
            id: self.next_ticket,
            round_number: self.round.number,
            action,
        };
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        ticket
    }

    fn redeem(&mut self, ticket: Ticket) -> Result<()> {
        if self.in_flight != Some(ticket) || ticket.round_number != self.round.number {
            return Err(SessionError::StaleSubmission);
        }
        self.in_flight = None;
        Ok(())
    }

    fn expect_idle(&self) -> Result<()> {
        match self.in_flight {
            Some(_) => Err(SessionError::EvaluationInProgress),
            None => Ok(()),
        }
    }

    fn expect_stage(&self, expected: RoundStage) -> Result<()> {
        if self.round.stage != expected {
            return Err(SessionError::WrongStage {
                expected,
                actual: self.round.stage,
            });
        }
        Ok(())
    }

    fn expect_complete(&self) -> Result<()> {
        if self.round.stage != RoundStage::Complete {
            return Err(SessionError::RoundIncomplete);
        }
        Ok(())
    }
}

fn non_empty(input: &str) -> Result<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InputEmpty);
    }
    Ok(trimmed)
}
