//! Idea submission wizard
//!
//! Four linear steps collect an idea before a create request is built:
//!
//! 1. Instrument - the asset symbol
//! 2. Direction - long/short and timeframe
//! 3. Levels - entry, stop and one or more targets, as typed
//! 4. Commitment - the "skin in the game" acknowledgement
//!
//! Validation here is advisory. The idea store validates levels again on
//! create and the access policy is enforced regardless of what a client sends.

use crate::domain::entities::idea::{validate_symbol, IdeaStatus, NewIdea, Side, Visibility};
use crate::domain::errors::ValidationError;
use crate::domain::value_objects::price::Price;
use crate::domain::value_objects::trade_levels::TradeLevels;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    #[default]
    Instrument,
    Direction,
    Levels,
    Commitment,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Instrument => 1,
            WizardStep::Direction => 2,
            WizardStep::Levels => 3,
            WizardStep::Commitment => 4,
        }
    }

    fn next(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Instrument => Some(WizardStep::Direction),
            WizardStep::Direction => Some(WizardStep::Levels),
            WizardStep::Levels => Some(WizardStep::Commitment),
            WizardStep::Commitment => None,
        }
    }

    fn previous(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Instrument => None,
            WizardStep::Direction => Some(WizardStep::Instrument),
            WizardStep::Levels => Some(WizardStep::Direction),
            WizardStep::Commitment => Some(WizardStep::Levels),
        }
    }
}

/// Raw form state, exactly as entered.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub asset: String,
    pub direction: String,
    pub timeframe: String,
    pub entry: String,
    pub stop: String,
    pub targets: Vec<String>,
    pub title: String,
    pub thesis: String,
    pub visibility: Visibility,
    pub acknowledged: bool,
    /// Submit for review instead of saving as a draft
    pub submit_for_review: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionWizard {
    step: WizardStep,
    form: SubmissionForm,
}

impl SubmissionWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &SubmissionForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut SubmissionForm {
        &mut self.form
    }

    /// Validate the current step and move to the next one.
    ///
    /// On the last step this only validates; use [`finish`](Self::finish).
    pub fn advance(&mut self) -> Result<WizardStep, ValidationError> {
        let current = self.step();
        self.validate_step(current)?;
        let next = current.next().unwrap_or(current);
        self.step = next;
        Ok(next)
    }

    /// Go back one step. Entered values are kept.
    pub fn back(&mut self) -> WizardStep {
        let current = self.step();
        let previous = current.previous().unwrap_or(current);
        self.step = previous;
        previous
    }

    pub fn validate_step(&self, step: WizardStep) -> Result<(), ValidationError> {
        match step {
            WizardStep::Instrument => self.asset().map(|_| ()),
            WizardStep::Direction => {
                self.side()?;
                self.timeframe().map(|_| ())
            }
            WizardStep::Levels => self.levels().map(|_| ()),
            WizardStep::Commitment => {
                if self.form.acknowledged {
                    Ok(())
                } else {
                    Err(ValidationError::CommitmentNotAcknowledged)
                }
            }
        }
    }

    /// Validate every step and build the create payload for `trader_id`.
    pub fn finish(&self, trader_id: &str) -> Result<NewIdea, ValidationError> {
        for step in [
            WizardStep::Instrument,
            WizardStep::Direction,
            WizardStep::Levels,
            WizardStep::Commitment,
        ] {
            self.validate_step(step)?;
        }

        let asset = self.asset()?;
        let levels = self.levels()?;
        let side = levels.side();
        let title = if self.form.title.trim().is_empty() {
            format!("{} {}", asset, side.as_str().to_uppercase())
        } else {
            self.form.title.trim().to_string()
        };
        let risk_pct = levels.risk_percent();
        let status = if self.form.submit_for_review {
            IdeaStatus::Submitted
        } else {
            IdeaStatus::Draft
        };

        Ok(NewIdea {
            id: None,
            trader_id: trader_id.to_string(),
            title,
            thesis: self.form.thesis.trim().to_string(),
            symbols: vec![asset],
            side,
            entry: levels.entry().value(),
            targets: levels.targets().iter().map(|t| t.value()).collect(),
            stop: levels.stop().value(),
            risk: risk_pct,
            timeframe: Some(self.timeframe()?),
            status,
            visibility: self.form.visibility,
        })
    }

    fn asset(&self) -> Result<String, ValidationError> {
        let asset = self.form.asset.trim().to_ascii_uppercase();
        if asset.is_empty() {
            return Err(ValidationError::MissingField {
                field: "asset".to_string(),
            });
        }
        validate_symbol(&asset)?;
        Ok(asset)
    }

    fn side(&self) -> Result<Side, ValidationError> {
        if self.form.direction.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "direction".to_string(),
            });
        }
        self.form.direction.parse()
    }

    fn timeframe(&self) -> Result<String, ValidationError> {
        let timeframe = self.form.timeframe.trim();
        if timeframe.is_empty() || timeframe.len() > 16 {
            return Err(ValidationError::MissingField {
                field: "timeframe".to_string(),
            });
        }
        Ok(timeframe.to_string())
    }

    fn levels(&self) -> Result<TradeLevels, ValidationError> {
        let side = self.side()?;
        let entry = Price::parse("entry", &self.form.entry)?;
        let stop = Price::parse("stop", &self.form.stop)?;
        let targets = self
            .form
            .targets
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .enumerate()
            .map(|(i, raw)| Price::parse(&format!("target {}", i + 1), raw))
            .collect::<Result<Vec<_>, _>>()?;
        TradeLevels::new(side, entry, stop, targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(direction: &str, entry: &str, stop: &str, targets: &[&str]) -> SubmissionWizard {
        let mut wizard = SubmissionWizard::new();
        let form = wizard.form_mut();
        form.asset = "btc-usd".to_string();
        form.direction = direction.to_string();
        form.timeframe = "4h".to_string();
        form.entry = entry.to_string();
        form.stop = stop.to_string();
        form.targets = targets.iter().map(|t| t.to_string()).collect();
        form.acknowledged = true;
        wizard
    }

    #[test]
    fn test_wizard_walks_all_four_steps() {
        let mut wizard = filled("long", "100", "95", &["110", "120"]);
        assert_eq!(wizard.step(), WizardStep::Instrument);
        assert_eq!(wizard.advance().unwrap(), WizardStep::Direction);
        assert_eq!(wizard.advance().unwrap(), WizardStep::Levels);
        assert_eq!(wizard.advance().unwrap(), WizardStep::Commitment);
        assert_eq!(wizard.advance().unwrap(), WizardStep::Commitment);
        assert_eq!(wizard.step().number(), 4);
    }

    #[test]
    fn test_advance_blocks_on_invalid_step() {
        let mut wizard = SubmissionWizard::new();
        assert!(matches!(
            wizard.advance(),
            Err(ValidationError::MissingField { .. })
        ));
        assert_eq!(wizard.step(), WizardStep::Instrument);
        wizard.form_mut().asset = "ETH".into();
        assert_eq!(wizard.advance().unwrap(), WizardStep::Direction);
        assert!(wizard.advance().is_err());
    }

    #[test]
    fn test_back_keeps_values() {
        let mut wizard = filled("long", "100", "95", &["110"]);
        wizard.advance().unwrap();
        assert_eq!(wizard.back(), WizardStep::Instrument);
        assert_eq!(wizard.back(), WizardStep::Instrument);
        assert_eq!(wizard.form().asset, "btc-usd");
    }

    #[test]
    fn test_finish_builds_long_idea() {
        let wizard = filled("long", "100", "95", &["110", "", "120"]);
        let idea = wizard.finish("trader_olof").unwrap();
        assert_eq!(idea.trader_id, "trader_olof");
        assert_eq!(idea.symbols, vec!["BTC-USD".to_string()]);
        assert_eq!(idea.side, Side::Long);
        assert_eq!(idea.targets, vec![110.0, 120.0]);
        assert_eq!(idea.title, "BTC-USD LONG");
        assert_eq!(idea.status, IdeaStatus::Draft);
        assert_eq!(idea.timeframe.as_deref(), Some("4h"));
        assert!((idea.risk - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_requires_stop_below_entry_below_targets() {
        let wizard = filled("long", "100", "101", &["110"]);
        assert_eq!(
            wizard.finish("t").unwrap_err(),
            ValidationError::LongLevelsOutOfOrder
        );
        let wizard = filled("long", "100", "95", &["110", "99"]);
        assert_eq!(
            wizard.finish("t").unwrap_err(),
            ValidationError::LongLevelsOutOfOrder
        );
    }

    #[test]
    fn test_short_requires_stop_above_entry_above_targets() {
        let wizard = filled("short", "100", "105", &["90", "80"]);
        assert!(wizard.finish("t").is_ok());
        let wizard = filled("short", "100", "95", &["90"]);
        assert_eq!(
            wizard.finish("t").unwrap_err(),
            ValidationError::ShortLevelsOutOfOrder
        );
    }

    #[test]
    fn test_non_numeric_and_missing_targets() {
        let wizard = filled("long", "abc", "95", &["110"]);
        assert!(matches!(
            wizard.finish("t"),
            Err(ValidationError::NotANumber { .. })
        ));
        let wizard = filled("long", "100", "95", &["", "  "]);
        assert_eq!(wizard.finish("t").unwrap_err(), ValidationError::NoTargets);
    }

    #[test]
    fn test_commitment_required() {
        let mut wizard = filled("long", "100", "95", &["110"]);
        wizard.form_mut().acknowledged = false;
        assert_eq!(
            wizard.finish("t").unwrap_err(),
            ValidationError::CommitmentNotAcknowledged
        );
    }

    #[test]
    fn test_submit_for_review_sets_submitted() {
        let mut wizard = filled("short", "100", "105", &["90"]);
        wizard.form_mut().submit_for_review = true;
        assert_eq!(wizard.finish("t").unwrap().status, IdeaStatus::Submitted);
    }
}
