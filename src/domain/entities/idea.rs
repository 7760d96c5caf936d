//! Idea Entity
//!
//! A trade proposal owned by a trader. Ideas move through a small lifecycle
//! (`draft` → `submitted` → `approved` | `rejected`) and carry a visibility flag
//! that decides whether approved ideas are readable by the public.

use crate::domain::errors::ValidationError;
use crate::domain::value_objects::trade_levels::TradeLevels;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

pub use crate::domain::value_objects::trade_levels::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::Draft => "draft",
            IdeaStatus::Submitted => "submitted",
            IdeaStatus::Approved => "approved",
            IdeaStatus::Rejected => "rejected",
        }
    }

    /// Statuses a trader may place their own idea in without an admin.
    pub fn is_owner_assignable(&self) -> bool {
        matches!(self, IdeaStatus::Draft | IdeaStatus::Submitted)
    }
}

impl std::fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdeaStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(IdeaStatus::Draft),
            "submitted" => Ok(IdeaStatus::Submitted),
            "approved" => Ok(IdeaStatus::Approved),
            "rejected" => Ok(IdeaStatus::Rejected),
            other => Err(ValidationError::UnknownVariant {
                field: "status".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(ValidationError::UnknownVariant {
                field: "visibility".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Stored idea document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub trader_id: String,
    pub title: String,
    pub thesis: String,
    pub symbols: Vec<String>,
    pub side: Side,
    pub entry: f64,
    pub targets: Vec<f64>,
    pub stop: f64,
    pub risk: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    pub status: IdeaStatus,
    pub visibility: Visibility,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl Idea {
    /// True when anyone, including anonymous callers, may read this idea.
    pub fn is_publicly_readable(&self) -> bool {
        self.visibility == Visibility::Public && self.status == IdeaStatus::Approved
    }

    /// Build the first stored version of an idea from a create payload.
    pub fn from_new(id: String, new_idea: NewIdea, now: DateTime<Utc>) -> Self {
        Self {
            id,
            trader_id: new_idea.trader_id,
            title: new_idea.title,
            thesis: new_idea.thesis,
            symbols: new_idea.symbols,
            side: new_idea.side,
            entry: new_idea.entry,
            targets: new_idea.targets,
            stop: new_idea.stop,
            risk: new_idea.risk,
            timeframe: new_idea.timeframe,
            status: new_idea.status,
            visibility: new_idea.visibility,
            version: 1,
            created_at: now,
            updated_at: now,
            approved_by: None,
            approved_at: None,
        }
    }

    /// The document that would result from applying `patch`.
    ///
    /// The version is bumped by one and `updated_at` is refreshed; nothing is
    /// authorised here.
    pub fn patched(&self, patch: &IdeaPatch, now: DateTime<Utc>) -> Idea {
        let mut next = self.clone();
        if let Some(trader_id) = &patch.trader_id {
            next.trader_id = trader_id.clone();
        }
        if let Some(title) = &patch.title {
            next.title = title.clone();
        }
        if let Some(thesis) = &patch.thesis {
            next.thesis = thesis.clone();
        }
        if let Some(symbols) = &patch.symbols {
            next.symbols = symbols.clone();
        }
        if let Some(side) = patch.side {
            next.side = side;
        }
        if let Some(entry) = patch.entry {
            next.entry = entry;
        }
        if let Some(targets) = &patch.targets {
            next.targets = targets.clone();
        }
        if let Some(stop) = patch.stop {
            next.stop = stop;
        }
        if let Some(risk) = patch.risk {
            next.risk = risk;
        }
        if let Some(timeframe) = &patch.timeframe {
            next.timeframe = Some(timeframe.clone());
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(visibility) = patch.visibility {
            next.visibility = visibility;
        }
        next.version = self.version + 1;
        next.updated_at = now;
        next
    }

    /// Align the approval stamp with the current status: approved ideas record
    /// the reviewer and time, every other status carries no stamp.
    pub fn stamp_approval(&mut self, reviewer: Option<&str>, now: DateTime<Utc>) {
        if self.status == IdeaStatus::Approved {
            self.approved_by = reviewer.map(str::to_string);
            self.approved_at = Some(now);
        } else {
            self.approved_by = None;
            self.approved_at = None;
        }
    }

    /// Content checks applied to every document before it is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "title".to_string(),
            });
        }
        if self.symbols.is_empty() {
            return Err(ValidationError::MissingField {
                field: "symbols".to_string(),
            });
        }
        for symbol in &self.symbols {
            validate_symbol(symbol)?;
        }
        if !self.risk.is_finite() || self.risk < 0.0 {
            return Err(ValidationError::NotANumber {
                field: "risk".to_string(),
                value: self.risk.to_string(),
            });
        }
        TradeLevels::from_raw(self.side, self.entry, self.stop, &self.targets)?;
        Ok(())
    }
}

/// Instrument symbols are upper-case tickers such as `BTC-USD` or `AAPL`.
pub fn validate_symbol(symbol: &str) -> Result<(), ValidationError> {
    let valid = !symbol.is_empty()
        && symbol.len() <= 20
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '/' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidSymbol(symbol.to_string()))
    }
}

/// Create payload. `id` may be chosen by the client; otherwise one is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIdea {
    #[serde(default)]
    pub id: Option<String>,
    pub trader_id: String,
    pub title: String,
    #[serde(default)]
    pub thesis: String,
    pub symbols: Vec<String>,
    pub side: Side,
    pub entry: f64,
    #[serde(alias = "tp", deserialize_with = "one_or_many")]
    pub targets: Vec<f64>,
    #[serde(alias = "sl")]
    pub stop: f64,
    #[serde(default)]
    pub risk: f64,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default = "default_status")]
    pub status: IdeaStatus,
    #[serde(default)]
    pub visibility: Visibility,
}

fn default_status() -> IdeaStatus {
    IdeaStatus::Draft
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdeaPatch {
    #[serde(default)]
    pub trader_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thesis: Option<String>,
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub entry: Option<f64>,
    #[serde(default, alias = "tp", deserialize_with = "optional_one_or_many")]
    pub targets: Option<Vec<f64>>,
    #[serde(default, alias = "sl")]
    pub stop: Option<f64>,
    #[serde(default)]
    pub risk: Option<f64>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub status: Option<IdeaStatus>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// When set, the update only applies if the stored version still matches.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl IdeaPatch {
    pub fn thesis(thesis: impl Into<String>) -> Self {
        Self {
            thesis: Some(thesis.into()),
            ..Default::default()
        }
    }

    pub fn status(status: IdeaStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Outcome of an admin review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Equality predicates of an idea query. `None` leaves a field unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaFilter {
    #[serde(default)]
    pub status: Option<IdeaStatus>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub trader_id: Option<String>,
}

impl IdeaFilter {
    pub fn approved() -> Self {
        Self {
            status: Some(IdeaStatus::Approved),
            ..Default::default()
        }
    }

    pub fn public_approved() -> Self {
        Self {
            status: Some(IdeaStatus::Approved),
            visibility: Some(Visibility::Public),
            trader_id: None,
        }
    }

    pub fn by_trader(trader_id: impl Into<String>) -> Self {
        Self {
            trader_id: Some(trader_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, idea: &Idea) -> bool {
        self.status.map_or(true, |s| idea.status == s)
            && self.visibility.map_or(true, |v| idea.visibility == v)
            && self
                .trader_id
                .as_deref()
                .map_or(true, |t| idea.trader_id == t)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(f64),
    Many(Vec<f64>),
}

impl From<OneOrMany> for Vec<f64> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    OneOrMany::deserialize(deserializer).map(Into::into)
}

fn optional_one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<OneOrMany>::deserialize(deserializer).map(|v| v.map(Into::into))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_new() -> NewIdea {
        serde_json::from_value(json!({
            "trader_id": "trader_olof",
            "title": "Trader idea test",
            "thesis": "Test thesis",
            "symbols": ["BTC-USD"],
            "side": "long",
            "entry": 1, "tp": 2, "sl": 0.5,
            "risk": 1,
            "status": "draft",
            "visibility": "private"
        }))
        .unwrap()
    }

    #[test]
    fn test_new_idea_accepts_single_target_alias() {
        let new_idea = sample_new();
        assert_eq!(new_idea.targets, vec![2.0]);
        assert_eq!(new_idea.stop, 0.5);
        assert_eq!(new_idea.status, IdeaStatus::Draft);
    }

    #[test]
    fn test_new_idea_defaults() {
        let new_idea: NewIdea = serde_json::from_value(json!({
            "trader_id": "t",
            "title": "x",
            "symbols": ["ETH"],
            "side": "short",
            "entry": 10.0,
            "targets": [8.0, 6.0],
            "stop": 11.0
        }))
        .unwrap();
        assert_eq!(new_idea.status, IdeaStatus::Draft);
        assert_eq!(new_idea.visibility, Visibility::Private);
        assert_eq!(new_idea.targets, vec![8.0, 6.0]);
    }

    #[test]
    fn test_from_new_starts_at_version_one() {
        let now = Utc::now();
        let idea = Idea::from_new("idea_1".into(), sample_new(), now);
        assert_eq!(idea.version, 1);
        assert_eq!(idea.created_at, now);
        assert!(idea.approved_by.is_none());
        assert!(idea.validate().is_ok());
    }

    #[test]
    fn test_patched_bumps_version_and_keeps_untouched_fields() {
        let now = Utc::now();
        let idea = Idea::from_new("idea_1".into(), sample_new(), now);
        let later = now + chrono::Duration::seconds(5);
        let next = idea.patched(&IdeaPatch::thesis("Edited"), later);
        assert_eq!(next.thesis, "Edited");
        assert_eq!(next.title, idea.title);
        assert_eq!(next.version, 2);
        assert_eq!(next.updated_at, later);
        assert_eq!(next.created_at, now);
    }

    #[test]
    fn test_validate_rejects_bad_levels_and_symbols() {
        let now = Utc::now();
        let mut idea = Idea::from_new("idea_1".into(), sample_new(), now);
        idea.stop = 3.0;
        assert_eq!(idea.validate(), Err(ValidationError::LongLevelsOutOfOrder));

        let mut idea = Idea::from_new("idea_1".into(), sample_new(), now);
        idea.symbols = vec!["btc usd".into()];
        assert!(matches!(idea.validate(), Err(ValidationError::InvalidSymbol(_))));

        let mut idea = Idea::from_new("idea_1".into(), sample_new(), now);
        idea.symbols.clear();
        assert!(matches!(idea.validate(), Err(ValidationError::MissingField { .. })));
    }

    #[test]
    fn test_filter_matches() {
        let now = Utc::now();
        let mut idea = Idea::from_new("idea_1".into(), sample_new(), now);
        assert!(IdeaFilter::default().matches(&idea));
        assert!(!IdeaFilter::approved().matches(&idea));
        assert!(IdeaFilter::by_trader("trader_olof").matches(&idea));
        idea.status = IdeaStatus::Approved;
        idea.visibility = Visibility::Public;
        assert!(IdeaFilter::public_approved().matches(&idea));
        assert!(idea.is_publicly_readable());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            IdeaStatus::Draft,
            IdeaStatus::Submitted,
            IdeaStatus::Approved,
            IdeaStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<IdeaStatus>().unwrap(), status);
        }
        assert!("OPEN".parse::<IdeaStatus>().is_err());
    }
}
