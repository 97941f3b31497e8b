use std::collections::BTreeSet;
use std::fmt;

use log::debug;

use crate::data::error::{DatasetError, Result};
use crate::data::model::{Table, Value, SEASON_END_YEAR, TEAM};
use crate::data::{seasons_before, team_history};

/// Performance columns averaged for each club, when the table has them.
pub const FEATURES: [&str; 7] = ["points", "gf", "ga", "gd", "won", "drawn", "lost"];

const POINTS: &str = "points";
const POSITION: &str = "position";

/// Seasons (before the target year) that count as "recent".
const RECENT_SEASONS: i64 = 3;
/// Time constant of the exponential season weighting.
const DECAY: f64 = 1.05;
const FORM_CAP: f64 = 3.0;
/// Positions moved per unit of form score.
const ADJUSTMENT_FACTOR: f64 = 0.05;

// ---------------------------------------------------------------------------
// FormDirection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormDirection {
    Improving,
    Declining,
    Stable,
}

impl FormDirection {
    /// Any positive trend counts as improving; decline needs at least -0.5.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            FormDirection::Improving
        } else if score < -0.5 {
            FormDirection::Declining
        } else {
            FormDirection::Stable
        }
    }
}

impl fmt::Display for FormDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormDirection::Improving => write!(f, "Improving ↗"),
            FormDirection::Declining => write!(f, "Declining ↘"),
            FormDirection::Stable => write!(f, "Stable →"),
        }
    }
}

// ---------------------------------------------------------------------------
// FormSummary
// ---------------------------------------------------------------------------

/// Recency-weighted view of one club's history as of a target season.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSummary {
    pub team: String,
    /// Number of seasons the summary is built from.
    pub seasons: usize,
    /// `(feature, weighted average)` in the order the features were requested.
    pub weighted: Vec<(String, f64)>,
    /// Momentum in [-3, 3]; positive means the club is trending upwards.
    pub form_score: f64,
}

impl FormSummary {
    pub fn direction(&self) -> FormDirection {
        FormDirection::from_score(self.form_score)
    }

    pub fn is_significant(&self) -> bool {
        self.form_score.abs() > 0.5
    }

    /// Correction to apply to a predicted league position (negative moves a
    /// club up the table).
    pub fn adjustment(&self) -> f64 {
        -self.form_score * ADJUSTMENT_FACTOR
    }

    pub fn feature(&self, name: &str) -> Option<f64> {
        self.weighted
            .iter()
            .find(|(f, _)| f == name)
            .map(|(_, v)| *v)
    }
}

// ---------------------------------------------------------------------------
// Calculations
// ---------------------------------------------------------------------------

/// Numeric cells of `column`, one per row. Empty or text cells are a schema
/// error: the column is expected to be a statistic.
fn numeric_column(table: &Table, column: &str) -> Result<Vec<f64>> {
    let idx = table.require_column(column)?;
    table
        .rows
        .iter()
        .enumerate()
        .map(|(row_no, row)| {
            row[idx].as_f64().ok_or_else(|| {
                DatasetError::Schema(format!(
                    "column '{column}' is not numeric (record {}: '{}')",
                    row_no + 1,
                    row[idx]
                ))
            })
        })
        .collect()
}

fn season_column(table: &Table) -> Result<Vec<f64>> {
    numeric_column(table, SEASON_END_YEAR)
}

/// Least-squares slope of `ys` against `xs`; `None` when all `xs` coincide.
fn slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var) = (0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mean_x) * (y - mean_y);
        var += (x - mean_x).powi(2);
    }
    (var > f64::EPSILON).then(|| cov / var)
}

/// Momentum over the last few seasons of one club's history.
///
/// Combines the points trend and the (inverted) league position trend of
/// the seasons ending in `current_year - 3` or later, clamped to [-3, 3].
/// Fewer than two such seasons, or all of them in the same year, give 0.
pub fn recent_form_score(history: &Table, current_year: i64) -> Result<f64> {
    let recent = {
        let idx = history.require_column(SEASON_END_YEAR)?;
        history.retain_where(|row| {
            row[idx]
                .as_i64()
                .is_some_and(|s| s >= current_year - RECENT_SEASONS)
        })
    };
    if recent.len() < 2 {
        return Ok(0.0);
    }

    let years = season_column(&recent)?;
    let points = numeric_column(&recent, POINTS)?;
    let positions = numeric_column(&recent, POSITION)?;

    let (Some(points_trend), Some(position_trend)) =
        (slope(&years, &points), slope(&years, &positions))
    else {
        return Ok(0.0);
    };

    let score = (points_trend / 5.0) * 0.6 + (-position_trend / 2.0) * 0.4;
    Ok(score.clamp(-FORM_CAP, FORM_CAP))
}

/// Average each feature over one club's history, weighting a season by
/// `exp(-(current_year - season) / 1.05)` so recent seasons dominate.
pub fn weighted_average(
    history: &Table,
    features: &[&str],
    current_year: i64,
) -> Result<FormSummary> {
    let team = history
        .value(0, TEAM)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if history.is_empty() {
        return Err(DatasetError::NoHistory(team));
    }

    let weights: Vec<f64> = season_column(history)?
        .into_iter()
        .map(|season| (-(current_year as f64 - season) / DECAY).exp())
        .collect();
    let total: f64 = weights.iter().sum();

    let weighted = features
        .iter()
        .map(|&feature| {
            let values = numeric_column(history, feature)?;
            let sum: f64 = values.iter().zip(&weights).map(|(v, w)| v * w).sum();
            Ok((feature.to_string(), sum / total))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FormSummary {
        team,
        seasons: history.len(),
        weighted,
        form_score: recent_form_score(history, current_year)?,
    })
}

/// Form summary for every club with at least one season before `year`,
/// sorted by club name. Only the [`FEATURES`] present in the table are
/// averaged.
pub fn form_report(table: &Table, year: i64) -> Result<Vec<FormSummary>> {
    let history = seasons_before(table, year)?;
    let team_idx = history.require_column(TEAM)?;

    let features: Vec<&str> = FEATURES
        .iter()
        .copied()
        .filter(|f| history.column_index(f).is_some())
        .collect();
    debug!("form features: {features:?}");

    let teams: BTreeSet<&str> = history
        .rows
        .iter()
        .filter_map(|row| row[team_idx].as_str())
        .collect();

    teams
        .into_iter()
        .map(|team| weighted_average(&team_history(&history, team)?, &features, year))
        .collect()
}
