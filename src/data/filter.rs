use log::{info, warn};

use super::error::Result;
use super::model::{Table, Value, SEASON_END_YEAR, TEAM};

// ---------------------------------------------------------------------------
// Season predicates
// ---------------------------------------------------------------------------

/// Drop every record of the season ending in `excluded`.
///
/// The input is left untouched; the result keeps the column schema and the
/// relative order of the remaining rows.
pub fn filter(table: &Table, excluded: i64) -> Result<Table> {
    let idx = table.require_column(SEASON_END_YEAR)?;
    let filtered = table.retain_where(|row| row[idx].as_i64() != Some(excluded));

    let dropped = table.len() - filtered.len();
    if dropped == 0 {
        warn!("season {excluded} not present, output equals input");
    } else {
        info!("dropped {dropped} rows for season {excluded}, {} remain", filtered.len());
    }
    Ok(filtered)
}

/// History strictly before `year`, i.e. everything known when predicting it.
pub fn seasons_before(table: &Table, year: i64) -> Result<Table> {
    let idx = table.require_column(SEASON_END_YEAR)?;
    Ok(table.retain_where(|row| row[idx].as_i64().is_some_and(|s| s < year)))
}

/// All seasons played by one club.
pub fn team_history(table: &Table, team: &str) -> Result<Table> {
    let idx = table.require_column(TEAM)?;
    Ok(table.retain_where(|row| matches!(&row[idx], Value::String(t) if t == team)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::DatasetError;

    fn scenario() -> Table {
        let row = |year: i64, team: &str, pts: i64| {
            vec![
                Value::Integer(year),
                Value::String(team.into()),
                Value::Integer(pts),
            ]
        };
        Table::new(
            vec![SEASON_END_YEAR.into(), TEAM.into(), "pts".into()],
            vec![row(2022, "A", 80), row(2023, "B", 75), row(2024, "C", 90)],
        )
    }

    #[test]
    fn drops_excluded_season() {
        let table = scenario();
        let out = filter(&table, 2024).unwrap();

        assert_eq!(out.rows, scenario().rows[..2].to_vec());
        assert_eq!(out.columns, table.columns);
        // input untouched
        assert_eq!(table, scenario());
    }

    #[test]
    fn absent_season_leaves_table_unchanged() {
        let table = scenario();
        assert_eq!(filter(&table, 1999).unwrap(), table);
    }

    #[test]
    fn missing_season_column_is_schema_error() {
        let table = Table::new(
            vec![TEAM.into()],
            vec![vec![Value::String("A".into())]],
        );
        assert!(matches!(
            filter(&table, 2024),
            Err(DatasetError::Schema(_))
        ));
    }

    #[test]
    fn filter_properties_hold() {
        let mut rows = Vec::new();
        for i in 0..60 {
            rows.push(vec![
                Value::Integer(2000 + (i * 7) % 5),
                Value::String(format!("team-{i}")),
                Value::Integer(i),
            ]);
        }
        let table = Table::new(vec![SEASON_END_YEAR.into(), TEAM.into(), "pts".into()], rows);

        for excluded in 2000..2006 {
            let out = filter(&table, excluded).unwrap();

            assert!(out.rows.iter().all(|r| r[0] != Value::Integer(excluded)));
            assert_eq!(out.columns, table.columns);
            assert_eq!(filter(&out, excluded).unwrap(), out);

            // retained rows form an ordered subsequence of the input
            let mut source = table.rows.iter();
            for kept in &out.rows {
                assert!(source.any(|r| r == kept));
            }
        }
    }

    #[test]
    fn seasons_before_is_strict() {
        let out = seasons_before(&scenario(), 2023).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows[0][0], Value::Integer(2022));
    }

    #[test]
    fn team_history_selects_by_name() {
        let out = team_history(&scenario(), "B").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows[0][2], Value::Integer(75));
        assert!(team_history(&scenario(), "Z").unwrap().is_empty());
    }
}
