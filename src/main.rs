mod data;
mod form;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use form::FormSummary;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Remove one season from a league standings dataset and write the rest"
)]
struct Args {
    /// Standings file to read (.csv, .json or .parquet)
    #[arg(default_value = "pl-tables-1993-2024.csv")]
    input: PathBuf,

    /// Where to write the remaining seasons; format follows the extension
    #[arg(default_value = "pl-tables-1993-2023.csv")]
    output: PathBuf,

    /// Season-end year whose rows are dropped
    #[arg(short, long, default_value_t = 2024)]
    exclude_season: i64,

    /// Also print each club's recent form going into this season
    #[arg(long)]
    form_year: Option<i64>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let table = data::load(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    if let Ok(seasons) = table.seasons() {
        debug!(
            "{} seasons in input ({:?}..={:?})",
            seasons.len(),
            seasons.first(),
            seasons.last()
        );
    }

    let filtered = data::filter(&table, args.exclude_season)
        .with_context(|| format!("filtering out season {}", args.exclude_season))?;

    data::save(&filtered, &args.output)
        .with_context(|| format!("saving {}", args.output.display()))?;

    info!(
        "{} -> {}: {} of {} rows kept",
        args.input.display(),
        args.output.display(),
        filtered.len(),
        table.len()
    );

    if let Some(year) = args.form_year {
        let report = form::form_report(&filtered, year)
            .with_context(|| format!("computing form going into {year}"))?;
        print_form_report(year, &report);
    }
    Ok(())
}

fn print_form_report(year: i64, report: &[FormSummary]) {
    println!("RECENT FORM GOING INTO {year}");
    println!("{}", "-".repeat(60));
    println!("{:<20} {:>7} {:>8} {:>7}  Direction", "Team", "Seasons", "Points", "Form");
    for summary in report {
        let points = summary
            .feature("points")
            .map(|p| format!("{p:.1}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<20} {:>7} {:>8} {:>+7.2}  {}",
            summary.team,
            summary.seasons,
            points,
            summary.form_score,
            summary.direction()
        );
    }

    let significant: Vec<&FormSummary> = report.iter().filter(|s| s.is_significant()).collect();
    if !significant.is_empty() {
        println!("\nSIGNIFICANT FORM CHANGES:");
        for s in significant {
            println!(
                "• {:<17} Form Score: {:+.2} ({}) Adj: {:+.2}",
                s.team,
                s.form_score,
                s.direction(),
                s.adjustment()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_drop_2024() {
        let args = Args::try_parse_from(["season-filter"]).unwrap();
        assert_eq!(args.input, PathBuf::from("pl-tables-1993-2024.csv"));
        assert_eq!(args.output, PathBuf::from("pl-tables-1993-2023.csv"));
        assert_eq!(args.exclude_season, 2024);
        assert_eq!(args.form_year, None);
    }

    #[test]
    fn explicit_arguments() {
        let args = Args::try_parse_from([
            "season-filter",
            "in.json",
            "out.parquet",
            "--exclude-season",
            "1993",
            "--form-year",
            "2024",
        ])
        .unwrap();
        assert_eq!(args.input, PathBuf::from("in.json"));
        assert_eq!(args.output, PathBuf::from("out.parquet"));
        assert_eq!(args.exclude_season, 1993);
        assert_eq!(args.form_year, Some(2024));
    }

    #[test]
    fn pipeline_writes_filtered_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tables.csv");
        let output = dir.path().join("filtered.csv");
        std::fs::write(
            &input,
            "season_end_year,team,position,points\n\
             2022,A,1,80\n\
             2023,B,2,75\n\
             2024,C,1,90\n",
        )
        .unwrap();

        let args = Args {
            input,
            output: output.clone(),
            exclude_season: 2024,
            form_year: Some(2024),
        };
        run(&args).unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "season_end_year,team,position,points\n2022,A,1,80\n2023,B,2,75\n"
        );
    }

    #[test]
    fn failure_names_the_step() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tables.csv");
        std::fs::write(&input, "team,points\nA,80\n").unwrap();

        let args = Args {
            input,
            output: dir.path().join("out.csv"),
            exclude_season: 2024,
            form_year: None,
        };
        let err = run(&args).unwrap_err();

        assert!(err.to_string().starts_with("filtering out season 2024"));
        assert!(err.downcast_ref::<data::error::DatasetError>().is_some());
        assert!(!dir.path().join("out.csv").exists());
    }

    #[test]
    fn missing_input_fails_while_loading() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            input: dir.path().join("absent.csv"),
            output: dir.path().join("out.csv"),
            exclude_season: 2024,
            form_year: None,
        };
        let err = run(&args).unwrap_err();
        assert!(err.to_string().starts_with("loading "));
    }
}
