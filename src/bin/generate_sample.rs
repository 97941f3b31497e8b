use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const CLUBS: [&str; 24] = [
    "Arsenal",
    "Aston Villa",
    "Bournemouth",
    "Brentford",
    "Brighton",
    "Burnley",
    "Chelsea",
    "Crystal Palace",
    "Everton",
    "Fulham",
    "Leeds United",
    "Leicester City",
    "Liverpool",
    "Luton Town",
    "Manchester City",
    "Manchester Utd",
    "Newcastle Utd",
    "Nottingham Forest",
    "Sheffield Utd",
    "Southampton",
    "Tottenham",
    "Watford",
    "West Ham",
    "Wolves",
];

#[derive(Parser, Debug)]
#[command(about = "Write a synthetic league standings CSV for trying out season-filter")]
struct Args {
    #[arg(default_value = "sample_tables.csv")]
    output: PathBuf,

    /// Number of consecutive seasons, ending in 2024
    #[arg(long, default_value_t = 10)]
    seasons: u32,

    /// Clubs per season
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(2..=24))]
    teams: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// One line of a final league table.
#[derive(Debug, Serialize)]
struct Standing {
    season_end_year: i64,
    team: String,
    position: u32,
    won: u32,
    drawn: u32,
    lost: u32,
    gf: u32,
    ga: u32,
    gd: i64,
    points: u32,
}

/// Simulate one season as independent results, each club's win chance
/// driven by its strength in [0, 1].
fn play_season(year: i64, clubs: &[(&str, f64)], rng: &mut StdRng) -> Vec<Standing> {
    let played = 2 * (clubs.len() as u32 - 1);

    let mut table: Vec<Standing> = clubs
        .iter()
        .map(|&(team, strength)| {
            let p_win = 0.15 + 0.5 * strength;
            let (mut won, mut drawn, mut lost) = (0, 0, 0);
            for _ in 0..played {
                let r: f64 = rng.random();
                if r < p_win {
                    won += 1;
                } else if r < p_win + 0.25 {
                    drawn += 1;
                } else {
                    lost += 1;
                }
            }
            let gf = 2 * won + drawn + rng.random_range(0..12);
            let ga = 2 * lost + drawn + rng.random_range(0..12);
            Standing {
                season_end_year: year,
                team: team.to_string(),
                position: 0,
                won,
                drawn,
                lost,
                gf,
                ga,
                gd: gf as i64 - ga as i64,
                points: 3 * won + drawn,
            }
        })
        .collect();

    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.gd.cmp(&a.gd))
            .then(b.gf.cmp(&a.gf))
    });
    for (i, standing) in table.iter_mut().enumerate() {
        standing.position = i as u32 + 1;
    }
    table
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let mut clubs: Vec<(&str, f64)> = CLUBS[..args.teams as usize]
        .iter()
        .map(|&name| (name, rng.random::<f64>()))
        .collect();

    let first_year = 2024 - args.seasons as i64 + 1;
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let mut rows = 0;
    for year in first_year..=2024 {
        for standing in play_season(year, &clubs, &mut rng) {
            writer.serialize(&standing).context("writing standing")?;
            rows += 1;
        }
        // strengths drift between seasons
        for (_, strength) in clubs.iter_mut() {
            *strength = (*strength + rng.random_range(-0.1..0.1)).clamp(0.0, 1.0);
        }
    }
    writer.flush().context("flushing CSV")?;

    println!(
        "Wrote {rows} standings ({} seasons x {} clubs) to {}",
        args.seasons,
        args.teams,
        args.output.display()
    );
    Ok(())
}
