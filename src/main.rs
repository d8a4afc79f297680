use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use agecalc::{AgeView, AgeViewState, Config, RawDateInput, Submission, age_between, validate};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Work out an age in years, months and days from a birth date.
///
/// Without a date, reads one birth date per line from stdin; each line
/// replaces the one before, even mid-reveal.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Day of birth (DD)
    day: Option<String>,
    /// Month of birth (MM)
    month: Option<String>,
    /// Year of birth (YYYY)
    year: Option<String>,

    /// Print the result as JSON instead of animating it
    #[arg(long, requires = "day")]
    json: bool,

    /// Print the final values without the count-up
    #[arg(long, requires = "day")]
    instant: bool,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Earliest accepted birth year
    #[arg(long)]
    min_year: Option<i32>,

    /// Reveal time for the years counter, in milliseconds
    #[arg(long)]
    years_ms: Option<u64>,

    /// Reveal time for the months counter, in milliseconds
    #[arg(long)]
    months_ms: Option<u64>,

    /// Reveal time for the days counter, in milliseconds
    #[arg(long)]
    days_ms: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(year) = self.min_year {
            config.min_year = year;
        }
        if let Some(ms) = self.years_ms {
            config.reveal.years = Duration::from_millis(ms);
        }
        if let Some(ms) = self.months_ms {
            config.reveal.months = Duration::from_millis(ms);
        }
        if let Some(ms) = self.days_ms {
            config.reveal.days = Duration::from_millis(ms);
        }
        config
    }

    fn input(&self) -> Option<RawDateInput> {
        self.day.as_ref()?;
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        Some(RawDateInput::new(
            field(&self.day),
            field(&self.month),
            field(&self.year),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.apply(Config::from_env()?);

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    info!(%today, ?config, "starting");

    match args.input() {
        Some(input) if args.json || args.instant => print_result(&input, today, &config, args.json),
        Some(input) => animate_once(input, today, config).await,
        None => interactive(today, config).await,
    }
}

/// No animation: validate, compute and print once.
fn print_result(
    input: &RawDateInput,
    today: NaiveDate,
    config: &Config,
    json: bool,
) -> Result<ExitCode> {
    let result =
        validate(input, today, config.min_year).map(|birthdate| age_between(birthdate, today));

    if json {
        let report = match &result {
            Ok(age) => serde_json::json!({ "age": age }),
            Err(errors) => serde_json::json!({ "errors": errors }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &result {
            Ok(age) => println!("{age}"),
            Err(errors) => {
                for (field, error) in errors.displayed() {
                    eprintln!("{field}: {error}");
                }
            }
        }
    }

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn animate_once(input: RawDateInput, today: NaiveDate, config: Config) -> Result<ExitCode> {
    let view = AgeView::new(config);
    let renderer = tokio::spawn(render(view.subscribe()));

    let outcome = view.submit(&input, today).await;
    drop(view);
    renderer.await.context("renderer task failed")??;

    Ok(match outcome {
        Submission::Rejected(_) => ExitCode::FAILURE,
        Submission::Revealed(_) | Submission::Superseded(_) => ExitCode::SUCCESS,
    })
}

async fn interactive(today: NaiveDate, config: Config) -> Result<ExitCode> {
    eprintln!("Enter a birth date as DD MM YYYY (Ctrl-D to quit)");

    let view = AgeView::new(config);
    let renderer = tokio::spawn(render(view.subscribe()));
    let mut submissions = JoinSet::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        if line.trim().is_empty() {
            view.reset();
            continue;
        }
        reap_finished(&mut submissions)?;
        let input = RawDateInput::from_line(&line);
        let view = view.clone();
        submissions.spawn(async move { view.submit(&input, today).await });
    }

    while let Some(joined) = submissions.join_next().await {
        joined.context("submission task failed")?;
    }
    drop(view);
    renderer.await.context("renderer task failed")??;

    Ok(ExitCode::SUCCESS)
}

/// Collects submissions that have already ended, surfacing a panicked one.
fn reap_finished(submissions: &mut JoinSet<Submission>) -> Result<usize> {
    let mut reaped = 0;
    while let Some(done) = submissions.try_join_next() {
        done.context("submission task failed")?;
        reaped += 1;
    }
    Ok(reaped)
}

/// Redraws the counter line on stdout after every change, until the view is
/// dropped.
async fn render(mut state: watch::Receiver<AgeViewState>) -> Result<()> {
    loop {
        {
            let line = state.borrow_and_update().render_line();
            let mut out = std::io::stdout().lock();
            write!(out, "\r\x1b[2K{line}")?;
            out.flush()?;
        }
        if state.changed().await.is_err() {
            break;
        }
    }
    println!();
    Ok(())
}
