//! Command-line front end. Every command maps to a route and goes through the guard
//! before any page is built.

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use hypertension_care_domain::entities::report::report_file_name;
use hypertension_care_domain::entities::{AnomalySeverity, BmiCategory, ReportRangePreset, ReportType, TimeRange};
use hypertension_care_domain::routing::{GuardDecision, Route};
use hypertension_care_domain::services::pagination::SortColumn;
use hypertension_care_domain::services::palette::{category_ansi, risk_level_ansi};
use hypertension_care_domain::services::{UploadFile, UploadKind};
use hypertension_care_domain::workflow::PredictionState;

use crate::cancel::ViewScope;
use crate::pages::PageError;
use crate::router::App;

#[derive(Parser, Debug)]
#[command(name = "hypertension_care", version, about = "HypertensionCare command-line client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        username: String,
        #[arg(long, env = "HYPERTENSION_CARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long, env = "HYPERTENSION_CARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Summary cards
    Dashboard,
    /// Show, save or delete the patient profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Fill the prediction form and ask for a risk prediction
    Predict {
        /// Form field as `name=value`, e.g. `--set sys_bp=138 --set diabetes=true`
        #[arg(long = "set", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
    /// Past predictions with trend and risk factors
    History,
    /// Blood pressure tracker
    Bp {
        #[command(subcommand)]
        action: BpAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ProfileAction {
    Show,
    /// Create the profile, or update the fields given
    Save(ProfileArgs),
    Delete,
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub age: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    /// Centimetres
    #[arg(long)]
    pub height: Option<String>,
    /// Kilograms
    #[arg(long)]
    pub weight: Option<String>,
    #[arg(long)]
    pub contact_email: Option<String>,
    #[arg(long)]
    pub emergency_contact: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum BpAction {
    /// Readings table
    List {
        /// date, systolic, diastolic, pulse or category
        #[arg(long)]
        sort: Option<SortColumn>,
        /// Flip the sort order
        #[arg(long)]
        reverse: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Record a reading
    Add {
        systolic: String,
        diastolic: String,
        #[arg(long)]
        pulse: Option<String>,
        /// `YYYY-MM-DDTHH:MM`, defaults to now
        #[arg(long)]
        at: Option<String>,
        /// Morning, Afternoon, Evening or Night
        #[arg(long)]
        time_of_day: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Delete {
        id: i64,
    },
    /// Send a CSV export or a monitor photo to the backend
    Upload {
        #[arg(value_enum)]
        kind: UploadArg,
        path: PathBuf,
    },
    /// Local statistics for a time window
    Stats {
        /// week, month, year or all
        #[arg(long, default_value = "month")]
        range: TimeRange,
    },
    /// Server-side analytics
    Analytics {
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=3650))]
        days: u32,
    },
    Anomalies,
    /// Generate a report and download it
    Report {
        /// pdf or excel
        #[arg(long = "type", default_value = "pdf")]
        report_type: ReportType,
        /// week, month, 3months, 6months, year or custom
        #[arg(long, default_value = "month")]
        range: ReportRangePreset,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Directory to save the report in
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadArg {
    Csv,
    Image,
}

impl From<UploadArg> for UploadKind {
    fn from(arg: UploadArg) -> Self {
        match arg {
            UploadArg::Csv => UploadKind::Csv,
            UploadArg::Image => UploadKind::Image,
        }
    }
}

impl Command {
    /// Route the command renders
    pub fn route(&self) -> Route {
        match self {
            Command::Login { .. } | Command::Logout => Route::Login,
            Command::Register { .. } => Route::Register,
            Command::Dashboard => Route::Dashboard,
            Command::Profile { .. } => Route::Profile,
            Command::Predict { .. } => Route::Prediction,
            Command::History => Route::PredictionHistory,
            Command::Bp { .. } => Route::BpTracker,
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.trim().to_string())),
        _ => Err(format!("Expected name=value, got '{}'", raw)),
    }
}

/// Wrap text in an ANSI colour
fn paint(code: &str, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", code, text)
}

/// Cancel the scope's requests on Ctrl-C
fn cancel_on_interrupt(scope: &ViewScope) -> JoinHandle<()> {
    let canceller = scope.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight requests");
            canceller.cancel();
        }
    })
}

/// Run one command against the application
pub async fn run(command: Command, app: &mut App) -> anyhow::Result<()> {
    match app.navigate(command.route()) {
        GuardDecision::Render(_) => {}
        GuardDecision::Redirect(Route::Login) => {
            bail!("You are not signed in. Run `hypertension_care login <username>` first.")
        }
        GuardDecision::Redirect(route) => bail!("Redirected to {}", route),
        GuardDecision::Loading => bail!("The session is still loading, try again"),
    }

    match command {
        Command::Login { username, password } => {
            let user = app.auth_mut().login(&username, &password).await?;
            println!("Welcome back, {}!", user.username);
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = app.auth_mut().register(&username, &email, &password).await?;
            println!("Account created. Signed in as {}.", user.username);
        }
        Command::Logout => {
            app.auth_mut().logout();
            println!("Signed out.");
        }
        Command::Dashboard => dashboard(app).await?,
        Command::Profile { action } => profile(app, action).await?,
        Command::Predict { fields } => predict(app, fields).await?,
        Command::History => history(app).await?,
        Command::Bp { action } => blood_pressure(app, action).await?,
    }

    Ok(())
}

async fn dashboard(app: &App) -> anyhow::Result<()> {
    let mut page = app.dashboard()?;
    let interrupt = cancel_on_interrupt(page.scope());
    let loaded = page.load().await;
    interrupt.abort();
    loaded?;

    if let Some(error) = page.error() {
        bail!("{}", error);
    }

    let name = page.user().map(|u| u.username.as_str()).unwrap_or("there");
    println!("Hello, {}", name);
    for card in page.cards() {
        match card.unit {
            Some(unit) => println!("  {:<22} {} {}", card.title, card.value, unit),
            None => println!("  {:<22} {}", card.title, card.value),
        }
    }
    Ok(())
}

async fn profile(app: &App, action: ProfileAction) -> anyhow::Result<()> {
    let mut page = app.profile()?;
    page.load().await?;

    match action {
        ProfileAction::Show => match page.profile() {
            None => println!("No profile yet. Create one with `hypertension_care profile save`."),
            Some(profile) => {
                let show = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
                println!("Age:               {}", show(profile.age.map(|v| v.to_string())));
                println!("Gender:            {}", show(profile.gender.clone()));
                println!("Height (cm):       {}", show(profile.height.map(|v| v.to_string())));
                println!("Weight (kg):       {}", show(profile.weight.map(|v| v.to_string())));
                match profile.effective_bmi() {
                    Some(bmi) => println!("BMI:               {:.2} ({})", bmi, BmiCategory::from_bmi(bmi)),
                    None => println!("BMI:               -"),
                }
                println!("Contact email:     {}", show(profile.contact_email.clone()));
                println!("Emergency contact: {}", show(profile.emergency_contact.clone()));
            }
        },
        ProfileAction::Save(args) => {
            let form = page.form_mut();
            let updates = [
                (&mut form.age, args.age),
                (&mut form.gender, args.gender),
                (&mut form.height, args.height),
                (&mut form.weight, args.weight),
                (&mut form.contact_email, args.contact_email),
                (&mut form.emergency_contact, args.emergency_contact),
            ];
            for (field, value) in updates {
                if let Some(value) = value {
                    *field = value;
                }
            }

            if let Some((bmi, category)) = page.bmi() {
                println!("BMI {:.2} ({})", bmi, category);
            }
            page.save().await?;
            if let Some(notice) = page.notice() {
                println!("{}", notice);
            }
        }
        ProfileAction::Delete => {
            page.delete().await?;
            if let Some(notice) = page.notice() {
                println!("{}", notice);
            }
        }
    }
    Ok(())
}

async fn predict(app: &App, fields: Vec<(String, String)>) -> anyhow::Result<()> {
    let mut page = app.prediction()?;
    let interrupt = cancel_on_interrupt(page.scope());
    let loaded = page.load().await;
    if let Err(e) = loaded {
        if e.is_cancelled() {
            interrupt.abort();
            return Err(e.into());
        }
        // The form stays usable after a failed load
        warn!("Continuing without saved data: {}", e);
    }

    let mut values = Map::new();
    for (key, value) in fields {
        let value = match value.to_lowercase().as_str() {
            "true" | "yes" => Value::Bool(true),
            "false" | "no" => Value::Bool(false),
            _ => Value::String(value),
        };
        values.insert(key, value);
    }
    let applied = page.form_mut().merge_saved(&values);
    if applied < values.len() {
        interrupt.abort();
        bail!("Some --set fields are unknown or have the wrong kind of value");
    }

    if let PredictionState::ProfileIncomplete { missing_fields } = page.state() {
        interrupt.abort();
        bail!(
            "Your profile is missing: {}. Update it with `hypertension_care profile save`.",
            missing_fields.join(", ")
        );
    }

    let submitted = page.submit().await.cloned();
    interrupt.abort();
    let record = match submitted {
        Ok(record) => record,
        Err(PageError::Api(e)) if e.missing_fields().is_some() => {
            bail!(
                "Your profile is missing: {}",
                e.missing_fields().unwrap_or_default().join(", ")
            )
        }
        Err(e) => return Err(e.into()),
    };

    let code = risk_level_ansi(&record.risk_level);
    println!(
        "Risk score: {} ({})",
        paint(code, &format!("{:.1}%", record.prediction_score)),
        paint(code, &record.risk_level)
    );
    if !record.key_factors.is_empty() {
        println!("Key factors:");
        for factor in &record.key_factors {
            println!("  - {}", factor);
        }
    }
    if !record.recommendations.is_empty() {
        println!("Recommendations:");
        for recommendation in &record.recommendations {
            println!("  - {}", recommendation);
        }
    }
    if let Some(advice) = page.advisory() {
        println!("\n{}", paint("1;31", advice));
    }
    Ok(())
}

async fn history(app: &App) -> anyhow::Result<()> {
    let mut page = app.history()?;
    let interrupt = cancel_on_interrupt(page.scope());
    let loaded = page.load().await;
    interrupt.abort();
    loaded?;

    if page.is_empty() {
        println!("No predictions yet. Run `hypertension_care predict` to get your first one.");
        return Ok(());
    }

    for point in page.timeline() {
        println!(
            "  {}  {:>5.1}%  {}",
            point.date.format("%Y-%m-%d"),
            point.score,
            paint(risk_level_ansi(&point.risk_level), &point.risk_level)
        );
    }
    if let Some(trend) = page.trend() {
        println!("Trend: {} ({:+.1} points)", trend.direction, trend.delta);
    }

    println!("Risk levels:");
    for (level, count) in page.risk_levels() {
        println!("  {:<10} {}", paint(risk_level_ansi(&level), &level), count);
    }

    let factors = page.risk_factors();
    if !factors.is_empty() {
        println!("Risk factors:");
        for (factor, count) in factors {
            println!("  {:<30} {}", factor, count);
        }
    }

    let features = page.top_features();
    if features.is_empty() {
        if !page.records().is_empty() {
            println!("Feature importance is not available for the latest prediction");
        }
    } else {
        println!("Most important features:");
        for feature in features {
            println!("  {:<30} {:.3}", feature.label, feature.importance);
        }
    }
    Ok(())
}

async fn blood_pressure(app: &App, action: BpAction) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let mut page = app.bp_tracker(now)?;
    let interrupt = cancel_on_interrupt(page.scope());
    let result = bp_action(&mut page, action, now).await;
    interrupt.abort();
    result
}

async fn bp_action(
    page: &mut crate::pages::BpTrackerPage,
    action: BpAction,
    now: chrono::NaiveDateTime,
) -> anyhow::Result<()> {
    match action {
        BpAction::List { sort, reverse, page: number } => {
            page.refresh().await?;
            if let Some(column) = sort {
                page.toggle_sort(column);
            }
            if reverse {
                let column = page.sort_state().column;
                page.toggle_sort(column);
            }
            page.set_page(number);

            let state = page.sort_state();
            println!("{} readings, sorted by {:?} {}", page.readings().len(), state.column, state.order.arrow());
            for reading in page.table_rows() {
                let pulse = reading.pulse.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
                let label = reading.category_label();
                println!(
                    "  #{:<5} {:<17} {:>3}/{:<3} pulse {:>3}  {:<9} {}",
                    reading.id,
                    reading.measurement_date,
                    reading.systolic,
                    reading.diastolic,
                    pulse,
                    reading.measurement_time.as_deref().unwrap_or("-"),
                    paint(category_ansi(label), label)
                );
            }
            let buttons: Vec<String> = page
                .page_buttons()
                .into_iter()
                .map(|n| if n == page.current_page() { format!("[{}]", n) } else { n.to_string() })
                .collect();
            println!("Page {} of {}: {}", page.current_page(), page.paginator().total_pages().max(1), buttons.join(" "));
        }
        BpAction::Add {
            systolic,
            diastolic,
            pulse,
            at,
            time_of_day,
            notes,
        } => {
            let form = page.form_mut();
            form.systolic = systolic;
            form.diastolic = diastolic;
            form.pulse = pulse.unwrap_or_default();
            if let Some(at) = at {
                form.measurement_date = at;
            }
            if let Some(time_of_day) = time_of_day {
                form.measurement_time = time_of_day;
            }
            form.notes = notes.unwrap_or_default();

            let created = page.submit_reading(now).await?;
            info!("Reading {} stored", created.reading_id);
            if let Some(notice) = page.notice() {
                println!("{}", notice);
            }
            if created.is_abnormal {
                println!("{}", paint("33", "This reading is outside the normal range."));
            }
        }
        BpAction::Delete { id } => {
            page.delete_reading(id).await?;
            println!("Reading {} deleted.", id);
        }
        BpAction::Upload { kind, path } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let contents = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Could not read {}", path.display()))?;

            let outcome = page
                .upload(kind.into(), Some(UploadFile::from_name(name)), contents)
                .await?;
            if let Some(notice) = page.notice() {
                println!("{}", notice);
            }
            if !outcome.errors.is_empty() {
                println!("{} entries could not be read:", outcome.errors.len());
                for error in &outcome.errors {
                    println!("  {}", error);
                }
            }
        }
        BpAction::Stats { range } => {
            page.refresh().await?;
            let Some(stats) = page.stats(range, now) else {
                println!("No readings in this period.");
                return Ok(());
            };
            let label = stats.category.label();
            println!("Readings:          {} ({} abnormal)", stats.reading_count, stats.abnormal_count);
            println!(
                "Average:           {:.0}/{:.0} mmHg {}",
                stats.avg_systolic,
                stats.avg_diastolic,
                paint(category_ansi(label), label)
            );
            println!("Highest:           {}/{}", stats.max_systolic, stats.max_diastolic);
            println!("Lowest:            {}/{}", stats.min_systolic, stats.min_diastolic);
            if let Some(pulse) = stats.avg_pulse {
                println!("Average pulse:     {:.0} bpm", pulse);
            }
            if let Some(trend) = page.trend(range, now) {
                println!("Systolic trend:    {} ({:+.0} mmHg)", trend.direction, trend.delta);
            }
            println!("Categories:");
            for (category, count) in page.categories() {
                println!("  {:<22} {}", paint(category_ansi(&category), &category), count);
            }
        }
        BpAction::Analytics { days } => {
            let report = page.analytics(days).await?;
            let analytics = report.analytics;
            if report.placeholder {
                println!("{}", paint("90", "(placeholder data, the backend is unavailable)"));
            }
            let avg = |v: Option<f64>| v.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".to_string());
            let value = |v: Option<i32>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
            println!(
                "Last {} days: {} readings, {} abnormal",
                days, analytics.reading_count, analytics.abnormal_reading_count
            );
            println!("Average: {}/{}", avg(analytics.avg_systolic), avg(analytics.avg_diastolic));
            println!(
                "Range:   {}-{} / {}-{}",
                value(analytics.min_systolic),
                value(analytics.max_systolic),
                value(analytics.min_diastolic),
                value(analytics.max_diastolic)
            );
            if let Some(direction) = analytics.trend_direction {
                println!("Trend:   {}", direction);
            }
            if let Some(details) = analytics.trend_details {
                println!("         {}", details);
            }
        }
        BpAction::Anomalies => {
            page.refresh().await?;
            let Some(report) = page.anomalies().await? else {
                println!("At least 5 readings are needed to look for anomalies.");
                return Ok(());
            };
            if report.placeholder {
                println!("{}", paint("90", "(placeholder data, the backend is unavailable)"));
            }
            if let Some(message) = &report.message {
                println!("{}", message);
            }
            if report.anomalies.is_empty() {
                println!("No anomalies found.");
            }
            for anomaly in &report.anomalies {
                let code = match anomaly.severity {
                    AnomalySeverity::High => "31",
                    AnomalySeverity::Medium => "33",
                    AnomalySeverity::Low => "32",
                };
                println!("{} {} [{}]", anomaly.date, anomaly.kind, paint(code, &anomaly.severity.to_string()));
                println!("  {}", anomaly.description);
                for reading in &anomaly.readings {
                    println!("    {} {}/{}", reading.date, reading.systolic, reading.diastolic);
                }
                if let Some(recommendation) = &anomaly.recommendation {
                    println!("  Recommendation: {}", recommendation);
                }
            }
        }
        BpAction::Report {
            report_type,
            range,
            start,
            end,
            output,
        } => {
            let custom = start.zip(end);
            if range == ReportRangePreset::Custom && custom.is_none() {
                bail!("A custom range needs both --start and --end");
            }

            let report = page.generate_report(report_type, range, now.date(), custom).await?;
            if let Some(message) = &report.message {
                println!("{}", message);
            }
            let Some(report_path) = report.report_path else {
                bail!("The backend did not return a report path");
            };

            let bytes = page.download_report(&report_path).await?;
            let target = output.join(report_file_name(&report_path));
            tokio::fs::write(&target, &bytes)
                .await
                .with_context(|| format!("Could not write {}", target.display()))?;
            println!("Saved {} ({} bytes)", target.display(), bytes.len());
        }
    }
    Ok(())
}
