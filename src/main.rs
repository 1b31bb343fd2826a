// Shop schedule CLI
// Main entry point

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};

use shop_schedule::config::AppConfig;
use shop_schedule::models::slot::SlotRow;
use shop_schedule::services::calendar::CalendarEntry;
use shop_schedule::services::remote::RestRemote;
use shop_schedule::services::reschedule::MoveProposal;
use shop_schedule::services::schedule::ScheduleService;

#[derive(Parser)]
#[command(name = "shop-schedule", version, about = "Admin schedule for the shop's lifts")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the slot grid for a day
    Day { date: NaiveDate },

    /// Print every entry in a month
    Month { year: i32, month: u32 },

    /// Move a reservation to a new start time
    Move {
        id: i64,
        to: DateTime<Utc>,
        /// Day the reservation is currently on (defaults to the target day)
        #[arg(long)]
        on: Option<NaiveDate>,
    },

    /// Print works grouped from day chunks in a date range
    Works { from: NaiveDate, to: NaiveDate },

    /// Print free start times for a new booking
    Available {
        date: NaiveDate,
        #[arg(long)]
        minutes: i64,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    log::info!("Using backend at {}", config.api.base_url);

    let remote = RestRemote::new(&config.api).context("Failed to build HTTP client")?;
    let service = ScheduleService::new(&remote);

    match cli.command {
        Command::Day { date } => print_day(&service, date).await,
        Command::Month { year, month } => print_month(&service, year, month).await,
        Command::Move { id, to, on } => move_reservation(&service, id, to, on).await,
        Command::Works { from, to } => print_works(&service, from, to).await,
        Command::Available {
            date,
            minutes,
            quantity,
        } => print_available(&service, date, minutes, quantity).await,
    }
}

fn hhmm(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M").to_string()
}

fn describe_row(row: &SlotRow, tz: Tz, lift_count: u32) -> String {
    let span = format!("{}-{}", hhmm(row.window.start, tz), hhmm(row.window.end, tz));
    if let Some(blocked) = &row.blocked {
        return format!("{}  blocked {}", span, blocked.reason.as_deref().unwrap_or(""));
    }

    let bookings: Vec<String> = row
        .reservations
        .iter()
        .map(|reservation| format!("#{} {}", reservation.id, reservation.status))
        .collect();
    format!(
        "{}  {}/{}  {}",
        span,
        row.occupied(),
        lift_count,
        bookings.join(", ")
    )
}

async fn print_day(service: &ScheduleService<'_, RestRemote>, date: NaiveDate) -> Result<()> {
    let snapshot = service
        .load_day(date)
        .await?
        .ok_or_else(|| anyhow!("Schedule for {} was replaced while loading", date))?;

    let tz = snapshot.settings.timezone;
    let rows = service.day_grid()?;
    if rows.is_empty() {
        println!("No slots on {} (check operating hours)", date);
    }
    for row in &rows {
        println!("{}", describe_row(row, tz, snapshot.settings.lift_count));
    }
    Ok(())
}

async fn print_month(
    service: &ScheduleService<'_, RestRemote>,
    year: i32,
    month: u32,
) -> Result<()> {
    let aggregate = service.month(year, month).await?;
    for entry in aggregate.entries() {
        match entry {
            CalendarEntry::Blocked(blocked) => println!(
                "blocked #{} {} - {} {}",
                blocked.id,
                blocked.start_at,
                blocked.end_at,
                blocked.reason.as_deref().unwrap_or("")
            ),
            CalendarEntry::Reservation(reservation) => println!(
                "reservation #{} {} {}min {}",
                reservation.id,
                reservation.scheduled_at,
                reservation.duration_minutes,
                reservation.status
            ),
        }
    }
    Ok(())
}

async fn move_reservation(
    service: &ScheduleService<'_, RestRemote>,
    id: i64,
    to: DateTime<Utc>,
    on: Option<NaiveDate>,
) -> Result<()> {
    let date = match on {
        Some(date) => date,
        None => service.shop_date(to).await?,
    };
    let snapshot = service
        .load_day(date)
        .await?
        .ok_or_else(|| anyhow!("Schedule for {} was replaced while loading", date))?;
    let reservation = snapshot
        .find_reservation(id)
        .cloned()
        .ok_or_else(|| anyhow!("Reservation {} is not scheduled on {}", id, date))?;

    let attempt = service.propose_move(MoveProposal::new(reservation, to)).await?;
    match attempt.message() {
        None => println!("Reservation {} moved to {}", id, to),
        Some(message) => println!("{}: {}", attempt.state(), message),
    }
    Ok(())
}

async fn print_works(
    service: &ScheduleService<'_, RestRemote>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<()> {
    for work in service.works(from, to).await? {
        println!(
            "work #{} {} chunk(s) {} .. {}{}",
            work.root_id,
            work.chunk_count(),
            work.first_start,
            work.last_start,
            if work.is_approximate() { " (approximate)" } else { "" }
        );
    }
    Ok(())
}

async fn print_available(
    service: &ScheduleService<'_, RestRemote>,
    date: NaiveDate,
    minutes: i64,
    quantity: u32,
) -> Result<()> {
    let snapshot = service
        .load_day(date)
        .await?
        .ok_or_else(|| anyhow!("Schedule for {} was replaced while loading", date))?;

    let starts = service.available_starts(minutes, quantity)?;
    if starts.is_empty() {
        println!("No free start on {}", date);
    }
    for start in starts {
        println!("{}", hhmm(start, snapshot.settings.timezone));
    }
    Ok(())
}
