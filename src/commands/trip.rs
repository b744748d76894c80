use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde::Serialize;

use super::{confirm, truncate, OutputFormat};
use travelog::db::{DestinationRepository, TripRepository};
use travelog::models::{parse_date, Destination, Trip, TripLength};

#[derive(Args)]
pub struct TripCommand {
    #[command(subcommand)]
    pub command: TripSubcommand,
}

#[derive(Subcommand)]
pub enum TripSubcommand {
    /// List trips, sorted by start date
    List {
        /// Only show titles containing this text (case-insensitive)
        #[arg(long, short)]
        search: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a trip with its destination
    Show {
        /// Trip ID
        id: i64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a trip
    Add {
        #[arg(long)]
        title: String,

        /// Destination ID
        #[arg(long)]
        destination: i64,

        /// Start date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        end: NaiveDate,
    },

    /// Edit an existing trip
    Edit {
        /// Trip ID
        id: i64,

        #[arg(long)]
        title: Option<String>,

        /// Destination ID
        #[arg(long)]
        destination: Option<i64>,

        /// Start date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
    },

    /// Delete a trip
    Delete {
        /// Trip ID
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

/// A trip joined with what the list and detail views show about it.
#[derive(Serialize)]
struct TripView<'a> {
    #[serde(flatten)]
    trip: &'a Trip,
    duration_days: i64,
    length: TripLength,
    destination: Option<&'a Destination>,
}

impl<'a> TripView<'a> {
    fn new(trip: &'a Trip, destinations: &'a [Destination]) -> Self {
        Self {
            trip,
            duration_days: trip.duration_days(),
            length: trip.length(),
            destination: trip.resolve_destination(destinations),
        }
    }

    fn destination_label(&self) -> String {
        match self.destination {
            Some(d) => format!("{}, {}", d.city, d.country),
            None => "Destination info not available".to_string(),
        }
    }
}

impl TripCommand {
    pub async fn run(
        &self,
        repo: &TripRepository,
        destinations: &DestinationRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TripSubcommand::List { search, format } => {
                let query = search.as_deref().unwrap_or("");
                let trips: Vec<Trip> = repo
                    .list()
                    .await?
                    .into_iter()
                    .filter(|t| t.matches_search(query))
                    .collect();

                if trips.is_empty() {
                    println!("No trips found");
                    return Ok(());
                }

                let known = destinations.list().await?;
                let views: Vec<TripView> =
                    trips.iter().map(|t| TripView::new(t, &known)).collect();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&views)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<6}  {:<28}  {:<23}  {:<6}  DESTINATION",
                            "ID", "TITLE", "DATES", "LENGTH"
                        );
                        println!("{}", "-".repeat(92));
                        for view in &views {
                            println!("{}", format_row(view));
                        }
                        println!("\nTotal: {} trip(s)", views.len());
                    }
                }
                Ok(())
            }

            TripSubcommand::Show { id, format } => {
                let trip = find(repo, *id).await?;
                let known = destinations.list().await?;
                let view = TripView::new(&trip, &known);

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&view)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", trip);
                        println!("Destination: {}", view.destination_label());
                        println!("Length: {}", view.length);
                    }
                }
                Ok(())
            }

            TripSubcommand::Add {
                title,
                destination,
                start,
                end,
            } => {
                let trip = Trip::new(0, title.trim(), *start, *end).with_destination(*destination);
                trip.validate()?;
                warn_if_unknown(destinations, *destination).await?;

                let created = repo.create_with_new_id(&trip).await?;
                tracing::debug!("Added trip {}", created.id);
                println!("Created trip:");
                print!("{}", created);
                Ok(())
            }

            TripSubcommand::Edit {
                id,
                title,
                destination,
                start,
                end,
            } => {
                let has_updates =
                    title.is_some() || destination.is_some() || start.is_some() || end.is_some();
                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut trip = find(repo, *id).await?;
                if let Some(title) = title {
                    trip.title = title.trim().to_string();
                }
                if let Some(destination) = destination {
                    trip.destination_id = Some(*destination);
                }
                if let Some(start) = start {
                    trip.start_date = *start;
                }
                if let Some(end) = end {
                    trip.end_date = *end;
                }
                trip.validate()?;
                if let Some(destination) = destination {
                    warn_if_unknown(destinations, *destination).await?;
                }

                let updated = repo.update(&trip).await?;
                println!("Updated trip:");
                print!("{}", updated);
                Ok(())
            }

            TripSubcommand::Delete { id, force } => {
                let trip = find(repo, *id).await?;

                if !force && !confirm(&format!("Delete trip '{}'?", trip.title))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                repo.delete(trip.id).await?;
                println!("Deleted trip: {}", trip.title);
                Ok(())
            }
        }
    }
}

async fn find(repo: &TripRepository, id: i64) -> Result<Trip, Box<dyn std::error::Error>> {
    repo.get_by_id(id)
        .await?
        .ok_or_else(|| format!("Trip not found: {}", id).into())
}

/// Trips may point at destinations that are not stored locally; say so
/// without refusing the write.
async fn warn_if_unknown(
    destinations: &DestinationRepository,
    id: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    if destinations.get_by_id(id).await?.is_none() {
        eprintln!("Warning: destination {} does not exist locally", id);
    }
    Ok(())
}

fn format_row(view: &TripView) -> String {
    let dates = format!("{} → {}", view.trip.start_date, view.trip.end_date);
    let destination = match view.destination {
        Some(d) => d.city.clone(),
        None => "?".to_string(),
    };
    format!(
        "{:<6}  {:<28}  {:<23}  {:<6}  {}",
        view.trip.id,
        truncate(&view.trip.title, 28),
        dates,
        view.length.to_string(),
        destination
    )
}
