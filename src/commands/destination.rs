use clap::{Args, Subcommand};

use super::{confirm, truncate, OutputFormat};
use travelog::db::{DestinationRepository, StoreError, TripRepository};
use travelog::models::Destination;

#[derive(Args)]
pub struct DestinationCommand {
    #[command(subcommand)]
    pub command: DestinationSubcommand,
}

#[derive(Subcommand)]
pub enum DestinationSubcommand {
    /// List destinations, sorted by city
    List {
        /// Only show cities containing this text (case-insensitive)
        #[arg(long, short)]
        search: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a destination and the trips that go there
    Show {
        /// Destination ID
        id: i64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a destination
    Add {
        #[arg(long)]
        city: String,

        #[arg(long)]
        country: String,
    },

    /// Edit an existing destination
    Edit {
        /// Destination ID
        id: i64,

        /// New city
        #[arg(long)]
        city: Option<String>,

        /// New country
        #[arg(long)]
        country: Option<String>,
    },

    /// Delete a destination that no trip references
    Delete {
        /// Destination ID
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl DestinationCommand {
    pub async fn run(
        &self,
        repo: &DestinationRepository,
        trips: &TripRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DestinationSubcommand::List { search, format } => {
                let query = search.as_deref().unwrap_or("");
                let destinations: Vec<Destination> = repo
                    .list()
                    .await?
                    .into_iter()
                    .filter(|d| d.matches_search(query))
                    .collect();

                if destinations.is_empty() {
                    println!("No destinations found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&destinations)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<6}  {:<24}  {:<24}  PICTURE", "ID", "CITY", "COUNTRY");
                        println!("{}", "-".repeat(68));
                        for destination in &destinations {
                            println!("{}", format_row(destination));
                        }
                        println!("\nTotal: {} destination(s)", destinations.len());
                    }
                }
                Ok(())
            }

            DestinationSubcommand::Show { id, format } => {
                let destination = find(repo, *id).await?;
                let linked = trips.list_for_destination(*id).await?;

                match format {
                    OutputFormat::Json => {
                        let value = serde_json::json!({
                            "destination": destination,
                            "trips": linked,
                        });
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", destination);
                        if linked.is_empty() {
                            println!("Trips: none");
                        } else {
                            println!("Trips:");
                            for trip in &linked {
                                println!(
                                    "  - {} ({} → {})",
                                    trip.title, trip.start_date, trip.end_date
                                );
                            }
                        }
                    }
                }
                Ok(())
            }

            DestinationSubcommand::Add { city, country } => {
                let destination = Destination::new(0, city.trim(), country.trim());
                destination.validate()?;

                let created = repo.create_with_new_id(&destination).await?;
                tracing::debug!("Added destination {}", created.id);
                println!("Created destination:");
                print!("{}", created);
                Ok(())
            }

            DestinationSubcommand::Edit { id, city, country } => {
                if city.is_none() && country.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut destination = find(repo, *id).await?;
                if let Some(city) = city {
                    destination.city = city.trim().to_string();
                }
                if let Some(country) = country {
                    destination.country = country.trim().to_string();
                }
                destination.validate()?;

                let updated = repo.update(&destination).await?;
                println!("Updated destination:");
                print!("{}", updated);
                Ok(())
            }

            DestinationSubcommand::Delete { id, force } => {
                let destination = find(repo, *id).await?;

                if !force && !confirm(&format!("Delete destination '{}'?", destination.city))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                match repo.delete(destination.id).await {
                    Ok(()) => {
                        println!("Deleted destination: {}", destination.city);
                        Ok(())
                    }
                    Err(e @ StoreError::DestinationInUse { .. }) => {
                        Err(format!("{}. Delete or edit those trips first.", e).into())
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

async fn find(
    repo: &DestinationRepository,
    id: i64,
) -> Result<Destination, Box<dyn std::error::Error>> {
    repo.get_by_id(id)
        .await?
        .ok_or_else(|| format!("Destination not found: {}", id).into())
}

fn format_row(destination: &Destination) -> String {
    let picture = match &destination.picture {
        Some(bytes) => format!("{} bytes", bytes.len()),
        None => "-".to_string(),
    };
    format!(
        "{:<6}  {:<24}  {:<24}  {}",
        destination.id,
        truncate(&destination.city, 24),
        truncate(&destination.country, 24),
        picture
    )
}
