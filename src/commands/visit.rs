use clap::{Args, Subcommand};

use super::{clip, OutputFormat};
use canvass::models::{NewVisit, Visit, VisitStatus};
use canvass::sync::SyncEngine;

#[derive(Args)]
pub struct VisitCommand {
    #[command(subcommand)]
    pub command: VisitSubcommand,
}

#[derive(Subcommand)]
pub enum VisitSubcommand {
    /// Record a visit and sync it to the CRM
    Add {
        /// Business name
        business_name: String,

        /// Zip code of the business
        #[arg(long)]
        zip: String,

        /// Contact person
        #[arg(long)]
        contact: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Street address
        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        city: Option<String>,

        /// Visit outcome (interested, contacted, converted, declined, ...)
        #[arg(long, default_value = "interested")]
        status: VisitStatus,

        #[arg(long)]
        notes: Option<String>,

        /// Latitude (requires --lng)
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude (requires --lat)
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,

        /// Where the visit was recorded from
        #[arg(long, default_value = "cli")]
        source: String,
    },

    /// List visits, newest first
    List {
        /// Only visits in this zip code
        #[arg(long)]
        zip: Option<String>,

        /// Only visits with coordinates
        #[arg(long)]
        mapped: bool,

        /// Only visits not yet synced
        #[arg(long)]
        unsynced: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a visit's details
    Show {
        id: i64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Retry syncing a single visit
    Sync { id: i64 },
}

impl VisitCommand {
    pub async fn run(&self, engine: &SyncEngine) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            VisitSubcommand::Add {
                business_name,
                zip,
                contact,
                phone,
                email,
                address,
                city,
                status,
                notes,
                lat,
                lng,
                source,
            } => {
                if business_name.trim().is_empty() {
                    return Err("Business name cannot be empty".into());
                }

                let mut visit = NewVisit::new(business_name.trim(), zip.trim())
                    .with_status(status.clone())
                    .with_source(source);

                if let Some(contact) = contact {
                    visit = visit.with_contact_name(contact);
                }
                if let Some(phone) = phone {
                    visit = visit.with_phone(phone);
                }
                if let Some(email) = email {
                    visit = visit.with_email(email);
                }
                if let Some(address) = address {
                    visit = visit.with_address(address);
                }
                if let Some(city) = city {
                    visit = visit.with_city(city);
                }
                if let Some(notes) = notes {
                    visit = visit.with_notes(notes);
                }
                if let (Some(lat), Some(lng)) = (lat, lng) {
                    visit = visit.with_coordinates(*lat, *lng);
                }

                let id = engine.add_visit(&visit).await?;
                let created = engine
                    .visits()
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Visit {} disappeared after insert", id))?;

                println!("Recorded visit:");
                println!("{}", created);
                if !engine.config().is_configured() {
                    println!("CRM location not configured; visit was not synced.");
                }
                Ok(())
            }

            VisitSubcommand::List {
                zip,
                mapped,
                unsynced,
                format,
            } => {
                let visits = match zip {
                    Some(zip) => engine.visits().list_by_zip(zip.trim()).await?,
                    None if *mapped => engine.visits().list_with_coordinates().await?,
                    None => engine.visits().list_all().await?,
                };
                let visits: Vec<Visit> = visits
                    .into_iter()
                    .filter(|v| !*mapped || v.has_coordinates())
                    .filter(|v| !*unsynced || !v.synced_to_ghl)
                    .collect();

                if visits.is_empty() {
                    println!("No visits found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&visits)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<6}  {:<16}  {:<30}  {:<7}  {:<12}  SYNCED",
                            "ID", "DATE", "BUSINESS", "ZIP", "STATUS"
                        );
                        println!("{}", "-".repeat(86));
                        for visit in &visits {
                            println!(
                                "{:<6}  {:<16}  {:<30}  {:<7}  {:<12}  {}",
                                visit.id,
                                visit.visit_date.format("%Y-%m-%d %H:%M"),
                                clip(&visit.business_name, 30),
                                clip(&visit.zip_code, 7),
                                clip(visit.visit_status.as_str(), 12),
                                if visit.synced_to_ghl { "yes" } else { "no" }
                            );
                        }
                        println!("\nTotal: {} visit(s)", visits.len());
                    }
                }
                Ok(())
            }

            VisitSubcommand::Show { id, format } => {
                let visit = engine
                    .visits()
                    .get(*id)
                    .await?
                    .ok_or_else(|| format!("Visit not found: {}", id))?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&visit)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", visit);
                        let link = engine.deep_link_for(&visit);
                        if !link.is_empty() {
                            println!("Link:    {}", link);
                        }
                    }
                }
                Ok(())
            }

            VisitSubcommand::Sync { id } => {
                if engine.visits().get(*id).await?.is_none() {
                    return Err(format!("Visit not found: {}", id).into());
                }
                if !engine.config().is_configured() {
                    return Err("CRM location not configured".into());
                }

                if engine.sync_to_remote(*id).await? {
                    println!("✓ Visit {} synced", id);
                    let link = engine.deep_link(*id).await?;
                    if !link.is_empty() {
                        println!("  {}", link);
                    }
                } else {
                    let error = engine
                        .visits()
                        .get(*id)
                        .await?
                        .and_then(|v| v.last_sync_error)
                        .unwrap_or_else(|| "unknown error".to_string());
                    println!("✗ Visit {} failed: {}", id, error);
                }
                Ok(())
            }
        }
    }
}
