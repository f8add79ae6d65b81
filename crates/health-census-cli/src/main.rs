use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use health_census_core::config::DEFAULT_NAMESPACE;
use health_census_core::export::{patients_to_csv, CSV_FILE_NAME};
use health_census_core::models::demo_patients;
use health_census_core::stats::{self, Summary};
use health_census_core::{
    validate_patient_input, CensusConfig, Database, LoadStatus, Patient, PatientInput,
    Repository, SearchCriteria, StorageLocation,
};

#[derive(Parser)]
#[command(name = "census")]
#[command(about = "Patient census registry CLI")]
struct Cli {
    /// SQLite file holding the registry
    #[arg(long, env = "HEALTH_CENSUS_DB", default_value = "census.db")]
    db: PathBuf,

    /// Key namespace inside the store
    #[arg(long, env = "HEALTH_CENSUS_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Keep everything in memory (nothing is saved)
    #[arg(long)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a patient
    Add(AddArgs),
    /// List patients matching the criteria (all when none given)
    Search {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        condition: String,
        #[arg(long, default_value = "")]
        min_age: String,
        #[arg(long, default_value = "")]
        max_age: String,
    },
    /// Print a report (general, by-condition, by-age, by-gender)
    Report {
        kind: String,
    },
    /// Print summary and detailed statistics
    Stats,
    /// Print chart series as JSON
    Charts,
    /// Export patients as CSV
    Export {
        /// Output file (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Register the sample patients
    SeedDemo,
    /// Remove every patient
    Clear,
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: String,
    /// male, female or other
    #[arg(long)]
    gender: String,
    /// Condition code (use "other" with --other-condition)
    #[arg(long)]
    condition: String,
    #[arg(long, default_value = "")]
    other_condition: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    email: String,
    /// YYYY-MM-DD
    #[arg(long, default_value = "")]
    birth_date: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    severity: String,
    #[arg(long, default_value = "")]
    medication: String,
    /// Weight in kg
    #[arg(long, default_value = "")]
    weight: String,
    /// Height in cm
    #[arg(long, default_value = "")]
    height: String,
}

impl From<AddArgs> for PatientInput {
    fn from(args: AddArgs) -> Self {
        PatientInput {
            name: args.name,
            age: args.age,
            gender: args.gender,
            phone: args.phone,
            email: args.email,
            birth_date: args.birth_date,
            address: args.address,
            condition: args.condition,
            other_condition: args.other_condition,
            severity: args.severity,
            medication: args.medication,
            weight: args.weight,
            height: args.height,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let storage = if cli.in_memory {
        StorageLocation::InMemory
    } else {
        StorageLocation::File(cli.db.clone())
    };
    let config = CensusConfig::new(storage, cli.namespace.clone())?;
    let mut repo = open_repository(&config)?;

    match cli.command {
        Commands::Add(args) => register(&mut repo, args.into())?,
        Commands::Search {
            name,
            condition,
            min_age,
            max_age,
        } => {
            let criteria = SearchCriteria::from_form(&name, &condition, &min_age, &max_age);
            let found = repo.search(&criteria);
            if found.is_empty() {
                println!("No patients match the search criteria.");
            }
            for patient in found {
                print_patient(patient);
            }
        }
        Commands::Report { kind } => {
            let report = stats::generate_report(&kind, repo.patients());
            println!("{}", report.title());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Stats => {
            match stats::summarize(repo.patients()) {
                Summary::NoData => println!("No data available."),
                Summary::Populated {
                    total,
                    average_age,
                    most_common_condition,
                } => {
                    println!("Total patients: {}", total);
                    println!("Average age: {:.1}", average_age);
                    println!("Most common condition: {}", most_common_condition);
                }
            }
            if let Some(details) = stats::detailed_statistics(repo.patients()) {
                for section in details.sections {
                    println!("\n{}", section.title);
                    for share in section.shares {
                        println!(
                            "  {}: {} patients ({:.1}%)",
                            share.label, share.count, share.percent
                        );
                    }
                }
            }
        }
        Commands::Charts => {
            let data = stats::chart_data(repo.patients());
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Commands::Export { output } => {
            if repo.is_empty() {
                println!("No data to export.");
                return Ok(());
            }
            let csv = patients_to_csv(repo.patients());
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Exported {} patients to {}", repo.len(), path.display());
                }
                None => print!("{}", csv),
            }
            tracing::debug!(suggested = CSV_FILE_NAME, "export complete");
        }
        Commands::SeedDemo => {
            for input in demo_patients() {
                register(&mut repo, input)?;
            }
        }
        Commands::Clear => {
            if let Some(warning) = repo.clear() {
                eprintln!("Warning: {}", warning);
            }
            println!("Registry cleared.");
        }
    }

    Ok(())
}

fn open_repository(config: &CensusConfig) -> anyhow::Result<Repository<Database>> {
    let db = match config.storage() {
        StorageLocation::File(path) => Database::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?,
        StorageLocation::InMemory => Database::open_in_memory()?,
    };
    let (repo, status) = Repository::open(db, config.storage_keys());
    if let LoadStatus::Reset { reason } = status {
        eprintln!("Warning: saved data could not be loaded ({}); starting empty.", reason);
    }
    Ok(repo)
}

fn register(repo: &mut Repository<Database>, input: PatientInput) -> anyhow::Result<()> {
    let draft = match validate_patient_input(&input) {
        Ok(draft) => draft,
        Err(report) => {
            for error in &report.errors {
                eprintln!("  {}: {}", error.field(), error);
            }
            anyhow::bail!("patient not registered: {}", report);
        }
    };

    let registration = repo.add(draft)?;
    if let Some(warning) = registration.warning {
        eprintln!("Warning: {}", warning);
    }
    println!(
        "Registered patient {} ({})",
        registration.patient.id, registration.patient.name
    );
    Ok(())
}

fn print_patient(patient: &Patient) {
    println!(
        "ID: {}, Name: {}, Age: {}, Gender: {}, Condition: {}, Severity: {}",
        patient.id,
        patient.name,
        patient.age,
        patient.gender,
        patient.resolved_condition(),
        patient.severity.as_deref().unwrap_or("not specified"),
    );
    if let Some(bmi) = patient.bmi {
        println!("    BMI: {:.1}", bmi);
    }
}
