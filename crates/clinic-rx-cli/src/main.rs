use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_rx_core::config::{ClinicConfig, Letterhead, DEFAULT_PDF_PREFIX};
use clinic_rx_core::{
    render_prescriptions, seed_official_catalog, CatalogCache, Database, DateSelection,
    DosageForm, ExpansionError, LineItem, MedicineStore, NewMedicine, NewPatient, PatientStore,
    PrescriptionDraft, PrescriptionStore, SqliteStore,
};

#[derive(Parser)]
#[command(name = "clinic-rx")]
#[command(about = "Clinic prescription desk CLI")]
struct Cli {
    /// Database file (overrides CLINIC_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage patients
    Patient {
        #[command(subcommand)]
        action: PatientAction,
    },
    /// Manage the medicine catalog
    Medicine {
        #[command(subcommand)]
        action: MedicineAction,
    },
    /// Create one prescription per date for a patient
    Prescribe {
        /// Patient ID
        patient: String,
        /// Medicine as ID or ID=dosing (repeatable, in print order)
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        /// Prescription date, YYYY-MM-DD (repeatable)
        #[arg(long = "date", conflicts_with = "months")]
        dates: Vec<NaiveDate>,
        /// Number of monthly dates starting at --start
        #[arg(long)]
        months: Option<u32>,
        /// First monthly date (defaults to today)
        #[arg(long, requires = "months")]
        start: Option<NaiveDate>,
        /// Free-text observations
        #[arg(long, default_value = "")]
        observations: String,
    },
    /// Render a patient's prescriptions to a PDF file
    Print {
        /// Patient ID
        patient: String,
        /// Prescription IDs to include (default: all of the patient's)
        #[arg(long = "prescription")]
        prescriptions: Vec<String>,
        /// Output file (default: <prefix>_<id>_<date>.pdf of the first prescription)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete every prescription, keeping patients and medicines
    PurgePrescriptions,
}

#[derive(Subcommand)]
enum PatientAction {
    /// Register a patient
    Add {
        /// Full name
        name: String,
        /// National ID (11 digits, punctuation optional)
        #[arg(long)]
        national_id: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<NaiveDate>,
    },
    /// List all patients
    List,
    /// Search by name or national ID
    Search { query: String },
    /// Delete a patient and their prescriptions
    Delete { id: String },
}

#[derive(Subcommand)]
enum MedicineAction {
    /// Register a medicine
    Add {
        /// Generic name
        name: String,
        /// Strength, e.g. 500mg
        strength: String,
        /// Dosage form code or label (tablet, capsule, Xarope, ...)
        #[arg(long)]
        form: DosageForm,
    },
    /// List the catalog
    List,
    /// Prefix search by name
    Search { query: String },
    /// Delete a medicine
    Delete { id: String },
    /// Load the official municipal medicine list (safe to re-run)
    Seed,
}

/// Configuration resolved from the environment.
fn load_config(db_override: Option<PathBuf>) -> anyhow::Result<ClinicConfig> {
    let db_path = db_override
        .or_else(|| std::env::var_os("CLINIC_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("clinic.db"));

    let letterhead = match std::env::var_os("CLINIC_LETTERHEAD") {
        Some(path) => Letterhead::from_json_file(&PathBuf::from(path))?,
        None => Letterhead::default(),
    };

    let pdf_prefix =
        std::env::var("CLINIC_PDF_PREFIX").unwrap_or_else(|_| DEFAULT_PDF_PREFIX.into());

    Ok(ClinicConfig::new(db_path, letterhead, pdf_prefix)?)
}

fn parse_item(value: &str) -> anyhow::Result<LineItem> {
    let (id, dosing) = value.split_once('=').unwrap_or((value, ""));
    if id.trim().is_empty() {
        bail!("empty medicine ID in --item {:?}", value);
    }
    Ok(LineItem::new(id.trim(), dosing))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_rx=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'clinic-rx --help' for commands");
        return Ok(());
    };

    let config = load_config(cli.db)?;
    tracing::debug!(db = %config.db_path().display(), "Opening clinic database");
    let db = Database::open(config.db_path())
        .with_context(|| format!("opening {}", config.db_path().display()))?;
    let mut cache = CatalogCache::new(SqliteStore::new(db));

    match command {
        Commands::Patient { action } => patient_command(&mut cache, action).await?,
        Commands::Medicine { action } => medicine_command(&mut cache, action).await?,
        Commands::Prescribe {
            patient,
            items,
            dates,
            months,
            start,
            observations,
        } => {
            let today = chrono::Local::now().date_naive();
            let mut draft = PrescriptionDraft::new(patient, today);
            for item in &items {
                draft.add_line_item(parse_item(item)?);
            }
            draft.set_observations(observations);
            if let Some(months) = months {
                draft.quick_select(start.unwrap_or(today), months);
            } else if !dates.is_empty() {
                draft.dates = dates.into_iter().map(DateSelection::enabled).collect();
            }

            match cache.store().create_multiple(&draft).await {
                Ok(created) => {
                    for prescription in &created {
                        println!("Created {} for {}", prescription.id, prescription.date);
                    }
                    println!("{} prescription(s) created", created.len());
                }
                Err(ExpansionError::Store {
                    date,
                    created,
                    source,
                }) => {
                    for prescription in &created {
                        println!("Created {} for {}", prescription.id, prescription.date);
                    }
                    bail!(
                        "stopped at {} after {} prescription(s): {}",
                        date,
                        created.len(),
                        source
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Print {
            patient,
            prescriptions,
            out,
        } => {
            let patient_record = cache
                .patient(&patient)
                .await?
                .with_context(|| format!("patient {} not found", patient))?;

            let selected = if prescriptions.is_empty() {
                cache.store().prescriptions_for_patient(&patient).await?
            } else {
                let mut selected = Vec::with_capacity(prescriptions.len());
                for id in &prescriptions {
                    let prescription = cache
                        .store()
                        .prescription_by_id(id)
                        .await?
                        .with_context(|| format!("prescription {} not found", id))?;
                    selected.push(prescription);
                }
                selected
            };

            let medicines = cache.medicine_index(&selected).await?;
            let bytes =
                render_prescriptions(&selected, &patient_record, &medicines, config.letterhead())?;

            let out = match out {
                Some(path) => path,
                None => PathBuf::from(selected[0].pdf_filename(config.pdf_prefix())),
            };
            std::fs::write(&out, &bytes)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote {} ({} bytes)", out.display(), bytes.len());
        }
        Commands::PurgePrescriptions => {
            let removed = cache.store().purge_prescriptions()?;
            println!("Removed {} prescription(s)", removed);
        }
    }

    Ok(())
}

async fn patient_command(
    cache: &mut CatalogCache<SqliteStore>,
    action: PatientAction,
) -> anyhow::Result<()> {
    match action {
        PatientAction::Add {
            name,
            national_id,
            birth_date,
        } => {
            let patient = cache
                .store()
                .create_patient(NewPatient {
                    name,
                    national_id,
                    birth_date,
                })
                .await?;
            println!("{}", patient.id);
        }
        PatientAction::List => {
            let patients = cache.store().list_patients().await?;
            if patients.is_empty() {
                println!("No patients found.");
            }
            for patient in patients {
                print_patient(&patient);
            }
        }
        PatientAction::Search { query } => {
            for patient in cache.store().search_patients(&query).await? {
                print_patient(&patient);
            }
        }
        PatientAction::Delete { id } => {
            cache.delete_patient(&id).await?;
            println!("Deleted patient {}", id);
        }
    }
    Ok(())
}

async fn medicine_command(
    cache: &mut CatalogCache<SqliteStore>,
    action: MedicineAction,
) -> anyhow::Result<()> {
    match action {
        MedicineAction::Add {
            name,
            strength,
            form,
        } => {
            let medicine = cache
                .store()
                .create_medicine(NewMedicine::new(name, strength, form))
                .await?;
            println!("{}", medicine.id);
        }
        MedicineAction::List => {
            let medicines = cache.store().list_medicines().await?;
            if medicines.is_empty() {
                println!("No medicines found.");
            }
            for medicine in medicines {
                println!("{}  {}", medicine.id, medicine.description());
            }
        }
        MedicineAction::Search { query } => {
            for medicine in cache.store().search_medicines(&query).await? {
                println!("{}  {}", medicine.id, medicine.description());
            }
        }
        MedicineAction::Delete { id } => {
            cache.delete_medicine(&id).await?;
            println!("Deleted medicine {}", id);
        }
        MedicineAction::Seed => {
            let report = seed_official_catalog(cache.store()).await?;
            println!(
                "{} medicine(s) inserted, {} already present",
                report.inserted, report.skipped
            );
        }
    }
    Ok(())
}

fn print_patient(patient: &clinic_rx_core::Patient) {
    let national_id = patient.national_id.as_deref().unwrap_or("-");
    let birth_date = patient
        .birth_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".into());
    println!(
        "{}  {}  CPF {}  nasc. {}",
        patient.id, patient.name, national_id, birth_date
    );
}
