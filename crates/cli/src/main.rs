use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vethere_core::config::{data_dir_from_env_value, max_status_attempts_from_env_value};
use vethere_core::validation::parse_appointment_date;
use vethere_core::{
    Appointment, AppointmentId, AppointmentStatus, ClientId, ClinicServices, CoreConfig,
    DoctorId, PetId, StoreBackend, VaccineCatalogEntry, VaccineId,
};

#[derive(Parser)]
#[command(name = "vethere")]
#[command(about = "VetHere appointment and clinical record CLI")]
struct Cli {
    /// Data directory (defaults to $VETHERE_DATA_DIR, then ./vethere_data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Book an appointment in Waiting
    Book {
        appointment_id: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        pet: String,
        #[arg(long)]
        doctor: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Time (HH:MM or HH:MM:SS)
        #[arg(long)]
        time: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Add or rename a vaccine in the catalogue
    AddVaccine { vaccine_id: String, name: String },
    /// List a doctor's appointments for a day
    List {
        #[arg(long)]
        doctor: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
    /// Show one appointment
    Show { appointment_id: String },
    /// Show what may be done with an appointment now
    Actions { appointment_id: String },
    /// Change an appointment's status
    Status {
        appointment_id: String,
        /// Waiting, Accepted, Rejected or Finished
        status: String,
    },
    /// File a medical record against an accepted appointment
    Record {
        appointment_id: String,
        #[arg(long)]
        diagnosis: String,
        #[arg(long)]
        treatment: String,
    },
    /// Record a vaccination during an accepted appointment
    Vaccinate {
        appointment_id: String,
        vaccine_id: String,
    },
    /// List the vaccine catalogue
    Vaccines,
    /// Show a pet's medical and vaccination history
    History { pet_id: String },
}

fn parse_time(value: &str) -> Result<NaiveTime, Box<dyn std::error::Error>> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|e| format!("invalid time '{}': {}", value, e).into())
}

fn print_appointment(a: &Appointment) {
    println!(
        "{}  {} {}  pet {}  client {}  doctor {}  [{}]",
        a.id, a.scheduled_date, a.scheduled_time, a.pet_id, a.client_id, a.doctor_id, a.status
    );
    if let Some(notes) = &a.notes {
        println!("    notes: {}", notes);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var("VETHERE_DATA_DIR").ok()));
    let max_attempts =
        max_status_attempts_from_env_value(std::env::var("VETHERE_MAX_STATUS_ATTEMPTS").ok())?;
    let cfg = CoreConfig::new(data_dir, StoreBackend::File, max_attempts)?;
    let services = ClinicServices::open(&cfg)?;

    match cli.command {
        Some(Commands::Book {
            appointment_id,
            client,
            pet,
            doctor,
            date,
            time,
            notes,
        }) => {
            let mut appointment = Appointment::booked(
                AppointmentId::new(appointment_id)?,
                ClientId::new(client)?,
                PetId::new(pet)?,
                DoctorId::new(doctor)?,
                parse_appointment_date(&date)?,
                parse_time(&time)?,
            );
            if let Some(notes) = notes {
                appointment = appointment.with_notes(notes);
            }
            match services.lifecycle().register_booking(appointment) {
                Ok(a) => println!("Booked appointment {} (Waiting)", a.id),
                Err(e) => eprintln!("Error booking appointment: {}", e),
            }
        }
        Some(Commands::AddVaccine { vaccine_id, name }) => {
            let entry = VaccineCatalogEntry {
                vaccine_id: VaccineId::new(vaccine_id)?,
                name,
            };
            match services.store().upsert_vaccine(&entry) {
                Ok(()) => println!("Catalogue entry {}: {}", entry.vaccine_id, entry.name),
                Err(e) => eprintln!("Error updating vaccine catalogue: {}", e),
            }
        }
        Some(Commands::List { doctor, date }) => {
            let doctor = DoctorId::new(doctor)?;
            let date = parse_appointment_date(&date)?;
            match services.lifecycle().appointments_for_doctor(&doctor, date) {
                Ok(list) if list.is_empty() => println!("No appointments found."),
                Ok(list) => list.iter().for_each(print_appointment),
                Err(e) => eprintln!("Error listing appointments: {}", e),
            }
        }
        Some(Commands::Show { appointment_id }) => {
            match services
                .lifecycle()
                .appointment(&AppointmentId::new(appointment_id)?)
            {
                Ok(a) => print_appointment(&a),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Some(Commands::Actions { appointment_id }) => {
            match services
                .lifecycle()
                .permitted_actions(&AppointmentId::new(appointment_id)?)
            {
                Ok(actions) => {
                    let next: Vec<&str> = actions.transitions.iter().map(|s| s.as_str()).collect();
                    println!("Status: {}", actions.status);
                    if next.is_empty() {
                        println!("Next: none (terminal)");
                    } else {
                        println!("Next: {}", next.join(", "));
                    }
                    println!(
                        "Clinical records: {}",
                        if actions.can_file_records {
                            "allowed"
                        } else {
                            "not allowed"
                        }
                    );
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Some(Commands::Status {
            appointment_id,
            status,
        }) => {
            let id = AppointmentId::new(appointment_id)?;
            let target: AppointmentStatus = status.parse()?;
            match services.lifecycle().change_status(&id, target) {
                Ok(a) => println!("Appointment {} is now {}", a.id, a.status),
                Err(e) => eprintln!("Error changing status: {}", e),
            }
        }
        Some(Commands::Record {
            appointment_id,
            diagnosis,
            treatment,
        }) => {
            let id = AppointmentId::new(appointment_id)?;
            match services
                .coordinator()
                .submit_medical_record(&id, &diagnosis, &treatment)
            {
                Ok(record) => println!(
                    "Filed medical record {} for pet {}",
                    record.id, record.pet_id
                ),
                Err(e) => eprintln!("Error filing medical record: {}", e),
            }
        }
        Some(Commands::Vaccinate {
            appointment_id,
            vaccine_id,
        }) => {
            let id = AppointmentId::new(appointment_id)?;
            let vaccine = VaccineId::new(vaccine_id)?;
            match services.coordinator().attach_vaccine(&id, &vaccine) {
                Ok(v) => println!("Recorded {} for pet {} ({})", v.vaccine_id, v.pet_id, v.id),
                Err(e) => eprintln!("Error recording vaccination: {}", e),
            }
        }
        Some(Commands::Vaccines) => match services.coordinator().vaccine_catalog() {
            Ok(list) if list.is_empty() => println!("Vaccine catalogue is empty."),
            Ok(list) => {
                for v in list {
                    println!("{}  {}", v.vaccine_id, v.name);
                }
            }
            Err(e) => eprintln!("Error reading vaccine catalogue: {}", e),
        },
        Some(Commands::History { pet_id }) => {
            let pet = PetId::new(pet_id)?;
            match services.coordinator().medical_history(&pet) {
                Ok(records) => {
                    println!("Medical records ({}):", records.len());
                    for r in records {
                        println!(
                            "  {}  {}  dx: {}  tx: {}",
                            r.created_at.to_rfc3339(),
                            r.doctor_id,
                            r.diagnosis,
                            r.treatment
                        );
                    }
                }
                Err(e) => eprintln!("Error reading medical history: {}", e),
            }
            match services.coordinator().vaccination_history(&pet) {
                Ok(records) => {
                    println!("Vaccinations ({}):", records.len());
                    for v in records {
                        println!("  {}  {}", v.administered_at.to_rfc3339(), v.vaccine_id);
                    }
                }
                Err(e) => eprintln!("Error reading vaccination history: {}", e),
            }
        }
        None => {}
    }

    Ok(())
}
