use clap::{Parser, Subcommand};
use lifetag_core::repositories::file::FileProfileStore;
use lifetag_core::repositories::memory::StaticPinVerifier;
use lifetag_core::repositories::sinks::{ChannelNotificationSink, TracingAccessLog};
use lifetag_core::wire::ProfileFile;
use lifetag_core::{
    pin_timeout_from_env_value, AccessRequest, Allergy, CoreConfig, Credential,
    DisclosureEvaluator, EmergencyAccessService, EmergencyContact, IdentityUpdate,
    MedicalInfoUpdate, ProfileId,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DATA_DIR: &str = lifetag_core::constants::DEFAULT_PROFILE_DATA_DIR;

#[derive(Parser)]
#[command(name = "lifetag")]
#[command(about = "LifeTag emergency profile CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a profile from a YAML file
    Import {
        /// Path to profile.yaml
        file: PathBuf,
    },
    /// List stored profiles
    List,
    /// Show a profile as an emergency responder would see it
    Show {
        /// Profile id (32 lowercase hex characters)
        id: ProfileId,
        /// Request the medical tier
        #[arg(long)]
        medical: bool,
        /// Medical-view PIN (implies --medical)
        #[arg(long)]
        pin: Option<String>,
    },
    /// Set one visibility option, e.g. `medications true`
    SetVisibility {
        /// Profile id
        id: ProfileId,
        /// Setting key (camelCase)
        key: String,
        /// New value
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Add an emergency contact
    AddContact {
        /// Profile id
        id: ProfileId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        relationship: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Remove an emergency contact by its position (0-based)
    RemoveContact {
        /// Profile id
        id: ProfileId,
        index: usize,
    },
    /// Edit name, age or gender
    UpdateIdentity {
        /// Profile id
        id: ProfileId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        /// Empty string clears the gender
        #[arg(long)]
        gender: Option<String>,
    },
    /// Edit medical information; list options may be repeated
    UpdateMedical {
        /// Profile id
        id: ProfileId,
        /// e.g. "O+" or "O Positive"; empty string clears it
        #[arg(long)]
        blood_type: Option<String>,
        /// Empty string clears the alert
        #[arg(long)]
        critical_alert: Option<String>,
        /// Empty string clears the notes
        #[arg(long)]
        notes: Option<String>,
        #[arg(long = "add-allergy")]
        add_allergies: Vec<String>,
        /// Add an allergy flagged life-threatening
        #[arg(long = "add-critical-allergy")]
        add_critical_allergies: Vec<String>,
        #[arg(long = "remove-allergy")]
        remove_allergies: Vec<String>,
        #[arg(long = "add-medication")]
        add_medications: Vec<String>,
        #[arg(long = "remove-medication")]
        remove_medications: Vec<String>,
        #[arg(long = "add-condition")]
        add_conditions: Vec<String>,
        #[arg(long = "remove-condition")]
        remove_conditions: Vec<String>,
    },
}

/// Entry point for the LifeTag CLI.
///
/// # Environment Variables
/// - `LIFETAG_DATA_DIR`: profile storage root (default: "profile_data")
/// - `LIFETAG_PIN_TIMEOUT_MS`: PIN verification budget in milliseconds (default: 3000)
/// - `LIFETAG_MEDICAL_PIN`: PIN accepted for medical access; unset rejects every PIN
/// - `RUST_LOG`: log filter
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lifetag=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let data_dir = std::env::var("LIFETAG_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let pin_timeout = pin_timeout_from_env_value(std::env::var("LIFETAG_PIN_TIMEOUT_MS").ok())?;
    let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_dir), pin_timeout)?);

    let (service, notifier) = build_service(cfg)?;
    let result = run(&service, cli.command).await;

    // Closing the service closes the notification channel so the drain task can finish.
    drop(service);
    notifier.await?;

    result
}

fn build_service(
    cfg: Arc<CoreConfig>,
) -> anyhow::Result<(EmergencyAccessService, JoinHandle<()>)> {
    let verifier = match std::env::var("LIFETAG_MEDICAL_PIN") {
        Ok(pin) if !pin.trim().is_empty() => StaticPinVerifier::with_shared_pin(pin.trim())?,
        _ => StaticPinVerifier::new(),
    };

    let (notifications, mut rx) = ChannelNotificationSink::channel();
    let notifier = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            tracing::info!(
                profile = %notification.profile_id,
                level = %notification.event.level,
                "owner notified of access"
            );
        }
    });

    let evaluator = DisclosureEvaluator::new(
        &cfg,
        Arc::new(verifier),
        Arc::new(TracingAccessLog),
        Arc::new(notifications),
    );
    let store = Arc::new(FileProfileStore::new(cfg));

    Ok((
        EmergencyAccessService::new(store.clone(), store, evaluator),
        notifier,
    ))
}

async fn run(service: &EmergencyAccessService, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Import { file } => {
            let contents = std::fs::read_to_string(&file)?;
            let profile = ProfileFile::parse(&contents)?;
            let id = service.register_profile(profile)?;
            println!("Imported profile {} ({})", id, id.display_id());
        }
        Commands::List => {
            let profiles = service.list_profiles()?;
            if profiles.is_empty() {
                println!("No profiles found.");
            }
            for profile in profiles {
                println!(
                    "{}  {}  {}",
                    profile.display_id(),
                    profile.id(),
                    profile.name
                );
            }
        }
        Commands::Show { id, medical, pin } => {
            let request = if medical || pin.is_some() {
                AccessRequest::medical(pin.map(Credential::new))
            } else {
                AccessRequest::public()
            };
            let view = service.view(&id, &request).await?;
            if view.denied {
                eprintln!("Medical access denied; showing public information.");
            }
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::SetVisibility { id, key, value } => {
            service.set_visibility_key(&id, &key, value)?;
            println!("Set {} = {} for {}", key.trim(), value, id.display_id());
        }
        Commands::AddContact {
            id,
            name,
            phone,
            relationship,
            email,
        } => {
            let contact = EmergencyContact::new(
                &name,
                &phone,
                relationship.as_deref(),
                email.as_deref(),
            )?;
            service.add_emergency_contact(&id, contact)?;
            println!("Added emergency contact {} to {}", name.trim(), id.display_id());
        }
        Commands::RemoveContact { id, index } => {
            let removed = service.remove_emergency_contact(&id, index)?;
            println!("Removed emergency contact {} from {}", removed.name, id.display_id());
        }
        Commands::UpdateIdentity {
            id,
            name,
            age,
            gender,
        } => {
            let update = IdentityUpdate { name, age, gender };
            if update.is_empty() {
                anyhow::bail!("nothing to update; pass --name, --age or --gender");
            }
            service.update_identity(&id, &update)?;
            println!("Updated identity of {}", id.display_id());
        }
        Commands::UpdateMedical {
            id,
            blood_type,
            critical_alert,
            notes,
            add_allergies,
            add_critical_allergies,
            remove_allergies,
            add_medications,
            remove_medications,
            add_conditions,
            remove_conditions,
        } => {
            let allergies = add_allergies
                .iter()
                .map(|a| Allergy::new(a, false))
                .chain(add_critical_allergies.iter().map(|a| Allergy::new(a, true)))
                .collect::<Result<Vec<_>, _>>()?;

            let update = MedicalInfoUpdate {
                blood_type,
                critical_alert,
                medical_notes: notes,
                add_allergies: allergies,
                remove_allergies,
                add_medications,
                remove_medications,
                add_conditions,
                remove_conditions,
            };
            if update.is_empty() {
                anyhow::bail!("nothing to update");
            }
            service.update_medical_info(&id, &update)?;
            println!("Updated medical information of {}", id.display_id());
        }
    }

    Ok(())
}
