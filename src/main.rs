use clap::{Args, Parser, Subcommand};
use hermes_sync::{
    ConfigFile, CrowdinClient, Profile, RunPolicy, SyncConfig, SyncError, SyncResult, TracingSink,
    UploadOptions, run_download, run_upload,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "hermes", version, about = "Sync localization bundles with Crowdin")]
struct Cli {
    /// Config file (default: ./hermes.config.json)
    #[arg(long, global = true, env = "HERMES_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the latest translations and export JS bundles
    Download(DownloadArgs),
    /// Create missing keys and upload AI drafted translations
    Upload(UploadArgs),
    /// Manage profiles
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct ProfileOverrides {
    /// Profile to use
    #[arg(long, short = 'p')]
    profile: Option<String>,
    /// Override project ID
    #[arg(long)]
    project_id: Option<String>,
    /// Override data path
    #[arg(long)]
    data_path: Option<PathBuf>,
    /// Crowdin API token
    #[arg(long, short = 't', env = "CROWDIN_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Args)]
struct DownloadArgs {
    #[command(flatten)]
    overrides: ProfileOverrides,
    /// Override result path
    #[arg(long)]
    result_path: Option<PathBuf>,
}

#[derive(Args)]
struct UploadArgs {
    #[command(flatten)]
    overrides: ProfileOverrides,
    /// Path to keys file
    #[arg(long = "keys", short = 'k')]
    key_path: Option<PathBuf>,
    /// Path to prompts file
    #[arg(long = "prompts")]
    prompts_path: Option<PathBuf>,
    /// Gemini API token
    #[arg(long, short = 'g', env = "GEMINI_TOKEN", hide_env_values = true)]
    gemini_token: Option<String>,
    /// Skip downloading latest translations
    #[arg(long)]
    no_download: bool,
    /// Skip Gemini AI translation
    #[arg(long)]
    no_gemini: bool,
    /// Keep going with key creation if the AI translation fails
    #[arg(long)]
    continue_on_translate_error: bool,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show all profiles
    Show,
    /// Print the config file location
    Path,
    /// Set the active profile
    Use { name: String },
    /// Create a new profile
    CreateProfile {
        name: String,
        #[arg(long, default_value = "")]
        project_id: String,
    },
    /// Delete a profile
    DeleteProfile { name: String },
    /// Store API tokens in a profile
    SetToken {
        #[arg(long, short = 'p')]
        profile: Option<String>,
        #[arg(long)]
        crowdin: Option<String>,
        #[arg(long)]
        gemini: Option<String>,
    },
    /// Set profile values
    Set {
        #[arg(long, short = 'p')]
        profile: Option<String>,
        #[arg(long)]
        project_id: Option<String>,
        #[arg(long)]
        data_path: Option<String>,
        #[arg(long)]
        result_path: Option<String>,
        #[arg(long)]
        key_path: Option<String>,
        #[arg(long)]
        prompts_path: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(ConfigFile::default_path);

    if let Err(e) = run(cli.command, config_path).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command, config_path: PathBuf) -> SyncResult<()> {
    let mut file = ConfigFile::load(&config_path)?;
    match command {
        Command::Download(args) => download(&mut file, args).await,
        Command::Upload(args) => upload(&mut file, args).await,
        Command::Config(command) => configure(&mut file, &config_path, command),
    }
}

fn select_profile(file: &mut ConfigFile, name: Option<&str>) -> SyncResult<Profile> {
    match name {
        Some(name) => file
            .profile(name)
            .cloned()
            .ok_or_else(|| SyncError::Config(format!("Profile '{}' not found", name))),
        None => Ok(file.current_profile().clone()),
    }
}

fn resolve(file: &mut ConfigFile, overrides: ProfileOverrides) -> SyncResult<SyncConfig> {
    let profile = select_profile(file, overrides.profile.as_deref())?;
    let mut config = profile.to_sync_config();
    if let Some(project_id) = overrides.project_id {
        config.project_id = project_id;
    }
    if let Some(data_path) = overrides.data_path {
        config.data_path = data_path;
    }
    if let Some(token) = overrides.token.filter(|t| !t.is_empty()) {
        config.crowdin_token = token;
    }
    config.validate()?;
    Ok(config)
}

async fn download(file: &mut ConfigFile, args: DownloadArgs) -> SyncResult<()> {
    let mut config = resolve(file, args.overrides)?;
    if let Some(result_path) = args.result_path {
        config.result_path = result_path;
    }

    let client = CrowdinClient::with_api_base(
        config.crowdin_token.clone(),
        &config.project_id,
        &config.api_base,
    )?;
    let summary = run_download(&client, &config, &TracingSink).await?;

    println!("Downloaded build {}", summary.build_id);
    println!(
        "Processed {} languages: {}",
        summary.exported.len(),
        summary.exported.join(", ")
    );
    Ok(())
}

async fn upload(file: &mut ConfigFile, args: UploadArgs) -> SyncResult<()> {
    let mut config = resolve(file, args.overrides)?;
    if let Some(key_path) = args.key_path {
        config.key_path = key_path;
    }
    if let Some(prompts_path) = args.prompts_path {
        config.prompts_path = prompts_path;
    }
    if let Some(token) = args.gemini_token.filter(|t| !t.is_empty()) {
        config.gemini_token = Some(token);
    }

    let options = UploadOptions {
        download_first: !args.no_download,
        policy: RunPolicy {
            translate: !args.no_gemini,
            continue_on_translate_error: args.continue_on_translate_error,
            ..RunPolicy::default()
        },
    };

    match run_upload(&config, options, Arc::new(TracingSink)).await {
        Ok(summary) => {
            if summary.languages_translated > 0 {
                println!("Translated {} languages", summary.languages_translated);
            }
            if let Some(error) = &summary.translation_error {
                println!("AI translation failed: {}", error);
            }
            println!(
                "Added {} new keys ({} already present)",
                summary.keys_added, summary.keys_skipped
            );
            println!(
                "Attached {} translations ({} failed)",
                summary.attach_succeeded, summary.attach_failed
            );
            println!("Upload complete!");
            Ok(())
        }
        Err(e) => {
            if let Some(raw) = e.raw_response() {
                eprintln!("Raw AI response:\n{}", raw);
            }
            Err(e)
        }
    }
}

fn configure(
    file: &mut ConfigFile,
    config_path: &std::path::Path,
    command: ConfigCommand,
) -> SyncResult<()> {
    match command {
        ConfigCommand::Show => {
            println!("Config file: {}", config_path.display());
            println!("Active profile: {}\n", file.active_profile);
            println!(
                "  {:<14} {:<10} {:<16} {:<16} {:<8} {:<8}",
                "Name", "Project", "Data Path", "Result Path", "Crowdin", "Gemini"
            );
            for (name, profile) in &file.profiles {
                let marker = if *name == file.active_profile { "*" } else { " " };
                println!(
                    "{} {:<14} {:<10} {:<16} {:<16} {:<8} {:<8}",
                    marker,
                    name,
                    profile.project_id,
                    profile.data_path,
                    profile.result_path,
                    yes_no(profile.has_crowdin_token()),
                    yes_no(profile.has_gemini_token())
                );
            }
        }
        ConfigCommand::Path => println!("{}", config_path.display()),
        ConfigCommand::Use { name } => {
            if !file.set_active(&name) {
                return Err(SyncError::Config(format!("Profile '{}' not found", name)));
            }
            file.save(config_path)?;
            println!("Active profile set to: {}", name);
        }
        ConfigCommand::CreateProfile { name, project_id } => {
            if file.profile(&name).is_some() {
                return Err(SyncError::Config(format!("Profile '{}' already exists", name)));
            }
            file.add_profile(Profile::new(&name).with_project_id(&project_id));
            file.save(config_path)?;
            println!("Created profile: {}", name);
        }
        ConfigCommand::DeleteProfile { name } => {
            if !file.delete_profile(&name) {
                return Err(SyncError::Config(format!(
                    "Profile '{}' not found or cannot be deleted",
                    name
                )));
            }
            file.save(config_path)?;
            println!("Deleted profile: {}", name);
        }
        ConfigCommand::SetToken {
            profile,
            crowdin,
            gemini,
        } => {
            if crowdin.is_none() && gemini.is_none() {
                println!("No tokens provided. Use --crowdin or --gemini");
                return Ok(());
            }
            let target = profile_mut(file, profile.as_deref())?;
            if let Some(token) = crowdin {
                target.crowdin_token = token;
            }
            if let Some(token) = gemini {
                target.gemini_token = token;
            }
            let name = target.name.clone();
            file.save(config_path)?;
            println!("Tokens updated for profile: {}", name);
        }
        ConfigCommand::Set {
            profile,
            project_id,
            data_path,
            result_path,
            key_path,
            prompts_path,
        } => {
            let target = profile_mut(file, profile.as_deref())?;
            let mut changed = Vec::new();
            for (field, value, label) in [
                (&mut target.project_id, project_id, "project_id"),
                (&mut target.data_path, data_path, "data_path"),
                (&mut target.result_path, result_path, "result_path"),
                (&mut target.key_path, key_path, "key_path"),
                (&mut target.prompts_path, prompts_path, "prompts_path"),
            ] {
                if let Some(value) = value {
                    *field = value;
                    changed.push(label);
                }
            }
            let name = target.name.clone();
            if changed.is_empty() {
                println!("No values provided");
                return Ok(());
            }
            file.save(config_path)?;
            println!("Updated {} for profile: {}", changed.join(", "), name);
        }
    }
    Ok(())
}

fn profile_mut<'a>(file: &'a mut ConfigFile, name: Option<&str>) -> SyncResult<&'a mut Profile> {
    match name {
        Some(name) => file
            .profiles
            .get_mut(name)
            .ok_or_else(|| SyncError::Config(format!("Profile '{}' not found", name))),
        None => Ok(file.current_profile_mut()),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}
