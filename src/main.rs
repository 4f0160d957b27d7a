use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gurudesk::api::{ApiClient, NewClass, NewSchool, NewUser};
use gurudesk::config::Config;
use gurudesk::document::{build_table, DocumentData, GeneratedDocument};
use gurudesk::export::{export_document, wrap_text, ExportFormat};
use gurudesk::session::Session;
use gurudesk::wizard::{fetch_classes, run_generation, WizardController};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Command-line client for the GuruDesk curriculum platform
#[derive(Parser)]
#[command(name = "gurudesk")]
#[command(about = "GuruDesk - manage schools and generate curriculum documents", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a config file (default: the global config)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with a username or email and persist the session token
    Login {
        /// Username or email
        #[arg(long)]
        login: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the persisted session token
    Logout,
    /// Show the profile of the logged-in user
    Whoami,
    /// Manage schools
    School {
        #[command(subcommand)]
        command: SchoolCommands,
    },
    /// Manage classes
    Class {
        #[command(subcommand)]
        command: ClassCommands,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage subjects
    Subject {
        #[command(subcommand)]
        command: SubjectCommands,
    },
    /// Browse saved curriculum documents
    Docs {
        #[command(subcommand)]
        command: DocsCommands,
    },
    /// Upload reference material to the platform
    Upload {
        #[command(subcommand)]
        command: UploadCommands,
    },
    /// Run the document generation wizard
    Generate {
        #[command(subcommand)]
        command: GenerateCommands,
    },
    /// Export a saved generation result to PDF or DOCX
    Export {
        /// JSON file holding a generation result
        #[arg(long)]
        input: PathBuf,
        /// Output format: pdf or docx
        #[arg(long)]
        format: ExportFormatArg,
        /// Output directory (default: current directory)
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum SchoolCommands {
    /// List all schools
    List,
    /// Create a school
    Create {
        #[arg(long)]
        name: String,
        /// School level, e.g. SD, SMP, SMA
        #[arg(long)]
        level: String,
        #[arg(long)]
        address: Option<String>,
    },
    /// Update a school's name, level or address
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        level: String,
        #[arg(long)]
        address: Option<String>,
    },
    /// Delete a school
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ClassCommands {
    /// List all classes
    List,
    /// Create a class
    Create {
        #[arg(long)]
        subject_id: i64,
        #[arg(long)]
        teacher_id: i64,
        #[arg(long)]
        grade_level: i64,
        /// Parallel class letter, e.g. A
        #[arg(long)]
        parallel: String,
        /// Required for Developer accounts
        #[arg(long)]
        school_id: Option<i64>,
    },
    /// Delete a class
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List visible users
    List,
    /// Create a user account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Developer, School Admin or Teacher
        #[arg(long)]
        role: String,
        #[arg(long)]
        school_id: Option<i64>,
    },
    /// Update username, email or password
    Update {
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// Delete a user account
    Delete { id: i64 },
    /// Replace the schools a teacher is assigned to
    AssignSchools {
        id: i64,
        /// School ids, repeatable
        #[arg(long = "school", required = true)]
        schools: Vec<i64>,
    },
}

#[derive(Subcommand)]
enum SubjectCommands {
    /// List subjects
    List,
    /// Create a custom subject
    Create {
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum DocsCommands {
    /// List saved documents
    List,
    /// Show a saved Prota as a table
    Show { id: i64 },
    /// Replace a saved Prota with edited content from a JSON file
    Update {
        id: i64,
        /// JSON file with the edited document content
        #[arg(long)]
        input: PathBuf,
    },
    /// Delete a saved Prota
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum UploadCommands {
    /// Upload reference PDFs for OCR and indexing
    Pdf {
        /// One or more PDF files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Upload a layout template document
    Layout {
        file: PathBuf,
        #[arg(long)]
        jenjang: String,
        #[arg(long)]
        mapel: String,
        #[arg(long)]
        tipe_dokumen: String,
    },
    /// Upload a teaching book PDF
    Book {
        file: PathBuf,
        #[arg(long)]
        jenjang: String,
        #[arg(long)]
        mapel_id: i64,
        #[arg(long)]
        kelas: String,
    },
    /// Upload an official CP reference document
    Cp {
        file: PathBuf,
        #[arg(long)]
        jenjang: String,
        #[arg(long)]
        mapel: String,
    },
    /// Show processing status of uploaded PDFs
    Status,
}

#[derive(Subcommand)]
enum GenerateCommands {
    /// List the classes you can generate for
    Classes,
    /// Generate a Prota draft for one class, streaming progress
    Prota {
        /// Class id (see `generate classes`)
        #[arg(long)]
        class: i64,
        /// Export formats after generation, e.g. --export pdf --export docx
        #[arg(long = "export")]
        exports: Vec<ExportFormatArg>,
        /// Output directory for exports (default: current directory)
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Save the raw result JSON to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

/// clap-friendly wrapper so `--format pdf` parses via FromStr.
#[derive(Debug, Clone, Copy)]
struct ExportFormatArg(ExportFormat);

impl std::str::FromStr for ExportFormatArg {
    type Err = gurudesk::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("gurudesk started with verbosity level: {}", cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Login { login, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password()?,
            };
            let mut client = ApiClient::new(&config, Session::new())?;
            let profile = client.login(&login, &password).await?;
            println!("Logged in as {} ({})", profile.username, profile.role);
        }
        Commands::Logout => {
            let mut client = ApiClient::new(&config, Session::new())?;
            client.logout()?;
            println!("Logged out.");
        }
        Commands::Whoami => {
            let client = authed_client(&config)?;
            let profile = client.fetch_profile().await?;
            println!("{} <{}>", profile.username, profile.email);
            println!("Role: {}", profile.role);
            if let Some(school_id) = profile.school_id {
                println!("School id: {school_id}");
            }
        }
        Commands::School { command } => run_school(&authed_client(&config)?, command).await?,
        Commands::Class { command } => run_class(&authed_client(&config)?, command).await?,
        Commands::User { command } => run_user(&authed_client(&config)?, command).await?,
        Commands::Subject { command } => run_subject(&authed_client(&config)?, command).await?,
        Commands::Docs { command } => run_docs(&authed_client(&config)?, command).await?,
        Commands::Upload { command } => run_upload(&authed_client(&config)?, command).await?,
        Commands::Generate { command } => run_generate(&authed_client(&config)?, command).await?,
        Commands::Export { input, format, out } => {
            let document = load_result_file(&input)?;
            let path = export_document(&document, format.0, &out)?;
            println!("Exported {}", path.display());
        }
    }

    Ok(())
}

fn authed_client(config: &Config) -> anyhow::Result<ApiClient> {
    let session = Session::load()?;
    Ok(ApiClient::new(config, session)?)
}

fn prompt_password() -> anyhow::Result<String> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    let password = password.trim_end_matches(['\n', '\r']).to_string();
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

async fn run_school(client: &ApiClient, command: SchoolCommands) -> anyhow::Result<()> {
    match command {
        SchoolCommands::List => {
            let schools = client.list_schools().await?;
            if schools.is_empty() {
                println!("No schools found.");
                return Ok(());
            }
            for school in schools {
                println!(
                    "{:>4}  {} [{}]{}",
                    school.id,
                    school.name,
                    school.level,
                    school
                        .address
                        .map(|a| format!(" - {a}"))
                        .unwrap_or_default()
                );
            }
        }
        SchoolCommands::Create {
            name,
            level,
            address,
        } => {
            let school = client
                .create_school(&NewSchool {
                    name,
                    level,
                    address,
                })
                .await?;
            println!("Created school {} (id {})", school.name, school.id);
        }
        SchoolCommands::Update {
            id,
            name,
            level,
            address,
        } => {
            let school = client
                .update_school(
                    id,
                    &NewSchool {
                        name,
                        level,
                        address,
                    },
                )
                .await?;
            println!("Updated school {} (id {})", school.name, school.id);
        }
        SchoolCommands::Delete { id } => {
            let message = client.delete_school(id).await?;
            println!("{message}");
        }
    }
    Ok(())
}

async fn run_class(client: &ApiClient, command: ClassCommands) -> anyhow::Result<()> {
    match command {
        ClassCommands::List => {
            let classes = client.list_classes().await?;
            if classes.is_empty() {
                println!("No classes found.");
                return Ok(());
            }
            for class in classes {
                println!(
                    "{:>4}  Kelas {}  {}  ({})",
                    class.id,
                    class.class_name,
                    class.subject.unwrap_or_else(|| "-".to_string()),
                    class.teacher.unwrap_or_else(|| "-".to_string()),
                );
            }
        }
        ClassCommands::Create {
            subject_id,
            teacher_id,
            grade_level,
            parallel,
            school_id,
        } => {
            let class = client
                .create_class(&NewClass {
                    subject_id,
                    teacher_id,
                    grade_level,
                    parallel_class: parallel,
                    school_id,
                })
                .await?;
            println!("Created class {} (id {})", class.class_name, class.id);
        }
        ClassCommands::Delete { id } => {
            let message = client.delete_class(id).await?;
            println!("{message}");
        }
    }
    Ok(())
}

async fn run_user(client: &ApiClient, command: UserCommands) -> anyhow::Result<()> {
    match command {
        UserCommands::List => {
            let users = client.list_users().await?;
            for user in users {
                let schools = if user.school_names.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", user.school_names.join(", "))
                };
                println!(
                    "{:>4}  {} <{}>  {}{}",
                    user.id, user.username, user.email, user.role, schools
                );
            }
        }
        UserCommands::Create {
            username,
            email,
            password,
            role,
            school_id,
        } => {
            let message = client
                .create_user(&NewUser {
                    username,
                    email,
                    password,
                    role,
                    school_id,
                })
                .await?;
            println!("{message}");
        }
        UserCommands::Update {
            id,
            username,
            email,
            password,
            role,
        } => {
            let mut fields = serde_json::Map::new();
            if let Some(username) = username {
                fields.insert("username".to_string(), username.into());
            }
            if let Some(email) = email {
                fields.insert("email".to_string(), email.into());
            }
            if let Some(password) = password {
                fields.insert("password".to_string(), password.into());
            }
            if let Some(role) = role {
                fields.insert("role".to_string(), role.into());
            }
            if fields.is_empty() {
                bail!("Nothing to update");
            }
            let message = client.update_user(id, &fields.into()).await?;
            println!("{message}");
        }
        UserCommands::Delete { id } => {
            let message = client.delete_user(id).await?;
            println!("{message}");
        }
        UserCommands::AssignSchools { id, schools } => {
            let message = client.assign_schools(id, &schools).await?;
            println!("{message}");
        }
    }
    Ok(())
}

async fn run_subject(client: &ApiClient, command: SubjectCommands) -> anyhow::Result<()> {
    match command {
        SubjectCommands::List => {
            for subject in client.list_subjects().await? {
                println!("{:>4}  {}", subject.id, subject.name);
            }
        }
        SubjectCommands::Create { name } => {
            let subject = client.create_subject(&name).await?;
            println!("Created subject {} (id {})", subject.name, subject.id);
        }
    }
    Ok(())
}

async fn run_docs(client: &ApiClient, command: DocsCommands) -> anyhow::Result<()> {
    match command {
        DocsCommands::List => {
            let docs = client.list_docs().await?;
            if docs.is_empty() {
                println!("No saved documents.");
                return Ok(());
            }
            for doc in docs {
                println!(
                    "{:>4}  {}  {}  ({})",
                    doc.id,
                    doc.created_at.format("%Y-%m-%d"),
                    doc.title,
                    doc.document_type
                );
            }
        }
        DocsCommands::Show { id } => {
            let data = client.fetch_prota(id).await?;
            print_document(&GeneratedDocument::from_data(data));
        }
        DocsCommands::Update { id, input } => {
            let document = load_result_file(&input)?;
            let message = client.update_prota(id, &document.data).await?;
            println!("{message}");
        }
        DocsCommands::Delete { id } => {
            let message = client.delete_prota(id).await?;
            println!("{message}");
        }
    }
    Ok(())
}

async fn run_upload(client: &ApiClient, command: UploadCommands) -> anyhow::Result<()> {
    match command {
        UploadCommands::Pdf { files } => {
            let queued = client.upload_pdfs(&files).await?;
            println!("{}", queued.message);
            for file in &queued.queued_files {
                println!("  queued: {file}");
            }
            for (file, reason) in &queued.errors {
                println!("  rejected: {file} ({reason})");
            }
        }
        UploadCommands::Layout {
            file,
            jenjang,
            mapel,
            tipe_dokumen,
        } => {
            let message = client
                .upload_layout(&file, &jenjang, &mapel, &tipe_dokumen)
                .await?;
            println!("{message}");
        }
        UploadCommands::Book {
            file,
            jenjang,
            mapel_id,
            kelas,
        } => {
            let message = client.upload_book(&file, &jenjang, mapel_id, &kelas).await?;
            println!("{message}");
        }
        UploadCommands::Cp {
            file,
            jenjang,
            mapel,
        } => {
            let message = client.upload_cp(&file, &jenjang, &mapel).await?;
            println!("{message}");
        }
        UploadCommands::Status => {
            let statuses = client.upload_statuses().await?;
            if statuses.is_empty() {
                println!("No uploads yet.");
                return Ok(());
            }
            for status in statuses {
                let progress = status
                    .progress
                    .map(|p| format!(" {p}%"))
                    .unwrap_or_default();
                println!(
                    "{:>4}  {}  {}{}",
                    status.id, status.filename, status.status, progress
                );
            }
        }
    }
    Ok(())
}

async fn run_generate(client: &ApiClient, command: GenerateCommands) -> anyhow::Result<()> {
    match command {
        GenerateCommands::Classes => {
            let classes = fetch_classes(client).await?;
            if classes.is_empty() {
                println!("No classes available for generation.");
                return Ok(());
            }
            for class in classes {
                println!("{:>4}  {}", class.id, class.label());
            }
        }
        GenerateCommands::Prota {
            class,
            exports,
            out,
            save,
        } => {
            let classes = fetch_classes(client).await?;
            let selected = classes
                .iter()
                .find(|c| c.id == class)
                .with_context(|| format!("Class {class} is not in your class list"))?;
            println!("Generating Prota for {}", selected.label());

            let mut controller = WizardController::new();
            controller.select_class(class)?;

            let cancel = CancellationToken::new();
            let cancel_on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel_on_signal.cancel();
                }
            });

            let bar = ProgressBar::new(100);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% | {msg}")
                    .expect("valid progress template")
                    .progress_chars("#>-"),
            );

            let result = run_generation(client, &mut controller, &cancel, |percent, status| {
                bar.set_position(u64::from(percent));
                bar.set_message(status.to_string());
            })
            .await;

            let document = match result {
                Ok(document) => {
                    bar.finish_with_message("selesai");
                    document
                }
                Err(e) => {
                    bar.abandon();
                    return Err(e.into());
                }
            };

            if !document.msg.is_empty() {
                println!("{}", document.msg);
            }
            print_document(&document);

            if let Some(path) = save {
                let json = serde_json::to_string_pretty(&document)?;
                std::fs::write(&path, json)?;
                println!("Saved result to {}", path.display());
            }
            for format in exports {
                let path = export_document(&document, format.0, &out)?;
                println!("Exported {}", path.display());
            }
        }
    }
    Ok(())
}

/// Accept either the stream envelope `{data, msg}` or bare document content
/// as written by `docs show`-era tooling.
fn load_result_file(path: &PathBuf) -> anyhow::Result<GeneratedDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    if let Ok(document) = serde_json::from_str::<GeneratedDocument>(&content) {
        return Ok(document);
    }
    let data: DocumentData = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a generation result", path.display()))?;
    Ok(GeneratedDocument::from_data(data))
}

/// Print the preamble and the fixed-column table to the terminal.
fn print_document(document: &GeneratedDocument) {
    println!();
    println!("{}", document.title());

    if let Some(structure) = &document.data.document_structure {
        if !structure.identity.is_empty() {
            println!();
            println!("Identitas Dokumen");
            for (key, value) in &structure.identity {
                let value = gurudesk::document::table::cell_text(Some(value));
                println!("  {key:<20} : {value}");
            }
        }
        if let Some(competency) = &structure.general_competency {
            println!();
            println!("Capaian Pembelajaran Umum");
            for line in wrap_text(competency, 76) {
                println!("  {line}");
            }
        }
        if !structure.competency_elements.is_empty() {
            println!();
            println!("Elemen Capaian Pembelajaran");
            for element in &structure.competency_elements {
                println!("  - {}", element.element);
                for line in wrap_text(&element.description, 72) {
                    println!("    {line}");
                }
            }
        }
    }

    let table = build_table(document);
    if table.is_empty() {
        return;
    }

    // cap the free-text column so rows stay within a terminal width
    let caps = [8usize, 48, 16, 8];
    let widths: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            table
                .rows
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .min(caps[i])
        })
        .collect();

    println!();
    print_row(&table.headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    print_row(&rule, &widths);
    for row in &table.rows {
        print_row(row, &widths);
    }
}

fn print_row(cells: &[String], widths: &[usize]) {
    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| wrap_text(cell, *width))
        .collect();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
    for i in 0..height {
        let mut line = String::new();
        for (cell_lines, &width) in wrapped.iter().zip(widths.iter()) {
            let text = cell_lines.get(i).map(String::as_str).unwrap_or("");
            line.push_str(&format!("{text:<width$}  "));
        }
        println!("{}", line.trim_end());
    }
}
