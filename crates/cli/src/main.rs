use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thumbsmith_core::{
    GateOutcome, GenerationConfig, Orientation, Slot, Style, ThumbSmith, image_processing, init,
    store::Page,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate all four cover variants for a video
    Generate {
        /// Video URL to analyze
        #[arg(long)]
        url: String,

        /// Extra notes describing the video
        #[arg(long, default_value = "")]
        context: String,

        /// Subject reference image, repeatable
        #[arg(long = "reference")]
        references: Vec<PathBuf>,

        /// Directory the finished images are written to
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Enter the interactive editor after generation
        #[arg(long)]
        edit: bool,
    },
    /// List past generations
    History,
    /// Remove one past generation by id
    Forget { id: String },
}

/// Checkout collaborator for the terminal: asks for confirmation and treats
/// a declined prompt as a payment failure.
struct TerminalCheckout;

impl thumbsmith_core::PaymentProvider for TerminalCheckout {
    fn collect(&self) -> thumbsmith_core::Result<()> {
        print!("This generation is paid. Proceed with checkout? [y/N] ");
        let _ = io::stdout().flush();
        let mut input = String::new();
        let _ = io::stdin().read_line(&mut input);
        if input.trim().eq_ignore_ascii_case("y") {
            Ok(())
        } else {
            Err(thumbsmith_core::AppError::Payment("checkout declined".to_string()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    let _ = dotenvy::dotenv();
    init();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let mut app = ThumbSmith::new().context("Failed to load configuration")?;

    match args.command {
        Command::Generate { url, context, references, out, edit } => {
            generate(&mut app, url, context, &references, &out, edit).await
        }
        Command::History => {
            for item in app.store().history() {
                println!("{}  {}  {}", item.id, item.date, item.title);
            }
            Ok(())
        }
        Command::Forget { id } => {
            if app.store_mut().remove_history(&id) {
                println!("Removed {id}");
            } else {
                println!("No history entry with id {id}");
            }
            Ok(())
        }
    }
}

async fn generate(
    app: &mut ThumbSmith,
    url: String,
    context: String,
    references: &[PathBuf],
    out: &Path,
    edit: bool,
) -> Result<()> {
    let reference_images = load_references(references)?;
    if reference_images.is_empty() {
        eprintln!("Warning: no reference images supplied; the model may invent a person.");
    }

    let config = GenerationConfig {
        video_url: url,
        additional_context: context,
        reference_images,
    };

    // Gate the request before any orchestration starts.
    let mut gate = app.gate();
    gate.request(config);
    let admitted = match gate
        .confirm(&TerminalCheckout, app.store().trial_used())
        .context("Payment was not completed")?
    {
        GateOutcome::Admitted { config, used_free_trial } => {
            if used_free_trial {
                app.store_mut().mark_trial_used();
            }
            config
        }
        GateOutcome::NothingPending => bail!("Nothing to generate"),
    };

    app.store_mut().set_current_page(Page::Studio);
    println!("Analyzing video and designing both variants...");

    let outcome = app.generate(admitted).await?;

    println!("\nVideo insight:\n{}\n", outcome.summary);
    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;
    write_images(&outcome.images, out)?;

    if edit {
        edit_loop(app, &outcome.images, out).await?;
    }
    Ok(())
}

fn write_images(images: &thumbsmith_core::ThumbnailSet, out: &Path) -> Result<()> {
    let timestamp = image_processing::timestamp_millis();
    for (slot, payload) in images.iter() {
        let filename = image_processing::download_filename(slot.style, slot.orientation, timestamp);
        let path = out.join(&filename);
        let bytes = image_processing::decode_payload(payload)
            .with_context(|| format!("Invalid image payload for {slot}"))?;
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

async fn edit_loop(
    app: &mut ThumbSmith,
    images: &thumbsmith_core::ThumbnailSet,
    out: &Path,
) -> Result<()> {
    let mut session = app.open_session(images);
    session.set_active_slot(app.store().active_tab());

    println!("\nMagic editor. Type an instruction to edit the active variant,");
    println!("or /slot <normal|clickbait|normal-vertical|clickbait-vertical>, /undo, /save, /done");

    loop {
        print!("[{}]> ", session.active_slot());
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        } else if line == "/done" {
            break;
        } else if line == "/undo" {
            if session.undo(session.active_slot()) {
                println!("Reverted to the previous version.");
            } else {
                println!("Nothing to undo for this variant.");
            }
        } else if line == "/save" {
            write_images(&session.images(), out)?;
        } else if let Some(name) = line.strip_prefix("/slot ") {
            match parse_slot(name) {
                Some(slot) => {
                    session.set_active_slot(slot);
                    app.store_mut().set_active_tab(slot);
                }
                None => println!("Unknown variant: {name}"),
            }
        } else {
            // Edit failures are local: report and keep the session intact.
            let slot = session.active_slot();
            match session.apply_edit(app.client(), slot, line).await {
                Ok(_) => println!("Applied edit to the {slot} variant."),
                Err(err) => println!("Edit failed: {err}"),
            }
        }
    }

    write_images(&session.images(), out)?;
    Ok(())
}

fn parse_slot(name: &str) -> Option<Slot> {
    match name.trim() {
        "normal" => Some(Slot::new(Style::Normal, Orientation::Horizontal)),
        "clickbait" => Some(Slot::new(Style::Clickbait, Orientation::Horizontal)),
        "normal-vertical" => Some(Slot::new(Style::Normal, Orientation::Vertical)),
        "clickbait-vertical" => Some(Slot::new(Style::Clickbait, Orientation::Vertical)),
        _ => None,
    }
}

/// Reads and normalizes reference images: explicit paths first, otherwise
/// any preset defaults in `THUMBSMITH_REFS_DIR`. Both go through the same
/// resize/recompress path.
fn load_references(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut resolved: Vec<PathBuf> = paths.to_vec();
    if resolved.is_empty() {
        if let Ok(dir) = std::env::var("THUMBSMITH_REFS_DIR") {
            let mut entries: Vec<PathBuf> = fs::read_dir(&dir)
                .with_context(|| format!("Failed to read THUMBSMITH_REFS_DIR {dir}"))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    matches!(
                        path.extension().and_then(|e| e.to_str()),
                        Some("jpg" | "jpeg" | "png")
                    )
                })
                .collect();
            entries.sort();
            resolved = entries;
        }
    }

    resolved
        .iter()
        .map(|path| {
            let bytes =
                fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            image_processing::normalize_reference(&bytes)
                .with_context(|| format!("Failed to process {}", path.display()))
        })
        .collect()
}
