mod app;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use std::path::PathBuf;

use spot_painter::{PaletteScheme, Session, ViewSettings};

#[derive(Parser, Debug)]
#[command(author, version, about = "Paint spatial spots into colored groups", long_about = None)]
struct Cli {
    /// Spots CSV with Cell_ID, X, Y columns
    #[arg(long)]
    points: Option<PathBuf>,

    /// The CSV has no header row; columns are Cell_ID, X, Y in that order
    #[arg(long)]
    no_header: bool,

    /// Background image drawn beneath the spots
    #[arg(long)]
    image: Option<PathBuf>,

    /// JSON view settings (palette, point size, image placement)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Palette scheme: Set3, Paired or Tableau10
    #[arg(long)]
    palette: Option<PaletteScheme>,

    /// Print the assembled scene as JSON and exit instead of opening a window
    #[arg(long)]
    dump_scene: bool,
}

/// Build the session from the command line. Returns the overlay bytes too so
/// the window can show the pixels without reading the file twice.
fn load_session(cli: &Cli) -> Result<(Session, Option<Vec<u8>>)> {
    let mut settings = match &cli.settings {
        Some(path) => ViewSettings::load(path)
            .with_context(|| format!("failed to load settings {}", path.display()))?,
        None => ViewSettings::default(),
    };
    if let Some(scheme) = cli.palette {
        settings.palette_scheme = scheme;
    }
    let mut session = Session::new(settings);

    if let Some(path) = &cli.points {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        session
            .on_csv_loaded(&text, !cli.no_header)
            .with_context(|| format!("failed to load spots from {}", path.display()))?;
    }
    let mut overlay = None;
    if let Some(path) = &cli.image {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        session
            .on_image_loaded(&path.display().to_string(), &bytes)
            .with_context(|| format!("failed to load image {}", path.display()))?;
        overlay = Some(bytes);
    }
    Ok((session, overlay))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let (session, overlay) = load_session(&cli)?;

    if cli.dump_scene {
        println!("{}", serde_json::to_string_pretty(&session.scene())?);
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Spatial Spots Painter"),
        ..Default::default()
    };

    let has_header = !cli.no_header;
    eframe::run_native(
        "Spatial Spots Painter",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(app::PainterApp::new(session, has_header, overlay.as_deref())))
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to run eframe: {e}"))
}
