//! press – command-line recipe → PDF exporter.
//!
//! Usage:
//!   press [--config FILE] [--font FILE] [--bold-font FILE] recipe <file.md> [-o OUT]
//!   press [...] book <dir> [-o OUT]
//!   press categories <dir>
//!   press slug <title>
//!
//! Without `-o` the PDF is written to the current directory under its
//! configured file name.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use recipe_press::category::catalog_from_recipes;
use recipe_press::config::ExportConfig;
use recipe_press::error::Result;
use recipe_press::images::FileImageLoader;
use recipe_press::pipeline::{ExportedPdf, Exporter};
use recipe_press::recipe::{load_recipe_file, load_recipes, slugify};

#[derive(Debug, Parser)]
#[command(name = "press")]
#[command(about = "Print-ready PDF export for recipes and recipe books")]
struct Cli {
    #[arg(long, global = true, help = "JSON export configuration.")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Regular TTF/OTF font to embed.")]
    font: Option<PathBuf>,

    #[arg(long = "bold-font", global = true, help = "Bold TTF/OTF font to embed.")]
    bold_font: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Export a single recipe file.
    Recipe {
        file: PathBuf,
        #[arg(short, long, help = "Output path.")]
        output: Option<PathBuf>,
    },
    /// Export every recipe in a directory as a book.
    Book {
        dir: PathBuf,
        #[arg(short, long, help = "Output path.")]
        output: Option<PathBuf>,
    },
    /// List the meal types used by the recipes in a directory.
    Categories { dir: PathBuf },
    /// Print the file-name slug of a title.
    Slug { title: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::Slug { title } = &cli.command {
        println!("{}", slugify(title));
        return;
    }

    if let Err(e) = run(cli).await {
        eprintln!("{}", e.user_message());
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ExportConfig::load(path).await?,
        None => ExportConfig::default(),
    };
    if cli.font.is_some() {
        config.fonts.regular = cli.font;
    }
    if cli.bold_font.is_some() {
        config.fonts.bold = cli.bold_font;
    }

    match cli.command {
        Command::Recipe { file, output } => {
            let recipe = load_recipe_file(&file).await?;
            let exporter = Exporter::new(config, FileImageLoader::new(parent_dir(&file))).await?;
            let pdf = exporter.export_recipe(&recipe).await?;
            write_pdf(&pdf, output).await
        }
        Command::Book { dir, output } => {
            let recipes = load_recipes(&dir).await?;
            let exporter = Exporter::new(config, FileImageLoader::new(&dir)).await?;
            let pdf = exporter.export_book(&recipes).await?;
            write_pdf(&pdf, output).await
        }
        Command::Categories { dir } => {
            let recipes = load_recipes(&dir).await?;
            for entry in catalog_from_recipes(&recipes, &config.categories).entries() {
                println!("{}\t{}", entry.key, entry.label);
            }
            Ok(())
        }
        Command::Slug { .. } => Ok(()),
    }
}

fn parent_dir(file: &Path) -> PathBuf {
    file.parent().map(Path::to_path_buf).unwrap_or_default()
}

async fn write_pdf(pdf: &ExportedPdf, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(&pdf.file_name));
    // Create output directory if necessary.
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&output, &pdf.bytes).await?;
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        pdf.bytes.len(),
        pdf.page_count,
        if pdf.page_count == 1 { "" } else { "s" }
    );
    Ok(())
}
