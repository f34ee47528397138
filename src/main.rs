use clap::{Parser, Subcommand};
use clearing_pdf::{
    config::{ExportConfig, Submission},
    overlay::FileTemplate,
    render::ChromeRenderer,
    ClearingForm, Error, ExportArtifact, Field,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fills in an import clearing instruction and exports it as PDF.")]
struct Args {
    #[arg(short, long, default_value = "clearing-pdf.toml", help = "Configuration file.")]
    config: PathBuf,
    #[arg(short, long, help = "Directory the PDF is written to (overrides the config).")]
    output_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the form in a headless browser and paginate the screenshot onto A4 pages.
    Rasterize {
        #[arg(help = "TOML file with the form values and signature strokes.")]
        submission: PathBuf,
        #[arg(long, help = "Show the browser window while rendering.")]
        headful: bool,
    },
    /// Draw the form values and signature onto the PDF template.
    Overlay {
        #[arg(help = "TOML file with the form values and signature strokes.")]
        submission: PathBuf,
        #[arg(short, long, help = "Template PDF (overrides the config).")]
        template: Option<PathBuf>,
    },
}

fn load_form(config: &ExportConfig, submission: &Path) -> Result<ClearingForm, Error> {
    let submission = Submission::load(submission)?;
    let mut form = ClearingForm::new(config.clone());
    for field in Field::ALL.iter() {
        form.handle_change(field.name(), submission.form.get(*field))?;
    }
    *form.signature_mut() = submission.signature.to_pad();
    Ok(form)
}

fn report(form: &ClearingForm, artifact: Option<ExportArtifact>, dir: PathBuf) -> Result<(), Error> {
    if let Some(message) = form.form_error() {
        log::warn!("{}", message);
    }
    if let Some(message) = form.signature_error() {
        log::warn!("{}", message);
    }
    match artifact {
        Some(artifact) => {
            let path = artifact.save_in(dir)?;
            println!("{}", path.display());
            Ok(())
        }
        None => Err(Error::Other("No PDF was generated.".to_owned())),
    }
}

fn run(args: Args) -> Result<(), Error> {
    let mut config = ExportConfig::load_or_default(&args.config)?;
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }

    match args.command {
        Command::Rasterize {
            submission,
            headful,
        } => {
            let mut form = load_form(&config, &submission)?;
            let artifact = form.submit_rasterized(&ChromeRenderer::new(!headful));
            report(&form, artifact, config.output_dir.clone())
        }
        Command::Overlay {
            submission,
            template,
        } => {
            if let Some(template) = template {
                config.template_path = template;
            }
            let mut form = load_form(&config, &submission)?;
            let artifact = form.submit_template(&FileTemplate::new(config.template_path.clone()));
            report(&form, artifact, config.output_dir.clone())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Args::parse()) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
