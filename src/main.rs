use clap::{Parser, Subcommand};
use postpic::blob::DirBlobStore;
use postpic::config::{self, PicConfig};
use postpic::host::{self, Host};
use postpic::imaging::{CropRect, DrawTextOptions, Rect};
use postpic::output;
use postpic::value::{self, PictureValue};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn version_string() -> &'static str {
    let hash = env!("POSTPIC_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} ({hash})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "postpic")]
#[command(about = "Picture values: images with queryable metadata")]
#[command(long_about = "\
Picture values: images with queryable metadata

A picture value is a JPEG payload with a fixed header carrying the capture
date, width, height, colorspace, ISO speed, f-number, exposure time and
focal length. Values are stored on disk in their binary form (.pic).

  postpic import photo.jpg photo.pic
  postpic info photo.pic
  postpic thumbnail photo.pic thumb.pic --size 400
  postpic montage sheet.pic a.pic b.pic c.pic --title Holiday --columns 3
  postpic export sheet.pic sheet.jpg

Color literals are written name#hex, e.g. RGB#ff8000 or RGBA#ff800080.

Run 'postpic gen-config' to generate a documented postpic.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Input and output value files of a single-image transform.
#[derive(clap::Args)]
struct InOut {
    /// Source picture value
    input: PathBuf,
    /// Destination picture value
    output: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Import an image file as a picture value
    Import { image: PathBuf, output: PathBuf },
    /// Import blob ID from a blob directory
    Load {
        /// Directory holding one file per blob
        #[arg(long)]
        store: PathBuf,
        id: String,
        output: PathBuf,
    },
    /// Write the JPEG payload of a value to a file
    Export { input: PathBuf, image: PathBuf },
    /// Show the metadata of a value
    Info {
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Print the one-line text form
        #[arg(long, conflicts_with = "json")]
        summary: bool,
    },
    /// Scale so the longer side is SIZE, keeping aspect ratio
    Thumbnail {
        #[command(flatten)]
        files: InOut,
        #[arg(long)]
        size: u32,
    },
    /// Scale and center-crop to SIZE x SIZE
    Square {
        #[command(flatten)]
        files: InOut,
        #[arg(long)]
        size: u32,
    },
    /// Scale to exactly WIDTH x HEIGHT
    Resize {
        #[command(flatten)]
        files: InOut,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Cut out a rectangle
    Crop {
        #[command(flatten)]
        files: InOut,
        #[arg(long)]
        x: u32,
        #[arg(long)]
        y: u32,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Rotate clockwise by DEGREES
    Rotate {
        #[command(flatten)]
        files: InOut,
        #[arg(long, allow_hyphen_values = true)]
        degrees: f64,
    },
    /// Draw a line of text
    DrawText {
        #[command(flatten)]
        files: InOut,
        text: String,
        #[arg(long, allow_hyphen_values = true)]
        x: Option<i32>,
        #[arg(long, allow_hyphen_values = true)]
        y: Option<i32>,
        #[arg(long)]
        font: Option<String>,
        #[arg(long)]
        size: Option<f32>,
        /// Color literal, e.g. RGB#ff0000
        #[arg(long)]
        color: Option<String>,
    },
    /// Fill the rectangle between two corners (inclusive)
    DrawRect {
        #[command(flatten)]
        files: InOut,
        #[arg(long, allow_hyphen_values = true)]
        x0: i32,
        #[arg(long, allow_hyphen_values = true)]
        y0: i32,
        #[arg(long, allow_hyphen_values = true)]
        x1: i32,
        #[arg(long, allow_hyphen_values = true)]
        y1: i32,
        #[arg(long)]
        color: String,
    },
    /// Lay out several values on one titled sheet
    Montage {
        output: PathBuf,
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value_t = 4)]
        columns: u32,
    },
    /// Create a solid-color value
    Canvas {
        output: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long, default_value = "RGB#ffffff")]
        color: String,
    },
    /// Parse a color literal and show its channels
    Color { literal: String },
    /// Print the library version string
    Version,
    /// Print a stock postpic.toml with all options documented
    GenConfig,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();
}

fn read_value(path: &Path) -> Result<PictureValue, Box<dyn std::error::Error>> {
    let buffer = fs::read(path)?;
    Ok(PictureValue::from_bytes(&buffer)?)
}

fn write_value(path: &Path, value: &PictureValue) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, value.to_bytes()?)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Version => {
            println!("{}", host::postpic_version());
            return Ok(());
        }
        _ => {}
    }

    let config = config::load_config(&cli.config)?;
    run(cli.command, config)
}

fn run(command: Command, config: PicConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = match &command {
        Command::Load { store, .. } => store.clone(),
        _ => PathBuf::from("."),
    };
    let host = Host::from_config(config, Box::new(DirBlobStore::new(store)))?;
    let pipeline = host.pipeline();

    // Single-image transforms share read → apply → write → report.
    let transform = |name: &str,
                     files: &InOut,
                     apply: &dyn Fn(&PictureValue) -> postpic::error::Result<PictureValue>|
     -> Result<(), Box<dyn std::error::Error>> {
        let before = read_value(&files.input)?;
        let after = apply(&before)?;
        write_value(&files.output, &after)?;
        println!(
            "{}",
            output::format_transform(name, &before.metadata, &after.metadata, &files.output)
        );
        Ok(())
    };

    match command {
        Command::Import { image, output: dest } => {
            let bytes = fs::read(&image)?;
            let value = pipeline.import(&bytes)?;
            write_value(&dest, &value)?;
            output::print_info(&value, &dest);
        }
        Command::Load { id, output: dest, .. } => {
            let value = host.image_in(&id)?;
            write_value(&dest, &value)?;
            output::print_info(&value, &dest);
        }
        Command::Export { input, image } => {
            let buffer = fs::read(&input)?;
            fs::write(&image, value::payload_of(&buffer)?)?;
        }
        Command::Info {
            input,
            json,
            summary,
        } => {
            let value = read_value(&input)?;
            if json {
                println!("{}", output::format_info_json(&value)?);
            } else if summary {
                println!("{}", host.image_out(&value));
            } else {
                output::print_info(&value, &input);
            }
        }
        Command::Thumbnail { files, size } => {
            transform("thumbnail", &files, &|v| pipeline.thumbnail(v, size))?;
        }
        Command::Square { files, size } => {
            transform("square", &files, &|v| pipeline.square(v, size))?;
        }
        Command::Resize {
            files,
            width,
            height,
        } => {
            transform("resize", &files, &|v| pipeline.resize(v, width, height))?;
        }
        Command::Crop {
            files,
            x,
            y,
            width,
            height,
        } => {
            let rect = CropRect {
                x,
                y,
                width,
                height,
            };
            transform("crop", &files, &|v| pipeline.crop(v, rect))?;
        }
        Command::Rotate { files, degrees } => {
            transform("rotate", &files, &|v| pipeline.rotate(v, degrees))?;
        }
        Command::DrawText {
            files,
            text,
            x,
            y,
            font,
            size,
            color,
        } => {
            let color = color.as_deref().map(|c| host.color_in(c)).transpose()?;
            let options = DrawTextOptions {
                x,
                y,
                font_family: font,
                font_size: size,
                color,
            };
            transform("draw-text", &files, &|v| {
                pipeline.draw_text(v, &text, options.clone())
            })?;
        }
        Command::DrawRect {
            files,
            x0,
            y0,
            x1,
            y1,
            color,
        } => {
            let color = host.color_in(&color)?;
            let rect = Rect::new(x0, y0, x1, y1);
            transform("draw-rect", &files, &|v| pipeline.draw_rect(v, rect, color))?;
        }
        Command::Montage {
            output: dest,
            inputs,
            title,
            columns,
        } => {
            let values = inputs
                .iter()
                .map(|p| read_value(p))
                .collect::<Result<Vec<_>, _>>()?;
            let sheet = pipeline.montage(&values, &title, columns)?;
            write_value(&dest, &sheet)?;
            println!(
                "{}",
                output::format_created("montage", values.len(), &sheet.metadata, &dest)
            );
        }
        Command::Canvas {
            output: dest,
            width,
            height,
            color,
        } => {
            let color = host.color_in(&color)?;
            let value = host.image_new(width, height, color)?;
            write_value(&dest, &value)?;
            println!(
                "{}",
                output::format_created("canvas", 0, &value.metadata, &dest)
            );
        }
        Command::Color { literal } => {
            output::print_color(host.color_in(&literal)?);
        }
        Command::Version | Command::GenConfig => {}
    }

    Ok(())
}
