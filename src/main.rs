use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cardforge::{compose_card, derive_share_link, CardConfig, Exporter, GreetingRecord};

#[derive(Parser)]
#[command(name = "cardforge")]
#[command(about = "Headless greeting-card rendering and export")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a greeting card and export it as a PNG
    Render {
        #[arg(long)]
        name: String,
        #[arg(long)]
        branch: String,
        #[arg(long)]
        year: String,
        #[arg(long)]
        title: String,
        /// Body text; literal "\n" sequences become paragraph breaks
        #[arg(long)]
        body: String,
        #[arg(long)]
        quote: String,
        /// Directory the PNG is written into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Derive the share link (and optionally a QR PNG) for an identity
    Share {
        identity: String,
        /// Embed a center mark in the QR code
        #[arg(long)]
        mark: bool,
        /// Write the QR code PNG to this path
        #[arg(long)]
        qr_out: Option<PathBuf>,
    },
    /// Page through a remote gallery and list its records
    #[cfg(feature = "http-store")]
    Gallery {
        endpoint: String,
        /// How many pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Dump the fetched records as JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CardConfig::default();

    match cli.command {
        Command::Render { name, branch, year, title, body, quote, out } => {
            let body = body.replace("\\n", "\n");
            let record = GreetingRecord::new(&name, &branch, &year, &title, &body, &quote);
            let scene = compose_card(&record, &config, 1.0)?;
            let exporter = Exporter::new(config);
            match exporter.export(&scene).await? {
                Some(output) => {
                    let path = output.save_to(&out)?;
                    println!("{}", path.display());
                }
                None => anyhow::bail!("an export is already in flight"),
            }
        }
        Command::Share { identity, mark, qr_out } => {
            let link = derive_share_link(&config, &identity, mark)?;
            println!("{}", link.url);
            if let Some(path) = qr_out {
                std::fs::write(&path, link.qr.to_png(8)?)?;
                eprintln!("QR written to {}", path.display());
            }
        }
        #[cfg(feature = "http-store")]
        Command::Gallery { endpoint, pages, json } => {
            use cardforge::{gallery, GalleryPaginator};

            let store = cardforge::HttpGreetingStore::new(&endpoint)?;
            let paginator = GalleryPaginator::new(std::sync::Arc::new(store), config.page_size);
            paginator.on_notify(|n| eprintln!("[{:?}] {}: {}", n.severity, n.title, n.description));

            paginator.load_initial().await?;
            for _ in 1..pages {
                if !paginator.has_more() {
                    break;
                }
                paginator.load_more().await?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&paginator.items())?);
            } else {
                for record in paginator.items() {
                    println!(
                        "{} ({} \u{2013} {}): {}",
                        gallery::display_first_name(&record),
                        record.branch,
                        record.year,
                        gallery::truncate_preview(&record.body, config.preview_budget),
                    );
                }
            }
            if paginator.has_more() {
                eprintln!("more records remain");
            }
        }
    }

    Ok(())
}
