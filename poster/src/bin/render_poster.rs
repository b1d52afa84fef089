use std::path::PathBuf;

use clap::Parser;
use poster::{
    config::ServiceConfig,
    service::{PosterOptions, PosterService, RenderTarget},
    theme::THEMES,
};
use shared::{CustomText, GeoPoint};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Render a city map poster to a PNG file")]
struct Args {
    /// Place to search for, e.g. "Lisbon, Portugal"
    #[arg(long, required_unless_present_any = ["lat", "list_themes"])]
    city: Option<String>,

    /// Center latitude, used when no --city is given
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Radius around the center, in meters
    #[arg(long, default_value_t = 10_000.0)]
    radius: f64,

    #[arg(long, default_value = "noir")]
    theme: String,

    /// portrait, square or landscape
    #[arg(long, default_value = "portrait")]
    size: String,

    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    subtitle: String,
    #[arg(long, default_value = "")]
    name: String,

    /// Directory the PNG files are written to
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Also write a preview scaled to this width
    #[arg(long)]
    preview_width: Option<u32>,

    /// Read map features from this OSM extract instead of Overpass
    #[arg(long)]
    pbf: Option<PathBuf>,

    #[arg(long)]
    list_themes: bool,
}

impl Args {
    fn center(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }

    fn custom_text(&self) -> CustomText {
        CustomText {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            name: self.name.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.list_themes {
        for theme in THEMES.iter() {
            println!("{:<16} {:<16} {}", theme.key, theme.name, theme.description);
        }
        return Ok(());
    }

    let mut config = ServiceConfig::from_env();
    if let Some(pbf) = &args.pbf {
        config.pbf_path = Some(pbf.clone());
    }
    let service = PosterService::from_config(&config)?;

    let location = service
        .resolve_location(args.city.as_deref(), args.center())
        .await?;
    tracing::info!(
        "{}, {} at {:.4},{:.4}",
        location.city,
        location.country,
        location.lat,
        location.lon
    );
    let snapshot = service.load_snapshot(location.center(), args.radius).await?;
    let options = PosterOptions::resolve(&args.theme, &args.size, args.custom_text());

    std::fs::create_dir_all(&args.output)?;

    let export = service
        .render_with(
            snapshot.clone(),
            location.clone(),
            options.clone(),
            RenderTarget::Export,
        )
        .await?;
    let export_path = args.output.join(&export.filename);
    std::fs::write(&export_path, &export.png)?;
    tracing::info!(
        "wrote {} ({}x{}): {} features drawn, {} skipped",
        export_path.display(),
        export.width,
        export.height,
        export.stats.drawn(),
        export.stats.skipped()
    );

    if let Some(display_width) = args.preview_width {
        let preview = service
            .render_with(
                snapshot,
                location,
                options,
                RenderTarget::Preview { display_width },
            )
            .await?;
        let stem = export.filename.trim_end_matches(".png");
        let preview_path = args.output.join(format!("{stem}_preview.png"));
        std::fs::write(&preview_path, &preview.png)?;
        tracing::info!(
            "wrote {} ({}x{})",
            preview_path.display(),
            preview.width,
            preview.height
        );
    }

    Ok(())
}
