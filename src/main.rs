use anyhow::Context as _;
use clap::Parser;
use orbit::config;
use orbit::gui::app::{AppInit, AppModel};
use orbit::scene::Scene;
use orbit::sys::runtime;
use relm4::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(version, about = "Pages of polar sector layouts")]
struct Cli {
    /// Config file to load and watch instead of the user config
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Page to show first, counting from 1
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// Write the default config if none exists and print its path
    #[arg(long)]
    init: bool,

    /// Render the first page to a PNG instead of opening a window
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Edge length of the snapshot in pixels
    #[arg(long, default_value_t = 480, requires = "snapshot")]
    size: u32,
}

fn snapshot(config: &config::Config, page: usize, size: u32, path: &Path) -> anyhow::Result<()> {
    let dimension = i32::try_from(size).context("snapshot size too large")?;
    let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, dimension, dimension)?;
    let mut scene = Scene::new(config, page, |_| {});
    scene.resize(size as f64, size as f64);
    {
        let cr = cairo::Context::new(&surface)?;
        scene.draw(&cr)?;
    }

    let mut file = fs_err::File::create(path)?;
    surface
        .write_to_png(&mut file)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("Wrote page {} to {}", page + 1, path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => config::resolve_config_path(&path)
            .with_context(|| format!("cannot resolve {}", path.display()))?,
        None => config::get_config_path()?,
    };

    if cli.init {
        let path = config::write_default_config(&config_path)?;
        println!("{}", path.display());
        return Ok(());
    }

    let config = config::load_or_setup(&config_path);
    let initial_page = cli.page as usize - 1;

    if let Some(path) = &cli.snapshot {
        return snapshot(&config, initial_page, cli.size, path);
    }

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx, config_path.clone());

    let app = RelmApp::new("dev.orbit.viewer");

    app.with_args(Vec::new()).run::<AppModel>(AppInit {
        config,
        config_path,
        initial_page,
        events: rx,
    });
    Ok(())
}
