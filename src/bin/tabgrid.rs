use std::path::PathBuf;
use std::process;

use clap::Parser;
use tabgrid::actor::activation::Activation;
use tabgrid::actor::broadcast::BroadcastReceiver;
use tabgrid::actor::switcher::{Event, SwitcherActor};
use tabgrid::common::config::{Config, config_file};
use tabgrid::common::log;
use tabgrid::sys::scene::{RecordingRenderer, Scene, SceneKeybindings, play_script};
use tokio::join;
use tracing::{info, warn};

#[derive(Parser)]
struct Cli {
    /// Scene to run the switcher against.
    #[arg(required_unless_present = "validate")]
    scene: Option<PathBuf>,

    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Check the configuration (and the scene, if given) and exit.
    #[arg(long)]
    validate: bool,
}

fn main() {
    sigpipe::reset();
    let opt = Cli::parse();
    log::init_logging();

    let config_path = opt.config.clone().unwrap_or_else(config_file);
    let config = match Config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(1);
        }
    };

    if opt.validate {
        let mut issues = config.validate();
        if let Some(path) = &opt.scene {
            if let Err(err) = Scene::load(path) {
                issues.push(format!("{err:#}"));
            }
        }
        if issues.is_empty() {
            println!("Config validation passed");
        } else {
            for issue in issues {
                eprintln!("{}", issue);
            }
            process::exit(1);
        }
        return;
    }

    let Some(scene_path) = opt.scene else {
        eprintln!("no scene given");
        process::exit(2);
    };
    let scene = match Scene::load(&scene_path) {
        Ok(scene) => scene,
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            process::exit(1);
        }
    };
    runtime.block_on(run(config, scene));
}

async fn run(config: Config, scene: Scene) {
    let (host, script) = scene.into_host();
    let modifiers = host.modifier_state();
    let (broadcast_tx, broadcast_rx) = tabgrid::actor::channel();
    let (actor, tx) =
        SwitcherActor::new(config.clone(), host, RecordingRenderer::default(), broadcast_tx);

    let mut keys = SceneKeybindings::default();
    let mut activation = Activation::new(tx.clone(), &config.settings.bindings);
    if config.settings.switcher.enabled {
        activation.enable(&mut keys);
    }

    let feeder = async move {
        play_script(script, &tx, &mut keys, &modifiers).await;
        activation.disable(&mut keys);
        tx.send(Event::Shutdown);
    };
    let ((host, renderer), (), ()) = join!(actor.run(), feeder, print_broadcasts(broadcast_rx));
    info!(
        activated = ?host.activated,
        tiles_created = renderer.created,
        tiles_left = renderer.live_tiles(),
        "scene finished"
    );
}

/// Writes every broadcast as one JSON line on stdout.
async fn print_broadcasts(mut rx: BroadcastReceiver) {
    while let Some((_span, event)) = rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(%err, "could not encode broadcast"),
        }
    }
}
