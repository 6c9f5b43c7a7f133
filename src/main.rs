use clap::Parser;
use config::{Config, Frontend};
use device_connectivity::{
    impl_fake::DeviceConnectivityFake,
    impl_tcp_probe::DeviceConnectivityTcpProbe,
    interface::{DeviceConnectivity, DeviceConnectivityEvent},
};
use device_dialog::{
    impl_console::DeviceDialogConsole, impl_gui::DeviceDialogGui, interface::DeviceDialog,
};
use device_image_source::{
    impl_desktop::DeviceImageSourceDesktop, impl_fake::DeviceImageSourceFake,
    interface::DeviceImageSource,
};
use device_permission::{
    impl_desktop::DevicePermissionDesktop, impl_fake::DevicePermissionFake,
    interface::DevicePermission,
};
use game::core::Event;
use game::main::Game;
use image_classifier::{
    impl_fake::ImageClassifierFake, impl_watson::ImageClassifierWatson,
    interface::ImageClassifier,
};
use library::logger::{impl_console::LoggerConsole, interface::Logger};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod device_connectivity;
mod device_dialog;
mod device_image_source;
mod device_permission;
mod game;
mod image_classifier;
mod library;

const WINDOW_CLOSE_DELAY: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "whatsit", about = "Show me a picture and I'll guess what it is")]
struct Args {
    /// Config file (defaults to ~/.config/whatsit/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Play in the terminal instead of a window
    #[arg(long)]
    console: bool,
    /// Use fake camera, permission, network and classifier
    #[arg(long)]
    fake: bool,
}

struct Devices {
    image_source: Arc<dyn DeviceImageSource + Send + Sync>,
    permission: Arc<dyn DevicePermission + Send + Sync>,
    connectivity: Arc<dyn DeviceConnectivity + Send + Sync>,
    image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
}

impl Devices {
    fn fake(config: &Config, logger: &Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            image_source: Arc::new(DeviceImageSourceFake::new(logger.clone())),
            permission: Arc::new(DevicePermissionFake::new(true, logger.clone())),
            connectivity: Arc::new(DeviceConnectivityFake::new(
                vec![DeviceConnectivityEvent::Connected],
                logger.clone(),
            )),
            image_classifier: Arc::new(ImageClassifierFake::new(
                config.classifier.threshold,
                logger.clone(),
            )),
        }
    }

    fn desktop(
        config: &Config,
        logger: &Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self {
            image_source: Arc::new(DeviceImageSourceDesktop::new(
                config.capture_command.clone(),
                logger.clone(),
            )),
            permission: Arc::new(DevicePermissionDesktop::new(
                &config.capture_command,
                logger.clone(),
            )),
            connectivity: Arc::new(DeviceConnectivityTcpProbe::new(
                config.connectivity_probe_addr.clone(),
                config.connectivity_probe_interval(),
                logger.clone(),
            )),
            image_classifier: Arc::new(ImageClassifierWatson::new(
                config.classifier.clone(),
                logger.clone(),
            )?),
        })
    }

    fn game(
        self,
        logger: Arc<dyn Logger + Send + Sync>,
        device_dialog: Arc<dyn DeviceDialog + Send + Sync>,
    ) -> Result<Game, Box<dyn std::error::Error + Send + Sync>> {
        Game::new(
            logger,
            self.image_source,
            self.permission,
            self.connectivity,
            device_dialog,
            self.image_classifier,
        )
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if args.console {
        config.frontend = Frontend::Console;
    }

    let logger: Arc<dyn Logger + Send + Sync> =
        Arc::new(LoggerConsole::new(config.logger_timezone()));
    logger.info(&format!("Using config {}", config_path.display()))?;

    let devices = if args.fake {
        Devices::fake(&config, &logger)
    } else {
        Devices::desktop(&config, &logger)?
    };

    match config.frontend {
        Frontend::Console => {
            let device_dialog = Arc::new(DeviceDialogConsole::new(logger.clone()));
            let game = devices.game(logger.clone(), device_dialog)?;
            game.run()?;
        }
        Frontend::Gui => {
            // The window has to own the main thread.
            let device_dialog = Arc::new(DeviceDialogGui::new(logger.clone()));
            let game = devices.game(logger.clone(), device_dialog.clone())?;

            let teardown = game.event_sender();
            let window = device_dialog.clone();
            let session = std::thread::spawn(move || {
                let score = game.run();
                window.close_after(WINDOW_CLOSE_DELAY);
                score
            });

            let window_result = device_dialog.run_window();
            let _ = teardown.send(Event::Teardown);
            session.join().map_err(|_| "Game thread panicked")??;
            window_result?;
        }
    }

    Ok(())
}
