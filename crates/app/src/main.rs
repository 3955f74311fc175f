use bevy::prelude::*;
use bevy::window::PresentMode;

use landscape::config::LandscapeConfig;
use landscape::{LandscapePlugin, LandscapeSet};
use rendering::RenderingPlugin;

mod flight;

/// Names a JSON file whose keys override the default landscape config.
const CONFIG_ENV: &str = "FLIGHT_CONFIG";

fn main() -> AppExit {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Flight".to_string(),
            resolution: (1280.0, 720.0).into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }));

    match load_config() {
        Ok(Some(config)) => {
            app.insert_resource(config);
        }
        Ok(None) => {}
        Err(message) => {
            error!("{}", message);
            return AppExit::error();
        }
    }

    app.add_plugins((LandscapePlugin, RenderingPlugin))
        .add_systems(
            Startup,
            flight::spawn_balloon.after(rendering::models::load_scenery_models),
        )
        .add_systems(Update, flight::fly_forward.before(LandscapeSet::Stream));

    app.run()
}

fn load_config() -> Result<Option<LandscapeConfig>, String> {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return Ok(None);
    };
    let json = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {CONFIG_ENV}={path}: {e}"))?;
    let config = LandscapeConfig::from_json(&json)
        .map_err(|e| format!("Invalid landscape config in {path}: {e}"))?;
    info!("Loaded landscape config from {}", path);
    Ok(Some(config))
}
