pub mod chart;
pub mod commands;
pub mod config;
pub mod format;
pub mod models;
pub mod quality;
pub mod refresh;
pub mod state;

mod client;
mod dashboard;
mod renderer;

pub use client::api::{AirQualityApi, ApiError, HttpApi};

use crate::commands::Command;
use crate::config::AppConfig;
use crate::refresh::{RefreshDriver, RefreshOutcome, RefreshSettings, RefreshTrigger};
use crate::renderer::fonts::Fonts;
use crate::state::{AppState, StateEvent};
use anyhow::Context;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting dashboard");

    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Dashboard stopped"),
                Err(e) => {
                    error!("Application error: {e:#}");
                    // Print chain of error causes
                    let mut source = e.source();
                    while let Some(e) = source {
                        error!("Caused by: {e}");
                        source = e.source();
                    }
                    return Err(e).context("Application failed to run");
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    Ok(())
}

/// Shared pieces a spawned refresh needs to render its result.
#[derive(Clone)]
struct Runtime {
    config: Arc<AppConfig>,
    fonts: Fonts,
    driver: Arc<RefreshDriver>,
}

impl Runtime {
    async fn render(&self) {
        let state = self.driver.state().lock().await.clone();
        let img = dashboard::create_image(&self.config, &self.fonts, &state);
        if self.config.dashboard.save_to_file {
            if let Err(e) = dashboard::save_image(&self.config, &img) {
                error!("{e:#}");
            }
        }
    }

    fn spawn_refresh(&self, trigger: RefreshTrigger) {
        let ctx = self.clone();
        tokio::spawn(async move {
            if let RefreshOutcome::Completed { .. } = ctx.driver.refresh(trigger).await {
                ctx.render().await;
            }
        });
    }

    fn spawn_districts(&self, city: String) {
        let ctx = self.clone();
        tokio::spawn(async move {
            ctx.driver.load_districts(&city).await;
        });
    }
}

async fn main_loop(config: AppConfig) -> anyhow::Result<()> {
    let api = HttpApi::new(&config.api).context("Failed to create API client")?;
    info!("API base: {}", api.base_url());
    info!("Auto-refresh interval: {} s", config.api.poll_secs);

    let state = Arc::new(Mutex::new(AppState::from_config(&config)));
    let driver = Arc::new(RefreshDriver::new(
        Arc::new(api),
        state,
        RefreshSettings::from(&config.api),
    ));
    let ctx = Runtime {
        fonts: Fonts::load(&config.dashboard.font),
        config: Arc::new(config),
        driver,
    };

    ctx.driver.load_cities().await;
    if !ctx.config.filter.city.is_empty() {
        ctx.driver.load_districts(&ctx.config.filter.city).await;
    }

    let initial = if ctx.config.filter.device.is_empty() {
        RefreshTrigger::Filter
    } else {
        RefreshTrigger::Selection
    };
    ctx.driver.refresh(initial).await;
    ctx.render().await;

    let (tx, mut commands) = mpsc::channel::<Command>(16);
    tokio::spawn(read_commands(tx));
    let mut commands_open = true;

    let period = Duration::from_secs(ctx.config.api.poll_secs.max(1));
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = interval.tick() => ctx.spawn_refresh(RefreshTrigger::Timer),
            command = commands.recv(), if commands_open => {
                match command {
                    Some(Command::Quit) => return Ok(()),
                    Some(command) => handle_command(&ctx, command).await,
                    None => {
                        debug!("stdin closed, continuing with timer only");
                        commands_open = false;
                    }
                }
            }
        }
    }
}

async fn handle_command(ctx: &Runtime, command: Command) {
    debug!("Command: {:?}", command);
    match command {
        Command::City(city) => {
            let city = city.unwrap_or_default();
            ctx.driver.update(StateEvent::CitySelected(city.clone())).await;
            if !city.is_empty() {
                ctx.spawn_districts(city);
            }
        }
        Command::District(district) => {
            ctx.driver
                .update(StateEvent::DistrictSelected(district.unwrap_or_default()))
                .await;
        }
        Command::Filter => ctx.spawn_refresh(RefreshTrigger::Filter),
        Command::Select(device_id) => {
            ctx.driver.update(StateEvent::LocationSelected(device_id)).await;
            ctx.render().await;
            ctx.spawn_refresh(RefreshTrigger::Selection);
        }
        Command::Deselect => {
            ctx.driver.update(StateEvent::Deselected).await;
            ctx.render().await;
        }
        Command::Refresh => ctx.spawn_refresh(RefreshTrigger::Manual),
        Command::Layer { layer, visible } => {
            ctx.driver.update(StateEvent::LayerToggled { layer, visible }).await;
            ctx.render().await;
        }
        Command::Quit => {}
    }
}

async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match commands::parse(&line) {
                Ok(Some(command)) => {
                    if tx.send(command).await.is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("{}", e),
            },
            Ok(None) => return,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                return;
            }
        }
    }
}
