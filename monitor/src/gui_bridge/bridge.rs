use crate::generator::profile::simulated_range_profile;
use crate::gui_bridge::model::VisualizationModel;
use crate::output::status_line;
use anyhow::Context;
use log::info;
use presencecore::dispatch::{RenderFrame, RenderSink};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    thread,
};
use tokio::runtime::Builder;
use warp::Filter;

type SharedModel = Arc<RwLock<VisualizationModel>>;

/// HTTP endpoint exposing the latest rendered frame as JSON.
pub struct GuiBridge {
    state: SharedModel,
}

impl GuiBridge {
    /// Bridge without an HTTP listener.
    pub fn detached() -> Self {
        Self {
            state: Arc::new(RwLock::new(VisualizationModel::default())),
        }
    }

    /// Starts serving `GET /snapshot` and `GET /health` on `address`.
    ///
    /// The listener is bound before this returns, so an unusable address is
    /// reported to the caller.
    pub fn serve(address: SocketAddr) -> anyhow::Result<Self> {
        let bridge = Self::detached();
        let routes = routes(bridge.state.clone());

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for the gui bridge")?;
        let (bound, server) = runtime
            .block_on(async move { warp::serve(routes).try_bind_ephemeral(address) })
            .with_context(|| format!("binding gui bridge to {}", address))?;
        info!("[GUI] serving snapshots on http://{}", bound);

        thread::Builder::new()
            .name("gui-bridge".into())
            .spawn(move || runtime.block_on(server))
            .context("starting gui bridge thread")?;

        Ok(bridge)
    }

    pub fn renderer(&self) -> BridgeRenderer {
        BridgeRenderer {
            state: self.state.clone(),
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> VisualizationModel {
        read(&self.state).clone()
    }
}

fn routes(
    state: SharedModel,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let snapshot_route = warp::path("snapshot")
        .and(warp::get())
        .and(state_filter)
        .map(|state: SharedModel| {
            let model = read(&state).clone();
            warp::reply::json(&model)
        });

    let health_route = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({"status": "ok"})));

    snapshot_route.or(health_route)
}

fn read(state: &SharedModel) -> RwLockReadGuard<'_, VisualizationModel> {
    match state.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write(state: &SharedModel) -> RwLockWriteGuard<'_, VisualizationModel> {
    match state.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Render sink that publishes each frame into the bridge state.
pub struct BridgeRenderer {
    state: SharedModel,
    rng: StdRng,
}

impl RenderSink for BridgeRenderer {
    fn render(&mut self, frame: &RenderFrame) {
        let range_profile = frame
            .target
            .as_ref()
            .map(|target| simulated_range_profile(&mut self.rng, target, frame.max_range_meters))
            .unwrap_or_default();

        let mut guard = write(&self.state);
        let frames_rendered = guard.frames_rendered + 1;
        *guard = VisualizationModel {
            target: frame.target,
            status: status_line(frame),
            max_range_meters: frame.max_range_meters,
            range_profile,
            frames_rendered,
        };
    }
}
