//! Scene lighting bake.
//!
//! A bake runs as its own task and publishes progress in `[0, 1]` on a
//! `watch` channel. Waiting for completion is a plain `await` on that
//! channel.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LightingError {
    /// The baker stopped before reaching 1.0.
    #[error("lighting bake stopped before completion")]
    Aborted,
}

/// Produces lighting for the loaded scene.
#[async_trait]
pub trait LightingBaker: Send + Sync {
    /// Run the bake, publishing progress. Completion is signalled by 1.0.
    async fn bake(&self, progress: watch::Sender<f32>);
}

/// Advances in fixed steps over a fixed duration.
pub struct SimulatedBaker {
    duration: Duration,
    steps: u32,
}

impl SimulatedBaker {
    pub fn new(duration: Duration, steps: u32) -> Self {
        Self {
            duration,
            steps: steps.max(1),
        }
    }
}

#[async_trait]
impl LightingBaker for SimulatedBaker {
    async fn bake(&self, progress: watch::Sender<f32>) {
        let tick = self.duration / self.steps;
        for step in 1..=self.steps {
            tokio::time::sleep(tick).await;
            progress.send_replace(step as f32 / self.steps as f32);
        }
    }
}

/// Entry point for lighting bakes.
#[derive(Clone)]
pub struct SceneLighting {
    baker: Arc<dyn LightingBaker>,
}

impl SceneLighting {
    pub fn new(baker: Arc<dyn LightingBaker>) -> Self {
        Self { baker }
    }

    /// Start a bake in the background.
    pub fn start_bake(&self) -> LightingBake {
        let (tx, rx) = watch::channel(0.0);
        let baker = self.baker.clone();
        let task = tokio::spawn(async move {
            baker.bake(tx).await;
        });
        LightingBake { progress: rx, task }
    }
}

/// Handle to a running bake. Dropping it cancels the bake.
pub struct LightingBake {
    progress: watch::Receiver<f32>,
    task: JoinHandle<()>,
}

impl LightingBake {
    pub fn progress(&self) -> f32 {
        (*self.progress.borrow()).clamp(0.0, 1.0)
    }

    /// Resolve once progress reaches 1.0, reporting each value on the way.
    pub async fn wait_for_completion(
        &mut self,
        mut on_progress: impl FnMut(f32),
    ) -> Result<(), LightingError> {
        self.progress
            .wait_for(|value| {
                let value = value.clamp(0.0, 1.0);
                on_progress(value);
                value >= 1.0
            })
            .await
            .map(|_| ())
            .map_err(|_| LightingError::Aborted)
    }
}

impl Drop for LightingBake {
    fn drop(&mut self) {
        self.task.abort();
    }
}
