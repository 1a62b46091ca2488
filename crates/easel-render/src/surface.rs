//! A surface that follows the editor's committed scene.

use crate::renderer::{CpuRenderer, Renderer};
use easel_core::observer::{SceneChange, SceneObserver};
use easel_core::scene::Scene;
use image::RgbaImage;

/// Re-renders after every committed change it is told about.
pub struct LiveSurface<R: Renderer = CpuRenderer> {
    renderer: R,
    frame: Option<RgbaImage>,
    frames_rendered: usize,
}

impl Default for LiveSurface {
    fn default() -> Self {
        Self::new(CpuRenderer::new())
    }
}

impl<R: Renderer> LiveSurface<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            frame: None,
            frames_rendered: 0,
        }
    }

    /// The last successfully rendered frame.
    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

impl<R: Renderer> SceneObserver for LiveSurface<R> {
    fn scene_changed(&mut self, scene: &Scene, changes: &[SceneChange]) {
        for change in changes {
            match change.object() {
                Some(id) => self.renderer.invalidate(id),
                None if *change == SceneChange::Replaced => self.renderer.invalidate_all(),
                None => {}
            }
        }
        match self.renderer.render(scene) {
            Ok(frame) => {
                self.frame = Some(frame);
                self.frames_rendered += 1;
            }
            Err(e) => log::warn!("Render failed, keeping previous frame: {}", e),
        }
    }
}
