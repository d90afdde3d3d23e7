//! Deterministic software reference backend
//!
//! Implements [`RenderBackend`] entirely in memory. The "render" is a
//! diagnostic gradient tinted by the scene's lights: enough to exercise the
//! tile pipeline, pause and cooperative abort, without attempting light
//! transport. Tests and the preview tool run against it; production plugins
//! swap in a real renderer adapter.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use super::backend::{
    BackendResult, EntityKind, FrameDescriptor, Geometry, ParamMap, ParamValue, RenderBackend,
    RenderOutcome,
};
use super::signal::RenderSignal;
use super::tile::{FrameData, TileData, TileSink, CHANNELS};
use crate::foundation::math::Mat4;

/// A positioned reference to a named object
#[derive(Debug, Clone)]
pub struct InstanceRecord {
    /// Name of the referenced object
    pub object: String,
    /// World transform of the instance
    pub transform: Mat4,
    /// Extra bindings (e.g. the material slot)
    pub params: ParamMap,
}

/// In-memory renderer backend with inspectable entity tables
#[derive(Default)]
pub struct SoftwareBackend {
    objects: HashMap<String, (Geometry, ParamMap)>,
    instances: HashMap<String, InstanceRecord>,
    lights: HashMap<String, ParamMap>,
    materials: HashMap<String, ParamMap>,
    shaders: HashMap<String, ParamMap>,
    camera: Option<(String, ParamMap)>,
    camera_transform: Mat4,
    frame: FrameDescriptor,
}

impl SoftwareBackend {
    /// Backend with the default 64×64 frame
    #[must_use]
    pub fn new() -> Self {
        Self {
            camera_transform: Mat4::identity(),
            ..Self::default()
        }
    }

    /// Backend with an explicit initial frame descriptor
    #[must_use]
    pub fn with_frame(frame: FrameDescriptor) -> Self {
        Self {
            frame,
            ..Self::new()
        }
    }

    /// Inspect an instance record (diagnostic accessor)
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<&InstanceRecord> {
        self.instances.get(name)
    }

    /// Inspect a light's parameters (diagnostic accessor)
    #[must_use]
    pub fn light(&self, name: &str) -> Option<&ParamMap> {
        self.lights.get(name)
    }

    /// Active camera name and parameters (diagnostic accessor)
    #[must_use]
    pub fn camera(&self) -> Option<(&str, &ParamMap)> {
        self.camera.as_ref().map(|(name, params)| (name.as_str(), params))
    }

    /// Active camera transform (diagnostic accessor)
    #[must_use]
    pub const fn camera_transform(&self) -> &Mat4 {
        &self.camera_transform
    }

    /// Number of entities of a kind (diagnostic accessor)
    #[must_use]
    pub fn entity_count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Object => self.objects.len(),
            EntityKind::ObjectInstance => self.instances.len(),
            EntityKind::Light => self.lights.len(),
            EntityKind::Material => self.materials.len(),
            EntityKind::Shader => self.shaders.len(),
            EntityKind::Camera => usize::from(self.camera.is_some()),
        }
    }

    // Average emitted light color; white when the scene has no lights.
    fn light_tint(&self) -> [f32; 3] {
        if self.lights.is_empty() {
            return [1.0, 1.0, 1.0];
        }
        let mut sum = [0.0f32; 3];
        for params in self.lights.values() {
            let color = match params.get("color") {
                Some(ParamValue::Color(c)) => *c,
                _ => [1.0, 1.0, 1.0],
            };
            let intensity = match params.get("intensity") {
                Some(ParamValue::Float(i)) => *i,
                _ => 1.0,
            };
            for (acc, channel) in sum.iter_mut().zip(color) {
                *acc += channel * intensity;
            }
        }
        let count = self.lights.len() as f32;
        [
            (sum[0] / count).clamp(0.0, 1.0),
            (sum[1] / count).clamp(0.0, 1.0),
            (sum[2] / count).clamp(0.0, 1.0),
        ]
    }

    fn shade_pixel(&self, fx: u32, fy: u32, tint: [f32; 3]) -> [f32; CHANNELS] {
        let u = (fx as f32 + 0.5) / self.frame.width.max(1) as f32;
        let v = (fy as f32 + 0.5) / self.frame.height.max(1) as f32;
        [u * tint[0], v * tint[1], (1.0 - u) * tint[2], 1.0]
    }
}

impl RenderBackend for SoftwareBackend {
    fn insert_object(
        &mut self,
        name: &str,
        geometry: Geometry,
        params: ParamMap,
    ) -> BackendResult<()> {
        self.objects.insert(name.to_owned(), (geometry, params));
        Ok(())
    }

    fn insert_instance(
        &mut self,
        name: &str,
        object: &str,
        transform: Mat4,
        params: ParamMap,
    ) -> BackendResult<()> {
        self.instances.insert(
            name.to_owned(),
            InstanceRecord {
                object: object.to_owned(),
                transform,
                params,
            },
        );
        Ok(())
    }

    fn insert_light(&mut self, name: &str, params: ParamMap) -> BackendResult<()> {
        self.lights.insert(name.to_owned(), params);
        Ok(())
    }

    fn insert_material(&mut self, name: &str, params: ParamMap) -> BackendResult<()> {
        self.materials.insert(name.to_owned(), params);
        Ok(())
    }

    fn insert_shader(&mut self, name: &str, params: ParamMap) -> BackendResult<()> {
        self.shaders.insert(name.to_owned(), params);
        Ok(())
    }

    fn set_camera(&mut self, name: &str, params: ParamMap) -> BackendResult<()> {
        self.camera = Some((name.to_owned(), params));
        Ok(())
    }

    fn set_camera_transform(&mut self, transform: Mat4) -> BackendResult<()> {
        self.camera_transform = transform;
        Ok(())
    }

    fn remove(&mut self, kind: EntityKind, name: &str) -> bool {
        match kind {
            EntityKind::Object => self.objects.remove(name).is_some(),
            EntityKind::ObjectInstance => self.instances.remove(name).is_some(),
            EntityKind::Light => self.lights.remove(name).is_some(),
            EntityKind::Material => self.materials.remove(name).is_some(),
            EntityKind::Shader => self.shaders.remove(name).is_some(),
            EntityKind::Camera => match &self.camera {
                Some((current, _)) if current == name => {
                    self.camera = None;
                    true
                }
                _ => false,
            },
        }
    }

    fn contains(&self, kind: EntityKind, name: &str) -> bool {
        match kind {
            EntityKind::Object => self.objects.contains_key(name),
            EntityKind::ObjectInstance => self.instances.contains_key(name),
            EntityKind::Light => self.lights.contains_key(name),
            EntityKind::Material => self.materials.contains_key(name),
            EntityKind::Shader => self.shaders.contains_key(name),
            EntityKind::Camera => self
                .camera
                .as_ref()
                .is_some_and(|(current, _)| current == name),
        }
    }

    fn set_frame(&mut self, frame: FrameDescriptor) -> BackendResult<()> {
        self.frame = frame;
        Ok(())
    }

    fn frame(&self) -> FrameDescriptor {
        self.frame.clone()
    }

    fn render(&mut self, signal: &RenderSignal, sink: &dyn TileSink) -> BackendResult<RenderOutcome> {
        let frame = self.frame.clone();
        let tint = self.light_tint();
        let tiles_x = frame.tiles_x();
        let tiles_y = frame.tiles_y();
        let total = (tiles_x * tiles_y).max(1);
        let mut done = 0u32;

        for tile_y in 0..tiles_y {
            for tile_x in 0..tiles_x {
                while signal.is_paused() && !signal.is_aborted() {
                    thread::sleep(Duration::from_millis(1));
                }
                if signal.is_aborted() {
                    log::debug!("render pass aborted at tile ({tile_x}, {tile_y})");
                    return Ok(RenderOutcome::Aborted);
                }

                let x0 = tile_x * frame.tile_size;
                let y0 = tile_y * frame.tile_size;
                let width = frame.tile_size.min(frame.width - x0);
                let height = frame.tile_size.min(frame.height - y0);
                let mut pixels = Vec::with_capacity((width * height) as usize * CHANNELS);
                for row in 0..height {
                    for col in 0..width {
                        pixels.extend_from_slice(&self.shade_pixel(x0 + col, y0 + row, tint));
                    }
                }
                sink.on_tile(
                    tile_x,
                    tile_y,
                    &TileData {
                        x: x0,
                        y: y0,
                        width,
                        height,
                        pixels,
                    },
                );
                done += 1;
                sink.on_progress(done as f32 / total as f32);
            }
        }

        let mut pixels = Vec::with_capacity((frame.width * frame.height) as usize * CHANNELS);
        for fy in 0..frame.height {
            for fx in 0..frame.width {
                pixels.extend_from_slice(&self.shade_pixel(fx, fy, tint));
            }
        }
        sink.on_complete(&FrameData {
            width: frame.width,
            height: frame.height,
            pixels,
        });
        Ok(RenderOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tile::FrameAccumulator;
    use std::sync::Arc;

    #[test]
    fn test_insert_replaces_by_name() {
        let mut backend = SoftwareBackend::new();
        backend
            .insert_light("key", ParamMap::new().with("intensity", ParamValue::Float(1.0)))
            .unwrap();
        backend
            .insert_light("key", ParamMap::new().with("intensity", ParamValue::Float(2.0)))
            .unwrap();
        assert_eq!(backend.entity_count(EntityKind::Light), 1);
        assert_eq!(
            backend.light("key").unwrap().get("intensity"),
            Some(&ParamValue::Float(2.0))
        );
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut backend = SoftwareBackend::new();
        assert!(!backend.remove(EntityKind::Object, "missing"));
        backend
            .insert_object("mesh", Geometry::UnitPlane, ParamMap::new())
            .unwrap();
        assert!(backend.remove(EntityKind::Object, "mesh"));
        assert!(!backend.contains(EntityKind::Object, "mesh"));
    }

    #[test]
    fn test_render_covers_frame_and_completes() {
        let mut backend = SoftwareBackend::with_frame(FrameDescriptor {
            width: 20,
            height: 10,
            tile_size: 8,
            ..FrameDescriptor::default()
        });
        let sink = Arc::new(FrameAccumulator::new(20, 10));
        let outcome = backend.render(&RenderSignal::new(), sink.as_ref()).unwrap();
        assert_eq!(outcome, RenderOutcome::Completed);
        assert!(sink.is_complete());
        assert!((sink.progress() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_render_observes_abort() {
        let mut backend = SoftwareBackend::new();
        let sink = Arc::new(FrameAccumulator::new(64, 64));
        let signal = RenderSignal::new();
        signal.request_abort();
        let outcome = backend.render(&signal, sink.as_ref()).unwrap();
        assert_eq!(outcome, RenderOutcome::Aborted);
        assert!(!sink.is_complete());
    }
}
