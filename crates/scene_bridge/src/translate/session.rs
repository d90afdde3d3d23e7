//! Translation session: host identity → renderer entity mapping
//!
//! The session owns the renderer-side entity bookkeeping: which host node
//! produced which named entities, which shape was translated last (so a
//! subsequently arriving transform update can be re-associated), and which
//! camera is active. All mutation happens on the control context; the worker
//! thread only reads the backend after the controller hands off.

use std::collections::HashMap;
use std::sync::MutexGuard;

use super::{camera, lights};
use crate::errors::{BridgeError, BridgeResult};
use crate::foundation::math::{area_light_prerotation, Mat4};
use crate::host::{HostScene, NodeId};
use crate::render::{
    EntityKind, EntityRef, Geometry, ParamMap, ParamValue, RenderBackend, SharedBackend,
};
use crate::scene::{NodeCategory, ObjectRegistry, SceneObject};

/// Result of one translation operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// A fresh entity set was created
    Created,
    /// An existing entity set of the same name was removed first
    Replaced,
    /// No translation rule; logged, deliberately not an error
    Skipped,
}

struct LastShape {
    id: NodeId,
    category: NodeCategory,
    name: String,
}

/// Maps host node identities to renderer-side entities and applies diffs
pub struct TranslationSession {
    backend: SharedBackend,
    entities: HashMap<NodeId, Vec<EntityRef>>,
    last_shape: Option<LastShape>,
    active_camera: Option<String>,
}

impl TranslationSession {
    /// Session over a shared renderer backend
    #[must_use]
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            entities: HashMap::new(),
            last_shape: None,
            active_camera: None,
        }
    }

    /// Renderer entities currently recorded for a host id
    #[must_use]
    pub fn entities(&self, id: NodeId) -> Option<&[EntityRef]> {
        self.entities.get(&id).map(Vec::as_slice)
    }

    /// Name of the active camera entity, if one was translated
    #[must_use]
    pub fn active_camera(&self) -> Option<&str> {
        self.active_camera.as_deref()
    }

    /// Idempotent create-or-replace for a shape node
    ///
    /// Renderer object tables do not support in-place geometry replace
    /// safely, so an existing entity of the derived name is removed first.
    /// Unknown categories are logged and skipped, never fatal.
    pub fn translate_shape(&mut self, obj: &SceneObject) -> BridgeResult<Translation> {
        if !obj.category.is_shape() {
            log::warn!(
                "no translation rule for {} ({:?}); skipping",
                obj.path,
                obj.category
            );
            return Ok(Translation::Skipped);
        }

        let name = obj.entity_name();
        let replaced = {
            let mut backend = self.lock();
            let replaced = backend.remove(EntityKind::Object, &name);
            if replaced {
                log::debug!("object {name} already defined, removing before insert");
            }
            backend
                .insert_object(&name, Geometry::HostMesh { source: obj.id }, ParamMap::new())
                .map_err(|err| BridgeError::RendererApi(err.to_string()))?;
            replaced
        };

        self.replace_entities(obj.id, vec![EntityRef::new(EntityKind::Object, name.clone())]);
        self.last_shape = Some(LastShape {
            id: obj.id,
            category: obj.category,
            name,
        });
        Ok(if replaced {
            Translation::Replaced
        } else {
            Translation::Created
        })
    }

    /// Create or replace the renderer entities for a light
    ///
    /// Point/spot/directional lights become native light primitives driven by
    /// the per-category field tables. Area lights become emissive geometry:
    /// unit plane + emission profile + surface shader + material, because the
    /// target renderers model area lights as geometry.
    pub fn translate_light(
        &mut self,
        obj: &SceneObject,
        host: &dyn HostScene,
    ) -> BridgeResult<Translation> {
        let name = obj.entity_name();
        match obj.category {
            NodeCategory::PointLight | NodeCategory::SpotLight | NodeCategory::DirectionalLight => {
                let params = lights::light_params(obj, host)
                    .ok_or_else(|| BridgeError::UnsupportedType(obj.category))?;
                let replaced = {
                    let mut backend = self.lock();
                    let replaced = backend.remove(EntityKind::Light, &name);
                    backend
                        .insert_light(&name, params)
                        .map_err(|err| BridgeError::RendererApi(err.to_string()))?;
                    replaced
                };
                self.replace_entities(obj.id, vec![EntityRef::new(EntityKind::Light, name.clone())]);
                self.last_shape = Some(LastShape {
                    id: obj.id,
                    category: obj.category,
                    name,
                });
                Ok(if replaced {
                    Translation::Replaced
                } else {
                    Translation::Created
                })
            }
            NodeCategory::AreaLight => self.translate_area_light(obj, host),
            _ => {
                log::warn!("{} ({:?}) is not a light; skipping", obj.path, obj.category);
                Ok(Translation::Skipped)
            }
        }
    }

    fn translate_area_light(
        &mut self,
        obj: &SceneObject,
        host: &dyn HostScene,
    ) -> BridgeResult<Translation> {
        let name = obj.entity_name();
        let emission_name = format!("{name}_emission");
        let surface_name = format!("{name}_surface");
        let material_name = format!("{name}_material");
        let radiance = lights::area_light_radiance(obj, host);

        let emission_params = ParamMap::new()
            .with("radiance", ParamValue::Color(radiance))
            .with(
                "exclusion_is_exclude",
                ParamValue::Bool(obj.light_exclusion.is_exclude),
            )
            .with(
                "exclusion_nodes",
                ParamValue::Ids(obj.light_exclusion.targets.iter().map(|id| id.raw()).collect()),
            );
        let material_params = ParamMap::new()
            .with("surface_shader", ParamValue::Str(surface_name.clone()))
            .with("emission", ParamValue::Str(emission_name.clone()));

        let replaced = {
            let mut backend = self.lock();
            let replaced = backend.remove(EntityKind::Object, &name);
            backend
                .insert_object(&name, Geometry::UnitPlane, ParamMap::new())
                .map_err(|err| BridgeError::RendererApi(err.to_string()))?;

            backend.remove(EntityKind::Shader, &emission_name);
            backend
                .insert_shader(&emission_name, emission_params)
                .map_err(|err| BridgeError::RendererApi(err.to_string()))?;

            backend.remove(EntityKind::Shader, &surface_name);
            backend
                .insert_shader(&surface_name, ParamMap::new())
                .map_err(|err| BridgeError::RendererApi(err.to_string()))?;

            backend.remove(EntityKind::Material, &material_name);
            backend
                .insert_material(&material_name, material_params)
                .map_err(|err| BridgeError::RendererApi(err.to_string()))?;
            replaced
        };

        self.replace_entities(
            obj.id,
            vec![
                EntityRef::new(EntityKind::Object, name.clone()),
                EntityRef::new(EntityKind::Shader, emission_name),
                EntityRef::new(EntityKind::Shader, surface_name),
                EntityRef::new(EntityKind::Material, material_name),
            ],
        );
        self.last_shape = Some(LastShape {
            id: obj.id,
            category: obj.category,
            name,
        });
        Ok(if replaced {
            Translation::Replaced
        } else {
            Translation::Created
        })
    }

    /// Replace the scene camera with this host camera
    ///
    /// A session has a single active camera; translating a different camera
    /// removes the previous one. The frame descriptor is rebound so output
    /// stays attached to the new camera.
    pub fn translate_camera(
        &mut self,
        obj: &SceneObject,
        host: &dyn HostScene,
    ) -> BridgeResult<Translation> {
        if obj.category != NodeCategory::Camera {
            log::warn!("{} ({:?}) is not a camera; skipping", obj.path, obj.category);
            return Ok(Translation::Skipped);
        }

        let name = obj.entity_name();
        let replaced = {
            let mut backend = self.lock();
            let frame = backend.frame();
            let image_aspect = frame.width as f32 / frame.height.max(1) as f32;
            let params = camera::camera_params(obj.id, host, image_aspect);

            let replaced = match &self.active_camera {
                Some(previous) if *previous != name => backend.remove(EntityKind::Camera, previous),
                Some(_) => true,
                None => false,
            };
            backend
                .set_camera(&name, params)
                .map_err(|err| BridgeError::RendererApi(err.to_string()))?;

            let mut frame = backend.frame();
            frame.camera = Some(name.clone());
            backend
                .set_frame(frame)
                .map_err(|err| BridgeError::RendererApi(err.to_string()))?;
            replaced
        };

        self.replace_entities(obj.id, vec![EntityRef::new(EntityKind::Camera, name.clone())]);
        self.active_camera = Some(name.clone());
        self.last_shape = Some(LastShape {
            id: obj.id,
            category: NodeCategory::Camera,
            name,
        });
        Ok(if replaced {
            Translation::Replaced
        } else {
            Translation::Created
        })
    }

    /// Apply a transform to the most recently translated entity
    ///
    /// Shape and transform notifications arrive as separate events, so the
    /// association runs through the last-shape cursor, not through `child_id`.
    /// Area lights get the fixed emitter pre-rotation before the host matrix;
    /// cameras update the scene camera transform; everything else upserts the
    /// renderer-side instance.
    pub fn translate_transform(
        &mut self,
        _id: NodeId,
        _child_id: NodeId,
        matrix: &Mat4,
    ) -> BridgeResult<Translation> {
        let Some(last) = &self.last_shape else {
            log::warn!("transform update before any shape translation; skipping");
            return Ok(Translation::Skipped);
        };
        let shape_id = last.id;
        let category = last.category;
        let shape_name = last.name.clone();
        let instance_name = format!("{shape_name}_instance");

        match category {
            NodeCategory::Camera => {
                self.lock()
                    .set_camera_transform(*matrix)
                    .map_err(|err| BridgeError::RendererApi(err.to_string()))?;
                return Ok(Translation::Replaced);
            }
            NodeCategory::AreaLight => {
                let adjusted = matrix * area_light_prerotation();
                let params = ParamMap::new()
                    .with("material", ParamValue::Str(format!("{shape_name}_material")));
                self.upsert_instance(&instance_name, &shape_name, adjusted, params)?;
            }
            _ => {
                self.upsert_instance(&instance_name, &shape_name, *matrix, ParamMap::new())?;
            }
        }

        self.record_entity(shape_id, EntityRef::new(EntityKind::ObjectInstance, instance_name));
        Ok(Translation::Replaced)
    }

    /// Create or replace the instance positioning a prototype's geometry
    ///
    /// Instances never duplicate geometry; they reference the prototype's
    /// object entity by name.
    pub fn translate_instance(
        &mut self,
        obj: &SceneObject,
        prototype: &SceneObject,
    ) -> BridgeResult<Translation> {
        let instance_name = format!("{}_instance", obj.entity_name());
        let object_name = prototype.entity_name();
        self.upsert_instance(
            &instance_name,
            &object_name,
            obj.transform_samples[0],
            ParamMap::new(),
        )?;
        self.replace_entities(
            obj.id,
            vec![EntityRef::new(EntityKind::ObjectInstance, instance_name)],
        );
        Ok(Translation::Created)
    }

    /// Replace the output resolution, preserving the camera binding
    pub fn set_resolution(&mut self, width: u32, height: u32) -> BridgeResult<()> {
        let mut backend = self.lock();
        let mut frame = backend.frame();
        frame.width = width;
        frame.height = height;
        backend
            .set_frame(frame)
            .map_err(|err| BridgeError::RendererApi(err.to_string()))
    }

    /// Remove every renderer entity recorded for a host id
    pub fn remove_object(&mut self, id: NodeId) {
        if let Some(refs) = self.entities.remove(&id) {
            let mut backend = self.lock();
            for entity in &refs {
                backend.remove(entity.kind, &entity.name);
            }
        }
        if self.last_shape.as_ref().is_some_and(|last| last.id == id) {
            self.last_shape = None;
        }
    }

    /// Full build: walk the registry and emit every supported, visible object
    ///
    /// Per-object failures are logged and contained; a single broken node
    /// never aborts the build.
    pub fn translate_scene(
        &mut self,
        registry: &ObjectRegistry,
        host: &dyn HostScene,
        active_camera: Option<NodeId>,
    ) -> BridgeResult<()> {
        let objects: Vec<SceneObject> = registry.iter().cloned().collect();
        for obj in &objects {
            if !obj.visible() {
                log::debug!("{} is not visible; skipping", obj.path);
                continue;
            }
            let result = if obj.category.is_shape() {
                if obj.instance_number == 0 {
                    self.translate_shape(obj).and_then(|t| {
                        self.translate_transform(obj.id, obj.id, &obj.transform_samples[0])?;
                        Ok(t)
                    })
                } else if let Some(prototype) = registry.find_prototype(obj.id) {
                    self.translate_instance(obj, prototype)
                } else {
                    log::warn!("instance {} has no prototype; skipping", obj.path);
                    Ok(Translation::Skipped)
                }
            } else if obj.category.is_light() {
                self.translate_light(obj, host).and_then(|t| {
                    self.translate_transform(obj.id, obj.id, &obj.transform_samples[0])?;
                    Ok(t)
                })
            } else if obj.category == NodeCategory::Camera {
                continue; // the single active camera is handled below
            } else {
                self.translate_shape(obj) // logs and skips unknown categories
            };

            if let Err(err) = result {
                log::warn!("translation of {} failed: {err}", obj.path);
            }
        }

        let camera_id = active_camera
            .filter(|id| registry.cameras().contains(id))
            .or_else(|| registry.cameras().first().copied());
        if let Some(id) = camera_id {
            if let Some(obj) = registry.get(id) {
                self.translate_camera(obj, host)?;
                self.translate_transform(id, id, &obj.transform_samples[0])?;
            }
        }
        Ok(())
    }

    fn upsert_instance(
        &mut self,
        instance_name: &str,
        object_name: &str,
        transform: Mat4,
        params: ParamMap,
    ) -> BridgeResult<()> {
        let mut backend = self.lock();
        if backend.remove(EntityKind::ObjectInstance, instance_name) {
            log::debug!("instance {instance_name} already defined, removing before insert");
        }
        backend
            .insert_instance(instance_name, object_name, transform, params)
            .map_err(|err| BridgeError::RendererApi(err.to_string()))
    }

    // At most one renderer-side entity set per host id: entities from a
    // previous translation that are not part of the new set are removed.
    fn replace_entities(&mut self, id: NodeId, refs: Vec<EntityRef>) {
        if let Some(old) = self.entities.get(&id) {
            let stale: Vec<EntityRef> = old.iter().filter(|e| !refs.contains(e)).cloned().collect();
            if !stale.is_empty() {
                let mut backend = self.lock();
                for entity in &stale {
                    backend.remove(entity.kind, &entity.name);
                }
            }
        }
        self.entities.insert(id, refs);
    }

    fn record_entity(&mut self, id: NodeId, entity: EntityRef) {
        let refs = self.entities.entry(id).or_default();
        if !refs.contains(&entity) {
            refs.push(entity);
        }
    }

    fn lock(&self) -> MutexGuard<'_, dyn RenderBackend + 'static> {
        self.backend.lock().unwrap()
    }
}
