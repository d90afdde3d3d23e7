//! Declarative per-category light field mapping
//!
//! Each light category maps host attributes to renderer parameters through a
//! data table, not control flow, so adding a field or a category never touches
//! the translator itself.

use nalgebra::Vector3;

use crate::foundation::math::{translation_of, transformed_direction, Color3};
use crate::host::HostScene;
use crate::render::{ParamMap, ParamValue};
use crate::scene::{NodeCategory, SceneObject};

/// How a host attribute is read, with its default baked in
#[derive(Debug, Clone, Copy)]
pub enum AttrRule {
    /// Boolean attribute with default
    Bool(bool),
    /// Float attribute with default
    Float(f32),
    /// Enum attribute with default index
    Enum(i32),
    /// Color attribute with default
    Color([f32; 3]),
}

/// One host-attribute → renderer-parameter mapping entry
#[derive(Debug, Clone, Copy)]
pub struct LightAttr {
    /// Attribute name on the host light node
    pub host_attr: &'static str,
    /// Parameter name on the renderer entity
    pub param: &'static str,
    /// Read rule and default
    pub rule: AttrRule,
}

const fn entry(host_attr: &'static str, param: &'static str, rule: AttrRule) -> LightAttr {
    LightAttr {
        host_attr,
        param,
        rule,
    }
}

/// Fields shared by every light category
pub const COMMON_ATTRS: &[LightAttr] = &[
    entry("color", "color", AttrRule::Color([1.0, 1.0, 1.0])),
    entry("intensity", "intensity", AttrRule::Float(1.0)),
    entry("shadowColor", "shadow_color", AttrRule::Color([0.0, 0.0, 0.0])),
    entry("useRayTraceShadows", "cast_shadows", AttrRule::Bool(true)),
];

/// Point light specific fields
pub const POINT_ATTRS: &[LightAttr] = &[
    entry("decayRate", "decay", AttrRule::Enum(0)),
    entry("lightRadius", "radius", AttrRule::Float(0.0)),
];

/// Spot light specific fields
pub const SPOT_ATTRS: &[LightAttr] = &[
    entry("decayRate", "decay", AttrRule::Enum(0)),
    entry("lightRadius", "radius", AttrRule::Float(0.0)),
    entry("coneAngle", "cone_angle", AttrRule::Float(40.0)),
    entry("penumbraAngle", "penumbra_angle", AttrRule::Float(0.0)),
    entry("dropoff", "dropoff", AttrRule::Float(0.0)),
];

/// Directional light specific fields
pub const DIRECTIONAL_ATTRS: &[LightAttr] = &[entry("lightAngle", "angle", AttrRule::Float(0.0))];

/// Attribute tables for a light primitive category
///
/// Area lights are not listed here: they are emitted as emissive geometry,
/// not as a light primitive.
#[must_use]
pub fn category_tables(category: NodeCategory) -> Option<[&'static [LightAttr]; 2]> {
    match category {
        NodeCategory::PointLight => Some([COMMON_ATTRS, POINT_ATTRS]),
        NodeCategory::SpotLight => Some([COMMON_ATTRS, SPOT_ATTRS]),
        NodeCategory::DirectionalLight => Some([COMMON_ATTRS, DIRECTIONAL_ATTRS]),
        _ => None,
    }
}

/// Build the full renderer parameter set for a light primitive
///
/// Applies the category's attribute tables, bakes placement from the current
/// transform sample, and attaches the exclusion list.
#[must_use]
pub fn light_params(obj: &SceneObject, host: &dyn HostScene) -> Option<ParamMap> {
    let tables = category_tables(obj.category)?;
    let mut params = ParamMap::new();
    for table in tables {
        for attr in table {
            params.insert(attr.param, read_attr(obj, host, attr));
        }
    }

    let matrix = &obj.transform_samples[0];
    let position = translation_of(matrix);
    params.insert(
        "position",
        ParamValue::Vec3([position.x as f32, position.y as f32, position.z as f32]),
    );
    if matches!(
        obj.category,
        NodeCategory::SpotLight | NodeCategory::DirectionalLight
    ) {
        // lights emit along their local -Z
        let direction = transformed_direction(matrix, Vector3::new(0.0, 0.0, -1.0));
        params.insert(
            "direction",
            ParamValue::Vec3([direction.x as f32, direction.y as f32, direction.z as f32]),
        );
    }

    params.insert(
        "exclusion_is_exclude",
        ParamValue::Bool(obj.light_exclusion.is_exclude),
    );
    params.insert(
        "exclusion_nodes",
        ParamValue::Ids(obj.light_exclusion.targets.iter().map(|id| id.raw()).collect()),
    );
    Some(params)
}

/// Radiance of an area light emitter: color scaled by intensity
#[must_use]
pub fn area_light_radiance(obj: &SceneObject, host: &dyn HostScene) -> [f32; 3] {
    let color = host.color_attr(obj.id, "color", Color3::new(1.0, 1.0, 1.0));
    let intensity = host.float_attr(obj.id, "intensity", 1.0);
    [
        color.x * intensity,
        color.y * intensity,
        color.z * intensity,
    ]
}

fn read_attr(obj: &SceneObject, host: &dyn HostScene, attr: &LightAttr) -> ParamValue {
    match attr.rule {
        AttrRule::Bool(default) => ParamValue::Bool(host.bool_attr(obj.id, attr.host_attr, default)),
        AttrRule::Float(default) => {
            ParamValue::Float(host.float_attr(obj.id, attr.host_attr, default))
        }
        AttrRule::Enum(default) => ParamValue::Int(host.enum_attr(obj.id, attr.host_attr, default)),
        AttrRule::Color(default) => {
            let color = host.color_attr(
                obj.id,
                attr.host_attr,
                Color3::new(default[0], default[1], default[2]),
            );
            ParamValue::Color([color.x, color.y, color.z])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AttrValue, HostNodeKind, MemoryScene};
    use crate::scene::SceneObject;
    use nalgebra::Matrix4;

    #[test]
    fn test_point_light_table_fields() {
        let mut scene = MemoryScene::new();
        let light = scene.add_node("key", HostNodeKind::PointLight, None);
        scene.set_attr(light, "intensity", AttrValue::Float(3.5));
        scene.set_attr(light, "decayRate", AttrValue::Enum(2));
        let obj = SceneObject::from_host(&scene, light).unwrap();

        let params = light_params(&obj, &scene).unwrap();
        assert_eq!(params.get("intensity"), Some(&ParamValue::Float(3.5)));
        assert_eq!(params.get("decay"), Some(&ParamValue::Int(2)));
        // defaults fill unset fields
        assert_eq!(params.get("cast_shadows"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("radius"), Some(&ParamValue::Float(0.0)));
        // point lights carry no direction
        assert!(params.get("direction").is_none());
    }

    #[test]
    fn test_spot_direction_follows_transform() {
        let mut scene = MemoryScene::new();
        let light = scene.add_node("spot", HostNodeKind::SpotLight, None);
        // +90° about X sends local -Z to +Y
        scene.set_world_matrix(
            light,
            Matrix4::from_axis_angle(&nalgebra::Vector3::x_axis(), std::f64::consts::FRAC_PI_2),
        );
        let obj = SceneObject::from_host(&scene, light).unwrap();
        let params = light_params(&obj, &scene).unwrap();
        let Some(&ParamValue::Vec3(dir)) = params.get("direction") else {
            panic!("direction missing");
        };
        assert!(dir[0].abs() < 1e-6);
        assert!((dir[1] - 1.0).abs() < 1e-6);
        assert!(dir[2].abs() < 1e-6);
    }

    #[test]
    fn test_area_light_radiance_premultiplies_intensity() {
        let mut scene = MemoryScene::new();
        let light = scene.add_node("area", HostNodeKind::AreaLight, None);
        scene.set_attr(light, "color", AttrValue::Color(Color3::new(1.0, 0.5, 0.0)));
        scene.set_attr(light, "intensity", AttrValue::Float(2.0));
        let obj = SceneObject::from_host(&scene, light).unwrap();
        assert_eq!(area_light_radiance(&obj, &scene), [2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_area_lights_have_no_primitive_table() {
        assert!(category_tables(NodeCategory::AreaLight).is_none());
    }
}
