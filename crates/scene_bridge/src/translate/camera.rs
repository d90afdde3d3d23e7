//! Camera field mapping and unit conversion

use crate::host::{HostScene, NodeId};
use crate::render::{ParamMap, ParamValue};

/// Host film-back values are in inches; renderers expect meters
const INCHES_TO_METERS: f32 = 2.54 * 0.01;

/// Host focal lengths are in millimeters
const MM_TO_METERS: f32 = 0.001;

/// Film dimensions in meters derived from the host's horizontal aperture
///
/// The vertical aperture is derived from the horizontal one divided by the
/// image aspect ratio (never read from the host directly) so film back and
/// output resolution always agree.
#[must_use]
pub fn film_dimensions(horizontal_aperture_inches: f32, image_aspect: f32) -> (f32, f32) {
    let horizontal = horizontal_aperture_inches * INCHES_TO_METERS;
    let vertical = horizontal / image_aspect;
    (horizontal, vertical)
}

/// Build the renderer camera parameter set for a host camera node
#[must_use]
pub fn camera_params(id: NodeId, host: &dyn HostScene, image_aspect: f32) -> ParamMap {
    let horizontal_aperture = host.float_attr(id, "horizontalFilmAperture", 24.892);
    let (film_width, film_height) = film_dimensions(horizontal_aperture, image_aspect);
    let focal_length = host.float_attr(id, "focalLength", 35.0) * MM_TO_METERS;
    let focus_distance = host.float_attr(id, "focusDistance", 10.0);
    let f_stop = host.float_attr(id, "fStop", 1000.0);

    ParamMap::new()
        .with("film_width", ParamValue::Float(film_width))
        .with("film_height", ParamValue::Float(film_height))
        .with("focal_length", ParamValue::Float(focal_length))
        .with("focus_distance", ParamValue::Float(focus_distance))
        .with("f_stop", ParamValue::Float(f_stop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aperture_conversion_default_film_back() {
        // 24.892 in × 2.54 × 0.01 = 0.6322568 m; vertical follows the aspect
        let (h, v) = film_dimensions(24.892, 16.0 / 9.0);
        assert_relative_eq!(h, 0.632_256_8, epsilon = 1e-5);
        assert_relative_eq!(v, 0.355_6, epsilon = 1e-4);
        assert_relative_eq!(h / v, 16.0 / 9.0, epsilon = 1e-5);
    }

    #[test]
    fn test_vertical_tracks_resolution_aspect() {
        let (h, v) = film_dimensions(24.892, 2.0);
        assert_relative_eq!(v, h / 2.0, epsilon = 1e-7);
    }

    #[test]
    fn test_focal_length_in_meters() {
        let mut scene = crate::host::MemoryScene::new();
        let cam = scene.add_node("cam", crate::host::HostNodeKind::Camera, None);
        let params = camera_params(cam, &scene, 1.0);
        // default 35 mm lens
        let Some(&ParamValue::Float(focal)) = params.get("focal_length") else {
            panic!("focal_length missing");
        };
        assert_relative_eq!(focal, 0.035, epsilon = 1e-7);
        assert_eq!(params.get("f_stop"), Some(&ParamValue::Float(1000.0)));
    }
}
