//! Interactive preview renderer
//!
//! Builds a small in-memory host scene, translates it through the bridge,
//! drives the render lifecycle against the software backend and writes the
//! completed frame to a PNG. The flags map 1:1 onto controller transitions;
//! `--ipr` additionally exercises an incremental scene edit mid-session.

use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use nalgebra::{Matrix4, Vector3};
use scene_bridge::host::AttrValue;
use scene_bridge::prelude::*;

#[derive(Parser)]
#[command(name = "ipr_app", about = "Interactive preview render for the scene bridge")]
struct Args {
    /// Output width in pixels (non-positive values fall back to settings)
    #[arg(long, default_value_t = -1)]
    width: i64,

    /// Output height in pixels (non-positive values fall back to settings)
    #[arg(long, default_value_t = -1)]
    height: i64,

    /// Short name of the camera to render through
    #[arg(long)]
    camera: Option<String>,

    /// Render settings file (.toml or .ron)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output image path
    #[arg(long, default_value = "preview.png")]
    output: PathBuf,

    /// Run an interactive session: render, apply a scene edit, re-render
    #[arg(long)]
    ipr: bool,

    /// Pause the render briefly after starting, then resume
    #[arg(long)]
    pause: bool,
}

fn build_demo_scene() -> (MemoryScene, NodeId, NodeId) {
    let mut scene = MemoryScene::new();
    let root = scene.add_node("world", HostNodeKind::Transform, None);

    let floor = scene.add_node("floorShape", HostNodeKind::Mesh, Some(root));
    scene.set_world_matrix(floor, Matrix4::new_translation(&Vector3::new(0.0, -1.0, 0.0)));

    let hero = scene.add_node("heroShape", HostNodeKind::Mesh, Some(root));
    let hero_instance = scene.add_instance("heroShape1", hero, Some(root));
    scene.set_world_matrix(
        hero_instance,
        Matrix4::new_translation(&Vector3::new(2.0, 0.0, 0.0)),
    );

    let key = scene.add_node("keyLight", HostNodeKind::PointLight, Some(root));
    scene.set_attr(key, "intensity", AttrValue::Float(1.5));
    scene.set_world_matrix(key, Matrix4::new_translation(&Vector3::new(4.0, 6.0, 4.0)));

    let fill = scene.add_node("fillArea", HostNodeKind::AreaLight, Some(root));
    scene.set_attr(fill, "intensity", AttrValue::Float(0.6));
    scene.set_world_matrix(fill, Matrix4::new_translation(&Vector3::new(-3.0, 2.0, 0.0)));

    let camera = scene.add_node("renderCam", HostNodeKind::Camera, Some(root));
    scene.set_attr(camera, "focalLength", AttrValue::Float(50.0));
    scene.set_world_matrix(camera, Matrix4::new_translation(&Vector3::new(0.0, 1.5, 8.0)));

    (scene, hero, camera)
}

fn wait_for_frame(sink: &FrameAccumulator, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if sink.is_complete() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    sink.is_complete()
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => RenderSettings::load_from_file(&path.to_string_lossy())?,
        None => RenderSettings {
            width: 320,
            height: 240,
            ..RenderSettings::default()
        },
    };
    if args.width > 0 {
        settings.width = args.width as u32;
    }
    if args.height > 0 {
        settings.height = args.height as u32;
    }

    let (mut scene, hero, default_camera) = build_demo_scene();
    let mut registry = ObjectRegistry::build(&scene);
    if settings.motion_blur {
        // the in-memory host has a single evaluation time; every step samples
        // the same matrices, which is enough to exercise the sampling path
        registry.sample_motion(&scene, true, settings.motion_steps);
        for _ in 1..settings.motion_steps {
            registry.sample_motion(&scene, false, settings.motion_steps);
        }
    }

    let active_camera = match &args.camera {
        Some(name) => match scene.find_by_name(name) {
            Some(id) => Some(id),
            None => {
                log::warn!("camera {name} not found, using the scene default");
                Some(default_camera)
            }
        },
        None => Some(default_camera),
    };

    let concrete = Arc::new(Mutex::new(SoftwareBackend::with_frame(
        settings.frame_descriptor(),
    )));
    let sink = Arc::new(FrameAccumulator::new(settings.width, settings.height));
    let mut session = TranslationSession::new(concrete.clone());
    let mut controller = RenderController::new(concrete.clone(), sink.clone());

    session.set_resolution(settings.width, settings.height)?;
    log::info!(
        "starting render session at {}x{}",
        settings.width,
        settings.height
    );
    controller.start_async(|| session.translate_scene(&registry, &scene, active_camera))?;

    if args.pause {
        controller.pause();
        log::info!("render paused");
        thread::sleep(Duration::from_millis(250));
        controller.resume();
        log::info!("render resumed");
    }

    if !wait_for_frame(&sink, Duration::from_secs(30)) {
        controller.destroy_scene();
        return Err("render did not complete in time".into());
    }

    if args.ipr {
        log::info!("applying incremental edit: moving heroShape");
        controller.begin_scene_update();
        scene.set_world_matrix(hero, Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0)));
        registry.patch_transform(&scene, hero);
        if let Some(obj) = registry.get(hero) {
            let obj = obj.clone();
            session.translate_shape(&obj)?;
            session.translate_transform(hero, hero, &obj.transform_samples[0])?;
        }
        controller.end_scene_update();

        if !wait_for_frame(&sink, Duration::from_secs(30)) {
            controller.destroy_scene();
            return Err("re-render did not complete in time".into());
        }
    }

    controller.stop_async();
    controller.destroy_scene();

    let (width, height) = sink.dimensions();
    let pixels = sink.snapshot();
    let image = image::RgbaImage::from_raw(width, height, pixels)
        .ok_or("frame buffer size mismatch")?;
    image.save(&args.output)?;
    log::info!("wrote {}", args.output.display());
    Ok(())
}
