use std::collections::HashSet;

use anyhow::Context;
use glam::{Mat3, Vec2, Vec3, Vec4};

use sim_usd_export::asset_pipeline::gltf_import::import_meshes;
use sim_usd_export::asset_pipeline::MeshAssetArena;
use sim_usd_export::geometry::shapes::capsule_parts;
use sim_usd_export::geometry::{GeometrySlice, ShapeDescriptor};
use sim_usd_export::materials::VisualAttributes;
use sim_usd_export::objects::ObjectPose;
use sim_usd_export::session::{ExportSession, ObjectDescriptor, ObjectId};
use sim_usd_export::stage::make_valid_identifier;

use crate::cli::Cli;

const BLINK_PERIOD: u32 = 10;

fn pyramid() -> GeometrySlice {
    GeometrySlice {
        vertices: vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
            Vec3::new(0.0, 0.0, 0.75),
        ],
        faces: vec![
            [0, 2, 1],
            [0, 3, 2],
            [0, 1, 4],
            [1, 2, 4],
            [2, 3, 4],
            [3, 0, 4],
        ],
        uv_coords: vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y, Vec2::splat(0.5)],
        face_uv_indices: vec![0, 2, 1, 0, 3, 2, 0, 1, 4, 1, 2, 4, 2, 3, 4, 3, 0, 4],
    }
}

/// Names of imported meshes, made into unique prim names.
fn unique_names(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .map(|name| {
            let base = make_valid_identifier(&name);
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            candidate
        })
        .collect()
}

pub struct DemoState {
    pub session: ExportSession,
    crate_box: ObjectId,
    beacon: ObjectId,
    rope: ObjectId,
    meshes: Vec<ObjectId>,
}

impl DemoState {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let mut assets = vec![("pyramid".to_string(), pyramid())];

        if let Some(path) = &cli.gltf {
            let imported = import_meshes(path)?;
            let names = unique_names(imported.iter().map(|mesh| format!("gltf_{}", mesh.name)));
            assets.extend(names.into_iter().zip(imported.into_iter().map(|mesh| mesh.geometry)));
        }

        let geometries: Vec<GeometrySlice> =
            assets.iter().map(|(_, geometry)| geometry.clone()).collect();
        let arena = MeshAssetArena::bake(&geometries).context("Failed to bake mesh assets")?;

        let mut session = ExportSession::new(cli.export_config(), arena)?;

        let crate_box = session.add_object(
            &ObjectDescriptor::primitive(
                "crate",
                ShapeDescriptor::Box {
                    width: 2.0,
                    height: 1.0,
                    depth: 1.0,
                },
            )
            .with_visual(VisualAttributes {
                texture_repeat: Vec2::splat(2.0),
                texture_uniform: true,
                ..VisualAttributes::textured("textures/crate.png")
            }),
        )?;

        let beacon = session.add_object(
            &ObjectDescriptor::primitive("beacon", ShapeDescriptor::Sphere { radius: 0.25 })
                .with_visual(VisualAttributes::solid(Vec4::new(1.0, 0.2, 0.1, 1.0))),
        )?;

        let rope = session.add_object(
            &ObjectDescriptor::composite("rope", capsule_parts(0.05, 0.5))
                .with_visual(VisualAttributes::solid(Vec4::new(0.8, 0.7, 0.5, 1.0))),
        )?;

        let meshes = assets
            .iter()
            .enumerate()
            .map(|(asset_id, (name, _))| session.add_object(&ObjectDescriptor::mesh(name, asset_id)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            session,
            crate_box,
            beacon,
            rope,
            meshes,
        })
    }

    pub fn update(&mut self, frame: u32) -> anyhow::Result<()> {
        let time = frame as f32 / self.session.config().frames_per_second as f32;

        let spin = Mat3::from_rotation_z(time * 0.5);
        self.session.update_object(
            self.crate_box,
            &ObjectPose::new(Vec3::new(0.0, 0.0, 0.5), spin),
            frame,
        )?;

        let blinking = (frame / BLINK_PERIOD) % 2 == 0;
        self.session.update_object(
            self.beacon,
            &ObjectPose::new(Vec3::new(2.0, 0.0, 1.0 + (time * 2.0).sin() * 0.25), Mat3::IDENTITY)
                .with_visibility(blinking),
            frame,
        )?;

        let stretch = 1.0 + 0.5 * (time * 1.5).sin();
        self.session.update_object(
            self.rope,
            &ObjectPose::new(Vec3::new(-2.0, 0.0, 1.0), Mat3::IDENTITY)
                .with_scale(Vec3::new(1.0, 1.0, stretch)),
            frame,
        )?;

        for (index, mesh) in self.meshes.iter().enumerate() {
            let offset = Vec3::new(index as f32 * 1.5, 3.0, 0.0);
            self.session
                .update_object(*mesh, &ObjectPose::new(offset, Mat3::from_rotation_z(time)), frame)?;
        }

        Ok(())
    }
}

pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut demo = DemoState::new(cli)?;

    for frame in 0..cli.frames {
        demo.update(frame)
            .with_context(|| format!("Failed to export frame {frame}"))?;
    }

    demo.session
        .save(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    log::info!(
        "Exported {} objects over {} frames",
        demo.session.object_count(),
        cli.frames
    );

    Ok(())
}
