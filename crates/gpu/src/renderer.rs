use foundation::math::Mat4;
use scene::components::{Material, RenderLayer, Shape3D, Transform};
use scene::world::World;

use crate::mesh::MarkerInstance;

/// One draw, in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RenderCommand {
    /// A globe shell. The radius is folded into `model`.
    Sphere {
        layer: RenderLayer,
        model: Mat4,
        material: Material,
    },
    /// A batch of marker boxes; indexes into [`RenderFrame::markers`].
    Markers { first: u32, count: u32 },
    Stars { model: Mat4, count: u32 },
}

impl RenderCommand {
    pub fn layer(&self) -> RenderLayer {
        match self {
            RenderCommand::Sphere { layer, .. } => *layer,
            RenderCommand::Markers { .. } => RenderLayer::Markers,
            RenderCommand::Stars { .. } => RenderLayer::Stars,
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderFrame {
    /// Back-to-front by layer; stable within a layer.
    pub commands: Vec<RenderCommand>,
    pub markers: Vec<MarkerInstance>,
}

impl RenderFrame {
    pub fn sphere_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Sphere { .. }))
            .count()
    }
}

pub struct Renderer;

impl Renderer {
    /// Snapshot every visible drawable in `world` into draw order.
    pub fn collect(world: &World) -> RenderFrame {
        let mut frame = RenderFrame::default();
        for (_, transform, drawable) in world.drawables_3d() {
            match drawable.shape {
                Shape3D::Sphere { radius } => {
                    let scaled = Transform {
                        scale: transform.scale * radius,
                        ..transform
                    };
                    frame.commands.push(RenderCommand::Sphere {
                        layer: drawable.layer,
                        model: scaled.matrix(),
                        material: drawable.material,
                    });
                }
                Shape3D::Box { size } => {
                    let sized = Transform {
                        scale: transform.scale.mul_elements(size),
                        ..transform
                    };
                    frame.markers.push(MarkerInstance {
                        model: sized.matrix(),
                        color: material_rgba(&drawable.material),
                    });
                }
                Shape3D::Points { count } => {
                    frame.commands.push(RenderCommand::Stars {
                        model: transform.matrix(),
                        count,
                    });
                }
            }
        }

        if !frame.markers.is_empty() {
            frame.commands.push(RenderCommand::Markers {
                first: 0,
                count: frame.markers.len() as u32,
            });
        }
        frame.commands.sort_by_key(RenderCommand::layer);
        tracing::trace!(
            commands = frame.commands.len(),
            markers = frame.markers.len(),
            "render frame collected"
        );
        frame
    }
}

pub fn material_rgba(material: &Material) -> [f32; 4] {
    [
        material.color.r,
        material.color.g,
        material.color.b,
        material.opacity,
    ]
}
