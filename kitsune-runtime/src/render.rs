use glam::Mat4;
use kitsune_wgpu::{
    FrameDesc, GpuMesh, GpuObject, GpuTexture, Handle, MaterialParams, RenderError, WgpuBackend,
};

use crate::actor::Actor;
use crate::config::StageConfig;
use crate::session::Session;
use crate::stage::{actor_material, clear_color, floor_material, floor_mesh, lighting_desc};

/// GPU resources owned by the uploaded actor.
struct ActorResources {
    object: Handle<GpuObject>,
    mesh: Handle<GpuMesh>,
    texture: Option<Handle<GpuTexture>>,
}

/// Keeps the GPU side of a [`Session`] in sync: the floor is uploaded up
/// front, each actor on the first frame after it appears in the session.
pub struct StageRenderer {
    backend: WgpuBackend,
    floor: Handle<GpuObject>,
    floor_material: MaterialParams,
    actor: Option<ActorResources>,
    /// Actor generation the GPU side reflects, set even when the upload failed.
    uploaded_generation: Option<u64>,
}

/// True when the session holds an actor the renderer has not tried yet.
fn needs_upload(uploaded: Option<u64>, current: u64) -> bool {
    uploaded != Some(current)
}

impl StageRenderer {
    pub fn new(mut backend: WgpuBackend, config: &StageConfig) -> Result<Self, RenderError> {
        let (vertices, indices) = floor_mesh(config.floor.width, config.floor.depth);
        let mesh = backend.upload_mesh(&vertices, &indices);
        let floor = backend.create_object(mesh, None, 1)?;
        Ok(Self {
            backend,
            floor,
            floor_material: floor_material(&config.floor),
            actor: None,
            uploaded_generation: None,
        })
    }

    /// Resize the surface to physical pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
    }

    fn release_actor(&mut self) {
        if let Some(old) = self.actor.take() {
            self.backend.destroy_object(old.object);
            self.backend.destroy_mesh(old.mesh);
            if let Some(texture) = old.texture {
                self.backend.destroy_texture(texture);
            }
        }
    }

    /// Upload `actor`'s mesh and texture. Partial uploads are freed on error.
    fn upload_actor(&mut self, actor: &Actor) -> Result<Option<ActorResources>, RenderError> {
        let Some(mesh) = actor.model().mesh.as_ref() else {
            log::warn!("actor has no mesh, nothing to draw");
            return Ok(None);
        };
        let gpu_mesh = self.backend.upload_mesh(&mesh.vertices, &mesh.indices);
        let texture = match &mesh.texture {
            Some(t) => {
                let uploaded = self
                    .backend
                    .upload_texture(&t.pixels, t.width, t.height, t.channels);
                match uploaded {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        self.backend.destroy_mesh(gpu_mesh);
                        return Err(e);
                    }
                }
            }
            None => None,
        };
        let object = match self.backend.create_object(gpu_mesh, texture, actor.palette().len()) {
            Ok(object) => object,
            Err(e) => {
                self.backend.destroy_mesh(gpu_mesh);
                if let Some(texture) = texture {
                    self.backend.destroy_texture(texture);
                }
                return Err(e);
            }
        };
        log::info!(
            "uploaded actor: {} vertices, {} joints",
            mesh.vertices.len(),
            actor.palette().len()
        );
        Ok(Some(ActorResources {
            object,
            mesh: gpu_mesh,
            texture,
        }))
    }

    /// Draw the current state of `session`.
    pub fn render(&mut self, session: &Session) -> Result<(), RenderError> {
        let config = session.config();

        self.backend.update_object(self.floor, Mat4::IDENTITY, &self.floor_material, &[]);
        let mut objects = vec![self.floor];

        if let Some(actor) = session.actor() {
            let generation = session.actor_generation();
            if needs_upload(self.uploaded_generation, generation) {
                self.release_actor();
                self.uploaded_generation = Some(generation);
                match self.upload_actor(actor) {
                    Ok(resources) => self.actor = resources,
                    Err(e) => log::error!("actor upload failed, drawing without it: {e}"),
                }
            }
            if let (Some(resources), Some(mesh)) = (&self.actor, actor.model().mesh.as_ref()) {
                let material = actor_material(mesh, config.actor.cast_shadow);
                self.backend.update_object(
                    resources.object,
                    actor.mesh_matrix(),
                    &material,
                    actor.palette(),
                );
                objects.push(resources.object);
            }
        }

        let camera = session.camera();
        self.backend.render(&FrameDesc {
            view_proj: camera.view_proj(),
            camera_position: camera.position,
            lighting: lighting_desc(&config.lighting),
            clear_color: clear_color(config.clear_color),
            objects: &objects,
        })
    }
}
