use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    /// Point the camera looks at.
    pub look_at: Vec3,
}

impl PerspectiveCamera {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            fov_degrees: config.fov_degrees,
            aspect,
            near: config.near,
            far: config.far,
            position: Vec3::from(config.position),
            look_at: Vec3::from(config.target),
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Camera-space right and up axes in world space.
    fn basis(&self) -> (Vec3, Vec3) {
        let forward = (self.look_at - self.position).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let up = right.cross(forward);
        (right, up)
    }
}

/// Drawing-buffer geometry of the canvas or window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// CSS / logical pixels.
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
    pub max_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
            max_pixel_ratio,
        }
    }

    /// Device pixel ratio clamped to `max_pixel_ratio`.
    pub fn pixel_ratio(&self) -> f64 {
        let dpr = if self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };
        dpr.min(self.max_pixel_ratio)
    }

    /// Physical drawing-buffer size, never zero.
    pub fn buffer_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        let scale = |v: u32| ((v as f64 * ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    None,
    Rotate,
    Pan,
}

/// Spherical coordinates around +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Orbit, dolly and pan around a target with optional inertia.
///
/// Pointer input accumulates deltas; [`OrbitControls::update`] applies them to
/// a camera once per frame. With damping on, each update applies
/// `damping_factor` of the pending motion and keeps the rest for later frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
    drag: DragState,
    last_pointer: Vec2,
}

impl OrbitControls {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            target: Vec3::from(config.target),
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            drag: DragState::None,
            last_pointer: Vec2::ZERO,
        }
    }

    pub fn pointer_down(&mut self, button: PointerButton, x: f32, y: f32) {
        self.drag = match button {
            PointerButton::Primary => DragState::Rotate,
            PointerButton::Secondary => DragState::Pan,
            PointerButton::Middle => DragState::None,
        };
        self.last_pointer = Vec2::new(x, y);
    }

    /// Pointer moved to (`x`, `y`) in logical pixels. `viewport_height` scales
    /// the gesture so a full-height drag is one full turn.
    pub fn pointer_move(&mut self, camera: &PerspectiveCamera, x: f32, y: f32, viewport_height: f32) {
        let pointer = Vec2::new(x, y);
        let delta = pointer - self.last_pointer;
        self.last_pointer = pointer;
        let height = viewport_height.max(1.0);

        match self.drag {
            DragState::None => {}
            DragState::Rotate => {
                self.rotate_left(2.0 * PI * delta.x / height * self.rotate_speed);
                self.rotate_up(2.0 * PI * delta.y / height * self.rotate_speed);
            }
            DragState::Pan => self.pan(camera, delta * self.pan_speed, height),
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::None;
    }

    /// Wheel scrolled by `delta_y`. Negative moves closer.
    pub fn wheel(&mut self, delta_y: f32) {
        let zoom = 0.95f32.powf(self.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= zoom;
        } else if delta_y > 0.0 {
            self.scale /= zoom;
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    fn pan(&mut self, camera: &PerspectiveCamera, delta: Vec2, height: f32) {
        let distance = (camera.position - self.target).length()
            * (camera.fov_degrees.to_radians() / 2.0).tan();
        let (right, up) = camera.basis();
        self.pan_offset -= right * (2.0 * delta.x * distance / height);
        self.pan_offset += up * (2.0 * delta.y * distance / height);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != DragState::None
    }

    /// Apply pending motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta_theta * factor;
        spherical.phi += self.delta_phi * factor;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(1e-6, PI - 1e-6);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * factor;
        camera.position = self.target + spherical.to_offset();
        camera.look_at = self.target;

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > 1e-8
    }
}
