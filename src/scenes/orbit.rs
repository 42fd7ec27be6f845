use std::f32::consts::TAU;

use glam::{Quat, Vec3};

use crate::core::{FrameRequest, TileRenderer, TileRequest};

const BIAS: f32 = 1e-4;
const MAX_BOUNCES: u32 = 1;

/// Downward tilt applied on top of the user rotation
const CAMERA_TILT: f32 = 0.9;
const CAMERA_ORIGIN: Vec3 = Vec3::new(0.0, 2.5, 3.0);

const SINGLE_SAMPLE: [(f32, f32); 1] = [(0.0, 0.0)];
const FIVE_SAMPLES: [(f32, f32); 5] = [
    (0.0, 0.0),
    (0.33, 0.33),
    (-0.33, 0.33),
    (-0.33, -0.33),
    (0.33, -0.33),
];

#[derive(Debug, Clone, Copy)]
struct Material {
    color: Vec3,
    ambient: f32,
    diffuse: f32,
    specular: f32,
    shininess: f32,
    reflective: f32,
}

const MATTE_BLUE: Material = Material {
    color: Vec3::new(0.0, 0.0, 1.0),
    ambient: 0.05,
    diffuse: 0.75,
    specular: 0.2,
    shininess: 4.0,
    reflective: 0.0,
};

const MIRROR_GREEN: Material = Material {
    color: Vec3::new(0.0, 1.0, 0.0),
    ambient: 0.2,
    diffuse: 0.4,
    specular: 0.0,
    shininess: 4.0,
    reflective: 0.4,
};

const BOARD_WHITE: Material = Material {
    color: Vec3::ONE,
    ambient: 0.4,
    diffuse: 0.3,
    specular: 0.3,
    shininess: 4.0,
    reflective: 0.0,
};

#[derive(Debug, Clone, Copy)]
struct Hit {
    t: f32,
    point: Vec3,
    normal: Vec3,
    material: Material,
}

#[derive(Debug, Clone, Copy)]
struct Sphere {
    center: Vec3,
    radius: f32,
    material: Material,
}

impl Sphere {
    fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<Hit> {
        let oc = origin - self.center;
        let a = dir.dot(dir);
        let half_b = oc.dot(dir);
        let c = oc.dot(oc) - self.radius * self.radius;

        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let near = (-half_b - sqrt_d) / a;
        let far = (-half_b + sqrt_d) / a;
        let t = if near > BIAS {
            near
        } else if far > BIAS {
            far
        } else {
            return None;
        };

        let point = origin + dir * t;
        Some(Hit {
            t,
            point,
            normal: (point - self.center).normalize(),
            material: self.material,
        })
    }
}

/// Disc of checker squares lying in a plane of constant z
#[derive(Debug, Clone, Copy)]
struct Checkerboard {
    center: Vec3,
    radius: f32,
    cell: f32,
    material: Material,
}

impl Checkerboard {
    fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<Hit> {
        let t = (self.center.z - origin.z) / dir.z;
        if !t.is_finite() || t <= BIAS {
            return None;
        }

        let point = origin + dir * t;
        if point.distance(self.center) > self.radius {
            return None;
        }

        let parity = (point.x / self.cell).floor() as i32 + (point.y / self.cell).floor() as i32;
        let color = if parity.rem_euclid(2) == 0 {
            Vec3::ZERO
        } else {
            self.material.color
        };
        let facing = if origin.z > self.center.z { 1.0 } else { -1.0 };

        Some(Hit {
            t,
            point,
            normal: Vec3::new(0.0, 0.0, facing),
            material: Material {
                color,
                ..self.material
            },
        })
    }
}

/// Three mirrored spheres circling a blue one between two checkerboards
#[derive(Debug, Clone)]
pub struct OrbitScene {
    spheres: Vec<Sphere>,
    boards: Vec<Checkerboard>,
    light: Vec3,
}

impl OrbitScene {
    /// Scene state `seconds` into the animation
    pub fn at_time(seconds: f32) -> Self {
        let t = seconds / 2.0;
        let u = (0.5 * t + 1.5).sin();
        let light = Vec3::new(5.0 * u.cos(), 4.0 * u.sin(), 1.8 * u);

        let mut spheres = vec![Sphere {
            center: Vec3::new(0.0, 0.0, 5.0),
            radius: 1.0,
            material: MATTE_BLUE,
        }];
        spheres.extend((0..3).map(|i| {
            let angle = t + i as f32 * TAU / 3.0;
            Sphere {
                center: Vec3::new(1.15 * angle.cos(), 1.15 * angle.sin(), 4.1),
                radius: 0.3,
                material: MIRROR_GREEN,
            }
        }));

        let boards = [5.0, 0.0]
            .into_iter()
            .map(|z| Checkerboard {
                center: Vec3::new(0.0, 0.0, z),
                radius: 2.0,
                cell: 0.25,
                material: BOARD_WHITE,
            })
            .collect();

        Self {
            spheres,
            boards,
            light,
        }
    }

    fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<Hit> {
        let sphere_hits = self.spheres.iter().filter_map(|s| s.intersect(origin, dir));
        let board_hits = self.boards.iter().filter_map(|b| b.intersect(origin, dir));
        sphere_hits
            .chain(board_hits)
            .min_by(|a, b| a.t.total_cmp(&b.t))
    }

    fn in_shadow(&self, point: Vec3) -> bool {
        let to_light = self.light - point;
        let distance = to_light.length();
        self.intersect(point, to_light / distance)
            .is_some_and(|hit| hit.t + BIAS < distance)
    }

    /// Linear RGB for one ray, black on a miss
    fn shade(&self, origin: Vec3, dir: Vec3, bounces: u32) -> Vec3 {
        let Some(hit) = self.intersect(origin, dir) else {
            return Vec3::ZERO;
        };
        let material = hit.material;

        let mut intensity = 0.0;
        let mut highlight = 0.0;
        if !self.in_shadow(hit.point) {
            let to_light = (self.light - hit.point).normalize();
            intensity = hit.normal.dot(to_light).clamp(0.0, 1.0);

            let to_eye = (origin - hit.point).normalize();
            let mirrored = hit.normal * (2.0 * hit.normal.dot(to_light)) - to_light;
            highlight = mirrored.dot(to_eye).max(0.0).powf(material.shininess);
        }

        let mut color = material.color * (material.diffuse * intensity + material.ambient)
            + Vec3::splat(material.specular * highlight);

        if material.reflective > 1e-5 && bounces > 0 {
            let incoming = -dir.normalize();
            let reflected = hit.normal * (2.0 * hit.normal.dot(incoming)) - incoming;
            color += self.shade(hit.point, reflected, bounces - 1) * material.reflective;
        }
        color
    }
}

/// Pinhole camera spanning the frame with `tan(fov / 2)` on its longer axis
#[derive(Debug, Clone, Copy)]
struct ViewCamera {
    origin: Vec3,
    forward: Vec3,
    right: Vec3,
    down: Vec3,
    half_width: f32,
    half_height: f32,
}

impl ViewCamera {
    fn new(frame: &FrameRequest) -> Self {
        let [rx, ry, rz] = frame.camera_rotation;
        let rotation = Quat::from_rotation_x(CAMERA_TILT)
            * Quat::from_rotation_z(rz)
            * Quat::from_rotation_y(ry)
            * Quat::from_rotation_x(rx);

        let half_width = frame.width as f32 / 2.0;
        let half_height = frame.height as f32 / 2.0;
        let spread = (frame.field_of_view / 2.0).tan();
        let (x_scale, y_scale) = if frame.width > frame.height {
            (spread, spread * half_height / half_width)
        } else {
            (spread * half_width / half_height, spread)
        };

        let right = rotation * Vec3::X;
        let down = rotation * Vec3::Y;
        Self {
            origin: CAMERA_ORIGIN + Vec3::from_array(frame.camera_position),
            forward: right.cross(down),
            right: right * x_scale,
            down: down * y_scale,
            half_width,
            half_height,
        }
    }

    /// Ray direction through a sub-pixel position
    fn direction(&self, x: f32, y: f32) -> Vec3 {
        let sx = (x - self.half_width) / self.half_width;
        let sy = (y - self.half_height) / self.half_height;
        self.forward + self.right * sx + self.down * sy
    }
}

fn sample_offsets(supersampling: bool) -> &'static [(f32, f32)] {
    if supersampling {
        &FIVE_SAMPLES
    } else {
        &SINGLE_SAMPLE
    }
}

/// Tile renderer for [`OrbitScene`]
///
/// Returns a full-frame buffer with only the requested region filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrbitRenderer;

impl TileRenderer for OrbitRenderer {
    fn render_tile(&self, request: &TileRequest) -> Vec<u8> {
        let frame = &request.frame;
        let mut pixels = vec![0u8; frame.size().byte_len()];
        if !request.region.fits_within(frame.width, frame.height) {
            return pixels;
        }

        let scene = OrbitScene::at_time(frame.animation_time);
        let camera = ViewCamera::new(frame);
        let samples = sample_offsets(frame.supersampling);
        let row_stride = frame.width as usize * 4;

        for y in request.region.start_y..request.region.end_y {
            for x in request.region.start_x..request.region.end_x {
                let total = samples.iter().fold(Vec3::ZERO, |acc, (dx, dy)| {
                    let dir = camera.direction(x as f32 + dx, y as f32 + dy);
                    acc + scene.shade(camera.origin, dir, MAX_BOUNCES)
                });
                let rgb = (total / samples.len() as f32 * 255.0).clamp(Vec3::ZERO, Vec3::splat(255.0));

                let offset = y as usize * row_stride + x as usize * 4;
                pixels[offset..offset + 4].copy_from_slice(&[rgb.x as u8, rgb.y as u8, rgb.z as u8, 255]);
            }
        }
        pixels
    }
}
