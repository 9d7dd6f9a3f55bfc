use glam::Vec3;

use crate::math::hex_to_rgb;

/// Flat square floor centred on the origin
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPlane {
    pub size: f32,
    pub color: [f32; 3],
    pub receive_shadow: bool,
    pub depth_write: bool,
}

/// Square line grid on the floor
#[derive(Debug, Clone, PartialEq)]
pub struct GridHelper {
    pub size: f32,
    pub divisions: u32,
    pub color: [f32; 3],
    pub opacity: f32,
}

impl GridHelper {
    /// Line segments: `divisions + 1` along each axis
    pub fn segments(&self) -> Vec<(Vec3, Vec3)> {
        let half = self.size * 0.5;
        let step = self.size / self.divisions.max(1) as f32;

        (0..=self.divisions.max(1))
            .flat_map(|i| {
                let k = -half + i as f32 * step;
                [
                    (Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k)),
                    (Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half)),
                ]
            })
            .collect()
    }
}

/// Sky/ground gradient light
#[derive(Debug, Clone, PartialEq)]
pub struct HemisphereLight {
    pub sky_color: [f32; 3],
    pub ground_color: [f32; 3],
    pub intensity: f32,
    pub position: Vec3,
}

/// Parallel light shining from `position` towards the origin
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vec3,
    pub cast_shadow: bool,
}

impl DirectionalLight {
    /// Unit vector pointing from the origin towards the light
    pub fn direction(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StaticEntity {
    Ground(GroundPlane),
    Grid(GridHelper),
    Hemisphere(HemisphereLight),
    Directional(DirectionalLight),
}

/// Floor, grid and the two-light rig of the stock diorama
pub fn default_entities() -> Vec<StaticEntity> {
    vec![
        StaticEntity::Hemisphere(HemisphereLight {
            sky_color: hex_to_rgb(0xffffff),
            ground_color: hex_to_rgb(0x444444),
            intensity: 5.0,
            position: Vec3::new(0.0, 200.0, 0.0),
        }),
        StaticEntity::Directional(DirectionalLight {
            color: hex_to_rgb(0xffffff),
            intensity: 5.0,
            position: Vec3::new(0.0, 200.0, 100.0),
            cast_shadow: true,
        }),
        StaticEntity::Ground(GroundPlane {
            size: 2000.0,
            color: hex_to_rgb(0x999999),
            receive_shadow: true,
            depth_write: false,
        }),
        StaticEntity::Grid(GridHelper {
            size: 2000.0,
            divisions: 20,
            color: hex_to_rgb(0x000000),
            opacity: 0.2,
        }),
    ]
}
