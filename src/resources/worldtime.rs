use bevy_ecs::prelude::Resource;

/// Simulation clock of a level world, advanced once per physics tick.
#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}
