use std::collections::HashMap;
use std::io::Write;

use sieve::{
    component,
    Aspect,
    AspectBuilder,
    ComponentMapper,
    Entity,
    EntityProcessor,
    IntervalSystem,
    ProcessingSystem,
    Result,
    World,
};
use tracing_subscriber::EnvFilter;

const G: f32 = 10.0;
const TIME_STEP: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct Position(f32, f32);

#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity(f32, f32);

#[derive(Debug, Clone, Copy, Default)]
pub struct Mass(f32);

component!(Position, Velocity, Mass);

#[derive(Default)]
struct ApplyAcceleration {
    members: Vec<Entity>,
    bodies: Vec<(Entity, Position, f32)>,
    positions: Option<ComponentMapper<Position>>,
    masses: Option<ComponentMapper<Mass>>,
}

impl EntityProcessor for ApplyAcceleration {
    fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect {
        builder.all::<Position>().all::<Velocity>().all::<Mass>().build()
    }

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.positions = Some(world.mapper());
        self.masses = Some(world.mapper());
        Ok(())
    }

    fn inserted(&mut self, _world: &mut World, entity: Entity) {
        self.members.push(entity);
    }

    fn removed(&mut self, _world: &mut World, entity: Entity) {
        self.members.retain(|e| *e != entity);
    }

    fn begin(&mut self, world: &mut World) {
        let (positions, masses) = match (self.positions, self.masses) {
            (Some(p), Some(m)) => (p, m),
            _ => return,
        };

        // Snapshot every body so the whole frame sees the same positions.
        self.bodies.clear();
        for entity in self.members.iter().copied() {
            if let (Some(p), Some(m)) = (positions.get(world, entity), masses.get(world, entity)) {
                self.bodies.push((entity, *p, m.0));
            }
        }
    }

    fn process(&mut self, world: &mut World, entity: Entity) {
        let Position(x_a, y_a) = match world.component::<Position>(entity) {
            Some(p) => *p,
            None => return,
        };

        let mut merged = false;
        let (mut vx_a, mut vy_a) = (0f32, 0f32);
        for (id_b, Position(x_b, y_b), m_b) in self.bodies.iter().copied() {
            if id_b == entity || m_b < 0.00001 {
                continue;
            }

            let dx = x_b - x_a;
            let dy = y_b - y_a;
            let r2 = dx * dx + dy * dy;

            // Bodies are overlapped!
            if r2 < 0.0005 {
                merged = true;
                continue;
            }

            let a = (G * m_b) / r2;
            let r = r2.sqrt();
            vx_a += TIME_STEP * ((dx * a) / r);
            vy_a += TIME_STEP * ((dy * a) / r);
        }

        if merged {
            if let Some(mass) = world.component_mut::<Mass>(entity) {
                mass.0 = 0.0;
            }
        }
        if let Some(velocity) = world.component_mut::<Velocity>(entity) {
            *velocity = Velocity(vx_a, vy_a);
        }
    }
}

struct ApplyVelocity;

impl EntityProcessor for ApplyVelocity {
    fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect {
        builder.all::<Position>().all::<Velocity>().build()
    }

    fn process(&mut self, world: &mut World, entity: Entity) {
        let Velocity(vx, vy) = match world.component::<Velocity>(entity) {
            Some(v) => *v,
            None => return,
        };
        if let Some(Position(x, y)) = world.component_mut::<Position>(entity) {
            *x += TIME_STEP * vx;
            *y += TIME_STEP * vy;
        }
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut world = World::new();
    world.set_system(IntervalSystem::new(TIME_STEP, ApplyAcceleration::default()));
    world.set_system(ProcessingSystem::new(ApplyVelocity));
    world.initialize()?;

    // Populate the world!
    const SQRT_NUM_ENTITIES: usize = 2;
    const SPREAD: f32 = 2.0 / ((SQRT_NUM_ENTITIES - 1) as f32);

    for x in 0..SQRT_NUM_ENTITIES {
        for y in 0..SQRT_NUM_ENTITIES {
            let x = ((x as f32) * SPREAD) - 1.0;
            let y = ((y as f32) * SPREAD) - 1.0;

            let vx = y * 0.003;
            let vy = -x * 0.003;

            let body = world.create_entity();
            world.entity_mut(body)?
                .with(Mass(0.00001))?
                .with(Position(x, y))?
                .with(Velocity(vx, vy))?
                .add_to_world();
        }
    }

    const SIZE: (i32, i32) = (500, 500);
    const OFFSET: (f32, f32) = (250.0, 250.0);
    const SCALE: (f32, f32) = (200.0, 200.0);
    const NUM_ITER: usize = 100;

    let mut dest = std::io::stdout();
    let mut last_positions = HashMap::new();

    writeln!(&mut dest, "<?xml version=\"1.0\" standalone=\"no\"?>")?;
    writeln!(&mut dest, "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.0//EN\" \"http://www.w3.org/TR/2001/REC-SVG-20010904/DTD/svg10.dtd\">")?;
    write!(&mut dest, "<svg xmlns=\"http://www.w3.org/2000/svg\" height=\"{}\" width=\"{}\">", SIZE.0, SIZE.1)?;
    write!(&mut dest, "<rect width=\"100%\" height=\"100%\" fill=\"black\"/>")?;

    world.set_delta(TIME_STEP);
    for _ in 0..NUM_ITER {
        for _ in 0..10usize {
            world.process()?;
        }

        // Render result!
        let bodies: Vec<Entity> = world.active_entities::<ProcessingSystem<ApplyVelocity>>()
            .map(|actives| actives.iter().copied().collect())
            .unwrap_or_default();
        for body in bodies {
            let (Position(x, y), Velocity(vx, vy)) = match (
                world.component::<Position>(body),
                world.component::<Velocity>(body),
            ) {
                (Some(p), Some(v)) => (*p, *v),
                _ => continue,
            };
            let v2 = (vx * vx + vy * vy).sqrt();
            let a = 1.0 - (v2 / 0.03).max(0.0).min(0.7);

            if let Some((lx, ly)) = last_positions.get(&body) {
                let x1 = lx * SCALE.0 + OFFSET.0;
                let y1 = ly * SCALE.1 + OFFSET.1;
                let x2 = x * SCALE.0 + OFFSET.0;
                let y2 = y * SCALE.1 + OFFSET.1;

                write!(&mut dest,
                       "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" style=\"stroke:rgba(255,0,0,{});stroke-width:1\" />",
                       x1, y1, x2, y2, a)?;
            }

            last_positions.insert(body, (x, y));
        }
    }

    write!(&mut dest, "</svg>")?;
    Ok(())
}
