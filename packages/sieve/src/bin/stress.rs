use sieve::{component, Aspect, AspectBuilder, Entity, EntityProcessor, PooledComponent, ProcessingSystem, World};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default)]
pub struct Lifetime(u32);

#[derive(Debug, Default)]
pub struct Payload {
    data: Vec<u8>,
}

component!(Lifetime, Payload);

impl PooledComponent for Payload {
    fn reset(&mut self) {
        self.data.clear();
    }
}

struct Expire;

impl EntityProcessor for Expire {
    fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect {
        builder.all::<Lifetime>().all::<Payload>().build()
    }

    fn process(&mut self, world: &mut World, entity: Entity) {
        let expired = match world.component_mut::<Lifetime>(entity) {
            Some(lifetime) if lifetime.0 == 0 => true,
            Some(lifetime) => {
                lifetime.0 -= 1;
                false
            }
            None => false,
        };

        if expired {
            world.delete_entity(entity);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut world = World::new();
    let payload = world.register_pooled::<Payload>()?;
    world.set_system(ProcessingSystem::new(Expire));
    world.initialize()?;

    for frame in 0..8u32 {
        for idx in 0..512u32 {
            let entity = world.create_entity();
            world.add_component(entity, Lifetime(idx % 12))?;
            world.create_component::<Payload>(entity)?
                .data
                .extend_from_slice(&frame.to_le_bytes());
            world.add_entity(entity);
        }
        world.process()?;
    }

    let entities = world.entities();
    println!("active: {}", entities.active_count());
    println!("created: {}", entities.total_created());
    println!("deleted: {}", entities.total_deleted());
    println!("pooled payloads waiting: {}", world.components().pool().available(&payload));
    Ok(())
}
