use sieve::{component, Aspect, AspectBuilder, Entity, EntityProcessor, ProcessingSystem, World};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default)]
pub struct Counter(i32);

#[derive(Debug, Clone, Copy, Default)]
pub struct Frozen;

component!(Counter, Frozen);

struct Increment;

impl EntityProcessor for Increment {
    fn aspect(&self, builder: AspectBuilder<'_>) -> Aspect {
        builder.all::<Counter>().exclude::<Frozen>().build()
    }

    fn inserted(&mut self, _world: &mut World, entity: Entity) {
        tracing::info!(%entity, "counting");
    }

    fn removed(&mut self, _world: &mut World, entity: Entity) {
        tracing::info!(%entity, "stopped counting");
    }

    fn process(&mut self, world: &mut World, entity: Entity) {
        if let Some(counter) = world.component_mut::<Counter>(entity) {
            counter.0 += 1;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut world = World::new();
    world.set_system(ProcessingSystem::new(Increment));
    world.initialize()?;

    let entity = world.create_named_entity("counter");
    world.entity_mut(entity)?
        .with(Counter(3))?
        .add_to_world();

    for _ in 0..3 {
        world.process()?;
    }
    println!("entity: {}", entity);
    println!("counter: {:?}", world.component::<Counter>(entity));

    world.add_component(entity, Frozen)?;
    world.changed_entity(entity);
    world.process()?;
    println!("frozen counter: {:?}", world.component::<Counter>(entity));

    let mut components = sieve::IndexedBag::new();
    world.components_for(entity, &mut components)?;
    for component in components.iter() {
        println!("component: {:?}", component);
    }

    world.delete_entity(entity);
    world.process()?;
    println!("alive after delete: {}", world.is_alive(entity));
    Ok(())
}
