//! Startup wiring: component keys, factories and capability lookups.
//!
//! Everything here happens once, before the first host object is built.
//! After [`Bootstrap::new`] returns, the registries are complete and the
//! first chunk or block entity construction freezes them.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result};
use tether_block::{
    ApiLookup, BlockEntityComponents, BlockEntityData, BlockEntityType, BlockId, BlockState,
    World, expose_api, expose_api_for,
};
use tether_chunk::{Chunk, ChunkComponents, ChunkData, ChunkType};
use tether_component::{
    ComponentKey, ComponentRegistry, FactoryResult, HostTypeTable, capability,
};
use tether_math::{BlockPos, ChunkPos, Direction};
use tracing::{debug, info};

use crate::config::AppConfig;

/// Item storage exposed by containers.
pub trait ItemStorage {
    fn slot_count(&self) -> usize;
}

/// Fluid storage exposed by furnaces.
pub trait FluidStorage {
    fn capacity(&self) -> u32;
    fn amount(&self) -> u32;
    /// Insert up to `amount`, returning how much was accepted.
    fn insert(&self, amount: u32) -> u32;
}

#[derive(Debug)]
pub struct Inventory {
    slots: usize,
}

impl ItemStorage for Inventory {
    fn slot_count(&self) -> usize {
        self.slots
    }
}

/// A furnace fuel tank. Lookups hand out [`TankPort`]s sharing its level.
#[derive(Debug)]
pub struct FuelTank {
    capacity: u32,
    amount: Rc<Cell<u32>>,
}

impl FuelTank {
    fn new(capacity: u32) -> Self {
        Self {
            capacity,
            amount: Rc::new(Cell::new(0)),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// A fluid storage view onto this tank.
    #[must_use]
    pub fn port(&self) -> TankPort {
        TankPort {
            capacity: self.capacity,
            amount: Rc::clone(&self.amount),
        }
    }
}

#[derive(Debug)]
pub struct TankPort {
    capacity: u32,
    amount: Rc<Cell<u32>>,
}

impl FluidStorage for TankPort {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn amount(&self) -> u32 {
        self.amount.get()
    }

    fn insert(&self, amount: u32) -> u32 {
        let accepted = amount.min(self.capacity - self.amount.get());
        self.amount.set(self.amount.get() + accepted);
        accepted
    }
}

capability!(Inventory => dyn ItemStorage);

/// Generation state of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkStatus {
    pub generated: bool,
}

/// Keys registered at startup.
#[derive(Debug)]
pub struct Keys {
    pub inventory: ComponentKey<Inventory>,
    pub fuel_tank: ComponentKey<FuelTank>,
    pub chunk_status: ComponentKey<ChunkStatus>,
}

impl Keys {
    fn register(registry: &mut ComponentRegistry) -> Result<Self> {
        Ok(Self {
            inventory: registry.register("tether:inventory")?,
            fuel_tank: registry.register("tether:fuel_tank")?,
            chunk_status: registry.register("tether:chunk_status")?,
        })
    }
}

/// Capability lookups queried by side.
#[derive(Debug)]
pub struct Lookups {
    pub items: ApiLookup<dyn ItemStorage, Direction>,
    pub fluids: ApiLookup<dyn FluidStorage, Direction>,
}

/// Outcome of [`Bootstrap::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub chunks: usize,
    pub generated_chunks: usize,
    pub block_entities: usize,
    pub item_storages: usize,
    pub fluid_storages: usize,
    pub fluid_inserted: u32,
}

/// Fully wired registries and lookups.
#[derive(Debug)]
pub struct Bootstrap {
    pub registry: ComponentRegistry,
    pub keys: Keys,
    pub chunks: ChunkComponents,
    pub block_entities: BlockEntityComponents,
    pub lookups: Lookups,
    config: AppConfig,
}

impl Bootstrap {
    /// Register every key, factory and lookup provider.
    ///
    /// # Errors
    ///
    /// Fails if the hierarchy cannot be loaded or lacks a type a factory is
    /// registered for.
    pub fn new(config: AppConfig) -> Result<Self> {
        let mut registry = ComponentRegistry::new();
        let keys = Keys::register(&mut registry)?;

        let hierarchy = HostTypeTable::from_config(&config.load_hierarchy()?)
            .context("invalid block entity hierarchy")?;
        let block_entities = block_entity_factories(&keys, hierarchy)
            .context("block entity hierarchy must declare the built-in types")?;
        let chunks = chunk_factories(&keys)?;
        let lookups = lookups(&keys)?;

        info!(
            keys = registry.key_count(),
            block_entity_types = block_entities.hierarchy().len(),
            "bootstrap complete"
        );
        Ok(Self {
            registry,
            keys,
            chunks,
            block_entities,
            lookups,
            config,
        })
    }

    /// Create every chunk within the configured radius.
    ///
    /// The origin chunk is a world chunk; the others are still generating.
    ///
    /// # Errors
    ///
    /// Propagates chunk construction failures.
    pub fn create_chunks(&self) -> Result<Vec<Chunk>> {
        let radius = self.config.chunk_radius;
        let mut chunks = Vec::new();
        for x in -radius..=radius {
            for z in -radius..=radius {
                let kind = if x == 0 && z == 0 { ChunkType::WORLD } else { ChunkType::PROTO };
                chunks.push(self.chunks.create_chunk(ChunkPos::new(x, z), kind)?);
            }
        }
        Ok(chunks)
    }

    /// Place the demo blocks and block entities.
    ///
    /// # Errors
    ///
    /// Propagates block entity construction failures.
    pub fn populate(&self, world: &mut World) -> Result<Vec<BlockPos>> {
        let placements = [
            ("chest", BlockEntityType::CHEST),
            ("furnace", BlockEntityType::FURNACE),
            ("blast_furnace", BlockEntityType::BLAST_FURNACE),
        ];
        let mut positions = Vec::with_capacity(placements.len() + 1);
        for (x, (block, kind)) in (0..).zip(placements) {
            let pos = BlockPos::new(x, 64, 0);
            world.set_block(pos, BlockState::new(BlockId::new(block)?));
            world
                .place_block_entity(pos, kind, &self.block_entities)
                .with_context(|| format!("failed to place {block} at {pos}"))?;
            positions.push(pos);
        }
        let stone = BlockPos::new(-1, 64, 0);
        world.set_block(stone, BlockState::new(BlockId::new("stone")?));
        positions.push(stone);
        Ok(positions)
    }

    /// Build chunks and a small world, then query both lookups on every side.
    ///
    /// # Errors
    ///
    /// Propagates construction failures and provider errors.
    pub fn run(&self) -> Result<Summary> {
        let chunks = self.create_chunks()?;
        let generated_chunks = chunks
            .iter()
            .filter(|chunk| self.keys.chunk_status.get(*chunk).is_ok_and(|s| s.generated))
            .count();

        let mut world = World::new();
        let positions = self.populate(&mut world)?;

        let mut summary = Summary {
            chunks: chunks.len(),
            generated_chunks,
            block_entities: world.block_entity_count(),
            ..Summary::default()
        };
        for pos in positions {
            for side in Direction::ALL {
                if let Some(items) = self.lookups.items.find(&world, pos, side)? {
                    debug!(%pos, %side, slots = items.slot_count(), "found item storage");
                    summary.item_storages += 1;
                }
                if let Some(fluids) = self.lookups.fluids.find(&world, pos, side)? {
                    summary.fluid_inserted += fluids.insert(250);
                    debug!(%pos, %side, amount = fluids.amount(), capacity = fluids.capacity(), "filled fluid storage");
                    summary.fluid_storages += 1;
                }
            }
        }
        Ok(summary)
    }
}

fn block_entity_factories(keys: &Keys, hierarchy: HostTypeTable) -> Result<BlockEntityComponents> {
    let mut factories = BlockEntityComponents::with_hierarchy(hierarchy);
    factories.register_for(
        BlockEntityType::LOCKABLE_CONTAINER,
        &keys.inventory,
        |be: &BlockEntityData| -> FactoryResult<Inventory> {
            let slots = if be.kind() == BlockEntityType::CHEST { 27 } else { 3 };
            Ok(Rc::new(Inventory { slots }))
        },
    )?;
    factories.register_for(
        BlockEntityType::ABSTRACT_FURNACE,
        &keys.fuel_tank,
        |_: &BlockEntityData| -> FactoryResult<FuelTank> { Ok(Rc::new(FuelTank::new(1000))) },
    )?;
    factories.decorate_for(
        BlockEntityType::BLAST_FURNACE,
        &keys.fuel_tank,
        |_: &BlockEntityData, tank: Rc<FuelTank>| -> FactoryResult<FuelTank> {
            Ok(Rc::new(FuelTank::new(tank.capacity * 2)))
        },
    )?;
    Ok(factories)
}

fn chunk_factories(keys: &Keys) -> Result<ChunkComponents> {
    let mut chunks = ChunkComponents::new()?;
    chunks.register(&keys.chunk_status, |_: &ChunkData| -> FactoryResult<ChunkStatus> {
        Ok(Rc::new(ChunkStatus { generated: true }))
    })?;
    chunks.register_for(
        ChunkType::PROTO,
        &keys.chunk_status,
        |_: &ChunkData| -> FactoryResult<ChunkStatus> { Ok(Rc::new(ChunkStatus { generated: false })) },
    )?;
    Ok(chunks)
}

fn lookups(keys: &Keys) -> Result<Lookups> {
    let mut items = ApiLookup::<dyn ItemStorage, Direction>::new("tether:item_storage")?;
    expose_api(&keys.inventory, &mut items);

    // Furnaces take fuel from every side but the bottom.
    let mut fluids = ApiLookup::<dyn FluidStorage, Direction>::new("tether:fluid_storage")?;
    expose_api_for(
        &keys.fuel_tank,
        &mut fluids,
        |tank: &FuelTank, side: &Direction| -> Option<Rc<dyn FluidStorage>> {
            (*side != Direction::Down).then(|| Rc::new(tank.port()) as Rc<dyn FluidStorage>)
        },
        &[BlockEntityType::FURNACE, BlockEntityType::BLAST_FURNACE],
    )?;
    Ok(Lookups { items, fluids })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_with_default_hierarchy() {
        let bootstrap = Bootstrap::new(AppConfig::default()).unwrap();
        assert_eq!(bootstrap.registry.key_count(), 3);
        assert!(!bootstrap.block_entities.is_frozen());
    }

    #[test]
    fn test_run_summary() {
        let bootstrap = Bootstrap::new(AppConfig::default().with_chunk_radius(1)).unwrap();
        let summary = bootstrap.run().unwrap();
        assert_eq!(summary.chunks, 9);
        assert_eq!(summary.generated_chunks, 1);
        assert_eq!(summary.block_entities, 3);
        // Chest, furnace and blast furnace on all six sides.
        assert_eq!(summary.item_storages, 18);
        // Both furnaces on five sides each.
        assert_eq!(summary.fluid_storages, 10);
        // 1000 fills after four inserts, 2000 takes all five.
        assert_eq!(summary.fluid_inserted, 1000 + 5 * 250);
        assert!(bootstrap.block_entities.is_frozen());
    }

    #[test]
    fn test_blast_furnace_tank_is_decorated() {
        let bootstrap = Bootstrap::new(AppConfig::default()).unwrap();
        let mut world = World::new();
        bootstrap.populate(&mut world).unwrap();
        let furnace = world.block_entity(BlockPos::new(1, 64, 0)).unwrap();
        let blast = world.block_entity(BlockPos::new(2, 64, 0)).unwrap();
        assert_eq!(bootstrap.keys.fuel_tank.get(furnace).unwrap().capacity(), 1000);
        assert_eq!(bootstrap.keys.fuel_tank.get(blast).unwrap().capacity(), 2000);
        assert!(bootstrap.keys.fuel_tank.get_nullable(world.block_entity(BlockPos::new(0, 64, 0)).unwrap()).is_none());
    }

    #[test]
    fn test_hierarchy_without_furnaces_is_rejected() {
        let path = std::env::temp_dir().join(format!("tether_bootstrap_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "types": [ { "name": "block_entity" } ] }"#).unwrap();
        let result = Bootstrap::new(AppConfig::default().with_hierarchy_path(&path));
        std::fs::remove_file(&path).unwrap();
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("built-in types"));
    }
}
