/*!
# romloader

A Rust library for identifying ROM and disc images and resolving them to the
emulation core that should run them.

## Features

- Open plain files and zip archives, binding the archive member to load
- Identify cartridges by content hash, header signature or extension
- Read ISO and CUE/BIN disc images through a seekable sector stream
- Detect disc platforms (Saturn, PSP, PlayStation, Mega CD, PC Engine CD)
- Validate system-card firmware against the game database
- Resolve content to one core, with config-selected alternate cores

## Quick Start

```rust,no_run
use romloader::{CoreRegistry, DispatchConfig, MemoryGameDatabase, Resolver};

let database = MemoryGameDatabase::load_from_file("gamedb.json")?;
let registry = CoreRegistry::standard().with_dry_run_builders();
let resolver = Resolver::new(registry, database);

let resolution = resolver.load_path("roms/game.nes", DispatchConfig::default());
match resolution.loaded() {
    Some(game) => println!("{} on {}", game.record, game.plan.core),
    None => println!("{:?}", resolution.failure()),
}

// Persist whatever config came back
resolution.config.save_to_file("config.toml")?;
# Ok::<(), romloader::RomError>(())
```

Reading a disc as a byte stream:

```rust,no_run
use std::io::{Read, Seek, SeekFrom};
use romloader::{Disc, DiscSectorReader, DiscStream, SectorView};

let disc = Disc::from_cue_path("game.cue")?;
let mut stream = DiscStream::new(DiscSectorReader::new(&disc), SectorView::Mode1, 0)?;

let mut pvd = [0u8; 2048];
stream.seek(SeekFrom::Start(16 * 2048))?;
stream.read_exact(&mut pvd)?;
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Modules

- `disc`: Disc images, sector reading and streaming, platform detection
- `game`: Game records, ROM images and the game database
- `media`: Plain file and archive media sources
- `firmware`: Firmware lookup and validation
- `dispatch`: Core registry and the resolver
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Disc images, sector reading and streaming
pub mod disc;
/// Core registry, configuration and resolution
pub mod dispatch;
/// Error types and Result alias
pub mod error;
/// Firmware lookup and validation
pub mod firmware;
/// Game records and the game database
pub mod game;
/// Plain file and archive media sources
pub mod media;

// Re-export common types
pub use disc::{
    identify, Blob, Disc, DiscIdentity, DiscSectorReader, DiscSectorView, DiscStream, DiscType,
    SectorReader, SectorView, Track, TrackKind, UserData2048Mode,
};
pub use dispatch::{
    ConfigFlag, Core, CoreBuilder, CoreComm, CoreKind, CorePlan, CoreRegistry, DispatchConfig,
    DispatchOutcome, DryRunBuilder, FailureKind, Lane, LoadFailure, LoadedGame, NoSettings,
    Resolution, Resolver, SettingsMap, SettingsProvider,
};
pub use error::{Result, RomError};
pub use firmware::{
    FirmwareRequirement, FirmwareStore, FirmwareValidator, MapFirmwareStore, ValidatedFirmware,
};
pub use game::{DumpStatus, GameDatabase, GameRecord, MemoryGameDatabase, RomImage, SystemRelabel};
pub use media::MediaSource;
