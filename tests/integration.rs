/// Integration tests for romloader

use romloader::dispatch::PlannedCore;
use romloader::game::rom::{content_hashes, sha256_hex};
use romloader::*;
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use tempfile::tempdir;
use zip::write::FileOptions;
use zip::ZipWriter;

const GB_LOGO: [u8; 8] = [0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B];

fn gb_rom(title: &str) -> Vec<u8> {
    let mut data = vec![0u8; 0x8000];
    data[0x104..0x10C].copy_from_slice(&GB_LOGO);
    data[0x134..0x134 + title.len()].copy_from_slice(title.as_bytes());
    data
}

fn iso(sectors: usize, patch: impl FnOnce(&mut [u8])) -> Vec<u8> {
    let mut data = vec![0u8; sectors * 2048];
    patch(&mut data);
    data
}

fn with_pvd(data: &mut [u8], system: &str) {
    let pvd = &mut data[16 * 2048..17 * 2048];
    pvd[0] = 1;
    pvd[1..6].copy_from_slice(b"CD001");
    pvd[8..40].fill(b' ');
    pvd[8..8 + system.len()].copy_from_slice(system.as_bytes());
}

fn pce_cd_iso() -> Vec<u8> {
    iso(30, |d| {
        d[2048 + 32..2048 + 32 + 23].copy_from_slice(b"PC Engine CD-ROM SYSTEM");
    })
}

fn resolver(database: MemoryGameDatabase) -> Resolver {
    Resolver::new(CoreRegistry::standard().with_dry_run_builders(), database)
}

fn planned(game: &LoadedGame) -> String {
    format!("{:?}", game.core)
}

fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        writer
            .start_file(*name, FileOptions::default())
            .expect("Failed to start zip entry");
        writer.write_all(data).expect("Failed to write zip entry");
    }
    writer.finish().expect("Failed to finish zip").into_inner()
}

#[test]
fn test_game_boy_default_core() {
    let source = MediaSource::from_bytes("tetris.gb", gb_rom("TETRIS")).unwrap();
    let config = DispatchConfig::default();
    let resolution = resolver(MemoryGameDatabase::new()).resolve(source, config);

    let game = resolution.loaded().expect("Game Boy ROM should load");
    assert_eq!(game.plan.core, CoreKind::Gambatte);
    assert_eq!(game.plan.system_id, "GB");
    assert_eq!(game.record.system_id(), "GB");
    assert_eq!(game.record.name(), "tetris");
    assert!(game.plan.firmware.is_empty());
    assert_eq!(game.core.kind(), CoreKind::Gambatte);
    assert!(resolution.relabel.is_none());
    assert_eq!(resolution.config, config);
}

#[test]
fn test_game_boy_as_super_game_boy() {
    let dir = tempdir().unwrap();
    let sgb_path = dir.path().join("sgb.sfc");
    let sgb = vec![0x5A; 256 * 1024];
    std::fs::write(&sgb_path, &sgb).unwrap();

    let rom = gb_rom("TETRIS");
    let hash = content_hashes(&rom)[0].clone();
    let database = MemoryGameDatabase::new().with(
        &hash,
        GameRecord::new("GB", "Tetris")
            .with_status(DumpStatus::Verified)
            .with_hash(&hash),
    );

    let resolver = resolver(database.clone())
        .with_firmware_store(MapFirmwareStore::new().with("SNES", "Rom_SGB", &sgb_path));

    let plain = resolver.resolve(
        MediaSource::from_bytes("tetris.gb", rom.clone()).unwrap(),
        DispatchConfig::default(),
    );
    let config = DispatchConfig::default().with(ConfigFlag::GbAsSgb, true);
    let sgb_run = resolver.resolve(MediaSource::from_bytes("tetris.gb", rom).unwrap(), config);

    let game = sgb_run.loaded().expect("SGB load should succeed");
    assert_eq!(game.plan.core, CoreKind::Libsnes);
    assert_eq!(game.plan.system_id, "SNES");
    assert_eq!(game.plan.firmware, vec![sgb]);
    assert_eq!(game.record.system_id(), "SNES");
    assert_eq!(game.record.option("SGB"), Some("true"));

    let relabel = sgb_run.relabel.as_ref().expect("Relabel should be recorded");
    assert_eq!(relabel.from, "GB");
    assert_eq!(relabel.to, "SNES");
    assert_eq!(sgb_run.config, config);

    // Identity is the same record either way, apart from the system
    let gambatte = plain.loaded().unwrap();
    assert_eq!(gambatte.plan.core, CoreKind::Gambatte);
    assert_eq!(game.record.name(), gambatte.record.name());
    assert_eq!(game.record.status(), gambatte.record.status());
    assert_eq!(game.record.hash(), gambatte.record.hash());
    assert_eq!(game.record.name(), "Tetris");
}

#[test]
fn test_super_game_boy_without_firmware() {
    let calls = Rc::new(Cell::new(0));
    let mut resolver = resolver(MemoryGameDatabase::new());
    let counter = calls.clone();
    resolver.on_load_error(move |failure| {
        assert_eq!(failure.kind, FailureKind::CoreConstructionFailure);
        counter.set(counter.get() + 1);
    });

    let config = DispatchConfig::default().with(ConfigFlag::GbAsSgb, true);
    let source = MediaSource::from_bytes("tetris.gb", gb_rom("TETRIS")).unwrap();
    let resolution = resolver.resolve(source, config);

    let failure = resolution.failure().expect("Load should fail");
    assert_eq!(failure.kind, FailureKind::CoreConstructionFailure);
    assert_eq!(failure.system_id, "GB");
    assert!(failure.message.contains("Disabling"));
    assert!(!resolution.config.gb_as_sgb);
    assert_eq!(calls.get(), 1);

    // Nothing was retried; the next load uses the persisted config
    let retry = resolver.resolve(
        MediaSource::from_bytes("tetris.gb", gb_rom("TETRIS")).unwrap(),
        resolution.config,
    );
    assert_eq!(retry.loaded().unwrap().plan.core, CoreKind::Gambatte);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_pce_cd_without_firmware() {
    for data in [pce_cd_iso(), iso(30, |_| {})] {
        let source = MediaSource::from_bytes("game.iso", data).unwrap();
        let resolution = resolver(MemoryGameDatabase::new()).resolve(source, DispatchConfig::default());

        let failure = resolution.failure().expect("Load should fail");
        assert_eq!(failure.kind, FailureKind::FirmwareMissing);
        assert_eq!(failure.system_id, "PCECD");
        assert!(failure.kind.is_firmware());
        assert!(failure.message.contains("PCE-CD System Card"));
    }
}

#[test]
fn test_pce_cd_firmware_gates() {
    let dir = tempdir().unwrap();
    let bios_path = dir.path().join("syscard3.pce");
    let bios = vec![0xA5; 256 * 1024];
    std::fs::write(&bios_path, &bios).unwrap();
    let bios_hash = content_hashes(&bios)[0].clone();

    let disc_data = pce_cd_iso();
    let disc_hash = identify(&Disc::from_iso_bytes(disc_data.clone()).unwrap())
        .unwrap()
        .hash;
    let game = GameRecord::new("PCECD", "Ys Book I & II")
        .with_hash(&disc_hash)
        .with_flag("NeedSuperSysCard");

    let run = |bios_record: Option<GameRecord>| {
        let mut database = MemoryGameDatabase::new().with(&disc_hash, game.clone());
        if let Some(record) = bios_record {
            database.insert(&bios_hash, record);
        }
        let resolver = resolver(database)
            .with_firmware_store(MapFirmwareStore::new().with("PCECD", "Bios", &bios_path));
        resolver.resolve(
            MediaSource::from_bytes("ys.iso", disc_data.clone()).unwrap(),
            DispatchConfig::default(),
        )
    };

    let kind = |r: &Resolution| r.failure().map(|f| f.kind);

    assert_eq!(kind(&run(None)), Some(FailureKind::FirmwareUnrecognized));
    assert_eq!(
        kind(&run(Some(
            GameRecord::new("PCECD", "Card").with_status(DumpStatus::BadDump).with_flag("BIOS")
        ))),
        Some(FailureKind::FirmwareInvalid)
    );
    assert_eq!(
        kind(&run(Some(GameRecord::new("PCECD", "Card")))),
        Some(FailureKind::FirmwareWrongKind)
    );
    assert_eq!(
        kind(&run(Some(GameRecord::new("PCECD", "Card 2.0").with_flag("BIOS")))),
        Some(FailureKind::FirmwareIncompatible)
    );

    let resolution = run(Some(
        GameRecord::new("PCECD", "Super CD-ROM2 3.0")
            .with_flag("BIOS")
            .with_flag("SuperSysCard"),
    ));
    let loaded = resolution.loaded().expect("Validated firmware should load");
    assert_eq!(loaded.plan.core, CoreKind::PcEngine);
    assert_eq!(loaded.plan.firmware, vec![bios.clone()]);
    assert_eq!(loaded.record.name(), "Ys Book I & II");
    assert_eq!(loaded.record.firmware_hash(), Some(sha256_hex(&bios).as_str()));
    assert!(loaded.record.flag("SuperSysCard"));
}

#[test]
fn test_disc_platforms() {
    let cases: Vec<(Vec<u8>, &str, CoreKind)> = vec![
        (
            iso(30, |d| d[..15].copy_from_slice(b"SEGA SEGASATURN")),
            "SAT",
            CoreKind::Yabause,
        ),
        (iso(30, |d| with_pvd(d, "PLAYSTATION")), "PSX", CoreKind::Octoshock),
        (iso(30, |d| with_pvd(d, "PSP GAME")), "PSP", CoreKind::Psp),
        (
            iso(30, |d| d[..14].copy_from_slice(b"SEGADISCSYSTEM")),
            "GEN",
            CoreKind::Gpgx,
        ),
    ];

    for (data, system, core) in cases {
        let source = MediaSource::from_bytes("disc.iso", data).unwrap();
        let resolution = resolver(MemoryGameDatabase::new()).resolve(source, DispatchConfig::default());

        let game = resolution.loaded().unwrap_or_else(|| panic!("{} disc should load", system));
        assert_eq!(game.plan.system_id, system);
        assert_eq!(game.plan.core, core);
        assert_eq!(game.record.name(), "disc");
        assert_eq!(game.record.hash().len(), 8);
    }
}

#[test]
fn test_disc_content_forms() {
    let saturn = iso(30, |d| d[..15].copy_from_slice(b"SEGA SEGASATURN"));
    let resolution = resolver(MemoryGameDatabase::new()).resolve(
        MediaSource::from_bytes("saturn.iso", saturn).unwrap(),
        DispatchConfig::default(),
    );
    assert!(planned(resolution.loaded().unwrap()).contains("stream"));

    let psx = iso(30, |d| with_pvd(d, "PLAYSTATION"));
    let resolution = resolver(MemoryGameDatabase::new()).resolve(
        MediaSource::from_bytes("psx.iso", psx).unwrap(),
        DispatchConfig::default(),
    );
    let game = resolution.loaded().unwrap();
    assert!(planned(game).contains("psx.iso"));
    assert_eq!(game.status_details().as_deref(), Some("PSX etc."));
}

#[test]
fn test_disc_database_hit() {
    let data = iso(30, |d| with_pvd(d, "PLAYSTATION"));
    let hash = identify(&Disc::from_iso_bytes(data.clone()).unwrap()).unwrap().hash;
    let database = MemoryGameDatabase::new().with(
        &hash,
        GameRecord::new("PSX", "Wipeout").with_status(DumpStatus::Verified),
    );

    let resolution = resolver(database).resolve(
        MediaSource::from_bytes("track01.iso", data).unwrap(),
        DispatchConfig::default(),
    );
    let game = resolution.loaded().unwrap();
    assert_eq!(game.record.name(), "Wipeout");
    assert!(game.record.in_database());
}

#[test]
fn test_cue_bin_disc() {
    let dir = tempdir().unwrap();

    // Raw mode 1 sectors: 16 byte sync/header, then user data
    let mut bin = vec![0u8; 30 * 2352];
    bin[16..16 + 15].copy_from_slice(b"SEGA SEGASATURN");
    std::fs::write(dir.path().join("game.bin"), &bin).unwrap();
    std::fs::write(
        dir.path().join("game.cue"),
        "FILE \"game.bin\" BINARY\n  TRACK 01 MODE1/2352\n    INDEX 01 00:00:00\n",
    )
    .unwrap();

    let resolution =
        resolver(MemoryGameDatabase::new()).load_path(dir.path().join("game.cue"), DispatchConfig::default());
    let game = resolution.loaded().expect("CUE disc should load");
    assert_eq!(game.plan.core, CoreKind::Yabause);
    assert_eq!(game.record.name(), "game");

    // The same user data as an ISO hashes the same
    let mut cooked = vec![0u8; 30 * 2048];
    cooked[..15].copy_from_slice(b"SEGA SEGASATURN");
    let iso_hash = identify(&Disc::from_iso_bytes(cooked).unwrap()).unwrap().hash;
    assert_eq!(game.record.hash(), iso_hash);
}

#[test]
fn test_cue_missing_bin_is_binding_error() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("game.cue"),
        "FILE \"missing.bin\" BINARY\n  TRACK 01 MODE1/2352\n    INDEX 01 00:00:00\n",
    )
    .unwrap();

    let resolution =
        resolver(MemoryGameDatabase::new()).load_path(dir.path().join("game.cue"), DispatchConfig::default());
    assert_eq!(resolution.failure().unwrap().kind, FailureKind::BindingError);
}

#[test]
fn test_extension_mapping() {
    let cases = [
        ("sms", "SMS", CoreKind::Sms),
        ("sg", "SG", CoreKind::Sms),
        ("gg", "GG", CoreKind::Sms),
        ("sfc", "SNES", CoreKind::Libsnes),
        ("smc", "SNES", CoreKind::Libsnes),
        ("pce", "PCE", CoreKind::PcEngine),
        ("sgx", "SGX", CoreKind::PcEngine),
        ("gen", "GEN", CoreKind::Gpgx),
        ("md", "GEN", CoreKind::Gpgx),
        ("smd", "GEN", CoreKind::Gpgx),
        ("bin", "GEN", CoreKind::Gpgx),
        ("gb", "GB", CoreKind::Gambatte),
        ("gbc", "GBC", CoreKind::Gambatte),
        ("nes", "NES", CoreKind::Nes),
        ("unf", "NES", CoreKind::Nes),
        ("fds", "NES", CoreKind::Nes),
        ("int", "INTV", CoreKind::Intellivision),
        ("a26", "A26", CoreKind::Atari2600),
        ("a78", "A78", CoreKind::Atari7800),
        ("col", "Coleco", CoreKind::ColecoVision),
        ("crt", "C64", CoreKind::C64),
        ("83p", "TI83", CoreKind::Ti83),
        ("z64", "N64", CoreKind::N64),
        ("v64", "N64", CoreKind::N64),
        ("n64", "N64", CoreKind::N64),
    ];

    let resolver = resolver(MemoryGameDatabase::new());
    for (extension, system, core) in cases {
        let name = format!("game.{}", extension);
        let source = MediaSource::from_bytes(&name, vec![0; 0x8000]).unwrap();
        let resolution = resolver.resolve(source, DispatchConfig::default());

        let game = resolution
            .loaded()
            .unwrap_or_else(|| panic!("{} failed: {:?}", name, resolution.failure()));
        assert_eq!(game.plan.system_id, system, "{}", name);
        assert_eq!(game.plan.core, core, "{}", name);
    }
}

#[test]
fn test_interim_systems() {
    let source = MediaSource::from_bytes("game.gba", vec![0; 0x8000]).unwrap();
    let resolution = resolver(MemoryGameDatabase::new()).resolve(source, DispatchConfig::default());

    if cfg!(feature = "interim") {
        assert_eq!(resolution.loaded().unwrap().plan.core, CoreKind::Gba);
    } else {
        let failure = resolution.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::NoCoreMatched);
        assert_eq!(failure.system_id, "GBA");
    }
}

#[test]
fn test_resolution_is_repeatable() {
    let resolver = resolver(MemoryGameDatabase::new());
    let config = DispatchConfig::default().with(ConfigFlag::NesInQuickNes, true);
    let mut rom = b"NES\x1A\x02\x01".to_vec();
    rom.resize(16 + 32768 + 8192, 0xEA);

    let first = resolver.resolve(MediaSource::from_bytes("smb.nes", rom.clone()).unwrap(), config);
    let second = resolver.resolve(MediaSource::from_bytes("smb.nes", rom).unwrap(), config);

    let a = first.loaded().unwrap();
    let b = second.loaded().unwrap();
    assert_eq!(a.plan, b.plan);
    assert_eq!(a.record, b.record);
    assert_eq!(a.plan.core, CoreKind::QuickNes);
    assert_eq!(first.config, second.config);
    assert_eq!(first.config, config);
}

#[test]
fn test_linked_game_boys() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("red.gb"), gb_rom("POKEMON RED")).unwrap();
    std::fs::write(dir.path().join("blue.gb"), gb_rom("POKEMON BLUE")).unwrap();
    std::fs::write(
        dir.path().join("link.xml"),
        r#"<?xml version="1.0" encoding="utf-8"?>
<BizHawk-XMLGame System="DGB" Name="Trade">
  <LoadAssets>
    <LeftRom FileName="red.gb"/>
    <RightRom FileName="blue.gb"/>
  </LoadAssets>
</BizHawk-XMLGame>
"#,
    )
    .unwrap();

    let resolution =
        resolver(MemoryGameDatabase::new()).load_path(dir.path().join("link.xml"), DispatchConfig::default());
    let game = resolution.loaded().expect("Linked game should load");
    assert_eq!(game.plan.core, CoreKind::GambatteLink);
    assert_eq!(game.record.system_id(), "DGB");
    assert_eq!(game.record.name(), "Trade");
    assert!(planned(game).contains("2 linked assets"));
}

#[test]
fn test_linked_missing_asset() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("link.xml"),
        r#"<BizHawk-XMLGame System="DGB"><LoadAssets><LeftRom FileName="gone.gb"/></LoadAssets></BizHawk-XMLGame>"#,
    )
    .unwrap();

    let resolution =
        resolver(MemoryGameDatabase::new()).load_path(dir.path().join("link.xml"), DispatchConfig::default());
    assert_eq!(resolution.failure().unwrap().kind, FailureKind::UnsupportedFormat);
}

#[test]
fn test_linked_unknown_system() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.gb"), gb_rom("A")).unwrap();
    std::fs::write(
        dir.path().join("link.xml"),
        r#"<BizHawk-XMLGame System="DNES"><LoadAssets><Left FileName="a.gb"/></LoadAssets></BizHawk-XMLGame>"#,
    )
    .unwrap();

    let resolution =
        resolver(MemoryGameDatabase::new()).load_path(dir.path().join("link.xml"), DispatchConfig::default());
    let failure = resolution.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::UnsupportedFormat);
    assert_eq!(failure.system_id, "DNES");
}

#[test]
fn test_archive_sole_rom() {
    let rom = gb_rom("TETRIS");
    let data = zip_bytes(&[("readme.txt", b"hello".as_slice()), ("roms/tetris.gb", rom.as_slice())]);
    let source = MediaSource::from_bytes("/games/tetris.zip", data).unwrap();

    let resolution = resolver(MemoryGameDatabase::new()).resolve(source, DispatchConfig::default());
    let game = resolution.loaded().expect("Archive member should load");
    assert_eq!(game.plan.core, CoreKind::Gambatte);
    assert_eq!(game.record.name(), "tetris");
    assert_eq!(
        resolution.canonical_path.as_deref(),
        Some("/games/tetris.zip|roms/tetris.gb")
    );
}

#[test]
fn test_archive_cue_and_bin() {
    let mut bin = vec![0u8; 30 * 2352];
    bin[16..16 + 15].copy_from_slice(b"SEGA SEGASATURN");
    let cue = b"FILE \"game.bin\" BINARY\n  TRACK 01 MODE1/2352\n    INDEX 01 00:00:00\n";
    let data = zip_bytes(&[("game.bin", bin.as_slice()), ("game.cue", cue.as_slice())]);

    let source = MediaSource::from_bytes("saturn.zip", data).unwrap();
    let resolution = resolver(MemoryGameDatabase::new()).resolve(source, DispatchConfig::default());

    let game = resolution.loaded().expect("Zipped disc should load");
    assert_eq!(game.plan.system_id, "SAT");
    assert_eq!(game.plan.core, CoreKind::Yabause);
    assert_eq!(resolution.canonical_path.as_deref(), Some("saturn.zip|game.cue"));
}

#[test]
fn test_archive_of_two_discs_is_ambiguous() {
    let cue = |name: &str| format!("FILE \"{}\" BINARY\n  TRACK 01 MODE1/2352\n    INDEX 01 00:00:00\n", name);
    let (cue1, cue2) = (cue("disc1.bin"), cue("disc2.bin"));
    let bin = vec![0u8; 30 * 2352];
    let data = zip_bytes(&[
        ("disc1.cue", cue1.as_bytes()),
        ("disc1.bin", bin.as_slice()),
        ("disc2.cue", cue2.as_bytes()),
        ("disc2.bin", bin.as_slice()),
    ]);

    let source = MediaSource::from_bytes("set.zip", data).unwrap();
    let resolution = resolver(MemoryGameDatabase::new()).resolve(source, DispatchConfig::default());
    assert_eq!(resolution.failure().unwrap().kind, FailureKind::ArchiveAmbiguous);
}

#[test]
fn test_archive_ambiguous() {
    let (a, b) = (gb_rom("A"), gb_rom("B"));
    let data = zip_bytes(&[("a.gb", a.as_slice()), ("b.gb", b.as_slice())]);

    let source = MediaSource::from_bytes("pair.zip", data.clone()).unwrap();
    let resolution = resolver(MemoryGameDatabase::new()).resolve(source, DispatchConfig::default());
    assert_eq!(resolution.failure().unwrap().kind, FailureKind::ArchiveAmbiguous);

    // A chooser settles it
    let chooser = resolver(MemoryGameDatabase::new()).with_archive_chooser(|source| {
        source.members().iter().position(|m| m.name() == "b.gb")
    });
    let source = MediaSource::from_bytes("pair.zip", data.clone()).unwrap();
    let resolution = chooser.resolve(source, DispatchConfig::default());
    assert_eq!(resolution.loaded().unwrap().record.name(), "b");

    // A chooser that picks nothing still fails
    let declining = resolver(MemoryGameDatabase::new()).with_archive_chooser(|_| None);
    let source = MediaSource::from_bytes("pair.zip", data).unwrap();
    let resolution = declining.resolve(source, DispatchConfig::default());
    assert_eq!(resolution.failure().unwrap().kind, FailureKind::ArchiveAmbiguous);
}

#[test]
fn test_config_round_trip_after_reset() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("romloader").join("config.toml");

    let config = DispatchConfig::default().with(ConfigFlag::GbAsSgb, true);
    config.save_to_file(&path).unwrap();

    let loaded = DispatchConfig::load_or_default(&path);
    let resolution = resolver(MemoryGameDatabase::new()).resolve(
        MediaSource::from_bytes("tetris.gb", gb_rom("TETRIS")).unwrap(),
        loaded,
    );
    resolution.config.save_to_file(&path).unwrap();

    let saved = DispatchConfig::load_from_file(&path).unwrap();
    assert!(!saved.gb_as_sgb);
    assert!(saved.deterministic);
}

#[test]
fn test_dry_run_core_records_content() {
    let mut rom = b"NES\x1A\x02\x01".to_vec();
    rom.resize(16 + 32768 + 8192, 0);

    let resolution = resolver(MemoryGameDatabase::new()).resolve(
        MediaSource::from_bytes("smb.nes", rom).unwrap(),
        DispatchConfig::default(),
    );
    let game = resolution.loaded().unwrap();

    // The accurate core gets the whole file, header included
    let expected = PlannedCore {
        kind: CoreKind::Nes,
        system_id: "NES".into(),
        content: "file data (40976 bytes)".into(),
        details: None,
    };
    assert_eq!(planned(game), format!("{:?}", expected));
    assert!(game.status_details().is_none());

    // The fast core is handed the same file data
    let quick = resolver(MemoryGameDatabase::new()).resolve(
        MediaSource::from_bytes("smb.nes", game.rom.as_ref().unwrap().file_data().to_vec()).unwrap(),
        DispatchConfig::default().with(ConfigFlag::NesInQuickNes, true),
    );
    assert!(planned(quick.loaded().unwrap()).contains("file data (40976 bytes)"));
}
