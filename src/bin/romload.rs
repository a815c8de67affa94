/// Interactive ROM loader console

use romloader::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "config",
                "db",
                "exit",
                "firmware",
                "help",
                "identify",
                "info",
                "load",
                "open",
                "quit",
                "read",
                "set",
                "systems",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".romloader_history");
        p
    })
}

/// Get the path to the dispatch config file
fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut p| {
        p.push("romloader");
        p.push("config.toml");
        p
    })
}

/// State kept between commands
struct Session {
    database: MemoryGameDatabase,
    firmware: MapFirmwareStore,
    config: DispatchConfig,
    loaded: Option<LoadedGame>,
}

impl Session {
    fn new() -> Self {
        let config = config_path()
            .map(DispatchConfig::load_or_default)
            .unwrap_or_default();

        Session {
            database: MemoryGameDatabase::new(),
            firmware: MapFirmwareStore::new(),
            config,
            loaded: None,
        }
    }

    fn resolver(&self) -> Resolver {
        let mut resolver = Resolver::new(
            CoreRegistry::standard().with_dry_run_builders(),
            self.database.clone(),
        )
        .with_firmware_store(self.firmware.clone())
        .with_archive_chooser(choose_member);

        resolver.on_load_error(|failure| {
            println!("Load error ({}): {}", display_system(&failure.system_id), failure.message);
        });
        resolver
    }

    fn save_config(&self) {
        if let Some(path) = config_path() {
            match self.config.save_to_file(&path) {
                Ok(()) => println!("Saved config to {}", path.display()),
                Err(e) => println!("Error saving config: {}", e),
            }
        }
    }
}

fn main() {
    env_logger::init();

    println!("=== ROM Loader ===");
    println!("Interactive console for identifying ROM and disc images.");
    println!("Type 'help' for available commands\n");

    let mut rl = Editor::new().expect("Failed to create editor");
    rl.set_helper(Some(CommandCompleter::new()));

    // Load history if available
    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let mut session = Session::new();

    loop {
        let readline = rl.readline("> ");
        let input = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                if let Some(history_path) = history_path() {
                    let _ = rl.save_history(&history_path);
                }
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }
        let command = parts[0].to_lowercase();

        match command.as_str() {
            "help" => {
                print_help();
            }
            "quit" | "exit" => {
                if let Some(history_path) = history_path() {
                    let _ = rl.save_history(&history_path);
                }
                println!("Goodbye!");
                break;
            }
            "open" | "load" => {
                if parts.len() < 2 {
                    println!("Usage: open <path>");
                    continue;
                }
                open_media(&mut session, &parts[1]);
            }
            "info" => match &session.loaded {
                Some(game) => print_info(game),
                None => println!("Nothing loaded. Use 'open <path>' first."),
            },
            "config" => {
                print_config(&session.config);
            }
            "set" => {
                if parts.len() < 3 {
                    println!("Usage: set <flag> <on|off>");
                    continue;
                }
                let value = match parts[2].to_lowercase().as_str() {
                    "on" | "true" | "1" => true,
                    "off" | "false" | "0" => false,
                    other => {
                        println!("Invalid value: {} (use on or off)", other);
                        continue;
                    }
                };
                if parts[1] == "deterministic" {
                    session.config.deterministic = value;
                } else if let Some(flag) = ConfigFlag::from_name(&parts[1]) {
                    session.config.set(flag, value);
                } else {
                    println!("Unknown flag: {}", parts[1]);
                    continue;
                }
                session.save_config();
            }
            "db" => {
                if parts.len() < 2 {
                    println!("Usage: db <path>");
                    continue;
                }
                match MemoryGameDatabase::load_from_file(&parts[1]) {
                    Ok(db) => {
                        println!("Loaded {} records", db.len());
                        session.database = db;
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "firmware" => {
                if parts.len() < 4 {
                    println!("Usage: firmware <system> <tag> <path>");
                    continue;
                }
                session.firmware.insert(&parts[1], &parts[2], &parts[3]);
                println!("Firmware {}/{} set to {}", parts[1], parts[2], parts[3]);
            }
            "identify" => {
                if parts.len() < 2 {
                    println!("Usage: identify <disc.iso|disc.cue>");
                    continue;
                }
                identify_disc(&session, &parts[1]);
            }
            "read" => {
                if parts.len() < 3 {
                    println!("Usage: read <disc.iso|disc.cue> <lba> [bytes]");
                    continue;
                }
                let lba = match parts[2].parse::<u32>() {
                    Ok(lba) => lba,
                    Err(_) => {
                        println!("Invalid LBA: {}", parts[2]);
                        continue;
                    }
                };
                let bytes = parts
                    .get(3)
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(256);
                read_disc(&parts[1], lba, bytes);
            }
            "systems" => {
                list_systems();
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", command);
            }
        }
    }
}

fn open_media(session: &mut Session, path: &str) {
    let before = session.config;
    let resolution = session.resolver().load_path(path, session.config);

    if let Some(canonical) = &resolution.canonical_path {
        println!("Media: {}", canonical);
    }
    if let Some(relabel) = &resolution.relabel {
        println!("Routed {} content as {}", relabel.from, relabel.to);
    }

    session.config = resolution.config;
    if session.config != before {
        println!("Config changed by the load");
        session.save_config();
    }

    match resolution.into_loaded() {
        Some(game) => {
            println!("Loaded {} on {}", game.record, game.plan.core);
            session.loaded = Some(game);
        }
        None => println!("Load failed; previous game kept"),
    }
}

/// Ask the user which archive member to load
fn choose_member(source: &MediaSource) -> Option<usize> {
    println!("{} contains several files:", source.path().display());
    for (i, member) in source.members().iter().enumerate() {
        println!("  {:>3}  {:>10}  {}", i, member.size(), member.name());
    }
    print!("Choose a file (blank to cancel): ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;
    line.trim().parse().ok()
}

fn open_disc(path: &str) -> romloader::Result<Disc> {
    let lower = path.to_lowercase();
    if lower.ends_with(".cue") {
        Disc::from_cue_path(path)
    } else {
        Disc::from_iso_path(path)
    }
}

fn identify_disc(session: &Session, path: &str) {
    let disc = match open_disc(path) {
        Ok(disc) => disc,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    println!("Tracks:");
    for track in disc.tracks() {
        println!(
            "  {:02}  {:<10}  LBA {:>7}  {:>7} sectors",
            track.number,
            track.kind.name(),
            track.start_lba,
            track.length
        );
    }
    println!("Lead-out: LBA {}", disc.leadout_lba());

    match identify(&disc) {
        Ok(identity) => {
            println!("Hash: {}", identity.hash);
            println!("Type: {}", identity.disc_type);
            match session.database.lookup_by_hash(&identity.hash) {
                Some(record) => println!("Database: {}", record),
                None => println!(
                    "Database: not found (defaults to {})",
                    identity.disc_type.default_system_id()
                ),
            }
            if identity.disc_type == DiscType::UnknownFormat {
                println!("No disc structure recognized");
            }
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn read_disc(path: &str, lba: u32, bytes: usize) {
    let disc = match open_disc(path) {
        Ok(disc) => disc,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    let mut stream = match DiscStream::new(DiscSectorReader::new(&disc), SectorView::Mode1, lba) {
        Ok(stream) => stream,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    match read_window(&mut stream, bytes) {
        Ok(data) if data.is_empty() => println!("LBA {} is past the end of the disc", lba),
        Ok(data) => {
            println!("LBA {} ({} bytes):", lba, data.len());
            print_hex_dump(&data, data.len());
        }
        Err(e) => println!("Error: {}", e),
    }
}

/// Read up to `bytes` from the current position, never past the end
fn read_window<R: SectorReader>(stream: &mut DiscStream<R>, bytes: usize) -> std::io::Result<Vec<u8>> {
    let remaining = stream.len().saturating_sub(stream.position());
    let len = (bytes as u64).min(remaining) as usize;

    let mut data = vec![0u8; len];
    stream.read_exact(&mut data)?;
    Ok(data)
}

fn list_systems() {
    let registry = CoreRegistry::standard();
    for lane in Lane::ALL {
        println!("{}:", lane);
        for id in registry.system_ids(lane) {
            if let Some(entry) = registry.entry(lane, id) {
                let cores: Vec<String> = entry.variants.cores().iter().map(|c| c.to_string()).collect();
                let note = if entry.availability.is_available() {
                    ""
                } else {
                    " (interim builds only)"
                };
                println!("  {:<8} {}{}", id, cores.join(" / "), note);
            }
        }
    }
}

/// Parse command line input, respecting quoted strings
fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(current.clone());
                    current.clear();
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_help() {
    println!("Available commands:");
    println!("  open <path>                    - Identify and load a ROM, disc or archive (load)");
    println!("  info                           - Show the loaded game and its core plan");
    println!("  config                         - Show dispatch flags");
    println!("  set <flag> <on|off>            - Set nes_in_quicknes, gb_as_sgb or deterministic");
    println!("  db <path>                      - Load a JSON game database");
    println!("  firmware <system> <tag> <path> - Configure a firmware file (e.g. PCECD Bios)");
    println!("  identify <disc>                - Show disc tracks, hash and detected type");
    println!("  read <disc> <lba> [bytes]      - Hex dump user data starting at a sector");
    println!("  systems                        - List system ids and their cores");
    println!("  help                           - Show this help");
    println!("  quit, exit                     - Exit");
}

fn print_config(config: &DispatchConfig) {
    if let Some(path) = config_path() {
        println!("Config file: {}", path.display());
    }
    for flag in ConfigFlag::ALL {
        println!("  {:<16} {}", flag.name(), on_off(config.get(flag)));
    }
    println!("  {:<16} {}", "deterministic", on_off(config.deterministic));
}

fn print_info(game: &LoadedGame) {
    println!("Path: {}", game.canonical_path);
    println!("Name: {}", game.record.name());
    println!("System: {}", game.record.system_id());
    println!("Status: {}", game.record.status());
    if !game.record.hash().is_empty() {
        println!("Hash: {}", game.record.hash());
    }
    if let Some(hash) = game.record.firmware_hash() {
        println!("Firmware: {}", hash);
    }
    for (key, value) in game.record.options() {
        println!("Option: {}={}", key, value);
    }
    println!("Core: {}", game.plan.core);
    if let Some(details) = game.status_details() {
        println!("Details: {}", details);
    }
    if let Some(rom) = &game.rom {
        println!("ROM: {} bytes ({} byte header)", rom.file_data().len(), rom.header_len());
        print_hex_dump(rom.rom_data(), 64);
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn display_system(system_id: &str) -> &str {
    if system_id.is_empty() {
        "?"
    } else {
        system_id
    }
}

fn print_hex_dump(data: &[u8], max_bytes: usize) {
    let len = data.len().min(max_bytes);

    for (i, chunk) in data[..len].chunks(16).enumerate() {
        print!("{:04X}: ", i * 16);

        for (j, byte) in chunk.iter().enumerate() {
            print!("{:02X} ", byte);
            if j == 7 {
                print!(" ");
            }
        }

        // Pad if less than 16 bytes
        for j in chunk.len()..16 {
            print!("   ");
            if j == 7 {
                print!(" ");
            }
        }

        print!(" |");

        for byte in chunk {
            let c = if *byte >= 32 && *byte < 127 {
                *byte as char
            } else {
                '.'
            };
            print!("{}", c);
        }

        println!("|");
    }

    if data.len() > max_bytes {
        println!("... ({} more bytes)", data.len() - max_bytes);
    }
}
