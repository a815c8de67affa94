//! Content signatures and extension mapping for cartridge images
//!
//! Header signatures are checked first, in table order. If none match, the
//! file extension decides.

/// Extensions treated as bindable ROM files inside archives
pub const ROM_EXTENSIONS: &[&str] = &[
    "sms", "sg", "gg", "sfc", "smc", "pce", "sgx", "gen", "md", "smd", "bin", "gb", "gbc", "nes",
    "unf", "fds", "int", "a26", "a78", "col", "crt", "83p", "z64", "v64", "n64", "gba", "rom",
    "iso", "cue", "xml",
];

/// Extensions of files that name their own companions (cue sheets, linked
/// descriptors) or stand alone as discs; preferred when binding an archive
pub const DESCRIPTOR_EXTENSIONS: &[&str] = &["cue", "iso", "xml"];

/// Nintendo logo start bytes, shared by Game Boy and GBA headers
const GB_LOGO: [u8; 8] = [0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B];
const GBA_LOGO: [u8; 8] = [0x24, 0xFF, 0xAE, 0x51, 0x69, 0x9A, 0xA2, 0x21];

type Matcher = fn(&[u8]) -> Option<&'static str>;

fn at(data: &[u8], offset: usize, magic: &[u8]) -> bool {
    data.get(offset..offset + magic.len()) == Some(magic)
}

fn nes(data: &[u8]) -> Option<&'static str> {
    (at(data, 0, b"NES\x1A") || at(data, 0, b"FDS\x1A") || at(data, 0, b"UNIF")).then_some("NES")
}

fn n64(data: &[u8]) -> Option<&'static str> {
    const MAGICS: [[u8; 4]; 3] = [
        [0x80, 0x37, 0x12, 0x40],
        [0x37, 0x80, 0x40, 0x12],
        [0x40, 0x12, 0x37, 0x80],
    ];
    MAGICS.iter().any(|m| at(data, 0, m)).then_some("N64")
}

fn c64(data: &[u8]) -> Option<&'static str> {
    at(data, 0, b"C64 CARTRIDGE").then_some("C64")
}

fn atari7800(data: &[u8]) -> Option<&'static str> {
    at(data, 1, b"ATARI7800").then_some("A78")
}

fn gameboy(data: &[u8]) -> Option<&'static str> {
    if !at(data, 0x104, &GB_LOGO) {
        return None;
    }
    match data.get(0x143) {
        Some(cgb) if cgb & 0x80 != 0 => Some("GBC"),
        _ => Some("GB"),
    }
}

fn gba(data: &[u8]) -> Option<&'static str> {
    (at(data, 0x04, &GBA_LOGO) && data.get(0xB2) == Some(&0x96)).then_some("GBA")
}

fn genesis(data: &[u8]) -> Option<&'static str> {
    at(data, 0x100, b"SEGA").then_some("GEN")
}

fn master_system(data: &[u8]) -> Option<&'static str> {
    [0x7FF0, 0x3FF0, 0x1FF0]
        .iter()
        .any(|&offset| at(data, offset, b"TMR SEGA"))
        .then_some("SMS")
}

/// Header signatures, checked in order
const SIGNATURES: &[(&str, Matcher)] = &[
    ("iNES/FDS/UNIF", nes),
    ("N64", n64),
    ("C64 CRT", c64),
    ("A78", atari7800),
    ("Game Boy", gameboy),
    ("GBA", gba),
    ("Mega Drive", genesis),
    ("Master System", master_system),
];

/// Identify the system from header signatures
pub fn sniff_content(data: &[u8]) -> Option<&'static str> {
    SIGNATURES.iter().find_map(|(name, matcher)| {
        let system = matcher(data)?;
        log::debug!("Matched {} signature", name);
        Some(system)
    })
}

/// Map a file extension (lowercase, no dot) to a system id
pub fn system_for_extension(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "sms" => "SMS",
        "sg" => "SG",
        "gg" => "GG",
        "sfc" | "smc" => "SNES",
        "pce" => "PCE",
        "sgx" => "SGX",
        "gen" | "md" | "smd" | "bin" => "GEN",
        "gb" => "GB",
        "gbc" => "GBC",
        "nes" | "unf" | "fds" => "NES",
        "int" => "INTV",
        "a26" => "A26",
        "a78" => "A78",
        "col" => "Coleco",
        "crt" => "C64",
        "83p" => "TI83",
        "z64" | "v64" | "n64" => "N64",
        "gba" => "GBA",
        _ => return None,
    })
}

/// Identify the system from content, falling back to the extension
pub fn identify_system(data: &[u8], extension: &str) -> Option<&'static str> {
    sniff_content(data).or_else(|| system_for_extension(extension))
}
