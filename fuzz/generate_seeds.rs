#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn header(format: u8, body: u32, palette: u32, index: u32) -> Vec<u8> {
    let mut out = vec![0u8; 28];
    out[4..8].copy_from_slice(&body.to_le_bytes());
    out[12..16].copy_from_slice(&palette.to_le_bytes());
    out[20..24].copy_from_slice(&index.to_le_bytes());
    out[0x18] = format;
    out
}

fn sized(blocks: &[Vec<u8>], prefix: usize) -> Vec<u8> {
    let mut out = vec![0u8; prefix];
    for b in blocks {
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&(b.len() as u32).to_le_bytes());
        out.extend_from_slice(&(b.len() as u32).to_le_bytes());
        out.extend_from_slice(b);
    }
    out
}

fn redirecting(blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for b in blocks {
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(1u32 << 16).to_le_bytes());
        out.extend_from_slice(&(b.len() as u32).to_le_bytes());
        out.extend_from_slice(&(b.len() as u32).to_le_bytes());
        out.extend_from_slice(b);
    }
    out
}

fn grouped(blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut entries = Vec::new();
    for b in blocks {
        entries.push(-0x10i32);
        entries.push(b.len() as i32);
    }
    let mut out = Vec::new();
    out.extend_from_slice(&((entries.len() as u32) << 8).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u32 * 4).to_le_bytes());
    for e in &entries {
        out.extend_from_slice(&e.to_le_bytes());
    }
    for b in blocks {
        out.extend_from_slice(b);
    }
    out
}

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // 8x8 textures
    let direct = vec![header(7, 128, 0, 0), vec![0x1F; 128]];
    let palette4 = vec![
        header(3, 32, 8, 0),
        vec![0x21; 32],
        vec![0xFF, 0x7F, 0x1F, 0x00, 0xE0, 0x03, 0x00, 0x7C],
    ];
    let compressed = vec![
        header(5, 16, 8, 8),
        vec![0xE4; 16],
        vec![0x1F, 0x00, 0x00, 0x7C, 0xE0, 0x03, 0xFF, 0x7F],
        vec![0x00, 0x00, 0x00, 0x40, 0x00, 0x80, 0x00, 0xC0],
    ];
    let a3i5 = vec![header(1, 64, 4, 0), vec![0xE1; 64], vec![0x1F, 0x00, 0xE0, 0x03]];

    for (name, blocks) in [
        ("direct", &direct),
        ("palette4", &palette4),
        ("compressed", &compressed),
        ("a3i5", &a3i5),
    ] {
        fs::write(format!("{dir}/v1_{name}.btga"), sized(blocks, 0x0C)).unwrap();
        fs::write(format!("{dir}/v2_{name}.btga"), sized(blocks, 0)).unwrap();
        fs::write(format!("{dir}/v3_{name}.btga"), redirecting(blocks)).unwrap();
        fs::write(format!("{dir}/v4_{name}.btga"), grouped(blocks)).unwrap();
    }

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/short.bin"), [0u8; 0x27]).unwrap();
    let mut bad_tag = grouped(&direct);
    bad_tag[8] = 0xEF;
    fs::write(format!("{dir}/v4_bad_tag.bin"), bad_tag).unwrap();

    println!("Generated seed corpus in {dir}/");
}
