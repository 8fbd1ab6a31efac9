#![no_main]
use libfuzzer_sys::fuzz_target;
use zenbtga::FormatVersion;

fuzz_target!(|data: &[u8]| {
    // First byte picks the revision; the rest is the file
    let Some((&selector, file)) = data.split_first() else {
        return;
    };
    let Some(version) = FormatVersion::from_number(u32::from(selector % 4) + 1) else {
        return;
    };

    if let Ok(tga) = zenbtga::convert_btga_to_tga(file, version, enough::Unstoppable) {
        let info = zenbtga::probe_btga(file, version).expect("decoded file must probe");
        assert_eq!(tga.len(), info.tga_len());
        assert_eq!(&tga[12..14], &(info.width as u16).to_le_bytes());
        assert_eq!(&tga[14..16], &(info.height as u16).to_le_bytes());
    }
});
