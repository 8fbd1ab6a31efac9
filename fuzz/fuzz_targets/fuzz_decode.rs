#![no_main]
use libfuzzer_sys::fuzz_target;
use zenbtga::FormatVersion;

fuzz_target!(|data: &[u8]| {
    // Every framing revision must reject garbage without panicking
    for version in [
        FormatVersion::V1,
        FormatVersion::V2,
        FormatVersion::V3,
        FormatVersion::V4,
    ] {
        let _ = zenbtga::probe_btga(data, version);
        let _ = zenbtga::decode_btga(data, version, enough::Unstoppable);
        let _ = zenbtga::DecodeRequest::new(version)
            .with_start_offset(0)
            .decode(data, enough::Unstoppable);
    }
});
