#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary TOML must parse or fail cleanly, and a parsed config must
    // validate or be rejected without panicking (bind address parsing included).
    if let Ok(cfg) = sorter_config::load_toml(data) {
        let _ = cfg.validate();
        let _ = cfg.server.bind_addr();
    }
});
