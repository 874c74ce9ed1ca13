fn main() {
    // Optional JSON override for `SystemConfig`, baked in at build time.
    // An unset variable yields an empty string and the defaults are used.
    println!("cargo:rerun-if-env-changed=SWITCHBOARD_CONFIG");
    let overrides = std::env::var("SWITCHBOARD_CONFIG").unwrap_or_default();
    if !overrides.trim().is_empty() {
        println!("cargo:warning=SWITCHBOARD_CONFIG override present");
    }
    println!("cargo:rustc-env=SWITCHBOARD_CONFIG={}", overrides.trim());

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
