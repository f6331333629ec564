use std::env;

// link.x is found through the search path of every crate that depends on the
// harness; test targets pass `-Tlink.x` through .cargo/config.toml.
fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=link.x");

    println!("cargo:rustc-link-search={}", crate_dir);
}
