use std::{env, fs, path::Path};

fn main() {
    println!("cargo:rerun-if-changed=src/c_bindings.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    if env::var("CANN_SKIP_CBINDGEN").ok().as_deref() == Some("1") {
        println!("cargo:warning=Skipping cbindgen due to CANN_SKIP_CBINDGEN=1");
        return;
    }

    let (Ok(crate_dir), Ok(out_dir)) = (env::var("CARGO_MANIFEST_DIR"), env::var("OUT_DIR")) else {
        println!("cargo:warning=Cargo build environment missing, skipping header generation");
        return;
    };

    let config = cbindgen::Config::from_file(Path::new(&crate_dir).join("cbindgen.toml"))
        .unwrap_or_default();

    let bindings = match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(b) => b,
        Err(e) => {
            println!("cargo:warning=Skipping cbindgen header generation: {}", e);
            return;
        }
    };

    // For build consumers
    bindings.write_to_file(Path::new(&out_dir).join("cann.h"));

    // Distributable copy
    let include_dir = Path::new(&crate_dir).join("include");
    let _ = fs::create_dir_all(&include_dir);
    bindings.write_to_file(include_dir.join("cann.h"));
}
