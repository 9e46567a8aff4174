fn main() {
    println!("cargo:rerun-if-env-changed=WIT_LIB_DIR");

    if std::env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }

    if let Ok(dir) = std::env::var("WIT_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }

    for lib in ["wit", "ssl", "crypto", "sox"] {
        println!("cargo:rustc-link-lib={}", lib);
    }
}
