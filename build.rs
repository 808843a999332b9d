fn main() {
    // tauri-build wires the IPC permission manifests for the desktop shell;
    // the core library builds without it.
    if std::env::var("CARGO_FEATURE_DESKTOP").is_ok() {
        tauri_build::build();
    }
}
