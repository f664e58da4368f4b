use kpi_drift::core::CoreApp;

#[tokio::main]
async fn main() {
    if let Err(e) = CoreApp::run().await {
        // Alternate form prints the context chain down to the root cause
        eprintln!("\nError: {:#}\n", e);
        std::process::exit(1);
    }
}
