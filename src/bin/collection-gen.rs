//! Collection generator CLI tool
//!
//! Downloads an indexed image sequence and writes one NFT metadata file per
//! image using the collection-gen library.

#[cfg(feature = "cli")]
use collection_gen::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
