//! The filestore server binary.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    filestore_server::cli::execute()
}
